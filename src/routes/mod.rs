//! Route table and navigation menus.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every path resolves to exactly one `Route`. Protected routes live under
//! the application layout and pass through `guard::RouteGuard`; `/login` and
//! the not-found page are public.

pub mod guard;

use std::fmt;

pub const APP_TITLE: &str = "Internal Management Platform";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Expenses,
    SickLeave,
    Education,
    Assets,
    Maintenance,
    Travel,
    Profile,
    NotFound,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Login,
        Route::Dashboard,
        Route::Expenses,
        Route::SickLeave,
        Route::Education,
        Route::Assets,
        Route::Maintenance,
        Route::Travel,
        Route::Profile,
        Route::NotFound,
    ];

    /// Resolve a location to a route. Query strings, fragments, a missing
    /// leading slash and trailing slashes are tolerated; anything unknown is
    /// `NotFound`.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('/');

        match path {
            "" => Self::Dashboard,
            "login" => Self::Login,
            "expenses" => Self::Expenses,
            "sick-leave" => Self::SickLeave,
            "education" => Self::Education,
            "assets" => Self::Assets,
            "maintenance" => Self::Maintenance,
            "travel" => Self::Travel,
            "profile" => Self::Profile,
            _ => Self::NotFound,
        }
    }

    /// Canonical path. `NotFound` has none of its own and reports `/404`.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/",
            Self::Expenses => "/expenses",
            Self::SickLeave => "/sick-leave",
            Self::Education => "/education",
            Self::Assets => "/assets",
            Self::Maintenance => "/maintenance",
            Self::Travel => "/travel",
            Self::Profile => "/profile",
            Self::NotFound => "/404",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Expenses => "Expenses",
            Self::SickLeave => "Sick Leave",
            Self::Education => "Education",
            Self::Assets => "Assets",
            Self::Maintenance => "Maintenance",
            Self::Travel => "Travel",
            Self::Profile => "Profile",
            Self::NotFound => "Page Not Found",
        }
    }

    /// Whether the route sits behind the route guard.
    #[must_use]
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login | Self::NotFound)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// =============================================================================
// MENUS
// =============================================================================

/// What selecting a menu entry does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Navigate(Route),
    Logout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

const fn nav(label: &'static str, route: Route) -> MenuItem {
    MenuItem { label, action: MenuAction::Navigate(route) }
}

/// Side navigation shown on every protected page.
pub const MENU: [MenuItem; 7] = [
    nav("Dashboard", Route::Dashboard),
    nav("Expenses", Route::Expenses),
    nav("Sick Leave", Route::SickLeave),
    nav("Education", Route::Education),
    nav("Assets", Route::Assets),
    nav("Maintenance", Route::Maintenance),
    nav("Travel", Route::Travel),
];

/// Account menu behind the avatar.
pub const ACCOUNT_MENU: [MenuItem; 2] = [
    nav("Profile", Route::Profile),
    MenuItem { label: "Logout", action: MenuAction::Logout },
];

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
