use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use portal::config::{ConfigError, PortalConfig};
use portal::net::api::{ApiError, HttpApi};
use portal::net::types::{Credentials, Registration, Role};
use portal::routes::guard::{GuardDecision, RouteGuard};
use portal::routes::{ACCOUNT_MENU, APP_TITLE, MENU, MenuAction, Route};
use portal::state::session::{SessionBusy, SessionState, SessionStore};
use portal::state::token_store::FileTokenStore;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("backend request failed: {0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Session(String),
    #[error(transparent)]
    Busy(#[from] SessionBusy),
    #[error("not logged in; run `portal login` first")]
    NotLoggedIn,
    #[error("missing password; pass --password or set PORTAL_PASSWORD")]
    MissingPassword,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Internal Management Platform session client")]
struct Cli {
    /// Backend base URL; overrides `PORTAL_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Token file; overrides `PORTAL_TOKEN_FILE`.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Log more to stderr (`-v` info, `-vv` debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is up.
    Ping,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "employee")]
        role: Role,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    /// Print the restored session state.
    Status,
    /// Navigate to a page path through the route guard.
    Open {
        #[arg(default_value = "/")]
        path: String,
    },
    Menu,
    /// Authenticated GET against a backend path, e.g. `/api/expenses/me`.
    Get { path: String },
}

struct CliContext {
    api: Arc<HttpApi>,
    store: SessionStore,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = PortalConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url.trim().trim_end_matches('/').to_owned();
    }
    if let Some(path) = cli.token_file {
        config.token_path = path;
    }
    let api = Arc::new(HttpApi::new(&config.api)?);
    tracing::debug!(base_url = %api.base_url(), token_path = %config.token_path.display(), "config loaded");

    let store = SessionStore::new(api.clone(), Arc::new(FileTokenStore::new(config.token_path)));
    let ctx = CliContext { api, store };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Login { email, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            run_login(&ctx, &Credentials::new(email, password)).await
        }
        Command::Register { email, username, first_name, last_name, role, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            let registration = Registration { email, username, password, first_name, last_name, role };
            run_register(&ctx, &registration).await
        }
        Command::Logout => {
            ctx.store.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&ctx).await,
        Command::Status => run_status(&ctx).await,
        Command::Open { path } => run_open(&ctx, &path).await,
        Command::Menu => {
            print_menu();
            Ok(())
        }
        Command::Get { path } => run_get(&ctx, &path).await,
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_ping(ctx: &CliContext) -> Result<(), CliError> {
    ctx.api.health().await?;
    println!("ok");
    Ok(())
}

async fn run_login(ctx: &CliContext, credentials: &Credentials) -> Result<(), CliError> {
    ctx.store.bootstrap().await;
    if !ctx.store.login(credentials).await? {
        return Err(session_error(&ctx.store.snapshot()));
    }
    print_user(&ctx.store.snapshot())
}

async fn run_register(ctx: &CliContext, registration: &Registration) -> Result<(), CliError> {
    if !ctx.store.register(registration).await? {
        return Err(session_error(&ctx.store.snapshot()));
    }
    print_user(&ctx.store.snapshot())
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    ctx.store.bootstrap().await;
    let state = ctx.store.snapshot();
    if let Some(error) = state.error.clone() {
        return Err(CliError::Session(error));
    }
    print_user(&state)
}

async fn run_status(ctx: &CliContext) -> Result<(), CliError> {
    ctx.store.bootstrap().await;
    let state = ctx.store.snapshot();
    let mut value = serde_json::to_value(&state)?;
    if let Value::Object(map) = &mut value {
        map.insert("status".to_owned(), serde_json::to_value(state.status())?);
        map.insert("is_authenticated".to_owned(), Value::Bool(state.is_authenticated()));
    }
    print_json(&value)
}

async fn run_open(ctx: &CliContext, path: &str) -> Result<(), CliError> {
    let route = Route::parse(path);
    let mut session = ctx.store.subscribe();
    let ((), decision) = tokio::join!(ctx.store.bootstrap(), RouteGuard::resolve(route, &mut session));

    match decision {
        GuardDecision::Render(route) => {
            print!("{}", render_page(route, &ctx.store.snapshot()));
            Ok(())
        }
        GuardDecision::Redirect { to, from } => {
            println!("redirect: {from} -> {to}");
            if let Some(error) = ctx.store.snapshot().error {
                eprintln!("{error}");
            }
            Ok(())
        }
        GuardDecision::Wait => Err(CliError::Session("session still resolving".to_owned())),
    }
}

async fn run_get(ctx: &CliContext, path: &str) -> Result<(), CliError> {
    ctx.store.bootstrap().await;
    let bearer = ctx.store.bearer().ok_or(CliError::NotLoggedIn)?;
    let value = ctx.api.get_json(path, &bearer).await?;
    print_json(&value)
}

fn session_error(state: &SessionState) -> CliError {
    CliError::Session(state.error.clone().unwrap_or_else(|| "session exchange failed".to_owned()))
}

fn render_page(route: Route, state: &SessionState) -> String {
    let mut out = format!("{APP_TITLE}\n");
    if route.is_protected() {
        let name = state.user.as_ref().map_or("User", |u| u.display_name());
        out.push_str(&format!("account: {name} ["));
        let account: Vec<&str> = ACCOUNT_MENU.iter().map(|item| item.label).collect();
        out.push_str(&account.join(", "));
        out.push_str("]\n");
        for item in MENU {
            let marker = if item.action == MenuAction::Navigate(route) { '>' } else { ' ' };
            out.push_str(&format!("{marker} {}\n", item.label));
        }
    }
    out.push_str(&format!("\n# {}\n", route.title()));
    match route {
        Route::Dashboard => {
            let name = state.user.as_ref().map_or("User", |u| u.display_name());
            out.push_str(&format!("Welcome back, {name}!\n"));
        }
        Route::Profile => {
            if let Some(user) = &state.user {
                out.push_str(&format!("{} <{}>\nusername: {}\nrole: {}\n", user.full_name(), user.email, user.username, user.role));
            }
        }
        Route::NotFound => out.push_str("The page you are looking for does not exist.\n"),
        _ => {}
    }
    out
}

fn print_menu() {
    for item in MENU {
        if let MenuAction::Navigate(route) = item.action {
            println!("{:<12} {}", item.label, route.path());
        }
    }
}

fn print_user(state: &SessionState) -> Result<(), CliError> {
    let user = state.user.as_ref().ok_or(CliError::NotLoggedIn)?;
    print_json(&serde_json::to_value(user)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
