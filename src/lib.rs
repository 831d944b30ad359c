//! Session client for the Internal Management Platform.
//!
//! DESIGN
//! ======
//! `state::session::SessionStore` owns the bearer token and the current user;
//! `routes::guard::RouteGuard` gates the protected pages on the store's
//! derived state. `net` talks to the backend and `config` reads the
//! environment. The `portal` binary wires them together.

pub mod config;
pub mod net;
pub mod routes;
pub mod state;
