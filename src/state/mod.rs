//! Client-side session state.
//!
//! DESIGN
//! ======
//! `token_store` owns durable persistence of the bearer token; `session`
//! owns the in-memory identity and is the only writer of the token store.

pub mod session;
pub mod token_store;
