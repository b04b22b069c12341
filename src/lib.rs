//! todosync — a terminal todo-list client synchronized against a hosted
//! backend exposing authentication (OAuth credential exchange) and a
//! document database.
//!
//! ## Architecture
//!
//! - [`backend`] — client layer for the hosted backend: trait seams for the
//!   auth and item-store facets plus the HTTP implementation.
//! - [`session`] — the login-state machine, the session controller gating
//!   the todo view, the polling refresher, and the item actions.
//! - [`providers`] — OAuth provider front-ends (Facebook, Google) that
//!   yield an opaque credential for the backend to exchange.
//! - [`ui`] — the view seam (wholesale list replacement, screen switching)
//!   and its terminal implementation.
//! - [`config`] — TOML configuration with CLI overrides.
//!
//! The backend's authentication protocol, storage engine, and the
//! providers' token issuance are external systems; this crate implements
//! only the client side of each interface.

pub mod backend;
pub mod config;
pub mod providers;
pub mod session;
pub mod ui;
