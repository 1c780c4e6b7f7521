//! Module for the service-request API.
//!
//! Lead submission is public; listing, editing, completing and deleting
//! require a staff session.

pub mod handlers;
pub mod routes;

pub use routes::requests_router;
