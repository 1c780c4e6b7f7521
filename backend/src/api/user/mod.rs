//! Module for staff account endpoints.
//!
//! These endpoints expose the signed-in user and the list of staff accounts,
//! distinct from the login and logout routes in `auth`.

pub mod handlers;
