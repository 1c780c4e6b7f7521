//! Module for core business logic services.
//!
//! This module encapsulates the operations behind the request endpoints and
//! the static service catalogue, keeping handlers free of validation and
//! storage details.

pub mod catalog;
pub mod request_manager;

pub use catalog::{catalog, ServiceOffering};
pub use request_manager::{CreateRequestPayload, RequestManager};
