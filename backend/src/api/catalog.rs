//! Public catalogue endpoint.

use axum::Json;

use crate::services::{catalog, ServiceOffering};

pub async fn list_services() -> Json<&'static [ServiceOffering]> {
    Json(catalog())
}
