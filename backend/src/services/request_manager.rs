//! Manages the lifecycle of service requests.
//!
//! This module validates lead submissions, turns dashboard edits into
//! field-map patches and maps "no such row" outcomes from the store onto
//! [`AppError::NotFound`].

use std::sync::Arc;

use reparo_adapters::{NewServiceRequest, RequestPatch, RequestStore, ServiceRequest, Storage};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

/// Body of `POST /api/requests`. Every field is optional at the wire level
/// so a missing one can be reported by name.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub preferred_time: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateRequestPayload {
    /// Checks the required fields, trimming whitespace and turning blank
    /// optional fields into `None`.
    pub fn validate(self) -> AppResult<NewServiceRequest> {
        let name = present(self.name);
        let phone = present(self.phone);
        let address = present(self.address);
        let brand = present(self.brand);
        let problem = present(self.problem);

        let missing: Vec<&str> = [
            ("name", name.is_none()),
            ("phone", phone.is_none()),
            ("address", address.is_none()),
            ("brand", brand.is_none()),
            ("problem", problem.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        match (name, phone, address, brand, problem) {
            (Some(name), Some(phone), Some(address), Some(brand), Some(problem)) => {
                Ok(NewServiceRequest {
                    name,
                    phone,
                    email: present(self.email),
                    address,
                    brand,
                    model: present(self.model),
                    problem,
                    preferred_time: present(self.preferred_time),
                })
            }
            _ => Err(AppError::Validation(format!(
                "Campos obrigatórios ausentes: {}",
                missing.join(", ")
            ))),
        }
    }
}

#[derive(Clone)]
pub struct RequestManager {
    store: Arc<dyn Storage>,
}

impl RequestManager {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: CreateRequestPayload) -> AppResult<ServiceRequest> {
        let new = payload.validate()?;
        let id = self.store.create_request(new).await?;
        self.get(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<ServiceRequest>> {
        Ok(self.store.list_requests().await?)
    }

    pub async fn get(&self, id: i64) -> AppResult<ServiceRequest> {
        self.store.get_request(id).await?.ok_or(AppError::NotFound)
    }

    /// Applies the mapped keys of `body`. A body with no mapped keys leaves
    /// the record untouched and returns it as is.
    pub async fn update(&self, id: i64, body: &Map<String, Value>) -> AppResult<ServiceRequest> {
        let patch = RequestPatch::from_json(body).map_err(|err| {
            AppError::Validation(format!("Valor inválido para o campo '{}'", err.field()))
        })?;

        if !patch.is_empty() && !self.store.update_request(id, &patch).await? {
            return Err(AppError::NotFound);
        }
        self.get(id).await
    }

    pub async fn complete(&self, id: i64) -> AppResult<ServiceRequest> {
        if !self.store.complete_request(id).await? {
            return Err(AppError::NotFound);
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if self.store.delete_request(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
