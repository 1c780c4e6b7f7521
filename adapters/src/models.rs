//! Domain models shared by every storage adapter.
//!
//! These models define the user and service-request records in their API
//! shape (camelCase keys), plus the fixed field-map that translates partial
//! updates onto storage columns. Both adapters consume the same map, so the
//! allow-list of editable fields lives in exactly one place.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::errors::StoreError;

/// Older data files stored ids as numeric strings (`"id": "12"`).
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid id '{text}'"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    /// Empty for accounts provisioned through federated login.
    #[serde(default)]
    pub password_hash: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_local_password(&self) -> bool {
        !self.password_hash.is_empty()
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// A user without its credential, as returned by `IdentityStore::list_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    New,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(RequestStatus::New),
            "completed" => Ok(RequestStatus::Completed),
            other => Err(StoreError::Corrupt(format!("unknown request status '{other}'"))),
        }
    }
}

/// A lead submitted through the public form.
///
/// `completed_at` is set iff `status` is [`RequestStatus::Completed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub brand: String,
    #[serde(default)]
    pub model: Option<String>,
    pub problem: String,
    #[serde(default)]
    pub preferred_time: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ServiceRequest {
    pub fn from_new(id: i64, new: NewServiceRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            brand: new.brand,
            model: new.model,
            problem: new.problem,
            preferred_time: new.preferred_time,
            status: RequestStatus::New,
            created_at: now,
            updated_at: None,
            completed_at: None,
        }
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = RequestStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = Some(now);
    }

    fn slot(&mut self, field: RequestField) -> Slot<'_> {
        match field {
            RequestField::Name => Slot::Required(&mut self.name),
            RequestField::Phone => Slot::Required(&mut self.phone),
            RequestField::Email => Slot::Optional(&mut self.email),
            RequestField::Address => Slot::Required(&mut self.address),
            RequestField::Brand => Slot::Required(&mut self.brand),
            RequestField::Model => Slot::Optional(&mut self.model),
            RequestField::Problem => Slot::Required(&mut self.problem),
            RequestField::PreferredTime => Slot::Optional(&mut self.preferred_time),
        }
    }
}

enum Slot<'a> {
    Required(&'a mut String),
    Optional(&'a mut Option<String>),
}

/// Input for creating a service request. Optional fields are `None` when
/// the submitter left them blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub brand: String,
    pub model: Option<String>,
    pub problem: String,
    pub preferred_time: Option<String>,
}

/// The editable columns of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestField {
    Name,
    Phone,
    Email,
    Address,
    Brand,
    Model,
    Problem,
    PreferredTime,
}

/// API key → field. Keys absent from this table are ignored on update.
pub const FIELD_MAP: [(&str, RequestField); 8] = [
    ("name", RequestField::Name),
    ("phone", RequestField::Phone),
    ("email", RequestField::Email),
    ("address", RequestField::Address),
    ("brand", RequestField::Brand),
    ("model", RequestField::Model),
    ("problem", RequestField::Problem),
    ("preferredTime", RequestField::PreferredTime),
];

impl RequestField {
    pub fn from_api_key(key: &str) -> Option<Self> {
        FIELD_MAP
            .iter()
            .find(|(api_key, _)| *api_key == key)
            .map(|(_, field)| *field)
    }

    pub fn api_key(&self) -> &'static str {
        match self {
            RequestField::Name => "name",
            RequestField::Phone => "phone",
            RequestField::Email => "email",
            RequestField::Address => "address",
            RequestField::Brand => "brand",
            RequestField::Model => "model",
            RequestField::Problem => "problem",
            RequestField::PreferredTime => "preferredTime",
        }
    }

    /// Storage column name, used verbatim in SQL.
    pub fn column(&self) -> &'static str {
        match self {
            RequestField::PreferredTime => "preferred_time",
            other => other.api_key(),
        }
    }

    /// Optional fields accept `null` to clear the stored value.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            RequestField::Email | RequestField::Model | RequestField::PreferredTime
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// A mapped field carried something other than a string, a blank string
    /// for a required field, or `null` for a required field.
    #[error("invalid value for field '{0}'")]
    InvalidValue(&'static str),
}

impl PatchError {
    /// API key of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            PatchError::InvalidValue(field) => field,
        }
    }
}

/// A partial update, already filtered through [`FIELD_MAP`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPatch {
    changes: Vec<(RequestField, Option<String>)>,
}

impl RequestPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a patch from a JSON object, silently dropping unknown keys.
    /// String values are trimmed, matching what creation stores.
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, PatchError> {
        let mut patch = Self::new();
        for (key, value) in body {
            let Some(field) = RequestField::from_api_key(key) else {
                continue;
            };
            match value {
                Value::String(s) if !field.is_optional() && s.trim().is_empty() => {
                    return Err(PatchError::InvalidValue(field.api_key()));
                }
                Value::String(s) => patch.set(field, Some(s.trim().to_string())),
                Value::Null if field.is_optional() => patch.set(field, None),
                _ => return Err(PatchError::InvalidValue(field.api_key())),
            }
        }
        Ok(patch)
    }

    /// Sets a field, replacing any earlier value for the same field. Blank
    /// strings on optional fields are stored as `None`.
    pub fn set(&mut self, field: RequestField, value: Option<String>) {
        let value = match value {
            Some(s) if field.is_optional() && s.trim().is_empty() => None,
            other => other,
        };
        self.changes.retain(|(existing, _)| *existing != field);
        self.changes.push((field, value));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RequestField, Option<&str>)> {
        self.changes
            .iter()
            .map(|(field, value)| (*field, value.as_deref()))
    }

    /// Applies the patch in memory and stamps `updated_at`.
    pub fn apply_to(&self, request: &mut ServiceRequest, now: DateTime<Utc>) {
        for (field, value) in &self.changes {
            match request.slot(*field) {
                Slot::Required(slot) => {
                    if let Some(v) = value {
                        *slot = v.clone();
                    }
                }
                Slot::Optional(slot) => *slot = value.clone(),
            }
        }
        request.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ServiceRequest {
        ServiceRequest::from_new(
            7,
            NewServiceRequest {
                name: "Ana".into(),
                phone: "11999990000".into(),
                email: None,
                address: "Rua A".into(),
                brand: "LG".into(),
                model: None,
                problem: "não liga".into(),
                preferred_time: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn field_map_translates_preferred_time_to_snake_case_column() {
        let field = RequestField::from_api_key("preferredTime").unwrap();
        assert_eq!(field, RequestField::PreferredTime);
        assert_eq!(field.column(), "preferred_time");
        assert_eq!(RequestField::from_api_key("preferred_time"), None);
    }

    #[test]
    fn field_map_is_total_over_its_keys() {
        for (key, field) in FIELD_MAP {
            assert_eq!(field.api_key(), key);
            assert_eq!(RequestField::from_api_key(key), Some(field));
        }
    }

    #[test]
    fn unknown_keys_produce_empty_patch() {
        let body = json!({"status": "completed", "id": 3, "createdAt": "x"});
        let patch = RequestPatch::from_json(body.as_object().unwrap()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn non_string_value_on_known_field_is_rejected() {
        let body = json!({"phone": 123});
        let err = RequestPatch::from_json(body.as_object().unwrap()).unwrap_err();
        assert_eq!(err, PatchError::InvalidValue("phone"));

        let body = json!({"name": null});
        assert!(RequestPatch::from_json(body.as_object().unwrap()).is_err());
    }

    #[test]
    fn patch_values_are_trimmed() {
        let body = json!({"model": "  X200 ", "phone": " 11999990000\n"});
        let patch = RequestPatch::from_json(body.as_object().unwrap()).unwrap();
        let values: Vec<_> = patch.iter().collect();
        assert!(values.contains(&(RequestField::Model, Some("X200"))));
        assert!(values.contains(&(RequestField::Phone, Some("11999990000"))));
    }

    #[test]
    fn null_clears_optional_field() {
        let mut request = sample();
        request.model = Some("X100".into());
        let body = json!({"model": null});
        let patch = RequestPatch::from_json(body.as_object().unwrap()).unwrap();
        patch.apply_to(&mut request, Utc::now());
        assert_eq!(request.model, None);
        assert!(request.updated_at.is_some());
    }

    #[test]
    fn apply_leaves_unpatched_fields_alone() {
        let mut request = sample();
        let body = json!({"model": "X200", "bogus": "y"});
        let patch = RequestPatch::from_json(body.as_object().unwrap()).unwrap();
        assert_eq!(patch.len(), 1);
        patch.apply_to(&mut request, Utc::now());
        assert_eq!(request.model.as_deref(), Some("X200"));
        assert_eq!(request.phone, "11999990000");
        assert_eq!(request.status, RequestStatus::New);
    }

    #[test]
    fn completion_sets_timestamps_together() {
        let mut request = sample();
        let now = Utc::now();
        request.mark_completed(now);
        assert_eq!(request.status, RequestStatus::Completed);
        assert_eq!(request.completed_at, Some(now));
        assert_eq!(request.updated_at, Some(now));
    }

    #[test]
    fn request_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("preferredTime").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["status"], "new");
        assert!(value["completedAt"].is_null());
    }
}
