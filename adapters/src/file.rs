//! JSON-file implementation of the storage traits.
//!
//! This file contains the file-backed adapter: one document with the
//! requests, one with the last assigned request id, and one with the user
//! records, all kept in a single data directory. Every operation is a full
//! read-modify-write of the affected document, serialised behind an async
//! mutex and finished with an atomic rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::errors::{StoreError, StoreResult};
use crate::models::{NewServiceRequest, NewUser, RequestPatch, ServiceRequest, User, UserSummary};
use crate::{IdentityStore, RequestStore, Storage};

const REQUESTS_FILE: &str = "requests.json";
const ID_SEQ_FILE: &str = "id-seq.json";
const USERS_FILE: &str = "users.json";

/// Ids of at most six digits count when rebuilding the sequence.
const LEGACY_SHORT_IDS: std::ops::RangeInclusive<i64> = 0..=999_999;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RequestsDoc {
    #[serde(default)]
    requests: Vec<ServiceRequest>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestsOnDisk {
    Wrapped(RequestsDoc),
    Bare(Vec<ServiceRequest>),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdSeq {
    #[serde(default)]
    last_request_id: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UsersOnDisk {
    Bare(Vec<User>),
    Legacy { usuarios: Vec<User> },
}

pub struct JsonFileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (and creates, if needed) the data directory.
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(dir = %dir.display(), "Using JSON file storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_doc<T: DeserializeOwned>(&self, file: &str) -> StoreResult<Option<T>> {
        let path = self.dir.join(file);
        match tokio::fs::read(&path).await {
            Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => Ok(None),
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_doc<T: Serialize>(&self, file: &str, doc: &T) -> StoreResult<()> {
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{file}.tmp"));
        let raw = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &path).await.map_err(|err| {
            tracing::error!(file, error = %err, "Failed to replace data file");
            StoreError::Io(err)
        })
    }

    async fn read_requests(&self) -> StoreResult<Vec<ServiceRequest>> {
        Ok(match self.read_doc::<RequestsOnDisk>(REQUESTS_FILE).await? {
            Some(RequestsOnDisk::Wrapped(doc)) => doc.requests,
            Some(RequestsOnDisk::Bare(requests)) => requests,
            None => Vec::new(),
        })
    }

    async fn write_requests(&self, requests: Vec<ServiceRequest>) -> StoreResult<()> {
        self.write_doc(REQUESTS_FILE, &RequestsDoc { requests }).await
    }

    async fn read_users(&self) -> StoreResult<Vec<User>> {
        Ok(match self.read_doc::<UsersOnDisk>(USERS_FILE).await? {
            Some(UsersOnDisk::Bare(users)) => users,
            Some(UsersOnDisk::Legacy { usuarios }) => usuarios,
            None => Vec::new(),
        })
    }

    /// Next request id. Falls back to the highest short stored id when the
    /// sequence document does not exist yet; timestamp-style ids from older
    /// data files are skipped.
    async fn next_request_id(&self, existing: &[ServiceRequest]) -> StoreResult<i64> {
        let last = match self.read_doc::<IdSeq>(ID_SEQ_FILE).await? {
            Some(seq) => seq.last_request_id,
            None => existing
                .iter()
                .map(|r| r.id)
                .filter(|id| LEGACY_SHORT_IDS.contains(id))
                .max()
                .unwrap_or(0),
        };
        let next = last + 1;
        self.write_doc(
            ID_SEQ_FILE,
            &IdSeq {
                last_request_id: next,
            },
        )
        .await?;
        Ok(next)
    }

    /// Runs `mutate` against the request with `id` and persists the result.
    /// Returns `false` when no such request exists.
    async fn modify_request<F>(&self, id: i64, mutate: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut ServiceRequest) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut requests = self.read_requests().await?;
        let Some(request) = requests.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        mutate(request);
        self.write_requests(requests).await?;
        Ok(true)
    }
}

#[async_trait]
impl RequestStore for JsonFileStore {
    async fn create_request(&self, new: NewServiceRequest) -> StoreResult<i64> {
        let _guard = self.lock.lock().await;
        let mut requests = self.read_requests().await?;
        let id = self.next_request_id(&requests).await?;
        requests.push(ServiceRequest::from_new(id, new, Utc::now()));
        self.write_requests(requests).await?;
        Ok(id)
    }

    async fn get_request(&self, id: i64) -> StoreResult<Option<ServiceRequest>> {
        let _guard = self.lock.lock().await;
        let requests = self.read_requests().await?;
        Ok(requests.into_iter().find(|r| r.id == id))
    }

    async fn list_requests(&self) -> StoreResult<Vec<ServiceRequest>> {
        let _guard = self.lock.lock().await;
        let mut requests = self.read_requests().await?;
        requests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(requests)
    }

    async fn update_request(&self, id: i64, patch: &RequestPatch) -> StoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }
        self.modify_request(id, |request| patch.apply_to(request, Utc::now()))
            .await
    }

    async fn complete_request(&self, id: i64) -> StoreResult<bool> {
        self.modify_request(id, |request| request.mark_completed(Utc::now()))
            .await
    }

    async fn delete_request(&self, id: i64) -> StoreResult<bool> {
        let _guard = self.lock.lock().await;
        let mut requests = self.read_requests().await?;
        let before = requests.len();
        requests.retain(|r| r.id != id);
        if requests.len() == before {
            return Ok(false);
        }
        self.write_requests(requests).await?;
        Ok(true)
    }
}

#[async_trait]
impl IdentityStore for JsonFileStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock().await;
        let users = self.read_users().await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock().await;
        let users = self.read_users().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<i64> {
        let _guard = self.lock.lock().await;
        let mut users = self.read_users().await?;
        if users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                new.username
            )));
        }
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' already exists",
                new.email
            )));
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(User {
            id,
            username: new.username,
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        });
        self.write_doc(USERS_FILE, &users).await?;
        Ok(id)
    }

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let _guard = self.lock.lock().await;
        let mut users = self.read_users().await?;
        users.sort_by_key(|u| u.id);
        Ok(users.iter().map(User::summary).collect())
    }

    async fn count_users(&self) -> StoreResult<usize> {
        let _guard = self.lock.lock().await;
        Ok(self.read_users().await?.len())
    }
}

#[async_trait]
impl Storage for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn health_check(&self) -> StoreResult<()> {
        tokio::fs::metadata(&self.dir).await?;
        Ok(())
    }
}
