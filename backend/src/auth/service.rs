//! Core business logic for the authentication system.
//!
//! This service handles local password login, federated login with account
//! auto-provisioning, session issuance and revocation, and the first-boot
//! admin account. It orchestrates interactions between the handlers, the
//! identity store and the session registry.

use std::sync::Arc;

use reparo_adapters::{IdentityStore, NewUser, Storage, User};

use super::errors::AuthError;
use super::google::IdTokenVerifier;
use super::models::SessionUser;
use super::password::PasswordHasher;
use super::session::SessionStore;
use crate::config::BootstrapAdmin;
use crate::errors::{AppError, AppResult};

/// Verified against when the username is unknown, so both failure paths
/// cost one bcrypt comparison.
const TIMING_DUMMY_PASSWORD: &str = "reparo-timing-dummy";

pub struct AuthService {
    storage: Arc<dyn Storage>,
    sessions: SessionStore,
    hasher: PasswordHasher,
    verifier: Option<Arc<dyn IdTokenVerifier>>,
    dummy_hash: String,
}

impl AuthService {
    pub async fn new(
        storage: Arc<dyn Storage>,
        sessions: SessionStore,
        hasher: PasswordHasher,
        verifier: Option<Arc<dyn IdTokenVerifier>>,
    ) -> AppResult<Self> {
        let dummy_hash = hasher.hash(TIMING_DUMMY_PASSWORD).await?;
        Ok(Self {
            storage,
            sessions,
            hasher,
            verifier,
            dummy_hash,
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    pub fn federated_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    /// Checks a username/password pair and opens a session.
    ///
    /// Accounts without a local password (federated ones) never log in
    /// this way.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(SessionUser, String)> {
        let user = self
            .storage
            .find_user_by_username(username)
            .await?
            .filter(User::has_local_password);

        let Some(user) = user else {
            self.hasher.verify(password, &self.dummy_hash).await?;
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(self.open_session(SessionUser::from(&user)))
    }

    /// Verifies an ID token, provisions the account on first sight, and
    /// opens a session.
    pub async fn login_with_id_token(&self, id_token: &str) -> AppResult<(SessionUser, String)> {
        let verifier = self.verifier.as_ref().ok_or(AuthError::FederatedDisabled)?;
        let identity = verifier.verify(id_token).await?;

        let session_user = match self.storage.find_user_by_email(&identity.email).await? {
            Some(user) => SessionUser::from(&user),
            None => {
                let name = identity.name.unwrap_or_else(|| identity.email.clone());
                let id = self
                    .storage
                    .create_user(NewUser {
                        username: identity.email.clone(),
                        email: identity.email.clone(),
                        name: name.clone(),
                        password_hash: String::new(),
                    })
                    .await?;
                tracing::info!(user_id = id, email = %identity.email, "Provisioned federated account");
                SessionUser {
                    id,
                    username: identity.email.clone(),
                    name,
                    email: identity.email,
                }
            }
        };

        Ok(self.open_session(session_user))
    }

    pub fn current_user(&self, token: &str) -> Option<SessionUser> {
        self.sessions.get(token)
    }

    pub fn logout(&self, token: &str) -> bool {
        self.sessions.revoke(token)
    }

    /// Creates the admin account when the identity store is empty. Returns
    /// whether an account was created.
    pub async fn ensure_default_user(
        &self,
        admin: &BootstrapAdmin,
        production: bool,
    ) -> AppResult<bool> {
        if self.storage.count_users().await? > 0 {
            return Ok(false);
        }
        if production && admin.default_password {
            tracing::warn!(
                "No users exist and ADMIN_PASSWORD is unset; refusing to create the default admin in production"
            );
            return Ok(false);
        }

        let password_hash = self.hasher.hash(&admin.password).await?;
        let created = self
            .storage
            .create_user(NewUser {
                username: admin.username.clone(),
                email: admin.email.clone(),
                name: admin.name.clone(),
                password_hash,
            })
            .await;

        match created {
            Ok(id) => {
                if admin.default_password {
                    tracing::warn!(
                        user_id = id,
                        username = %admin.username,
                        "Created default admin with the development password; set ADMIN_PASSWORD"
                    );
                } else {
                    tracing::info!(user_id = id, username = %admin.username, "Created admin account");
                }
                Ok(true)
            }
            // Another instance bootstrapped the same store first.
            Err(err) => match AppError::from(err) {
                AppError::Conflict(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    fn open_session(&self, user: SessionUser) -> (SessionUser, String) {
        let token = self.sessions.issue(user.clone());
        (user, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::FederatedIdentity;
    use async_trait::async_trait;
    use reparo_adapters::JsonFileStore;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StaticVerifier;

    #[async_trait]
    impl IdTokenVerifier for StaticVerifier {
        async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, AuthError> {
            match id_token {
                "good" => Ok(FederatedIdentity {
                    email: "tecnico@gmail.com".into(),
                    name: Some("Técnico".into()),
                }),
                _ => Err(AuthError::InvalidIdToken("bad".into())),
            }
        }
    }

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            username: "admin".into(),
            email: "admin@local".into(),
            name: "Administrador".into(),
            password: "admin123".into(),
            default_password: true,
        }
    }

    async fn service(verifier: Option<Arc<dyn IdTokenVerifier>>) -> (TempDir, AuthService) {
        let dir = TempDir::new().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let auth = AuthService::new(
            storage,
            SessionStore::new(Duration::from_secs(60)),
            PasswordHasher::new(4),
            verifier,
        )
        .await
        .unwrap();
        auth.ensure_default_user(&admin(), false).await.unwrap();
        (dir, auth)
    }

    #[tokio::test]
    async fn correct_password_opens_session() {
        let (_dir, auth) = service(None).await;
        let (user, token) = auth.login("admin", "admin123").await.unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.email, "admin@local");
        assert_eq!(auth.current_user(&token), Some(user));
        assert!(auth.logout(&token));
        assert_eq!(auth.current_user(&token), None);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_fail_identically() {
        let (_dir, auth) = service(None).await;
        let wrong = auth.login("admin", "nope").await.unwrap_err();
        let unknown = auth.login("ghost", "admin123").await.unwrap_err();
        assert!(matches!(wrong, AppError::Auth(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, AppError::Auth(AuthError::InvalidCredentials)));
        assert_eq!(wrong.public_message(), unknown.public_message());
        assert_eq!(wrong.status_code(), unknown.status_code());
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let (_dir, auth) = service(None).await;
        assert!(!auth.ensure_default_user(&admin(), false).await.unwrap());
        assert_eq!(auth.storage.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn production_refuses_default_password() {
        let dir = TempDir::new().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let auth = AuthService::new(
            storage.clone(),
            SessionStore::new(Duration::from_secs(60)),
            PasswordHasher::new(4),
            None,
        )
        .await
        .unwrap();
        assert!(!auth.ensure_default_user(&admin(), true).await.unwrap());
        assert_eq!(storage.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn federated_login_provisions_account_without_password() {
        let (_dir, auth) = service(Some(Arc::new(StaticVerifier))).await;
        let (user, _token) = auth.login_with_id_token("good").await.unwrap();
        assert_eq!(user.username, "tecnico@gmail.com");
        assert_eq!(user.name, "Técnico");

        let stored = auth
            .storage
            .find_user_by_email("tecnico@gmail.com")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.password_hash.is_empty());

        // Second login reuses the account.
        let (again, _) = auth.login_with_id_token("good").await.unwrap();
        assert_eq!(again.id, user.id);

        // The empty hash never satisfies a local login.
        let err = auth.login("tecnico@gmail.com", "").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn federated_login_rejects_bad_token_and_missing_config() {
        let (_dir, auth) = service(Some(Arc::new(StaticVerifier))).await;
        let err = auth.login_with_id_token("forged").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidIdToken(_))));

        let (_dir, auth) = service(None).await;
        let err = auth.login_with_id_token("good").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::FederatedDisabled)));
    }
}
