//! Shared harness: starts the real server on an ephemeral port with a
//! throwaway data directory and a stub Google verifier.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reparo_backend::auth::{
    AuthError, AuthService, FederatedIdentity, IdTokenVerifier, PasswordHasher, SessionStore,
};
use reparo_backend::config::Config;
use reparo_backend::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const ADMIN_PASSWORD: &str = "s3nha-de-teste";
pub const GOOGLE_EMAIL: &str = "tecnico@gmail.com";

/// Accepts the literal token `valid-google-token`.
pub struct StubVerifier;

#[async_trait]
impl IdTokenVerifier for StubVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, AuthError> {
        if id_token == "valid-google-token" {
            Ok(FederatedIdentity {
                email: GOOGLE_EMAIL.into(),
                name: Some("Técnico Google".into()),
            })
        } else {
            Err(AuthError::InvalidIdToken("signature mismatch".into()))
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Backend {
    File,
    Sqlite,
}

pub struct Options {
    pub backend: Backend,
    pub google: bool,
    pub admin_username: Option<&'static str>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            google: true,
            admin_username: None,
        }
    }
}

pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(Options::default()).await
    }

    pub async fn start_with(options: Options) -> Self {
        let dir = TempDir::new().unwrap();
        let static_dir = dir.path().join("public");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<h1>Reparo</h1>").unwrap();
        std::fs::write(static_dir.join("login.html"), "<form>login</form>").unwrap();
        std::fs::write(static_dir.join("dashboard.html"), "<h1>Painel</h1>").unwrap();

        let mut vars = HashMap::from([
            ("SESSION_SECRET", "0123456789abcdef0123456789abcdef-test".to_string()),
            ("BCRYPT_COST", "4".to_string()),
            ("ADMIN_PASSWORD", ADMIN_PASSWORD.to_string()),
            ("STATIC_DIR", static_dir.display().to_string()),
            ("DATA_DIR", dir.path().join("data").display().to_string()),
        ]);
        if let Some(username) = options.admin_username {
            vars.insert("ADMIN_USERNAME", username.to_string());
        }
        if let Backend::Sqlite = options.backend {
            vars.insert("STORAGE_BACKEND", "sqlite".to_string());
            vars.insert(
                "DATABASE_URL",
                format!("sqlite://{}", dir.path().join("reparo.db").display()),
            );
        }
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();

        let storage = reparo_backend::database::connect(&config.storage)
            .await
            .unwrap();
        let verifier: Option<Arc<dyn IdTokenVerifier>> = if options.google {
            Some(Arc::new(StubVerifier))
        } else {
            None
        };
        let auth = AuthService::new(
            storage.clone(),
            SessionStore::new(config.session_ttl),
            PasswordHasher::new(config.bcrypt_cost),
            verifier,
        )
        .await
        .unwrap();
        auth.ensure_default_user(&config.admin, false).await.unwrap();

        let state = AppState::new(storage, Arc::new(auth), &config.session_secret, false);
        let app = reparo_backend::build_app(state, &config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(reparo_backend::serve(
            listener,
            app,
            std::future::pending::<()>(),
        ));

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base: format!("http://{addr}"),
            client,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn login_admin(&self) {
        let resp = self
            .client
            .post(self.url("/login"))
            .json(&json!({"username": "admin", "password": ADMIN_PASSWORD}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    pub async fn create_request(&self, name: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/requests"))
            .json(&lead(name))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }
}

pub fn lead(name: &str) -> Value {
    json!({
        "name": name,
        "phone": "11987654321",
        "address": "Rua das Flores, 10",
        "brand": "Samsung",
        "problem": "Não liga",
        "preferredTime": "manhã"
    })
}

pub async fn mensagem(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.unwrap();
    body["mensagem"].as_str().unwrap_or_default().to_string()
}
