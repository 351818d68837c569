#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::json;

use user_portal_api::auth::hash_password;
use user_portal_api::config::AppConfig;
use user_portal_api::models::{User, UserRole};
use user_portal_api::server;
use user_portal_api::state::AppState;
use user_portal_api::store::{JsonUserStore, StoreError, UserStore};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "user-pass";

/// Wraps the JSON store and counts every call that reaches it.
pub struct CountingStore {
    inner: JsonUserStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for CountingStore {
    async fn get_all(&self) -> Result<Vec<User>, StoreError> {
        self.hit();
        self.inner.get_all().await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.hit();
        self.inner.get_by_email(email).await
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        self.hit();
        self.inner.exists(id).await
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        self.hit();
        self.inner.insert(user).await
    }

    async fn update(&self, user: User) -> Result<(), StoreError> {
        self.hit();
        self.inner.update(user).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.hit();
        self.inner.delete(id).await
    }
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<CountingStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Logs in and returns the `name=value` pair to send back as a Cookie header.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        session_cookie(&res).context("login response carried no session cookie")
    }

    pub async fn admin_cookie(&self) -> Result<String> {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn user_cookie(&self) -> Result<String> {
        self.login(USER_EMAIL, USER_PASSWORD).await
    }

    pub fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(self.client.get(self.url(path)), cookie)
    }

    pub fn post(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(self.client.post(self.url(path)), cookie)
    }

    pub fn put(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(self.client.put(self.url(path)), cookie)
    }

    pub fn delete(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(self.client.delete(self.url(path)), cookie)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/api/test2")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

fn with_cookie(builder: reqwest::RequestBuilder, cookie: Option<&str>) -> reqwest::RequestBuilder {
    match cookie {
        Some(cookie) => builder.header(COOKIE, cookie),
        None => builder,
    }
}

/// `name=value` of the first Set-Cookie header, if any.
pub fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}

pub fn set_cookie_header(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn seed(store: &JsonUserStore, name: &str, email: &str, password: &str, role: UserRole) -> Result<()> {
    store
        .insert(User {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            role,
            pwd_hash: Some(hash_password(password, 4)?),
        })
        .await?;
    Ok(())
}

/// Starts an in-process server on a free port with one admin and one standard user.
pub async fn spawn_server() -> Result<TestServer> {
    let inner = JsonUserStore::in_memory();
    seed(&inner, "Admin", ADMIN_EMAIL, ADMIN_PASSWORD, UserRole::Admin).await?;
    seed(&inner, "Sam User", USER_EMAIL, USER_PASSWORD, UserRole::Standard).await?;
    let store = Arc::new(CountingStore {
        inner,
        calls: AtomicUsize::new(0),
    });

    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut config = AppConfig::test();
    config.paths.views_dir = root.join("views");
    config.paths.static_dir = root.join("public");

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    config.server.port = port;
    let base_url = format!("http://127.0.0.1:{}", port);

    let state = AppState::new(config, store.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind {}", base_url))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, server::app(state)).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let server = TestServer {
        port,
        base_url,
        store,
        client,
    };
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
