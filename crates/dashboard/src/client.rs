//! HTTP client for the operator dashboard.
//!
//! Logs in with a form post, keeps the session cookie and reads the sales and
//! terminals pages. A dashboard that only renders in a browser needs a
//! different [`PageFetcher`] behind the same trait.

use crate::extract::{parse_alerts, parse_sales};
use crate::{FetchError, PageFetcher};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use watermon_core::{Alert, Sale};

/// Marker of the login form. Seeing it after login means the session is gone.
const LOGIN_FORM_MARKER: &str = r#"name="password""#;

/// Dashboard location and credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Site root, e.g. `https://my.alivewater.cloud`.
    pub base_url: String,
    /// Path the login form posts to.
    pub login_path: String,
    pub sales_path: String,
    pub terminals_path: String,
    pub login: String,
    pub password: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("base_url", &self.base_url)
            .field("login_path", &self.login_path)
            .field("sales_path", &self.sales_path)
            .field("terminals_path", &self.terminals_path)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "https://my.alivewater.cloud".to_string(),
            login_path: "/login".to_string(),
            sales_path: "/sales".to_string(),
            terminals_path: "/terminals".to_string(),
            login: String::new(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl DashboardConfig {
    pub fn has_credentials(&self) -> bool {
        !self.login.is_empty() && !self.password.is_empty()
    }
}

fn is_login_page(body: &str) -> bool {
    body.to_ascii_lowercase().contains(LOGIN_FORM_MARKER)
}

/// Session-holding dashboard client.
pub struct DashboardClient {
    config: DashboardConfig,
    base: Url,
    http: reqwest::Client,
    logged_in: Mutex<bool>,
}

impl DashboardClient {
    /// Build a client. Does not touch the network.
    pub fn new(config: DashboardConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            base,
            http,
            logged_in: Mutex::new(false),
        })
    }

    async fn login(&self) -> Result<(), FetchError> {
        if !self.config.has_credentials() {
            return Err(FetchError::Authentication(
                "dashboard login or password not configured".to_string(),
            ));
        }

        let url = self.base.join(&self.config.login_path)?;
        let params = [
            ("login", self.config.login.as_str()),
            ("password", self.config.password.as_str()),
        ];
        let response = self.http.post(url).form(&params).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Authentication(format!("login rejected: HTTP {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Transport(format!("login: HTTP {status}")));
        }

        let body = response.text().await?;
        if is_login_page(&body) {
            return Err(FetchError::Authentication("credentials not accepted".to_string()));
        }

        info!(base_url = %self.base, "Logged in to dashboard");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<String, FetchError> {
        let url = self.base.join(path)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("{path}: HTTP {status}")));
        }
        Ok(response.text().await?)
    }

    /// Fetch a page, logging in first if needed and once more if the session
    /// turns out to have expired.
    async fn page(&self, path: &str) -> Result<String, FetchError> {
        let mut logged_in = self.logged_in.lock().await;
        if !*logged_in {
            self.login().await?;
            *logged_in = true;
        }

        let body = self.get(path).await?;
        if !is_login_page(&body) {
            debug!(path, bytes = body.len(), "Fetched dashboard page");
            return Ok(body);
        }

        warn!(path, "Dashboard session expired, logging in again");
        *logged_in = false;
        self.login().await?;
        *logged_in = true;

        let body = self.get(path).await?;
        if is_login_page(&body) {
            *logged_in = false;
            return Err(FetchError::Authentication(format!(
                "{path} still redirects to login"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for DashboardClient {
    async fn fetch_sales(&self) -> Result<Vec<Sale>, FetchError> {
        let body = self.page(&self.config.sales_path).await?;
        parse_sales(&body)
    }

    async fn fetch_alerts(&self) -> Result<Vec<Alert>, FetchError> {
        let body = self.page(&self.config.terminals_path).await?;
        parse_alerts(&body, &self.base)
    }
}
