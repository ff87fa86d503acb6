//! IAM REST API role lookup
//!
//! Fetches `GET {endpoint}/v1/{role}` and reads `includedPermissions`.
//! Authentication uses a bearer token from application default credentials.

use super::{RoleCache, RoleResolver};
use crate::error::{PolicyError, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, warn};

/// Public IAM API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://iam.googleapis.com";

/// Environment variable checked for a ready-made access token
const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ROLE_CACHE_CAPACITY: usize = 256;

const AUTH_HELP: &str = "Not authenticated to Google Cloud. Try running `gcloud auth application-default login`\n\n\
See https://developers.google.com/accounts/docs/application-default-credentials for more information.";

fn not_authenticated() -> PolicyError {
    PolicyError::Authentication(AUTH_HELP.to_string())
}

/// Obtain an access token from application default credentials
///
/// Checks `GOOGLE_OAUTH_ACCESS_TOKEN` first, then asks
/// `gcloud auth application-default print-access-token`.
///
/// # Errors
///
/// `Authentication` with login instructions when no token is available.
pub fn application_default_token() -> Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim();
        if !token.is_empty() {
            debug!("using access token from {}", TOKEN_ENV);
            return Ok(token.to_string());
        }
    }

    let output = Command::new("gcloud")
        .args(["auth", "application-default", "print-access-token"])
        .output()
        .map_err(|e| {
            debug!("gcloud unavailable: {e}");
            not_authenticated()
        })?;

    if !output.status.success() {
        debug!(
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "gcloud print-access-token failed"
        );
        return Err(not_authenticated());
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(not_authenticated());
    }
    Ok(token)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleResponse {
    #[serde(default)]
    included_permissions: Vec<String>,
}

/// Role lookups against the IAM REST API
pub struct IamRoleClient {
    http: Client,
    endpoint: String,
    token: String,
    cache: RoleCache,
}

impl IamRoleClient {
    /// Create a client for `endpoint` authenticating with `token`
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PolicyError::RoleLookup(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, endpoint, token))
    }

    /// Create a client on top of a preconfigured HTTP client
    pub fn with_client(http: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        IamRoleClient {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: token.into(),
            cache: RoleCache::new(ROLE_CACHE_CAPACITY),
        }
    }

    /// Create a client using application default credentials
    pub fn from_application_default(endpoint: impl Into<String>) -> Result<Self> {
        let token = application_default_token()?;
        Self::new(endpoint, token)
    }

    fn role_url(&self, role: &str) -> String {
        format!("{}/v1/{}", self.endpoint, role.trim_start_matches('/'))
    }

    fn fetch(&self, role: &str) -> Result<Option<Vec<String>>> {
        let url = self.role_url(role);
        debug!(%url, "fetching role");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| PolicyError::RoleLookup(format!("failed to contact {url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(not_authenticated());
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(role, %status, "role lookup failed: {}", body.trim());
            return Ok(None);
        }

        let body: RoleResponse = response
            .json()
            .map_err(|e| PolicyError::RoleLookup(format!("invalid response for {role}: {e}")))?;
        Ok(Some(body.included_permissions))
    }
}

impl RoleResolver for IamRoleClient {
    fn permissions(&mut self, role: &str) -> Result<Option<Vec<String>>> {
        if let Some(cached) = self.cache.get(role) {
            return Ok(cached.clone());
        }
        let fetched = self.fetch(role)?;
        self.cache.put(role, fetched.clone());
        Ok(fetched)
    }
}
