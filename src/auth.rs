use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// HTTP client plus a bearer token accepted by the Sheets API.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    pub http: reqwest::Client,
    pub access_token: String,
}

#[async_trait]
pub trait CredentialProvider {
    async fn authorized_client(&self) -> anyhow::Result<AuthorizedClient>;
}

/// Stored `authorized_user` credentials, as written by the consent flow.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredToken {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Unix seconds after which the stored token must be regenerated.
    pub expiry_date: i64,
}

pub fn load_token(path: &Path, now: i64) -> anyhow::Result<StoredToken> {
    let contents = std::fs::read_to_string(path).with_context(|| {
        format!(
            "token not found at {}; run the consent flow to create it",
            path.display()
        )
    })?;
    let token: StoredToken = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse token {}", path.display()))?;

    if now > token.expiry_date {
        anyhow::bail!(
            "token at {} expired; run the consent flow to regenerate it",
            path.display()
        );
    }
    Ok(token)
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

/// Reads `token.json` and trades its refresh token for an access token.
pub struct TokenFileProvider {
    path: PathBuf,
}

impl TokenFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenFileProvider { path: path.into() }
    }
}

#[async_trait]
impl CredentialProvider for TokenFileProvider {
    async fn authorized_client(&self) -> anyhow::Result<AuthorizedClient> {
        let token = load_token(&self.path, Utc::now().timestamp())?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        debug!("Exchanging refresh token for {}", token.client_id);
        let params = [
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
            ("refresh_token", token.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = http
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .context("token endpoint request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("token endpoint returned {}", response.status());
        }

        let body: AccessTokenResponse = response
            .json()
            .await
            .context("failed to parse token endpoint response")?;

        Ok(AuthorizedClient {
            http,
            access_token: body.access_token,
        })
    }
}
