//! `Page` over the W3C WebDriver HTTP protocol.
//!
//! Expects a driver (chromedriver, geckodriver) already listening at the
//! configured URL. Each navigation opens a new tab so that earlier sessions'
//! forms stay open for review.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::page::{ControlHandle, Page};

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const READY_POLL: Duration = Duration::from_millis(100);

pub struct WebDriverPage {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
    navigated: bool,
}

impl WebDriverPage {
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build HTTP client")?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let response = http
            .post(format!("{base_url}/session"))
            .json(&json!({ "capabilities": { "alwaysMatch": {} } }))
            .send()
            .await
            .with_context(|| format!("no WebDriver listening at {base_url}"))?;
        let value = unwrap_response(response).await?;
        let session_id = value["sessionId"]
            .as_str()
            .context("WebDriver did not return a session id")?
            .to_string();

        info!("WebDriver session {} started", session_id);
        Ok(WebDriverPage {
            http,
            base_url,
            session_id,
            navigated: false,
        })
    }

    /// End the WebDriver session, closing its browser windows.
    pub async fn close(self) -> anyhow::Result<()> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        let response = self.http.delete(url).send().await?;
        unwrap_response(response).await?;
        Ok(())
    }

    async fn command(&self, method: Method, path: &str, body: Value) -> anyhow::Result<Value> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        debug!(%method, path, "webdriver command");
        let response = self
            .http
            .request(method, url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("WebDriver request {path} failed"))?;
        unwrap_response(response).await
    }

    async fn open_tab(&self) -> anyhow::Result<()> {
        let value = self
            .command(Method::POST, "/window/new", json!({ "type": "tab" }))
            .await?;
        let handle = value["handle"]
            .as_str()
            .context("WebDriver did not return a window handle")?
            .to_string();
        self.command(Method::POST, "/window", json!({ "handle": handle }))
            .await?;
        Ok(())
    }
}

/// Extract `value` from a WebDriver reply, turning protocol errors into `Err`.
async fn unwrap_response(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let mut body: Value = response
        .json()
        .await
        .context("failed to parse WebDriver response")?;
    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value["error"].as_str().unwrap_or("unknown error");
        let message = value["message"].as_str().unwrap_or_default();
        anyhow::bail!("WebDriver {status}: {error}: {message}");
    }
    Ok(value)
}

fn element_handle(value: &Value) -> anyhow::Result<ControlHandle> {
    value[ELEMENT_KEY]
        .as_str()
        .map(|id| ControlHandle(id.to_string()))
        .with_context(|| format!("not an element reference: {value}"))
}

fn element_handles(value: &Value) -> anyhow::Result<Vec<ControlHandle>> {
    value
        .as_array()
        .context("expected a list of elements")?
        .iter()
        .map(element_handle)
        .collect()
}

#[async_trait]
impl Page for WebDriverPage {
    async fn navigate(&mut self, url: &str) -> anyhow::Result<()> {
        if self.navigated {
            self.open_tab().await?;
        }
        self.command(Method::POST, "/url", json!({ "url": url }))
            .await?;
        self.navigated = true;
        Ok(())
    }

    async fn find_controls(&mut self, selector: &str) -> anyhow::Result<Vec<ControlHandle>> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                json!({ "using": "css selector", "value": selector }),
            )
            .await?;
        element_handles(&value)
    }

    async fn click(&mut self, control: &ControlHandle) -> anyhow::Result<()> {
        let path = format!("/element/{}/click", control.0);
        self.command(Method::POST, &path, json!({})).await?;
        Ok(())
    }

    async fn type_text(&mut self, control: &ControlHandle, text: &str) -> anyhow::Result<()> {
        let path = format!("/element/{}/value", control.0);
        self.command(Method::POST, &path, json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> anyhow::Result<()> {
        loop {
            let state = self
                .command(
                    Method::POST,
                    "/execute/sync",
                    json!({ "script": "return document.readyState", "args": [] }),
                )
                .await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }
}
