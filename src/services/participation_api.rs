use axum::http::StatusCode;
use reqwest::Response;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::models::{NewParticipation, ParticipationList, ParticipationRecord};

const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

#[derive(Debug, Error)]
pub enum ParticipationApiError {
    #[error("participation api unreachable at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("participation api answered {status}")]
    Upstream {
        status: StatusCode,
        body: Option<Value>,
    },
    #[error("participation api sent an unreadable body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ParticipationApiError {
    /// Text for the dashboard banner. Only 4xx answers are "expected" and get
    /// the API's own message; everything else gets the generic one.
    pub fn user_message(&self) -> String {
        match self {
            ParticipationApiError::Upstream { status, body } if status.is_client_error() => body
                .as_ref()
                .and_then(|b| b.get("message"))
                .and_then(|m| m.as_str())
                .filter(|m| !m.trim().is_empty())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16())),
            _ => UNEXPECTED_ERROR.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ParticipationApiError::Upstream { status, .. } => *status,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Thin client for the remote `/participation` resource.
#[derive(Debug, Clone)]
pub struct ParticipationClient {
    http: reqwest::Client,
    base_url: String,
}

impl ParticipationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;
        Ok(Self::with_http(http, config.api_base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/participation", self.base_url)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/participation/{}", self.base_url, id)
    }

    pub async fn create(&self, data: &NewParticipation) -> Result<(), ParticipationApiError> {
        let url = self.collection_url();
        let resp = self
            .http
            .post(&url)
            .json(data)
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;
        ensure_success(resp).await?;
        info!(first_name = %data.first_name, last_name = %data.last_name, "participation_created");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<ParticipationRecord>, ParticipationApiError> {
        let url = self.collection_url();
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;
        decode_list(&url, resp).await
    }

    /// Records matching both names exactly, as filtered by the API.
    pub async fn list_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<ParticipationRecord>, ParticipationApiError> {
        let url = format!("{}/participation/user", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("firstname", first_name), ("lastname", last_name)])
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;
        decode_list(&url, resp).await
    }

    pub async fn update(
        &self,
        id: i64,
        data: &NewParticipation,
    ) -> Result<(), ParticipationApiError> {
        let url = self.item_url(id);
        let resp = self
            .http
            .put(&url)
            .json(data)
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;
        ensure_success(resp).await?;
        info!(id, "participation_updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ParticipationApiError> {
        let url = self.item_url(id);
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;
        ensure_success(resp).await?;
        info!(id, "participation_deleted");
        Ok(())
    }
}

fn connect_failed(url: &str, source: reqwest::Error) -> ParticipationApiError {
    warn!(url, error = %source, "participation_api_unreachable");
    ParticipationApiError::Connect {
        url: url.to_string(),
        source,
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ParticipationApiError> {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    if status.is_success() {
        return Ok(resp);
    }
    // Error bodies are optional and not always JSON.
    let body = resp.json::<Value>().await.ok();
    warn!(status = %status, body = ?body, "participation_api_error");
    Err(ParticipationApiError::Upstream { status, body })
}

async fn decode_list(
    url: &str,
    resp: Response,
) -> Result<Vec<ParticipationRecord>, ParticipationApiError> {
    let resp = ensure_success(resp).await?;
    let list: ParticipationList =
        resp.json()
            .await
            .map_err(|source| ParticipationApiError::Decode {
                url: url.to_string(),
                source,
            })?;
    Ok(list.into_records())
}
