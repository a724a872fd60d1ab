//! REST client for the settings backend
//!
//! All persistence goes through the `SettingsApi` trait so the managers can
//! be exercised against stub backends in tests. The real implementation is a
//! blocking reqwest client that talks to the `stylesync/v1` REST namespace,
//! authenticating every request with a nonce header.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::http;
use crate::error::SyncError;
use crate::settings::Snapshot;

/// Receipt returned by a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    pub saved_at: DateTime<Utc>,
}

pub trait SettingsApi {
    fn get_settings(&self) -> Result<Snapshot, SyncError>;
    fn save_settings(&self, snapshot: &Snapshot) -> Result<SaveReceipt, SyncError>;

    /// Apply a palette server-side; the response is the resulting full
    /// settings snapshot, which callers adopt verbatim.
    fn apply_palette(&self, palette_id: &str) -> Result<Snapshot, SyncError>;
    fn apply_template(&self, template_id: &str) -> Result<Snapshot, SyncError>;

    fn save_custom_palette(&self, name: &str, colors: &Value) -> Result<String, SyncError>;
    fn delete_custom_palette(&self, palette_id: &str) -> Result<(), SyncError>;
    fn save_custom_template(&self, name: &str, settings: &Snapshot) -> Result<String, SyncError>;
    fn delete_custom_template(&self, template_id: &str) -> Result<(), SyncError>;
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    saved_at: String,
}

#[derive(Debug, Deserialize)]
struct ApplyResponse {
    snapshot: Value,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct NamedPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    colors: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings: Option<Value>,
}

pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    nonce: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, nonce: impl Into<String>, timeout_secs: u64) -> Result<Self, SyncError> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(http::CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            nonce: nonce.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn execute(&self, request: reqwest::blocking::RequestBuilder) -> Result<reqwest::blocking::Response, SyncError> {
        let response = request.header(http::NONCE_HEADER, &self.nonce).send()?;
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }
        let body: Option<ErrorBody> = response.json().ok();
        let message = body.and_then(|b| b.message);
        warn!(status, message = message.as_deref().unwrap_or(""), "api request failed");
        Err(classify_status(status, message))
    }

}

/// Map an HTTP error status to the failure taxonomy: 403 means the nonce
/// expired, other 4xx are request-level, 5xx are server faults.
pub fn classify_status(status: u16, message: Option<String>) -> SyncError {
    match status {
        403 => SyncError::Auth,
        400..=499 => SyncError::Api {
            status,
            message: message.unwrap_or_else(|| "request rejected".to_string()),
        },
        _ => SyncError::Server { status },
    }
}

fn parse_saved_at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|err| {
            warn!(raw, error = %err, "unparseable saved_at timestamp, using local clock");
            Utc::now()
        })
}

impl SettingsApi for ApiClient {
    fn get_settings(&self) -> Result<Snapshot, SyncError> {
        debug!("fetching settings");
        let response = self.execute(self.http.get(self.url("settings")))?;
        let body: Value = response.json()?;
        Ok(Snapshot::from_nested_json(&body))
    }

    fn save_settings(&self, snapshot: &Snapshot) -> Result<SaveReceipt, SyncError> {
        debug!(entries = snapshot.len(), "saving settings");
        let response = self.execute(
            self.http
                .post(self.url("settings"))
                .json(&snapshot.to_nested_json()),
        )?;
        let body: SaveResponse = response.json()?;
        Ok(SaveReceipt {
            saved_at: parse_saved_at(&body.saved_at),
        })
    }

    fn apply_palette(&self, palette_id: &str) -> Result<Snapshot, SyncError> {
        debug!(palette_id, "applying palette");
        let response = self.execute(
            self.http
                .post(self.url("palette/apply"))
                .json(&serde_json::json!({ "palette_id": palette_id })),
        )?;
        let body: ApplyResponse = response.json()?;
        Ok(Snapshot::from_nested_json(&body.snapshot))
    }

    fn apply_template(&self, template_id: &str) -> Result<Snapshot, SyncError> {
        debug!(template_id, "applying template");
        let response = self.execute(
            self.http
                .post(self.url("template/apply"))
                .json(&serde_json::json!({ "template_id": template_id })),
        )?;
        let body: ApplyResponse = response.json()?;
        Ok(Snapshot::from_nested_json(&body.snapshot))
    }

    fn save_custom_palette(&self, name: &str, colors: &Value) -> Result<String, SyncError> {
        let response = self.execute(self.http.post(self.url("palette")).json(&NamedPayload {
            name,
            colors: Some(colors),
            settings: None,
        }))?;
        let body: CreateResponse = response.json()?;
        Ok(body.id)
    }

    fn delete_custom_palette(&self, palette_id: &str) -> Result<(), SyncError> {
        self.execute(self.http.delete(self.url(&format!("palette/{palette_id}"))))?;
        Ok(())
    }

    fn save_custom_template(&self, name: &str, settings: &Snapshot) -> Result<String, SyncError> {
        let response = self.execute(self.http.post(self.url("template")).json(&NamedPayload {
            name,
            colors: None,
            settings: Some(settings.to_nested_json()),
        }))?;
        let body: CreateResponse = response.json()?;
        Ok(body.id)
    }

    fn delete_custom_template(&self, template_id: &str) -> Result<(), SyncError> {
        self.execute(self.http.delete(self.url(&format!("template/{template_id}"))))?;
        Ok(())
    }
}
