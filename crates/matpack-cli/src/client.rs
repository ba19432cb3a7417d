//! HTTP client for the Matpack API.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Config;

/// API client for Matpack generation endpoints.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    /// Schedules a generation run for a composition.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn schedule(&self, composition: &str) -> Result<ScheduleResponse> {
        let url = format!("{}/v1/generate/{composition}", self.base_url);

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status().is_success() {
            response.json().await.context("Failed to parse response")
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({status}): {body}")
        }
    }

    /// Schedules augmentation sub-runs for an existing run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn augment(&self, composition: &str, run_id: &str) -> Result<ScheduleResponse> {
        let url = format!(
            "{}/v1/generate/{composition}/{run_id}/augment",
            self.base_url
        );

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status().is_success() {
            response.json().await.context("Failed to parse response")
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({status}): {body}")
        }
    }

    /// Gets the derived status of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn status(&self, composition: &str, run_id: &str) -> Result<StatusResponse> {
        let url = format!(
            "{}/v1/generate/{composition}/{run_id}/status",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status().is_success() {
            response.json().await.context("Failed to parse response")
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({status}): {body}")
        }
    }

    /// Downloads a sub-run ZIP archive. Returns the raw archive bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server responds with a
    /// non-success status.
    pub async fn download(
        &self,
        composition: &str,
        run_id: &str,
        sub_run: &str,
    ) -> Result<Vec<u8>> {
        let url = format!(
            "{}/v1/generate/{composition}/{run_id}/{sub_run}/download",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status().is_success() {
            let bytes = response
                .bytes()
                .await
                .context("Failed to read archive body")?;
            Ok(bytes.to_vec())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({status}): {body}")
        }
    }

    /// Lists every scheduled run, keyed by composition.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn available(&self) -> Result<AvailableResponse> {
        let url = format!("{}/v1/generate/available", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status().is_success() {
            response.json().await.context("Failed to parse response")
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({status}): {body}")
        }
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Response after scheduling a run or an augmentation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    /// Nominal composition.
    pub composition: String,
    /// Run identifier assigned to (or addressed by) this request.
    pub run_id: String,
    /// Always `"SCHEDULED"` on success.
    pub status: String,
}

/// Derived status response.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `"RUNNING"` or `"DONE"` for the initial run.
    pub run_status: String,
    /// `"RUNNING"` or `"DONE"` for augmentation sub-runs, once scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_runs_status: Option<String>,
}

impl StatusResponse {
    /// True once the run, and its augmentation if one was scheduled, both
    /// report DONE.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.run_status == "DONE"
            && self
                .sub_runs_status
                .as_deref()
                .map_or(true, |s| s == "DONE")
    }
}

/// Full registry listing: composition → scheduled runs, in scheduling order.
pub type AvailableResponse = IndexMap<String, Vec<RunSummary>>;

/// One scheduled run as reported by the listing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Nominal composition.
    pub composition: String,
    /// Run identifier.
    pub run_id: String,
    /// Registered sub-run identifiers.
    pub sub_runs: Vec<String>,
    /// When the run was scheduled.
    pub scheduled_at: DateTime<Utc>,
    /// When augmentation was last scheduled, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_runs_scheduled_at: Option<DateTime<Utc>>,
}
