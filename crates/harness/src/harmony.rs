use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::auth::Session;
use crate::error::{HarnessError, Result};

/// A Harmony request against a single collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarmonyRequest {
    pub collection_id: String,
    pub max_results: u32,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobLink {
    pub href: String,
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

/// The job document returned by `/jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub links: Vec<JobLink>,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "successful" | "complete_with_errors" | "failed" | "canceled"
        )
    }

    pub fn is_successful(&self) -> bool {
        self.status == "successful"
    }
}

/// Runs a Harmony request to completion.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, request: &HarmonyRequest) -> Result<JobStatus>;
}

pub struct HarmonyClient {
    session: Session,
    base_url: String,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl HarmonyClient {
    pub fn new(
        session: Session,
        base_url: &str,
        poll_interval: Duration,
        job_timeout: Duration,
    ) -> Self {
        Self {
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
            job_timeout,
        }
    }

    /// Submits an asynchronous job and returns its ID.
    pub async fn submit(&self, request: &HarmonyRequest) -> Result<String> {
        let url = format!(
            "{}/{}/ogc-api-coverages/1.0.0/collections/all/coverage/rangeset",
            self.base_url, request.collection_id
        );
        let max_results = request.max_results.to_string();
        let query = [
            ("maxResults", max_results.as_str()),
            ("format", request.format.as_str()),
            ("forceAsync", "true"),
        ];

        let job: JobStatus = self.get_json(&url, &query).await?;
        info!("Submitted job {} for {}", job.job_id, request.collection_id);
        Ok(job.job_id)
    }

    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        self.get_json(&url, &[]).await
    }

    /// Polls a job until it reaches a terminal status.
    pub async fn wait_for_result(&self, job_id: &str) -> Result<JobStatus> {
        let start = Instant::now();

        loop {
            let job = self.job_status(job_id).await?;
            if job.is_terminal() {
                info!("Job {} finished: {}", job_id, job.status);
                return Ok(job);
            }

            if start.elapsed() > self.job_timeout {
                return Err(HarnessError::Job(format!(
                    "timed out waiting for job {} (status {}, {}% complete)",
                    job_id, job.status, job.progress
                )));
            }

            debug!("Job {} is {} ({}%)", job_id, job.status, job.progress);
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!("GET {}", url);
        let response = self.session.client().get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarnessError::Job(format!("{} returned {}: {}", url, status, body)));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl JobRunner for HarmonyClient {
    async fn run(&self, request: &HarmonyRequest) -> Result<JobStatus> {
        let job_id = self.submit(request).await?;
        self.wait_for_result(&job_id).await
    }
}
