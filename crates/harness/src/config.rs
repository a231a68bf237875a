use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::Collection;
use crate::error::{HarnessError, Result};
use crate::mapping::Tier;

/// Configuration for enumerating services and their collections.
#[derive(Deserialize, Debug, Clone)]
pub struct CatalogConfig {
    /// CMR GraphQL endpoint queried for services and collections.
    pub cmr_graphql_url: String,

    /// Earthdata Login root URL, e.g. "https://uat.urs.earthdata.nasa.gov".
    pub edl_url: String,
    pub edl_user: String,
    pub edl_password: String,

    /// File that CI reads `key=value` step outputs from.
    pub github_output: PathBuf,

    /// UMM-S `type` used to filter the service enumeration.
    #[serde(default = "default_service_type")]
    pub service_type: String,

    /// Items requested per GraphQL page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Failed page requests tolerated before an enumeration gives up.
    #[serde(default = "default_max_page_errors")]
    pub max_page_errors: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Warn when a service's reported collection count differs from the
    /// number of collections actually enumerated.
    #[serde(default)]
    pub verify_collection_counts: bool,
}

/// Configuration for resolving a service's test directory.
#[derive(Deserialize, Debug, Clone)]
pub struct TestDirectoryConfig {
    pub service_concept_id: String,
    pub github_output: PathBuf,

    /// "UAT" selects the UAT mapping, anything else means production.
    #[serde(default)]
    pub earthdata_environment: Option<String>,

    /// Optional JSON file replacing the built-in service mapping.
    #[serde(default)]
    pub service_mapping_file: Option<PathBuf>,
}

/// Configuration for running one smoke-test suite.
#[derive(Deserialize, Debug, Clone)]
pub struct SmokeConfig {
    /// JSON list of `{concept_id, short_name, version}` records.
    pub service_collections: String,

    /// Directory of the suite under test; failures are written inside it.
    pub test_directory: PathBuf,

    pub edl_user: String,
    pub edl_password: String,

    #[serde(default)]
    pub earthdata_environment: Option<String>,

    /// Overrides the tier's Earthdata Login URL.
    #[serde(default)]
    pub edl_url: Option<String>,

    /// Overrides the tier's Harmony URL.
    #[serde(default)]
    pub harmony_url: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_job_poll")]
    pub job_poll_seconds: u64,

    #[serde(default = "default_job_timeout")]
    pub job_timeout_seconds: u64,
}

fn default_service_type() -> String { "harmony".to_string() }
fn default_page_size() -> u32 { 100 }
fn default_max_page_errors() -> u32 { 3 }
fn default_request_timeout() -> u64 { 10 }
fn default_job_poll() -> u64 { 5 }
fn default_job_timeout() -> u64 { 60 * 60 } // 1 hour

/// Name of the file, inside the test directory, listing failed collections.
pub const TEST_OUTPUT_FILE: &str = "test_output.json";

impl CatalogConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env::<CatalogConfig>()?)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.cmr_graphql_url.trim().is_empty() {
            return Err("CMR_GRAPHQL_URL must not be empty.".to_string());
        }
        if self.edl_url.trim().is_empty() {
            return Err("EDL_URL must not be empty.".to_string());
        }
        if self.page_size == 0 {
            return Err("PAGE_SIZE must be at least 1.".to_string());
        }
        if self.max_page_errors == 0 {
            return Err("MAX_PAGE_ERRORS must be at least 1, or no page would ever be requested.".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl fmt::Display for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Credentials are never printed.
        write!(
            f,
            "CMR GraphQL: {}, EDL: {} (user {}), service type: {}, page size: {}, max page errors: {}",
            self.cmr_graphql_url,
            self.edl_url,
            self.edl_user,
            self.service_type,
            self.page_size,
            self.max_page_errors
        )
    }
}

impl TestDirectoryConfig {
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env::<TestDirectoryConfig>()?)
    }

    pub fn tier(&self) -> Tier {
        Tier::from_environment(self.earthdata_environment.as_deref())
    }
}

impl SmokeConfig {
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env::<SmokeConfig>()?)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.job_poll_seconds == 0 {
            return Err("JOB_POLL_SECONDS must be at least 1.".to_string());
        }
        if self.job_timeout_seconds < self.job_poll_seconds {
            return Err("JOB_TIMEOUT_SECONDS must not be shorter than JOB_POLL_SECONDS.".to_string());
        }
        Ok(())
    }

    pub fn tier(&self) -> Tier {
        Tier::from_environment(self.earthdata_environment.as_deref())
    }

    pub fn collections(&self) -> Result<Vec<Collection>> {
        serde_json::from_str(&self.service_collections).map_err(|e| {
            HarnessError::InvalidConfig(format!("SERVICE_COLLECTIONS is not a list of collections: {}", e))
        })
    }

    pub fn edl_url(&self) -> String {
        self.edl_url
            .clone()
            .unwrap_or_else(|| self.tier().edl_url().to_string())
    }

    pub fn harmony_url(&self) -> String {
        self.harmony_url
            .clone()
            .unwrap_or_else(|| self.tier().harmony_url().to_string())
    }

    pub fn output_file(&self) -> PathBuf {
        self.test_directory.join(TEST_OUTPUT_FILE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_secs(self.job_poll_seconds)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_seconds)
    }
}
