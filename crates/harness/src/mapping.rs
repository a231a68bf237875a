//! Which test suite, if any, covers a given service.
//!
//! To enable a suite for a service, add its concept ID to the built-in table
//! of the relevant tier, or point `SERVICE_MAPPING_FILE` at a JSON file of the
//! form `{"production": {"<concept id>": "<dir>"}, "UAT": {...}}`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::{HarnessError, Result};
use crate::output::GithubOutput;

const PRODUCTION_SERVICE_MAPPING: &[(&str, &str)] = &[("S2697183066-XYZ_PROV", "tests/hybig")];
const UAT_SERVICE_MAPPING: &[(&str, &str)] = &[("S1257776354-EEDTEST", "tests/hybig")];

/// Earthdata deployment tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Production,
    Uat,
}

impl Tier {
    /// Interprets `EARTHDATA_ENVIRONMENT`: exactly "UAT" is UAT, anything
    /// else (including unset) is production.
    pub fn from_environment(value: Option<&str>) -> Self {
        match value {
            Some("UAT") => Tier::Uat,
            _ => Tier::Production,
        }
    }

    pub fn edl_url(self) -> &'static str {
        match self {
            Tier::Production => "https://urs.earthdata.nasa.gov",
            Tier::Uat => "https://uat.urs.earthdata.nasa.gov",
        }
    }

    pub fn harmony_url(self) -> &'static str {
        match self {
            Tier::Production => "https://harmony.earthdata.nasa.gov",
            Tier::Uat => "https://harmony.uat.earthdata.nasa.gov",
        }
    }
}

/// Service concept ID to test directory, per tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceMapping {
    #[serde(default)]
    production: HashMap<String, String>,
    #[serde(default, rename = "UAT")]
    uat: HashMap<String, String>,
}

impl Default for ServiceMapping {
    fn default() -> Self {
        fn table(entries: &[(&str, &str)]) -> HashMap<String, String> {
            entries
                .iter()
                .map(|(id, dir)| (id.to_string(), dir.to_string()))
                .collect()
        }

        Self {
            production: table(PRODUCTION_SERVICE_MAPPING),
            uat: table(UAT_SERVICE_MAPPING),
        }
    }
}

impl ServiceMapping {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| HarnessError::Mapping(format!("invalid service mapping: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Mapping(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Built-in table, or the file's contents when a file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// The test directory for a service, or `None` when it has no suite.
    pub fn test_directory(&self, tier: Tier, service_concept_id: &str) -> Option<&str> {
        let table = match tier {
            Tier::Production => &self.production,
            Tier::Uat => &self.uat,
        };
        table.get(service_concept_id).map(String::as_str)
    }
}

/// Writes `test_directory=<dir>` for a service that has a suite.
///
/// A service without a suite writes nothing and is not an error. Returns the
/// directory that was written, if any.
pub fn output_test_directory(
    mapping: &ServiceMapping,
    tier: Tier,
    service_concept_id: &str,
    output: &GithubOutput,
) -> Result<Option<String>> {
    match mapping.test_directory(tier, service_concept_id) {
        Some(directory) => {
            output.emit("test_directory", directory)?;
            Ok(Some(directory.to_string()))
        }
        None => {
            info!("No test directory configured for {} ({:?})", service_concept_id, tier);
            Ok(None)
        }
    }
}
