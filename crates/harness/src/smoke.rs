//! Lightweight per-collection smoke tests.
//!
//! Each suite submits one small Harmony request per collection and checks the
//! finished job, without downloading any output. Collections whose check
//! fails are recorded in a failure log; requests that could not be run at all
//! (network, EDL or Harmony outages) count as failures but are not recorded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::catalog::Collection;
use crate::error::{HarnessError, Result};
use crate::harmony::{HarmonyRequest, JobLink, JobRunner, JobStatus};

/// A check that a finished job did not pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CheckFailure(pub String);

/// The test suites that can be run, keyed by test directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    /// Harmony Browse Image Generator.
    Hybig,
}

impl Suite {
    /// Picks the suite from the last component of its test directory,
    /// e.g. `tests/hybig`.
    pub fn for_directory(directory: &Path) -> Option<Self> {
        match directory.file_name()?.to_str()? {
            "hybig" => Some(Suite::Hybig),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Suite::Hybig => "hybig",
        }
    }

    pub fn request(self, collection: &Collection) -> HarmonyRequest {
        match self {
            Suite::Hybig => HarmonyRequest {
                collection_id: collection.concept_id.clone(),
                max_results: 1,
                format: "image/png".to_string(),
            },
        }
    }

    pub fn check(self, job: &JobStatus) -> std::result::Result<(), CheckFailure> {
        if !job.is_successful() {
            return Err(CheckFailure(format!("Harmony request failed: {}", job.message)));
        }

        match self {
            Suite::Hybig => check_browse_image_links(&job.links),
        }
    }
}

/// Checks the data links of a browse-image job.
///
/// There must be at least three, and every PNG needs a world file (`.pgw`)
/// and an auxiliary file (`.png.aux.xml`) with the same basename. That holds
/// both for a single untiled granule and for tiled output, where a text file
/// lists the tiles.
pub fn check_browse_image_links(links: &[JobLink]) -> std::result::Result<(), CheckFailure> {
    let data_links: Vec<&str> = links
        .iter()
        .filter(|link| link.rel == "data")
        .map(|link| link.href.as_str())
        .collect();

    if data_links.len() < 3 {
        return Err(CheckFailure("Should have at least 1 png, pgw and aux.xml".to_string()));
    }

    let png_files = basenames_with_suffix(&data_links, ".png");
    let pgw_files = basenames_with_suffix(&data_links, ".pgw");
    let aux_xml_files = basenames_with_suffix(&data_links, ".png.aux.xml");

    if png_files != pgw_files {
        return Err(CheckFailure("PNG and world file mismatch".to_string()));
    }
    if png_files != aux_xml_files {
        return Err(CheckFailure("PNG and auxiliary file mismatch".to_string()));
    }

    Ok(())
}

fn basenames_with_suffix<'a>(hrefs: &[&'a str], suffix: &str) -> BTreeSet<&'a str> {
    hrefs
        .iter()
        .copied()
        .filter_map(|href| href.rsplit('/').next()?.strip_suffix(suffix))
        .collect()
}

/// A collection whose check failed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    #[serde(flatten)]
    pub collection: Collection,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLog {
    failures: Vec<FailedTest>,
}

impl FailureLog {
    pub fn record(&mut self, collection: Collection, error: impl Into<String>) {
        self.failures.push(FailedTest {
            collection,
            error: error.into(),
        });
    }

    pub fn failures(&self) -> &[FailedTest] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Writes the failures as an indented JSON list, replacing the file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.failures)?;
        std::fs::write(path, json).map_err(|source| HarnessError::Sink {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub passed: usize,
    /// Requests that could not be run at all.
    pub unexpected: usize,
    pub failures: FailureLog,
}

impl SuiteReport {
    pub fn failed(&self) -> usize {
        self.failures.len() + self.unexpected
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs `suite` against each collection in turn.
pub async fn run_suite<R: JobRunner + ?Sized>(
    runner: &R,
    suite: Suite,
    collections: &[Collection],
) -> SuiteReport {
    let mut report = SuiteReport::default();

    for collection in collections {
        info!(
            "TEST: {} against {} ({} v{})",
            suite.name(),
            collection.concept_id,
            collection.short_name,
            collection.version
        );

        match runner.run(&suite.request(collection)).await {
            Ok(job) => match suite.check(&job) {
                Ok(()) => {
                    info!("  ✅ {} passed", collection.concept_id);
                    report.passed += 1;
                }
                Err(failure) => {
                    warn!("  ❌ {} failed: {}", collection.concept_id, failure);
                    report.failures.record(collection.clone(), failure.to_string());
                }
            },
            Err(e) => {
                error!("  ❌ Unexpected request failure for {}: {}", collection.concept_id, e);
                report.unexpected += 1;
            }
        }
    }

    report
}
