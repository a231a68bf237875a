// crates/smoke-tests/src/main.rs
//
// Runs the smoke-test suite in `TEST_DIRECTORY` against every collection in
// `SERVICE_COLLECTIONS`, writes failed collections to
// `<TEST_DIRECTORY>/test_output.json` and exits nonzero if any collection failed.

use anyhow::{Context, Result};
use harness::auth::Session;
use harness::config::SmokeConfig;
use harness::harmony::HarmonyClient;
use harness::smoke::{run_suite, Suite};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "info,hyper=off,hyper_util=off,reqwest=off".into()
        }))
        .init();

    info!("Starting Harmony smoke tests");
    info!("=========================================");

    let config = SmokeConfig::from_env().context("Failed to load configuration from env")?;
    if let Err(e) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", e);
    }

    let suite = Suite::for_directory(&config.test_directory).with_context(|| {
        format!("No smoke-test suite for {}", config.test_directory.display())
    })?;
    let collections = config.collections()?;

    info!("Environment: {:?}", config.tier());
    info!("Suite: {} ({} collections)", suite.name(), collections.len());

    let session = Session::connect(
        &config.edl_url(),
        &config.edl_user,
        &config.edl_password,
        config.request_timeout(),
    )
    .await
    .context("Failed to obtain an EDL bearer token")?;

    let harmony = HarmonyClient::new(
        session,
        &config.harmony_url(),
        config.job_poll_interval(),
        config.job_timeout(),
    );

    info!("\n=== Test Suite: {} ===", suite.name());
    let report = run_suite(&harmony, suite, &collections).await;

    // Failures are written even when empty, so the reporting job always finds a file.
    let output_file = config.output_file();
    report
        .failures
        .write(&output_file)
        .with_context(|| format!("Failed to write {}", output_file.display()))?;

    // Summary
    info!("\n=== Test Summary ===");
    info!("Passed: {}, failed: {}", report.passed, report.failed());
    if report.is_success() {
        info!("✅ All collections passed!");
        Ok(())
    } else {
        error!("❌ Failed collections:");
        for failure in report.failures.failures() {
            error!("  - {}: {}", failure.collection.concept_id, failure.error);
        }
        if report.unexpected > 0 {
            error!("  - {} requests could not be run", report.unexpected);
        }
        anyhow::bail!("Smoke tests failed")
    }
}
