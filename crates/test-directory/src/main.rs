// crates/test-directory/src/main.rs
//
// Writes the test directory for `SERVICE_CONCEPT_ID` to the CI output file as
// `test_directory=<path>`. A service without a test suite produces no output.

use anyhow::{Context, Result};
use harness::config::TestDirectoryConfig;
use harness::mapping::{output_test_directory, ServiceMapping};
use harness::output::GithubOutput;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = TestDirectoryConfig::from_env().context("Failed to load configuration from env")?;
    let mapping = ServiceMapping::load(config.service_mapping_file.as_deref())
        .context("Failed to load service mapping")?;

    let output = GithubOutput::new(&config.github_output);
    if let Some(directory) =
        output_test_directory(&mapping, config.tier(), &config.service_concept_id, &output)?
    {
        info!("Tests for {} are in {}", config.service_concept_id, directory);
    }

    Ok(())
}
