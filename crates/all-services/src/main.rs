// crates/all-services/src/main.rs
//
// Identifies every Harmony service and its associated collections, and writes
// them to the CI output file as `all_services=<json>`. Later workflow jobs use
// that list as the matrix for per-service testing.

use anyhow::{Context, Result};
use harness::aggregate::aggregate;
use harness::auth::Session;
use harness::catalog::CmrGraphQl;
use harness::config::CatalogConfig;
use harness::output::GithubOutput;
use harness::pagination::Completion;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "info,hyper=off,hyper_util=off,reqwest=off".into()
        }))
        .init();

    // --- 1. Load configuration ---
    let config = CatalogConfig::from_env().context("Failed to load configuration from env")?;
    if let Err(e) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", e);
    }
    info!("Configuration loaded: {}", config);

    // --- 2. Authenticate ---
    let session = Session::connect(
        &config.edl_url,
        &config.edl_user,
        &config.edl_password,
        config.request_timeout(),
    )
    .await
    .context("Failed to obtain an EDL bearer token")?;

    // --- 3. Enumerate services, then each service's collections ---
    let catalog = CmrGraphQl::new(
        session,
        config.cmr_graphql_url.as_str(),
        config.service_type.as_str(),
        config.page_size,
    );
    let aggregation = aggregate(&catalog, config.max_page_errors).await;

    if aggregation.completion == Completion::Truncated {
        warn!("Service list is incomplete: gave up after {} failed requests", config.max_page_errors);
    }
    for service in aggregation.truncated_services() {
        warn!(
            "Collection list for {} is incomplete ({} collections retrieved)",
            service.concept_id,
            service.collections.len()
        );
    }
    if config.verify_collection_counts {
        for service in &aggregation.services {
            if let Some((reported, fetched)) = service.count_mismatch() {
                warn!(
                    "{} reports {} collections but {} were retrieved",
                    service.concept_id, reported, fetched
                );
            }
        }
    }

    let collection_total: usize = aggregation.services.iter().map(|s| s.collections.len()).sum();
    info!(
        "Retrieved {} services with {} collections",
        aggregation.services.len(),
        collection_total
    );

    // --- 4. Write the output ---
    GithubOutput::new(&config.github_output)
        .emit_json("all_services", &aggregation.services)
        .context("Failed to write service list")?;

    Ok(())
}
