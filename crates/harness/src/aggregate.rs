use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, Collection, CollectionPages, ServicePages, ServiceSummary};
use crate::pagination::{fetch_all, Completion};

/// A service together with every collection associated with it.
///
/// Serialises to `{concept_id, name, version, collection_count, collections}`,
/// the record shape downstream CI jobs build their test matrix from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub concept_id: String,
    pub name: String,
    pub version: String,
    pub collection_count: u64,
    pub collections: Vec<Collection>,
    #[serde(skip)]
    pub collections_completion: Completion,
}

impl Service {
    fn assemble(summary: ServiceSummary, collections: Vec<Collection>, completion: Completion) -> Self {
        Self {
            concept_id: summary.concept_id,
            name: summary.name,
            version: summary.version,
            collection_count: summary.collection_count,
            collections,
            collections_completion: completion,
        }
    }

    /// `(reported, fetched)` when the catalog's collection count disagrees
    /// with the collections actually enumerated.
    pub fn count_mismatch(&self) -> Option<(u64, u64)> {
        let fetched = self.collections.len() as u64;
        (fetched != self.collection_count).then_some((self.collection_count, fetched))
    }
}

/// Result of a full enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub services: Vec<Service>,
    /// Completion of the top-level service enumeration.
    pub completion: Completion,
}

impl Aggregation {
    /// Whether the service list and every collection list were read to the end.
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Exhausted
            && self
                .services
                .iter()
                .all(|s| s.collections_completion == Completion::Exhausted)
    }

    pub fn truncated_services(&self) -> impl Iterator<Item = &Service> {
        self.services
            .iter()
            .filter(|s| s.collections_completion == Completion::Truncated)
    }
}

/// Enumerates all services, then each service's collections.
///
/// Collections are fetched with a separate enumeration per service instead of
/// a nested page in the services query: the catalog does not page nested
/// results reliably. Services keep discovery order.
pub async fn aggregate<C: Catalog + ?Sized>(catalog: &C, max_errors: u32) -> Aggregation {
    info!("Retrieving all services");
    let services = fetch_all(&ServicePages::new(catalog), max_errors).await;
    info!("Found {} services", services.items.len());

    let mut assembled = Vec::with_capacity(services.items.len());
    for summary in services.items {
        info!("Retrieving collections for {}", summary.concept_id);
        let collections = fetch_all(&CollectionPages::new(catalog, &summary.concept_id), max_errors).await;
        if collections.errors > 0 {
            warn!(
                "{}: {} failed collection page requests",
                summary.concept_id, collections.errors
            );
        }
        assembled.push(Service::assemble(summary, collections.items, collections.completion));
    }

    Aggregation {
        services: assembled,
        completion: services.completion,
    }
}
