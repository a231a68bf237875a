use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::auth::Session;
use crate::catalog::{Catalog, Collection, ServiceSummary};
use crate::error::PageError;
use crate::pagination::{Page, PageSource};

/// A page source that replays a fixed list of responses and records the
/// cursor of every request it receives.
pub struct ScriptedPages<T> {
    responses: Mutex<VecDeque<Result<Page<T>, PageError>>>,
    requested: Mutex<Vec<Option<String>>>,
}

impl<T> ScriptedPages<T> {
    pub fn new(responses: Vec<Result<Page<T>, PageError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_cursors(&self) -> Vec<Option<String>> {
        self.requested.lock().unwrap().clone()
    }

    fn next(&self, cursor: Option<&str>) -> Result<Page<T>, PageError> {
        self.requested.lock().unwrap().push(cursor.map(str::to_string));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(server_error()))
    }
}

#[async_trait]
impl<T: Send> PageSource for ScriptedPages<T> {
    type Item = T;

    fn describe(&self) -> String {
        "scripted".to_string()
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page<T>, PageError> {
        self.next(cursor)
    }
}

/// In-memory catalog with scripted pages for the service list and for each
/// service's collections. Services without a script have no collections.
pub struct ScriptedCatalog {
    services: ScriptedPages<ServiceSummary>,
    collections: HashMap<String, ScriptedPages<Collection>>,
}

impl ScriptedCatalog {
    pub fn new(services: Vec<Result<Page<ServiceSummary>, PageError>>) -> Self {
        Self {
            services: ScriptedPages::new(services),
            collections: HashMap::new(),
        }
    }

    pub fn with_collections(
        mut self,
        service_concept_id: &str,
        pages: Vec<Result<Page<Collection>, PageError>>,
    ) -> Self {
        self.collections
            .insert(service_concept_id.to_string(), ScriptedPages::new(pages));
        self
    }

    pub fn collection_cursors(&self, service_concept_id: &str) -> Vec<Option<String>> {
        self.collections
            .get(service_concept_id)
            .map(|pages| pages.requested_cursors())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Catalog for ScriptedCatalog {
    async fn services_page(&self, cursor: Option<&str>) -> Result<Page<ServiceSummary>, PageError> {
        self.services.next(cursor)
    }

    async fn collections_page(
        &self,
        service_concept_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Collection>, PageError> {
        match self.collections.get(service_concept_id) {
            Some(pages) => pages.next(cursor),
            None => Ok(Page::last(Vec::new())),
        }
    }
}

pub fn server_error() -> PageError {
    PageError::Status {
        status: 500,
        body: "Internal Server Error".to_string(),
    }
}

pub fn service(concept_id: &str, collection_count: u64) -> ServiceSummary {
    ServiceSummary {
        concept_id: concept_id.to_string(),
        name: format!("{} name", concept_id),
        version: "1.0.0".to_string(),
        collection_count,
    }
}

pub fn collection(concept_id: &str) -> Collection {
    Collection {
        concept_id: concept_id.to_string(),
        short_name: format!("{}_short", concept_id),
        version: "1".to_string(),
    }
}

/// `count` collections with IDs `C<start>-PROV` onwards.
pub fn collections(start: usize, count: usize) -> Vec<Collection> {
    (start..start + count)
        .map(|i| collection(&format!("C{}-PROV", i)))
        .collect()
}

pub fn test_session() -> Session {
    Session::with_token("test-token", Duration::from_secs(5)).expect("Failed to build session")
}
