//! Service and collection enumeration against CMR GraphQL.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::Session;
use crate::error::PageError;
use crate::pagination::{Page, PageSource};

const SERVICES_OPERATION: &str = "Services";
const SERVICES_QUERY: &str = r#"
query Services($servicesParams: ServicesInput) {
  services(params: $servicesParams) {
    count
    items {
      name
      conceptId
      version
      collections {
        count
      }
    }
    cursor
  }
}
"#;

const SERVICE_COLLECTIONS_OPERATION: &str = "Service";
const SERVICE_COLLECTIONS_QUERY: &str = r#"
query Service($serviceParams: ServiceInput, $collectionsParams: CollectionsInput) {
  service(params: $serviceParams) {
    collections(params: $collectionsParams) {
      items {
        conceptId
        shortName
        version
      }
      cursor
    }
  }
}
"#;

/// A service as listed by the top-level enumeration, before its collections
/// are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub concept_id: String,
    pub name: String,
    pub version: String,
    /// Collection count as reported by the catalog.
    pub collection_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub concept_id: String,
    pub short_name: String,
    pub version: String,
}

/// The two paged queries the harness needs from the metadata catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn services_page(&self, cursor: Option<&str>) -> Result<Page<ServiceSummary>, PageError>;

    async fn collections_page(
        &self,
        service_concept_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Collection>, PageError>;
}

/// Pages of the service enumeration.
pub struct ServicePages<'a, C: ?Sized> {
    catalog: &'a C,
}

impl<'a, C: ?Sized> ServicePages<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl<'a, C: Catalog + ?Sized> PageSource for ServicePages<'a, C> {
    type Item = ServiceSummary;

    fn describe(&self) -> String {
        "services".to_string()
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page<ServiceSummary>, PageError> {
        self.catalog.services_page(cursor).await
    }
}

/// Pages of one service's collections.
pub struct CollectionPages<'a, C: ?Sized> {
    catalog: &'a C,
    service_concept_id: &'a str,
}

impl<'a, C: ?Sized> CollectionPages<'a, C> {
    pub fn new(catalog: &'a C, service_concept_id: &'a str) -> Self {
        Self {
            catalog,
            service_concept_id,
        }
    }
}

#[async_trait]
impl<'a, C: Catalog + ?Sized> PageSource for CollectionPages<'a, C> {
    type Item = Collection;

    fn describe(&self) -> String {
        format!("collections of {}", self.service_concept_id)
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page<Collection>, PageError> {
        self.catalog
            .collections_page(self.service_concept_id, cursor)
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRequest<'a> {
    operation_name: &'a str,
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQlResponse<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct ServicesData {
    services: Connection<ServiceItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceItem {
    concept_id: String,
    name: String,
    version: String,
    collections: Option<CollectionCount>,
}

#[derive(Deserialize)]
struct CollectionCount {
    count: u64,
}

#[derive(Deserialize)]
struct ServiceData {
    service: Option<ServiceCollections>,
}

#[derive(Deserialize)]
struct ServiceCollections {
    collections: Option<Connection<CollectionItem>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionItem {
    concept_id: String,
    short_name: String,
    version: String,
}

/// [`Catalog`] backed by the CMR GraphQL endpoint.
pub struct CmrGraphQl {
    session: Session,
    endpoint: String,
    service_type: String,
    page_size: u32,
}

impl CmrGraphQl {
    pub fn new(
        session: Session,
        endpoint: impl Into<String>,
        service_type: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            session,
            endpoint: endpoint.into(),
            service_type: service_type.into(),
            page_size,
        }
    }

    async fn query<D: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: Value,
    ) -> Result<D, PageError> {
        let request = GraphQlRequest {
            operation_name,
            query,
            variables,
        };
        debug!("POST {} operation {}: {}", self.endpoint, operation_name, request.variables);

        let response = self
            .session
            .client()
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphQlResponse<D> = response
            .json()
            .await
            .map_err(|e| PageError::Malformed(e.to_string()))?;

        match body.data {
            Some(data) => Ok(data),
            None => {
                let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
                Err(PageError::Malformed(format!(
                    "no data in response: {}",
                    messages.join("; ")
                )))
            }
        }
    }
}

#[async_trait]
impl Catalog for CmrGraphQl {
    async fn services_page(&self, cursor: Option<&str>) -> Result<Page<ServiceSummary>, PageError> {
        let variables = json!({
            "servicesParams": {
                "limit": self.page_size,
                "type": self.service_type,
                "cursor": cursor,
            }
        });

        let data: ServicesData = self
            .query(SERVICES_OPERATION, SERVICES_QUERY, variables)
            .await?;

        let items = data
            .services
            .items
            .into_iter()
            .map(|service| ServiceSummary {
                concept_id: service.concept_id,
                name: service.name,
                version: service.version,
                collection_count: service.collections.map_or(0, |c| c.count),
            })
            .collect();

        Ok(Page::new(items, data.services.cursor))
    }

    async fn collections_page(
        &self,
        service_concept_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Collection>, PageError> {
        let variables = json!({
            "serviceParams": {
                "conceptId": service_concept_id,
            },
            "collectionsParams": {
                "cursor": cursor,
                "limit": self.page_size,
            }
        });

        let data: ServiceData = self
            .query(SERVICE_COLLECTIONS_OPERATION, SERVICE_COLLECTIONS_QUERY, variables)
            .await?;

        // An unknown service or one without collections has nothing more to page through.
        let Some(connection) = data.service.and_then(|s| s.collections) else {
            return Ok(Page::last(Vec::new()));
        };

        let items = connection
            .items
            .into_iter()
            .map(|collection| Collection {
                concept_id: collection.concept_id,
                short_name: collection.short_name,
                version: collection.version,
            })
            .collect();

        Ok(Page::new(items, connection.cursor))
    }
}
