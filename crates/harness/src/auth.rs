use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{HarnessError, Result};

#[derive(Debug, Deserialize)]
struct EdlToken {
    access_token: String,
}

/// Retrieves an Earthdata Login bearer token for the given credentials.
///
/// The first token already registered for the user is reused. Only when the
/// user has none is a new token created, which is a permanent change on the
/// EDL side; repeat runs then find and reuse that token.
pub async fn authenticate(
    http: &Client,
    edl_url: &str,
    edl_user: &str,
    edl_password: &str,
) -> Result<String> {
    let edl_url = edl_url.trim_end_matches('/');

    let existing: Vec<EdlToken> = edl_call(
        http.get(format!("{}/api/users/tokens", edl_url)),
        edl_user,
        edl_password,
    )
    .await?;

    if let Some(token) = existing.into_iter().next() {
        debug!("Reusing existing EDL token for {}", edl_user);
        return Ok(token.access_token);
    }

    info!("No EDL token found for {}, requesting a new one", edl_user);
    let created: EdlToken = edl_call(
        http.post(format!("{}/api/users/token", edl_url)),
        edl_user,
        edl_password,
    )
    .await?;

    Ok(created.access_token)
}

async fn edl_call<T: DeserializeOwned>(
    request: RequestBuilder,
    edl_user: &str,
    edl_password: &str,
) -> Result<T> {
    let response = request
        .basic_auth(edl_user, Some(edl_password))
        .header(CONTENT_TYPE, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(HarnessError::Auth {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json::<T>().await?)
}

/// An HTTP client whose every request carries the EDL bearer token.
///
/// The header is fixed when the session is built and never changes for the
/// rest of the run.
#[derive(Clone, Debug)]
pub struct Session {
    client: Client,
}

impl Session {
    /// Authenticates against EDL and builds a session around the token.
    pub async fn connect(
        edl_url: &str,
        edl_user: &str,
        edl_password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let token = authenticate(&http, edl_url, edl_user, edl_password).await?;
        Self::with_token(&token, timeout)
    }

    pub fn with_token(token: &str, timeout: Duration) -> Result<Self> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            HarnessError::InvalidConfig("EDL token is not a valid header value".to_string())
        })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
