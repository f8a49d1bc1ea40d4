use crate::index::credentials::{IndexAuth, IndexCredentials};
use log::{debug, info};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

const NDJSON: &str = "application/x-ndjson";
const BODY_SNIPPET_CHARS: usize = 500;

/// Thin Elasticsearch REST client: index bootstrap and `_bulk`.
#[derive(Debug, Clone)]
pub struct IndexClient {
    http: Client,
    endpoint: String,
    auth: IndexAuth,
}

#[derive(Debug)]
pub enum IndexError {
    /// The HTTP client could not be built from the given credentials.
    Client(reqwest::Error),
    Network(reqwest::Error, String),
    Status { url: String, status: StatusCode, body: String },
    Parsing(reqwest::Error, String),
    Encoding(serde_json::Error),
    /// At least one bulk chunk failed; `report` covers the whole submission.
    Bulk { report: BulkReport, last_error: Box<IndexError> },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Client(e) => write!(f, "Could not build index client: {e}"),
            IndexError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            IndexError::Status { url, status, body } => write!(f, "HTTP {status} for {url}: {body}"),
            IndexError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            IndexError::Encoding(e) => write!(f, "Could not encode document: {e}"),
            IndexError::Bulk { report, last_error } => write!(
                f,
                "{} of {} bulk chunks failed ({} documents attempted, {} indexed): {last_error}",
                report.failed_chunks, report.chunks, report.attempted, report.indexed
            ),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Client(e) | IndexError::Network(e, _) | IndexError::Parsing(e, _) => Some(e),
            IndexError::Encoding(e) => Some(e),
            IndexError::Bulk { last_error, .. } => Some(last_error.as_ref()),
            IndexError::Status { .. } => None,
        }
    }
}

/// Per-run accounting of a bulk submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub attempted: usize,
    pub indexed: usize,
    /// Documents the index refused item by item.
    pub rejected: usize,
    pub chunks: usize,
    pub failed_chunks: usize,
}

// ---------------------------------------------------------------------------
// `_bulk` response wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    /// One single-key object per action: `{"index": {...}}`.
    #[serde(default)]
    pub items: Vec<BTreeMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BulkItem {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: u16,
    pub error: Option<Value>,
}

impl BulkResponse {
    /// Items the index refused, in submission order.
    pub fn rejected(&self) -> impl Iterator<Item = &BulkItem> {
        self.items
            .iter()
            .flat_map(|item| item.values())
            .filter(|item| item.error.is_some() || item.status >= 300)
    }
}

impl IndexClient {
    pub fn new(credentials: IndexCredentials, timeout: Duration) -> Result<Self, IndexError> {
        let http = Client::builder()
            .user_agent(concat!("nhl-ingest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(!credentials.verify_certs)
            .build()
            .map_err(IndexError::Client)?;

        Ok(Self {
            http,
            endpoint: credentials.endpoint.trim_end_matches('/').to_owned(),
            auth: credentials.auth,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool, IndexError> {
        let url = format!("{}/{index}", self.endpoint);
        let response = self.send(self.request(Method::HEAD, &url), &url).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(IndexError::Status { url, status, body: String::new() }),
        }
    }

    pub async fn create_index(&self, index: &str, body: &Value) -> Result<(), IndexError> {
        let url = format!("{}/{index}", self.endpoint);
        let response = self.send(self.request(Method::PUT, &url).json(body), &url).await?;
        check_status(response, &url).await?;
        Ok(())
    }

    /// Create `index` with `body` unless it already exists. Returns whether it was created.
    pub async fn ensure_index(&self, index: &str, body: &Value) -> Result<bool, IndexError> {
        if self.index_exists(index).await? {
            debug!("index {index} already exists");
            return Ok(false);
        }
        self.create_index(index, body).await?;
        info!("created index {index}");
        Ok(true)
    }

    /// Submit one NDJSON `_bulk` body.
    pub async fn bulk(&self, body: String) -> Result<BulkResponse, IndexError> {
        let url = format!("{}/_bulk", self.endpoint);
        let request = self.request(Method::POST, &url).header(CONTENT_TYPE, NDJSON).body(body);
        let response = check_status(self.send(request, &url).await?, &url).await?;
        response
            .json::<BulkResponse>()
            .await
            .map_err(|e| IndexError::Parsing(e, url))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.auth {
            IndexAuth::ApiKey(key) => request.header(AUTHORIZATION, format!("ApiKey {key}")),
            IndexAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<reqwest::Response, IndexError> {
        request
            .send()
            .await
            .map_err(|e| IndexError::Network(e, url.to_owned()))
    }
}

async fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IndexError::Status {
        url: url.to_owned(),
        status,
        body: body.trim().chars().take(BODY_SNIPPET_CHARS).collect(),
    })
}
