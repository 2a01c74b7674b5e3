use std::io::Write;
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use url::Url;

use crate::auth::AuthToken;
use crate::domain::{FileDescriptor, MetagenomeId};
use crate::error::MgError;

pub const DEFAULT_API_URL: &str = "https://api.mg-rast.org";

const AUTH_HEADER: &str = "Auth";

/// Transport capabilities the resolver, fetcher and orchestrator depend on.
pub trait CatalogClient: Send + Sync {
    fn fetch_json(&self, url: &Url) -> Result<Value, MgError>;
    /// Streams the resource into `sink`, returning the number of bytes written.
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, MgError>;
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
}

impl CatalogHttpClient {
    pub fn new(token: Option<&AuthToken>) -> Result<Self, MgError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("mg-download/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MgError::CatalogHttp(err.to_string()))?,
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(token.as_str())
                .map_err(|err| MgError::Auth(err.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTH_HEADER, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| MgError::CatalogHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn json_request(&self, url: &Url) -> RequestBuilder {
        self.client.get(url.clone()).header(ACCEPT, "application/json")
    }

    fn transfer_request(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    fn catalog_status(response: Response) -> Result<Response, MgError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "catalog request failed".to_string());
        Err(MgError::CatalogStatus { status, message })
    }

    fn transfer_status(response: Response) -> Result<Response, MgError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "transfer failed".to_string());
        Err(MgError::TransferStatus { status, message })
    }
}

impl CatalogClient for CatalogHttpClient {
    fn fetch_json(&self, url: &Url) -> Result<Value, MgError> {
        tracing::debug!(%url, "catalog request");
        let response = self
            .json_request(url)
            .send()
            .map_err(|err| MgError::CatalogHttp(err.to_string()))?;
        let response = Self::catalog_status(response)?;
        let value: Value = response
            .json()
            .map_err(|err| MgError::MalformedResponse(err.to_string()))?;
        reject_reported(value)
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, MgError> {
        tracing::debug!(url, "transfer request");
        let response = self
            .transfer_request(url)
            .send()
            .map_err(|err| MgError::TransferHttp(err.to_string()))?;
        let mut response = Self::transfer_status(response)?;
        std::io::copy(&mut response, sink).map_err(|err| MgError::TransferHttp(err.to_string()))
    }
}

/// The API reports some failures as a 200 body carrying an `"ERROR"` key.
pub fn reject_reported(value: Value) -> Result<Value, MgError> {
    if let Some(message) = value.get("ERROR") {
        let message = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return Err(MgError::RemoteReported(message));
    }
    Ok(value)
}

/// `<api>/<segments...>`, with each segment percent-encoded.
pub fn endpoint(api: &Url, segments: &[&str]) -> Result<Url, MgError> {
    let mut url = api.clone();
    url.path_segments_mut()
        .map_err(|_| MgError::InvalidUrl(api.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn download_listing_url(api: &Url, mg: &MetagenomeId) -> Result<Url, MgError> {
    endpoint(api, &["download", mg.as_str()])
}

/// Files available for one metagenome, in server order.
pub fn fetch_files<C: CatalogClient + ?Sized>(
    client: &C,
    api: &Url,
    mg: &MetagenomeId,
) -> Result<Vec<FileDescriptor>, MgError> {
    let url = download_listing_url(api, mg)?;
    let mut value = client.fetch_json(&url)?;
    let data = value
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| MgError::MalformedResponse(format!("{mg}: missing \"data\"")))?;
    serde_json::from_value(data).map_err(|err| MgError::MalformedResponse(format!("{mg}: {err}")))
}

/// Metagenome id to its files. Iterates in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: IndexMap<MetagenomeId, Vec<FileDescriptor>>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier entry for `mg`, keeping its original position.
    pub fn insert(&mut self, mg: MetagenomeId, files: Vec<FileDescriptor>) -> bool {
        self.entries.insert(mg, files).is_some()
    }

    pub fn get(&self, mg: &MetagenomeId) -> Option<&[FileDescriptor]> {
        self.entries.get(mg).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetagenomeId, &[FileDescriptor])> {
        self.entries.iter().map(|(mg, files)| (mg, files.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Fetch every id in order. Repeated ids are fetched again; the last response wins.
pub fn build_index<C: CatalogClient + ?Sized>(
    client: &C,
    api: &Url,
    metagenomes: &[MetagenomeId],
) -> Result<CatalogIndex, MgError> {
    let mut index = CatalogIndex::new();
    for mg in metagenomes {
        let files = fetch_files(client, api, mg)?;
        tracing::debug!(metagenome = %mg, files = files.len(), "file listing fetched");
        if index.insert(mg.clone(), files) {
            tracing::debug!(metagenome = %mg, "replaced earlier listing for repeated id");
        }
    }
    Ok(index)
}
