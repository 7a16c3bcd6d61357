//! Per-document calls against the Elasticsearch REST API

use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ElasticError;
use crate::options::{ElasticOptions, Refresh};

#[derive(Deserialize)]
struct SourceDoc<T> {
    #[serde(rename = "_source")]
    source: T,
}

#[derive(Deserialize)]
struct SearchResponse<T> {
    hits: Hits<T>,
}

#[derive(Deserialize)]
struct Hits<T> {
    #[serde(default)]
    total: Option<Total>,
    hits: Vec<Hit<T>>,
}

/// `hits.total` is an object since 7.0 and a bare count before.
#[derive(Deserialize)]
#[serde(untagged)]
enum Total {
    Count(u64),
    Relation { value: u64 },
}

impl Total {
    fn value(&self) -> u64 {
        match self {
            Total::Count(value) | Total::Relation { value } => *value,
        }
    }
}

/// Default `index.max_result_window`; `from + size` may not exceed it.
const MAX_RESULT_WINDOW: u64 = 10_000;

#[derive(Deserialize)]
struct Hit<T> {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: T,
}

#[derive(Deserialize)]
struct DeleteByQueryResponse {
    #[serde(default)]
    deleted: u64,
}

/// Thin client over `_doc`, `_create`, `_search` and index deletion.
///
/// Missing documents and missing indices are reported as `None`/`false`/empty
/// rather than errors; callers decide what absence means.
pub(crate) struct DocumentClient {
    base_url: String,
    http_client: Client,
    refresh: Refresh,
    search_size: u32,
    request_timeout: Option<Duration>,
}

impl DocumentClient {
    pub(crate) fn new(options: &ElasticOptions, http_client: Client) -> Self {
        Self {
            base_url: options.url.clone(),
            http_client,
            refresh: options.refresh,
            search_size: options.search_size,
            request_timeout: options.request_timeout,
        }
    }

    /// Fetch a document's source. Any 4xx answer means "absent".
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<T>, ElasticError> {
        debug!("GET {}/_doc/{}", index, id);
        let url = self.url(&[index, "_doc", id])?;
        let response = self.request(Method::GET, url).send().await?;

        let status = response.status();
        if status.is_client_error() {
            if status != StatusCode::NOT_FOUND {
                warn!("lookup of {}/{} answered {}", index, id, status);
            }
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let doc = response
            .json::<SourceDoc<T>>()
            .await
            .map_err(|e| ElasticError::DeserializationError(e.to_string()))?;
        Ok(Some(doc.source))
    }

    /// Create or overwrite a document (last write wins).
    pub(crate) async fn put<T: Serialize>(
        &self,
        index: &str,
        id: &str,
        doc: &T,
    ) -> Result<(), ElasticError> {
        debug!("PUT {}/_doc/{}", index, id);
        let mut url = self.url(&[index, "_doc", id])?;
        url.query_pairs_mut()
            .append_pair("refresh", self.refresh.as_str());

        let response = self.request(Method::PUT, url).json(doc).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// Create a document only if its id is free. Returns `false` on a conflict.
    pub(crate) async fn create<T: Serialize>(
        &self,
        index: &str,
        id: &str,
        doc: &T,
    ) -> Result<bool, ElasticError> {
        debug!("PUT {}/_create/{}", index, id);
        let mut url = self.url(&[index, "_create", id])?;
        url.query_pairs_mut()
            .append_pair("refresh", self.refresh.as_str());

        let response = self.request(Method::PUT, url).json(doc).send().await?;
        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        Ok(true)
    }

    /// Delete one document. Returns `false` if it did not exist.
    pub(crate) async fn delete(&self, index: &str, id: &str) -> Result<bool, ElasticError> {
        debug!("DELETE {}/_doc/{}", index, id);
        let mut url = self.url(&[index, "_doc", id])?;
        url.query_pairs_mut()
            .append_pair("refresh", self.refresh.as_str());

        let response = self.request(Method::DELETE, url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        Ok(true)
    }

    /// List `(id, source)` of every document in an index, in hit order.
    /// A missing index is an empty one.
    ///
    /// Pages of `search_size` hits are fetched until `hits.total` is reached.
    pub(crate) async fn search<T: DeserializeOwned>(
        &self,
        index: &str,
    ) -> Result<Vec<(String, T)>, ElasticError> {
        let size = u64::from(self.search_size.max(1));
        let mut found: Vec<(String, T)> = Vec::new();

        loop {
            let from = found.len() as u64;
            debug!("GET {}/_search from {}", index, from);
            let mut url = self.url(&[index, "_search"])?;
            url.query_pairs_mut()
                .append_pair("size", &size.to_string());
            if from > 0 {
                url.query_pairs_mut().append_pair("from", &from.to_string());
            }

            let response = self.request(Method::GET, url).send().await?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(found);
            }
            if !status.is_success() {
                return Err(api_error(response).await);
            }

            let answer = response
                .json::<SearchResponse<T>>()
                .await
                .map_err(|e| ElasticError::DeserializationError(e.to_string()))?;
            let total = answer.hits.total.as_ref().map(Total::value);
            let page = answer.hits.hits.len() as u64;
            found.extend(answer.hits.hits.into_iter().map(|hit| (hit.id, hit.source)));

            let fetched = found.len() as u64;
            let more = match total {
                Some(total) => fetched < total && page > 0,
                None => page == size,
            };
            if !more {
                return Ok(found);
            }
            if fetched + size > MAX_RESULT_WINDOW {
                warn!(
                    "{} holds {:?} documents, listing stops at {}",
                    index, total, fetched
                );
                return Ok(found);
            }
        }
    }

    /// Drop a whole index. Returns `false` if it did not exist.
    pub(crate) async fn delete_index(&self, index: &str) -> Result<bool, ElasticError> {
        debug!("DELETE {}", index);
        let url = self.url(&[index])?;

        let response = self.request(Method::DELETE, url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("index {} was already gone", index);
            return Ok(false);
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        Ok(true)
    }

    /// Delete every document matching `query`; returns how many went.
    pub(crate) async fn delete_by_query(
        &self,
        index: &str,
        query: &Value,
    ) -> Result<u64, ElasticError> {
        debug!("POST {}/_delete_by_query", index);
        let mut url = self.url(&[index, "_delete_by_query"])?;
        url.query_pairs_mut()
            .append_pair("refresh", self.refresh.as_bool_str());

        let response = self.request(Method::POST, url).json(query).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let answer = response
            .json::<DeleteByQueryResponse>()
            .await
            .map_err(|e| ElasticError::DeserializationError(e.to_string()))?;
        Ok(answer.deleted)
    }

    // URLを構築
    fn url(&self, segments: &[&str]) -> Result<Url, ElasticError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| ElasticError::UrlParseError(url::ParseError::EmptyHost))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http_client.request(method, url);
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

async fn api_error(response: Response) -> ElasticError {
    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());
    ElasticError::ApiError { message, status }
}
