//! Client for the hosted database's nearest-neighbor matching RPC.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;

use crate::error::{AppError, Result};

/// Server-side function that ranks product records against a query vector.
const MATCH_RPC: &str = "match_products";

/// A product record returned by the matching service.
///
/// The pipeline never inspects these; they are passed through to the caller
/// in the order the service ranked them.
pub type ProductMatch = serde_json::Value;

#[derive(Serialize)]
struct MatchQuery<'a> {
    query_embedding: &'a [f32],
    match_threshold: f32,
    match_count: usize,
}

/// Client for the remote similarity-search procedure.
///
/// Failures never propagate out of [`find_similar`](Self::find_similar):
/// a request that cannot be completed degrades to an empty result list so
/// the surrounding request still succeeds.
#[derive(Clone)]
pub struct SimilarityClient {
    http: reqwest::Client,
    rpc_url: String,
}

impl SimilarityClient {
    /// Build a client for the matching RPC exposed at `base_url`.
    ///
    /// `api_key` is sent as both the `apikey` header and a bearer token,
    /// which is how the hosted database authenticates RPC calls. `timeout`
    /// bounds every request the client makes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-http(s) URL, an empty key,
    /// or a key that is not a valid header value.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(
                "similarity service URL must be an http(s) URL".to_string(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(AppError::Config(
                "similarity service key must not be empty".to_string(),
            ));
        }

        let header_err =
            |_| AppError::Config("similarity service key is not a valid header value".to_string());

        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key.trim()).map_err(header_err)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key.trim())).map_err(header_err)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build similarity client: {}", e)))?;

        Ok(Self {
            http,
            rpc_url: format!(
                "{}/rest/v1/rpc/{}",
                base_url.trim_end_matches('/'),
                MATCH_RPC
            ),
        })
    }

    /// Find products visually similar to `embedding`.
    ///
    /// Returns at most `limit` records at or above `threshold`, in the
    /// order the service ranked them. Any failure (connect, timeout,
    /// non-2xx, malformed body) is logged and yields an empty list; there
    /// is no retry.
    pub async fn find_similar(
        &self,
        embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Vec<ProductMatch> {
        let query = MatchQuery {
            query_embedding: embedding,
            match_threshold: threshold,
            match_count: limit,
        };

        match self.call_match_rpc(&query).await {
            Ok(products) => products,
            Err(e) => {
                log::warn!("similarity search failed, returning no matches: {}", e);
                Vec::new()
            }
        }
    }

    async fn call_match_rpc(&self, query: &MatchQuery<'_>) -> Result<Vec<ProductMatch>> {
        let response = self.http.post(&self.rpc_url).json(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::Fetch(format!(
                "match RPC returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}
