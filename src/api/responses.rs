//! Request and response bodies for the HTTP surface

use serde::{Deserialize, Serialize};

use crate::similarity::ProductMatch;

/// Request body for the URL-based matching endpoint.
///
/// `url` is optional at the serde level so a missing key surfaces as a
/// proper validation error instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    /// Location of the image to match against
    pub url: Option<String>,
}

/// Successful response for both matching endpoints
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    /// Always `true`; failures use the error envelope instead
    pub success: bool,
    /// Ranked product records from the similarity service, possibly empty
    pub products: Vec<ProductMatch>,
    /// Base64 JPEG re-encoding of the image that was actually processed
    pub uploaded_image: String,
}

impl MatchResponse {
    /// Build the success envelope for a completed match.
    pub fn new(products: Vec<ProductMatch>, uploaded_image: String) -> Self {
        Self {
            success: true,
            products,
            uploaded_image,
        }
    }
}

/// Response for the liveness endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Fixed liveness marker
    pub status: &'static str,
    /// Human-readable status line
    pub message: &'static str,
}

impl HealthResponse {
    /// The one healthy payload this service ever reports.
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            message: "Server is running",
        }
    }
}
