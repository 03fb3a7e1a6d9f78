#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

//! # Lensmatch
//!
//! A thin web backend for visual product matching. An incoming image
//! (multipart upload or URL) is decoded and normalized to RGB, embedded
//! with a pretrained CLIP visual encoder, and matched against a hosted
//! product catalog through the database's server-side nearest-neighbor
//! RPC. The response carries the ranked matches plus a base64 JPEG copy
//! of the image that was actually processed.
//!
//! ## Endpoints
//!
//! - `POST /api/upload`: multipart `file` field
//! - `POST /api/url`: JSON `{"url": "..."}`
//! - `GET /api/health`: liveness
//! - everything else: static frontend assets
//!
//! The embedding model and both outbound HTTP clients are constructed once
//! at startup and shared read-only across requests; see [`AppState`].

// Internal modules
pub mod api;
pub mod core;
/// Defines the application's error types and result aliases.
pub mod error;
/// Client for the hosted similarity-search RPC.
pub mod similarity;
mod state;

// Public API exports
pub use crate::{
    core::embeddings::{l2_normalize, ClipEncoder, ImageEncoder},
    error::{AppError, ErrorResponse, Result},
    similarity::{ProductMatch, SimilarityClient},
    state::{AppState, Config},
};

/// Initialize the application with default settings
///
/// Sets up logging; call once, early in startup.
///
/// # Errors
///
/// Returns an error if logging initialization fails.
pub fn init() -> Result<()> {
    let env = env_logger::Env::default()
        .default_filter_or("info")
        .default_write_style_or("auto");

    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_module_path(false)
        .format_target(false)
        .init();

    log::info!("Initializing lensmatch");
    Ok(())
}
