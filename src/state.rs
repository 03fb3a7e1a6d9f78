use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::core::embeddings::ImageEncoder;
use crate::error::{AppError, Result};
use crate::similarity::SimilarityClient;

/// Configuration for the application
#[derive(Clone, Debug)]
pub struct Config {
    /// Port the HTTP server binds on
    pub port: u16,
    /// Base URL of the hosted database exposing the matching RPC
    pub supabase_url: String,
    /// API key for the hosted database
    pub supabase_key: String,
    /// Path to the TorchScript export of the vision encoder
    pub model_path: PathBuf,
    /// Directory of static frontend assets
    pub static_dir: PathBuf,
    /// Maximum request body size in bytes
    pub max_upload_size: usize,
    /// Timeout for fetching an image from a caller-supplied URL
    pub fetch_timeout: Duration,
    /// Timeout for the similarity-search RPC
    pub rpc_timeout: Duration,
    /// Number of product matches requested per query
    pub match_limit: usize,
    /// Minimum similarity score for a match
    pub match_threshold: f32,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `SUPABASE_URL` and `SUPABASE_KEY` are required; startup fails fast
    /// without them. `PORT`, `CLIP_MODEL_PATH`, and `STATIC_DIR` are
    /// optional overrides.
    pub fn from_env() -> Result<Self> {
        let supabase_url = std::env::var("SUPABASE_URL")
            .map_err(|_| AppError::Config("SUPABASE_URL must be set".to_string()))?;
        let supabase_key = std::env::var("SUPABASE_KEY")
            .map_err(|_| AppError::Config("SUPABASE_KEY must be set".to_string()))?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {}", raw)))?,
            Err(_) => 7860,
        };

        let model_path = std::env::var("CLIP_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models/clip-vit-b32-visual.pt"));
        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("frontend"));

        let config = Self {
            port,
            supabase_url,
            supabase_key,
            model_path,
            static_dir,
            max_upload_size: 20 * 1024 * 1024, // 20MB
            fetch_timeout: Duration::from_secs(10),
            rpc_timeout: Duration::from_secs(15),
            match_limit: 12,
            match_threshold: 0.7,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the fixed pipeline parameters are in range.
    pub fn validate(&self) -> Result<()> {
        if self.match_limit == 0 {
            return Err(AppError::Config("match limit must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(AppError::Config(format!(
                "match threshold must be in [0, 1], got {}",
                self.match_threshold
            )));
        }
        if self.max_upload_size == 0 {
            return Err(AppError::Config("max upload size must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Application state shared read-only across request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Shared vision encoder, loaded once at startup
    pub encoder: Arc<dyn ImageEncoder>,
    /// Client for the similarity-search RPC
    pub matcher: SimilarityClient,
    /// HTTP client for fetching caller-supplied image URLs
    pub fetcher: reqwest::Client,
}

impl AppState {
    /// Assemble the application state from a validated configuration and a
    /// loaded encoder.
    pub fn new(config: Config, encoder: Arc<dyn ImageEncoder>) -> Result<Arc<Self>> {
        config.validate()?;

        let matcher = SimilarityClient::new(
            &config.supabase_url,
            &config.supabase_key,
            config.rpc_timeout,
        )?;
        let fetcher = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build fetch client: {}", e)))?;

        Ok(Arc::new(Self {
            config,
            encoder,
            matcher,
            fetcher,
        }))
    }
}
