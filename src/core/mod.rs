//! Core pipeline stages: image acquisition and embedding inference

/// Generates unit-normalized visual embeddings with a pretrained encoder.
pub mod embeddings;
/// Decodes, fetches, and re-encodes request images.
pub mod imaging;
