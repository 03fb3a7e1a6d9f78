use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use http_body_util::BodyExt;
use image::{DynamicImage, GenericImageView, RgbImage};
use ndarray::Array1;
use tower::ServiceExt;

use lensmatch::{api::create_router, AppState, Config, ImageEncoder, Result};

/// Stand-in encoder so the suite runs without model weights. Returns a
/// fixed unit vector for any image.
struct FixedEncoder;

impl ImageEncoder for FixedEncoder {
    fn embed(&self, _image: &DynamicImage) -> Result<Array1<f32>> {
        Ok(Array1::from(vec![1.0, 0.0, 0.0, 0.0]))
    }
}

/// Router wired to an unreachable similarity service (port 9 refuses
/// connections immediately), exercising the degrade-to-empty path.
fn test_app() -> Router {
    let config = Config {
        port: 0,
        supabase_url: "http://127.0.0.1:9".to_string(),
        supabase_key: "test-key".to_string(),
        model_path: PathBuf::from("unused.pt"),
        static_dir: PathBuf::from("frontend"),
        max_upload_size: 4 * 1024 * 1024,
        fetch_timeout: Duration::from_secs(1),
        rpc_timeout: Duration::from_secs(1),
        match_limit: 12,
        match_threshold: 0.7,
    };
    let state = AppState::new(config, Arc::new(FixedEncoder)).unwrap();
    create_router(state)
}

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut imgbuf = RgbImage::new(width, height);
    for (x, y, pixel) in imgbuf.enumerate_pixels_mut() {
        *pixel = image::Rgb([
            (x as f32 * 255.0 / width as f32) as u8,
            (y as f32 * 255.0 / height as f32) as u8,
            128,
        ]);
    }

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(imgbuf)
        .write_to(&mut buffer, image::ImageOutputFormat::Png)
        .unwrap();
    buffer.into_inner()
}

const BOUNDARY: &str = "lensmatch-test-boundary";

fn multipart_request(field_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field_name}\"; \
             filename=\"image.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_url_endpoint_rejects_missing_url() {
    let response = test_app()
        .oneshot(json_request("/api/url", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_url_endpoint_rejects_blank_url() {
    let response = test_app()
        .oneshot(json_request("/api/url", r#"{"url": "   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_url_endpoint_reports_fetch_failure() {
    // Nothing listens on port 9; the fetch fails and surfaces as an
    // upstream error with a populated detail message.
    let response = test_app()
        .oneshot(json_request(
            "/api/url",
            r#"{"url": "http://127.0.0.1:9/product.png"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_missing_file_field() {
    let response = test_app()
        .oneshot(multipart_request("attachment", b"whatever"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rejects_non_image_bytes() {
    let response = test_app()
        .oneshot(multipart_request("file", b"this is not an image"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_succeeds_with_unreachable_similarity_service() {
    // The similarity client degrades to an empty result list; the request
    // as a whole still succeeds.
    let response = test_app()
        .oneshot(multipart_request("file", &png_fixture(32, 24)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["products"].as_array().unwrap().len(), 0);
    assert!(!body["uploaded_image"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_uploaded_image_round_trips_as_jpeg() {
    let response = test_app()
        .oneshot(multipart_request("file", &png_fixture(32, 24)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let bytes = BASE64
        .decode(body["uploaded_image"].as_str().unwrap())
        .unwrap();
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );

    let reloaded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(reloaded.dimensions(), (32, 24));
}
