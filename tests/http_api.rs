//! End-to-end tests for the HTTP API with a stub detector in place of ONNX Runtime.

use async_trait::async_trait;
use base64::Engine;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use cardlens::{
    adapters::{
        http::{router, state::HttpState},
        onnx::{detector::OnnxModelLoader, model_catalog::OnnxModelCatalog},
        render::annotator::{class_color, BoxAnnotator},
    },
    application::{
        dto::UiConfigResponse,
        ports::DetectorPort,
        presets::PresetCatalog,
        services::{DetectionService, ModelHandle, ModelService},
    },
    domain::{
        classes::ClassRegistry,
        detection::{BoundingBox, Detection},
        errors::DomainResult,
        model::{ConfidenceThreshold, ModelId, YoloParams},
    },
};
use image::RgbImage;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

const BOUNDARY: &str = "cardlens-test-boundary";

/// Returns fixed detections, filtered by the requested threshold like a real detector.
struct StubDetector {
    detections: Vec<Detection>,
    thresholds: Mutex<Vec<f32>>,
}

#[async_trait]
impl DetectorPort for StubDetector {
    async fn detect(&self, _image: Arc<RgbImage>, threshold: ConfidenceThreshold) -> DomainResult<Vec<Detection>> {
        self.thresholds.lock().unwrap().push(threshold.value());
        Ok(self
            .detections
            .iter()
            .filter(|d| d.score > threshold.value())
            .cloned()
            .collect())
    }
}

fn det(class_id: usize, score: f32) -> Detection {
    Detection {
        class_id,
        score,
        bbox: BoundingBox { x1: 4.0, y1: 20.0, x2: 30.0, y2: 40.0 },
    }
}

fn app_with(handle: ModelHandle, examples_dir: &Path) -> Router {
    let annotator = BoxAnnotator::new(ClassRegistry::default()).unwrap();
    let detection = DetectionService::new(Arc::new(handle), Arc::new(annotator), ClassRegistry::default());
    router(HttpState {
        detection: Arc::new(detection),
        presets: Arc::new(PresetCatalog::scan(examples_dir)),
        ui: Arc::new(UiConfigResponse::new(0.3, 250)),
    })
}

fn loaded(detector: Arc<StubDetector>) -> ModelHandle {
    ModelHandle::Loaded { model: ModelId { onnx_path: "cards.onnx".into() }, detector }
}

fn stub(detections: Vec<Detection>) -> Arc<StubDetector> {
    Arc::new(StubDetector { detections, thresholds: Mutex::new(vec![]) })
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_pixel(w, h, image::Rgb([200, 200, 200]))
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn multipart(image: Option<(&str, Vec<u8>)>, confidence: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(conf) = confidence {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"confidence\"\r\n\r\n{conf}\r\n").as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post(app: Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    (status, to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec())
}

#[tokio::test]
async fn dashboard_renders_rows_in_detector_order_with_banner() {
    let dir = tempfile::tempdir().unwrap();
    let detector = stub(vec![det(2, 0.91), det(17, 0.42)]);
    let app = app_with(loaded(detector.clone()), dir.path());

    let (status, json) = post(app, "/api/dashboard/detect", multipart(Some(("card.png", png(64, 48))), Some("0.3"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rows"][0], serde_json::json!({"index": 1, "label": "Bullseye", "confidence": "91.00%"}));
    assert_eq!(json["rows"][1], serde_json::json!({"index": 2, "label": "circle", "confidence": "42.00%"}));
    assert_eq!(json["banner"]["level"], "success");
    assert!(json["banner"]["text"].as_str().unwrap().contains("detected 2 objects."));
    assert_eq!(json["width"], 64);
    assert_eq!(json["height"], 48);
    assert!(json["annotated_image"].as_str().unwrap().starts_with("data:image/png;base64,"));
    assert_eq!(json["detections"][0]["bbox"]["x1"], 4.0);
    assert_eq!(*detector.thresholds.lock().unwrap(), vec![0.3]);
}

#[tokio::test]
async fn dashboard_empty_result_is_an_advisory() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(loaded(stub(vec![det(2, 0.2)])), dir.path());

    let (status, json) = post(app, "/api/dashboard/detect", multipart(Some(("card.jpg", png(16, 16))), Some("0.3"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rows"], serde_json::json!([]));
    assert_eq!(json["banner"]["level"], "warning");
    let text = json["banner"]["text"].as_str().unwrap();
    assert!(text.contains("lowering the confidence threshold"));
    assert!(text.contains("physical card"));
}

#[tokio::test]
async fn dashboard_defaults_confidence_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let detector = stub(vec![]);
    let app = app_with(loaded(detector.clone()), dir.path());

    let (status, _) = post(app, "/api/dashboard/detect", multipart(Some(("a.png", png(8, 8))), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(*detector.thresholds.lock().unwrap(), vec![0.3]);
}

#[tokio::test]
async fn dashboard_rejects_bad_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let img = png(8, 8);

    let app = app_with(loaded(stub(vec![])), dir.path());
    let (status, json) = post(app, "/api/dashboard/detect", multipart(Some(("a.png", img.clone())), Some("1.5"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_request");

    let app = app_with(loaded(stub(vec![])), dir.path());
    let (status, _) = post(app, "/api/dashboard/detect", multipart(Some(("a.gif", img)), Some("0.3"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let app = app_with(loaded(stub(vec![])), dir.path());
    let (status, _) = post(app, "/api/dashboard/detect", multipart(None, Some("0.3"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let app = app_with(loaded(stub(vec![])), dir.path());
    let (status, _) = post(app, "/api/dashboard/detect", multipart(Some(("a.png", b"garbage".to_vec())), Some("0.3"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn form_returns_text_details() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(loaded(stub(vec![det(2, 0.91), det(17, 0.42)])), dir.path());

    let (status, json) = post(app, "/api/form/predict", multipart(Some(("x.png", png(32, 32))), Some("0.3"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["details"],
        "Detected 2 objects:\n\n1. Bullseye - Confidence: 91.00%\n2. circle - Confidence: 42.00%\n"
    );
    assert!(json["annotated_image"].is_string());
}

#[tokio::test]
async fn annotated_image_carries_label_tabs() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(loaded(stub(vec![det(2, 0.91)])), dir.path());

    let (status, json) = post(app, "/api/form/predict", multipart(Some(("x.png", png(64, 48))), Some("0.3"))).await;
    assert_eq!(status, StatusCode::OK);

    let data_url = json["annotated_image"].as_str().unwrap();
    let encoded = data_url.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
    let annotated = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(annotated.dimensions(), (64, 48));

    // Box top is y=20 and the tab occupies y 8..20 starting at x=4.
    let tab = class_color(2);
    let background = image::Rgb([200, 200, 200]);
    assert_eq!(*annotated.get_pixel(5, 9), tab);
    let text_pixels = (6..64)
        .flat_map(|x| (8..20).map(move |y| (x, y)))
        .filter(|&(x, y)| {
            let p = *annotated.get_pixel(x, y);
            p != tab && p != background
        })
        .count();
    assert!(text_pixels > 0);
}

#[tokio::test]
async fn form_without_image_asks_for_one() {
    let dir = tempfile::tempdir().unwrap();
    let detector = stub(vec![det(2, 0.91)]);
    let app = app_with(loaded(detector.clone()), dir.path());

    let (status, json) = post(app, "/api/form/predict", multipart(None, Some("0.3"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"], "Please upload an image");
    assert!(json["annotated_image"].is_null());
    assert!(detector.thresholds.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_model_is_reported_by_both_front_ends() {
    let dir = tempfile::tempdir().unwrap();
    let failed = || ModelHandle::Failed {
        model: ModelId { onnx_path: "missing.onnx".into() },
        reason: "Not found: model file not found: missing.onnx".into(),
    };

    let (status, body) = get(app_with(failed(), dir.path()), "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["model_loaded"], false);
    assert_eq!(json["model_path"], "missing.onnx");
    assert!(json["error"].as_str().unwrap().contains("missing.onnx"));

    for uri in ["/api/dashboard/detect", "/api/form/predict"] {
        let (status, json) = post(app_with(failed(), dir.path()), uri, multipart(Some(("a.png", png(8, 8))), Some("0.3"))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(json["error_type"], "model_unavailable");
    }
}

#[tokio::test]
async fn missing_model_file_message_has_one_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.onnx").to_string_lossy().into_owned();
    let service = ModelService::new(Arc::new(OnnxModelCatalog::new()), Arc::new(OnnxModelLoader::new()));
    let handle = service.initialize(ModelId { onnx_path: path.clone() }, &YoloParams::default()).await;

    let (_, body) = get(app_with(handle.clone(), dir.path()), "/api/status").await;
    let st: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(st["error"], format!("Not found: model file not found: {path}"));

    let (status, json) = post(app_with(handle, dir.path()), "/api/dashboard/detect", multipart(Some(("a.png", png(8, 8))), Some("0.3"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["message"], format!("Model load failed: Not found: model file not found: {path}"));
}

#[tokio::test]
async fn classes_config_and_status_endpoints() {
    let dir = tempfile::tempdir().unwrap();

    let (_, body) = get(app_with(loaded(stub(vec![])), dir.path()), "/api/classes").await;
    let classes: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(classes["total"], 31);
    assert_eq!(classes["groups"][0]["kind"], "letter");
    assert_eq!(classes["groups"][2]["labels"][0], "Bullseye");

    let (_, body) = get(app_with(loaded(stub(vec![])), dir.path()), "/api/config").await;
    let cfg: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(cfg["confidence"]["step"], 0.05);
    assert_eq!(cfg["debounce_ms"], 250);
    assert_eq!(cfg["accepted_types"], serde_json::json!(["jpg", "jpeg", "png"]));

    let (_, body) = get(app_with(loaded(stub(vec![])), dir.path()), "/api/status").await;
    let st: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(st["model_loaded"], true);
    assert!(st["error"].is_null());
}

#[tokio::test]
async fn examples_only_listed_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let (_, body) = get(app_with(loaded(stub(vec![])), dir.path()), "/api/examples").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["examples"], serde_json::json!([]));

    std::fs::write(dir.path().join("test.jpg"), b"jpeg-bytes").unwrap();
    let (_, body) = get(app_with(loaded(stub(vec![])), dir.path()), "/api/examples").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["examples"][0]["name"], "test.jpg");
    assert_eq!(json["examples"][0]["confidence"], 0.3);

    let (status, bytes) = get(app_with(loaded(stub(vec![])), dir.path()), "/api/examples/test.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"jpeg-bytes");

    let (status, _) = get(app_with(loaded(stub(vec![])), dir.path()), "/api/examples/test2.jpg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
