//! Google Cloud Vision text detection adapter.
//!
//! Builds the `images:annotate` request, performs the call, and turns the
//! response into [`RawDetection`]s for the layout projector. The first
//! annotation of a response is the full-image aggregate and is skipped.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::layout::{RawDetection, Vertex};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default `images:annotate` endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Top-level request body.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<ImageRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_context: Option<ImageContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageContent {
    /// Base64-encoded image bytes.
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContext {
    pub language_hints: Vec<String>,
}

impl AnnotateRequest {
    /// A single-image `TEXT_DETECTION` request.
    pub fn text_detection(content: String, language_hints: &[String]) -> Self {
        let image_context = (!language_hints.is_empty()).then(|| ImageContext {
            language_hints: language_hints.to_vec(),
        });
        Self {
            requests: vec![ImageRequest {
                image: ImageContent { content },
                features: vec![Feature {
                    kind: "TEXT_DETECTION".to_string(),
                    max_results: 1,
                }],
                image_context,
            }],
        }
    }
}

/// Top-level response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<ImageResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_annotations: Option<Vec<TextAnnotation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bounding_poly: BoundingPoly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<PolyVertex>,
}

/// The service omits coordinates equal to zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PolyVertex {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// Error status embedded in a response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Status,
}

impl AnnotateResponse {
    /// Parses a response body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Per-word detections of the first image, without the aggregate.
    ///
    /// # Errors
    /// Returns [`AppError::VisionApi`] if the service reported an error for
    /// the image.
    pub fn detections(&self) -> Result<Vec<RawDetection>> {
        let Some(first) = self.responses.first() else {
            return Ok(Vec::new());
        };
        if let Some(status) = &first.error {
            return Err(AppError::vision(format!(
                "{} (code {})",
                status.message, status.code
            )));
        }
        let detections: Vec<RawDetection> = first
            .text_annotations
            .iter()
            .flatten()
            .skip(1)
            .map(|annotation| RawDetection {
                text: annotation.description.clone(),
                vertices: annotation
                    .bounding_poly
                    .vertices
                    .iter()
                    .map(|v| Vertex::new(v.x, v.y))
                    .collect(),
            })
            .collect();
        debug!(count = detections.len(), "Extracted detections");
        Ok(detections)
    }
}

/// HTTP client for the Vision API.
pub struct VisionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language_hints: Vec<String>,
}

impl VisionClient {
    /// # Errors
    /// Returns [`AppError::MissingEnvVar`] if no API key is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .vision_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::MissingEnvVar("VISION_API_KEY".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
            language_hints: config.language_hints.clone(),
        })
    }

    /// Sends a base64-encoded image for text detection.
    #[instrument(skip(self, base64_image), fields(endpoint = %self.endpoint))]
    pub async fn annotate(&self, base64_image: String) -> Result<AnnotateResponse> {
        let body = AnnotateRequest::text_detection(base64_image, &self.language_hints);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        AnnotateResponse::from_json(&check_status(status, text)?)
    }
}

/// Maps a non-success HTTP status to an error, passing successful bodies
/// through.
fn check_status(status: StatusCode, body: String) -> Result<String> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::RateLimited);
    }
    if !status.is_success() {
        return Err(AppError::VisionStatus {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or(body),
        });
    }
    Ok(body)
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const RESPONSE: &str = r#"{
      "responses": [{
        "textAnnotations": [
          { "description": "Hello world", "boundingPoly": { "vertices": [
              {"x": 10, "y": 10}, {"x": 200, "y": 10}, {"x": 200, "y": 40}, {"x": 10, "y": 40}] } },
          { "description": "Hello", "boundingPoly": { "vertices": [
              {}, {"x": 90}, {"x": 90, "y": 40}, {"y": 40}] } },
          { "description": "world", "boundingPoly": { "vertices": [
              {"x": 110, "y": 10}, {"x": 200, "y": 10}, {"x": 200, "y": 40}] } }
        ]
      }]
    }"#;

    #[test]
    fn skips_aggregate_annotation() {
        let response = AnnotateResponse::from_json(RESPONSE).unwrap();
        let detections = response.detections().unwrap();
        let texts: Vec<_> = detections.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "world"]);
    }

    #[test]
    fn missing_coordinates_default_to_zero() {
        let response = AnnotateResponse::from_json(RESPONSE).unwrap();
        let hello = &response.detections().unwrap()[0];
        assert_eq!(
            hello.vertices,
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(90.0, 0.0),
                Vertex::new(90.0, 40.0),
                Vertex::new(0.0, 40.0),
            ]
        );
    }

    #[test]
    fn short_polygons_are_passed_through_for_the_projector() {
        let response = AnnotateResponse::from_json(RESPONSE).unwrap();
        assert_eq!(response.detections().unwrap()[1].vertices.len(), 3);
    }

    #[test]
    fn no_text_is_an_empty_list() {
        for body in [r#"{"responses": [{}]}"#, r#"{"responses": []}"#, "{}"] {
            let response = AnnotateResponse::from_json(body).unwrap();
            assert!(response.detections().unwrap().is_empty());
        }
    }

    #[test]
    fn embedded_error_is_reported() {
        let body = r#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#;
        let error = AnnotateResponse::from_json(body)
            .unwrap()
            .detections()
            .unwrap_err();
        assert!(matches!(error, AppError::VisionApi(msg) if msg.contains("Bad image data.")));
    }

    #[test]
    fn request_has_text_detection_shape() {
        let request = AnnotateRequest::text_detection("QUJD".into(), &[]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "requests": [{
                    "image": { "content": "QUJD" },
                    "features": [{ "type": "TEXT_DETECTION", "maxResults": 1 }]
                }]
            })
        );
    }

    #[test]
    fn request_carries_language_hints() {
        let request = AnnotateRequest::text_detection("QUJD".into(), &["en".into(), "ja".into()]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["requests"][0]["imageContext"],
            json!({ "languageHints": ["en", "ja"] })
        );
    }

    #[test]
    fn extracts_http_error_message() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid."}}"#;
        assert_eq!(error_message(body).as_deref(), Some("API key not valid."));
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded."}}"#;
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS, body.to_string()),
            Err(AppError::RateLimited)
        ));
    }

    #[test]
    fn error_status_uses_json_message() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid."}}"#;
        match check_status(StatusCode::FORBIDDEN, body.to_string()) {
            Err(AppError::VisionStatus { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn error_status_falls_back_to_raw_body() {
        let body = "<html>Internal error</html>";
        match check_status(StatusCode::INTERNAL_SERVER_ERROR, body.to_string()) {
            Err(AppError::VisionStatus { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, body);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn success_passes_body_through() {
        let body = check_status(StatusCode::OK, RESPONSE.to_string()).unwrap();
        assert_eq!(body, RESPONSE);
    }

    #[test]
    fn client_requires_api_key() {
        let config = Config::builder().build().unwrap();
        assert!(matches!(
            VisionClient::new(&config),
            Err(AppError::MissingEnvVar(_))
        ));
        let config = Config::builder().with_api_key("secret").build().unwrap();
        assert!(VisionClient::new(&config).is_ok());
    }
}
