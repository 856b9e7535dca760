//! AI image editing.
//!
//! `edit_image` checks its inputs before anything touches the network, then
//! hands off to an [`ImageEditor`]. [`GeminiImageEditor`] is the production
//! backend: one `generateContent` call per edit, no retry.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ImageEditConfig;
use crate::error::ImageEditError;
use crate::image::ImagePayload;

/// A backend that rewrites an image according to a text instruction.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, image: &ImagePayload, instruction: &str) -> Result<ImagePayload, ImageEditError>;
}

/// Run one edit.
///
/// Fails with `MissingInput` when there is no image or the trimmed
/// instruction is empty, and with `NotConfigured` when there is no backend.
/// Backend failures are logged here with their cause.
pub async fn edit_image(
    editor: Option<&dyn ImageEditor>,
    image: Option<&ImagePayload>,
    instruction: &str,
) -> Result<ImagePayload, ImageEditError> {
    let instruction = instruction.trim();
    let image = match image {
        Some(image) if !instruction.is_empty() => image,
        _ => return Err(ImageEditError::MissingInput),
    };
    let Some(editor) = editor else {
        error!("image edit requested but no API key is configured");
        return Err(ImageEditError::NotConfigured);
    };

    debug!(mime = image.mime_type(), "sending image edit request");
    match editor.edit(image, instruction).await {
        Ok(edited) => {
            info!(result = %edited, "image edit finished");
            Ok(edited)
        }
        Err(e) => {
            error!(error = %e, "image edit failed");
            Err(e)
        }
    }
}

/// Google Gemini image model over its REST API.
pub struct GeminiImageEditor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiImageEditor {
    pub fn new(config: &ImageEditConfig, api_key: impl Into<String>) -> Result<Self, ImageEditError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Build the backend from config, or `None` (with one warning) when no
    /// credential is set. Only image editing is affected.
    pub fn from_config(config: &ImageEditConfig) -> Option<Self> {
        let Some(key) = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) else {
            warn!("no API key configured, image editing is disabled");
            return None;
        };
        match Self::new(config, key) {
            Ok(editor) => Some(editor),
            Err(e) => {
                error!(error = %e, "cannot build image edit client, image editing is disabled");
                None
            }
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageEditor for GeminiImageEditor {
    async fn edit(&self, image: &ImagePayload, instruction: &str) -> Result<ImagePayload, ImageEditError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Inline {
                        inline_data: InlineDataRef {
                            mime_type: image.mime_type(),
                            data: image.base64_data(),
                        },
                    },
                    RequestPart::Text { text: instruction },
                ],
            }],
            generation_config: GenerationConfig { response_modalities: vec!["IMAGE"] },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ImageEditError::Service { status: status.as_u16(), body });
        }

        let text = resp.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| ImageEditError::Malformed(e.to_string()))?;
        parsed.first_image().ok_or(ImageEditError::NoImage)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataRef<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataRef<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateResponse {
    /// The first inline image of the first candidate.
    fn first_image(self) -> Option<ImagePayload> {
        let content = self.candidates.into_iter().next()?.content?;
        content
            .parts
            .into_iter()
            .filter_map(|p| p.inline_data)
            .find(|d| !d.data.is_empty())
            .map(|d| ImagePayload::from_base64(&d.mime_type, &d.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

    fn photo() -> ImagePayload {
        ImagePayload::from_base64("image/png", "AAAA")
    }

    fn gemini(base_url: &str) -> GeminiImageEditor {
        let config = ImageEditConfig { base_url: base_url.to_string(), ..Default::default() };
        GeminiImageEditor::new(&config, "test-key").unwrap()
    }

    struct CountingEditor(AtomicUsize);

    #[async_trait]
    impl ImageEditor for CountingEditor {
        async fn edit(&self, image: &ImagePayload, _: &str) -> Result<ImagePayload, ImageEditError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(image.clone())
        }
    }

    #[tokio::test]
    async fn missing_image_never_calls_backend() {
        let counter = CountingEditor(AtomicUsize::new(0));
        let err = edit_image(Some(&counter), None, "make it blue").await.unwrap_err();
        assert!(matches!(err, ImageEditError::MissingInput));
        assert_eq!(err.user_message(), crate::error::IMAGE_EDIT_MISSING_INPUT);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_prompt_never_calls_backend() {
        let counter = CountingEditor(AtomicUsize::new(0));
        let err = edit_image(Some(&counter), Some(&photo()), "   ").await.unwrap_err();
        assert!(matches!(err, ImageEditError::MissingInput));
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_backend_is_not_configured() {
        let err = edit_image(None, Some(&photo()), "crop").await.unwrap_err();
        assert!(matches!(err, ImageEditError::NotConfigured));
        assert_eq!(err.user_message(), crate::error::IMAGE_EDIT_FAILED);
    }

    #[tokio::test]
    async fn missing_input_makes_no_http_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", PATH).expect(0).create_async().await;
        let editor = gemini(&server.url());
        let err = edit_image(Some(&editor), None, "crop").await.unwrap_err();
        assert!(matches!(err, ImageEditError::MissingInput));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_image_and_prompt_and_returns_edited_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                    {"text": "make it blue"}
                ]}],
                "generationConfig": {"responseModalities": ["IMAGE"]}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates": [{"content": {"parts": [
                    {"text": "here you go"},
                    {"inlineData": {"mimeType": "image/webp", "data": "QkJCQg=="}}
                ]}}]})
                .to_string(),
            )
            .create_async()
            .await;

        let editor = gemini(&server.url());
        let edited = edit_image(Some(&editor), Some(&photo()), "  make it blue ").await.unwrap();
        assert_eq!(edited.as_str(), "data:image/webp;base64,QkJCQg==");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn service_error_is_reported_with_generic_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let editor = gemini(&server.url());
        let err = edit_image(Some(&editor), Some(&photo()), "crop").await.unwrap_err();
        assert!(matches!(err, ImageEditError::Service { status: 500, .. }));
        assert_eq!(err.user_message(), crate::error::IMAGE_EDIT_FAILED);
    }

    #[tokio::test]
    async fn response_without_image_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(json!({"candidates": [{"content": {"parts": [{"text": "no"}]}}]}).to_string())
            .create_async()
            .await;

        let editor = gemini(&server.url());
        let err = edit_image(Some(&editor), Some(&photo()), "crop").await.unwrap_err();
        assert!(matches!(err, ImageEditError::NoImage));
        assert_eq!(err.to_string(), "No image was returned");
    }

    #[tokio::test]
    async fn garbage_response_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", PATH).with_status(200).with_body("<html>").create_async().await;

        let editor = gemini(&server.url());
        let err = edit_image(Some(&editor), Some(&photo()), "crop").await.unwrap_err();
        assert!(matches!(err, ImageEditError::Malformed(_)));
    }

    #[test]
    fn no_key_disables_backend() {
        assert!(GeminiImageEditor::from_config(&ImageEditConfig::default()).is_none());
        let config = ImageEditConfig { api_key: Some("k".into()), ..Default::default() };
        assert!(GeminiImageEditor::from_config(&config).is_some());
    }
}
