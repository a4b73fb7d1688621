use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{
    client::{FreeGptClient, FreeGptRequestBuilder, PayloadPending},
    error::FreeGptError,
};

/// A request for the image generation endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    /// Either `"url"` or `"b64_json"`.
    pub response_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageRequest {
    /// Request asking for a downloadable URL at the given size.
    pub fn new<M: Into<String>, P: Into<String>>(
        model: M,
        prompt: P,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            response_format: "url".to_string(),
            width: Some(width),
            height: Some(height),
        }
    }

    /// The same request without size hints, accepted by backends that
    /// reject explicit dimensions.
    pub fn without_size(&self) -> Self {
        Self {
            width: None,
            height: None,
            ..self.clone()
        }
    }
}

/// Response of the image generation endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ImageResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// Where the generated picture can be obtained from.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedImage {
    Url(String),
    Bytes(Vec<u8>),
}

impl TryFrom<ImageResponse> for GeneratedImage {
    type Error = FreeGptError;

    fn try_from(value: ImageResponse) -> Result<Self, Self::Error> {
        let first = value.data.into_iter().next().ok_or(FreeGptError::EmptyImage)?;
        match (first.url, first.b64_json) {
            (Some(url), _) if !url.is_empty() => Ok(GeneratedImage::Url(url)),
            (_, Some(encoded)) if !encoded.is_empty() => {
                Ok(GeneratedImage::Bytes(STANDARD.decode(encoded.trim())?))
            }
            _ => Err(FreeGptError::EmptyImage),
        }
    }
}

impl FreeGptClient {
    /// Creates a request builder for the image generation endpoint
    pub fn images(self) -> FreeGptRequestBuilder<PayloadPending, ImageRequest> {
        let url = self.url("/v1/images/generate");
        self.client.post(&url).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_request_serialization() {
        let request = ImageRequest::new("flux", "a red fox", 1024, 1024);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "flux");
        assert_eq!(value["response_format"], "url");
        assert_eq!(value["width"], 1024);

        let minimal = serde_json::to_value(request.without_size()).unwrap();
        assert!(minimal.get("width").is_none());
        assert!(minimal.get("height").is_none());
        assert_eq!(minimal["prompt"], "a red fox");
    }

    #[test]
    fn test_generated_image_prefers_url() {
        let response: ImageResponse = serde_json::from_str(
            r#"{"created":1,"data":[{"url":"https://img.example/1.png","b64_json":null}]}"#,
        )
        .unwrap();
        assert_eq!(
            GeneratedImage::try_from(response).unwrap(),
            GeneratedImage::Url("https://img.example/1.png".to_string())
        );
    }

    #[test]
    fn test_generated_image_from_inline_data() {
        let response: ImageResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"aGVsbG8="}]}"#).unwrap();
        assert_eq!(
            GeneratedImage::try_from(response).unwrap(),
            GeneratedImage::Bytes(b"hello".to_vec())
        );
    }

    #[test]
    fn test_generated_image_errors() {
        let empty = ImageResponse::default();
        assert!(matches!(
            GeneratedImage::try_from(empty),
            Err(FreeGptError::EmptyImage)
        ));

        let bad: ImageResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"***"}]}"#).unwrap();
        assert!(matches!(
            GeneratedImage::try_from(bad),
            Err(FreeGptError::Base64(_))
        ));
    }
}
