use freegpt_client::{FreeGptError, GeneratedImage, ImageRequest};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use log::{error, info, warn};

use crate::config::BotSettings;
use crate::error::BotError;
use crate::provider::ChatBackend;

const JPEG_QUALITY: u8 = 90;

/// Generates a picture for `prompt` and returns it as JPEG.
///
/// A failed first request is retried once without size hints. Every failure
/// is logged and collapses to `None`.
pub async fn generate_jpeg(
    backend: &dyn ChatBackend,
    settings: &BotSettings,
    prompt: &str,
) -> Option<Vec<u8>> {
    info!("Image requested for prompt: {prompt}");

    let request = ImageRequest::new(
        &settings.image_model,
        prompt,
        settings.image_width,
        settings.image_height,
    );
    let generated = match backend.generate_image(&request).await {
        Ok(generated) => generated,
        Err(e) => {
            warn!("Image generation failed, retrying without size: {e}");
            match backend.generate_image(&request.without_size()).await {
                Ok(generated) => generated,
                Err(e) => {
                    error!("Image generation failed: {e}");
                    return None;
                }
            }
        }
    };

    match render(backend, settings, generated).await {
        Ok(jpeg) => Some(jpeg),
        Err(e) => {
            error!("Could not prepare generated image [{}]: {e}", e.error_code());
            None
        }
    }
}

async fn render(
    backend: &dyn ChatBackend,
    settings: &BotSettings,
    generated: GeneratedImage,
) -> Result<Vec<u8>, BotError> {
    let raw = match generated {
        GeneratedImage::Url(url) => {
            info!("Downloading generated image from {url}");
            backend
                .fetch_image(&url, settings.image_fetch_timeout())
                .await?
                .to_vec()
        }
        GeneratedImage::Bytes(bytes) => bytes,
    };
    if raw.is_empty() {
        return Err(FreeGptError::EmptyImage.into());
    }
    Ok(to_jpeg(&raw)?)
}

/// Decodes any supported image format and re-encodes it as RGB JPEG.
pub fn to_jpeg(raw: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let rgb = image::load_from_memory(raw)?.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&DynamicImage::ImageRgb8(rgb))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use freegpt_client::{ChatMessage, RawReply};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::Duration;

    fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Fails the first `failures` generation requests, then answers with a URL.
    struct ScriptedImages {
        failures: usize,
        requests: Mutex<Vec<ImageRequest>>,
        download: Vec<u8>,
    }

    #[async_trait]
    impl ChatBackend for ScriptedImages {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _stream: bool,
        ) -> Result<RawReply, FreeGptError> {
            unreachable!("text completion not used")
        }

        async fn generate_image(
            &self,
            request: &ImageRequest,
        ) -> Result<GeneratedImage, FreeGptError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            if requests.len() <= self.failures {
                Err(FreeGptError::Api {
                    status: 500,
                    message: "busy".to_string(),
                })
            } else {
                Ok(GeneratedImage::Url("https://images.example.org/1.png".to_string()))
            }
        }

        async fn fetch_image(&self, _url: &str, timeout: Duration) -> Result<Bytes, FreeGptError> {
            assert_eq!(timeout, Duration::from_secs(60));
            Ok(Bytes::from(self.download.clone()))
        }

        async fn list_models(&self) -> Result<Vec<String>, FreeGptError> {
            Ok(Vec::new())
        }
    }

    fn backend(failures: usize, download: Vec<u8>) -> ScriptedImages {
        ScriptedImages {
            failures,
            requests: Mutex::new(Vec::new()),
            download,
        }
    }

    #[test]
    fn test_png_is_reencoded_as_jpeg() {
        let jpeg = to_jpeg(&png_bytes()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(to_jpeg(b"<html>not an image</html>").is_err());
    }

    #[tokio::test]
    async fn test_first_attempt_uses_configured_size() {
        let backend = backend(0, png_bytes());
        let jpeg = generate_jpeg(&backend, &BotSettings::default(), "a fox").await;

        assert!(jpeg.is_some());
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "flux");
        assert_eq!(requests[0].width, Some(1024));
    }

    #[tokio::test]
    async fn test_retries_without_size_once() {
        let backend = backend(1, png_bytes());
        let jpeg = generate_jpeg(&backend, &BotSettings::default(), "a fox").await;

        assert!(jpeg.is_some());
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].width, None);
        assert_eq!(requests[1].prompt, "a fox");
    }

    #[tokio::test]
    async fn test_two_failures_give_none() {
        let backend = backend(2, png_bytes());
        assert!(generate_jpeg(&backend, &BotSettings::default(), "a fox").await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_download_gives_none() {
        let backend = backend(0, b"not an image".to_vec());
        assert!(generate_jpeg(&backend, &BotSettings::default(), "a fox").await.is_none());
    }
}
