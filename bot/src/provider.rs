use async_trait::async_trait;
use bytes::Bytes;
use freegpt_client::{
    ChatMessage, ChatRequest, FreeGptClient, FreeGptError, GeneratedImage, ImageRequest,
    ImageResponse, ModelList, RawReply,
};
use log::debug;
use std::time::Duration;

/// Everything the bot needs from the aggregation service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends a chat completion and classifies whatever comes back.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<RawReply, FreeGptError>;

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, FreeGptError>;

    /// Downloads a generated image, giving up after `timeout`.
    async fn fetch_image(&self, url: &str, timeout: Duration) -> Result<Bytes, FreeGptError>;

    async fn list_models(&self) -> Result<Vec<String>, FreeGptError>;
}

/// [`ChatBackend`] over the HTTP API of the aggregation service.
#[derive(Clone)]
pub struct FreeGptProvider {
    pub client: FreeGptClient,
    pub api_key: Option<String>,
}

impl FreeGptProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: FreeGptClient::with_base_url(base_url),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for FreeGptProvider {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<RawReply, FreeGptError> {
        let request = ChatRequest::builder()
            .model(model)
            .messages(messages.iter().cloned())
            .stream(stream)
            .build();
        debug!(
            "Requesting completion from {model} with {} messages (stream: {stream})",
            messages.len()
        );

        let response = self
            .client
            .clone()
            .chat()
            .maybe_bearer_auth(self.api_key.as_ref())
            .json(request)
            .send()
            .await?;

        RawReply::from_response(map_status_errors(response).await?).await
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, FreeGptError> {
        debug!("Requesting image from {}", request.model);
        let response = self
            .client
            .clone()
            .images()
            .maybe_bearer_auth(self.api_key.as_ref())
            .json(request.clone())
            .send()
            .await?;

        let body = map_status_errors(response)
            .await?
            .json::<ImageResponse>()
            .await?;
        GeneratedImage::try_from(body)
    }

    async fn fetch_image(&self, url: &str, timeout: Duration) -> Result<Bytes, FreeGptError> {
        let response = self.client.download(url, timeout).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FreeGptError::Api {
                status: status.as_u16(),
                message: format!("image download returned {status}"),
            });
        }
        Ok(response.bytes().await?)
    }

    async fn list_models(&self) -> Result<Vec<String>, FreeGptError> {
        let response = self
            .client
            .clone()
            .models()
            .maybe_bearer_auth(self.api_key.as_ref())
            .send()
            .await?;

        let list = map_status_errors(response)
            .await?
            .json::<ModelList>()
            .await?;
        Ok(list.ids())
    }
}

/// Turns 4xx/5xx responses into errors, passing successful ones through.
async fn map_status_errors(response: reqwest::Response) -> Result<reqwest::Response, FreeGptError> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(FreeGptError::from_status(status.as_u16(), &body));
    }
    Ok(response)
}
