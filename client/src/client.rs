use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::{fmt::Display, future::Future, marker::PhantomData, time::Duration};

/// Base URL of a locally running aggregation service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:1337";

/// Represents the state where the request still needs its JSON payload
pub struct PayloadPending;
/// Represents the state where the request can be sent
pub struct Ready;

/// Builder for making requests to the aggregation service endpoints
///
/// # Type Parameters
///
/// * `State` - Whether the payload has been set (PayloadPending or Ready)
/// * `Payload` - The request payload type accepted by the endpoint
pub struct FreeGptRequestBuilder<State, Payload>(
    pub RequestBuilder,
    pub PhantomData<State>,
    pub PhantomData<Payload>,
);

impl From<Client> for FreeGptClient {
    fn from(value: Client) -> Self {
        Self {
            client: value,
            base_url: None,
        }
    }
}

/// A client for interacting with an OpenAI-compatible aggregation service
///
/// Wraps a reqwest::Client. Cloning is cheap and shares the connection pool.
#[derive(Clone, Default)]
pub struct FreeGptClient {
    pub client: Client,
    pub base_url: Option<String>,
}

impl FreeGptClient {
    pub fn new() -> FreeGptClient {
        FreeGptClient::default()
    }

    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            client: Client::new(),
            base_url: Some(base_url.into()),
        }
    }

    /// Joins `path` onto the configured base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    /// Downloads an arbitrary URL, typically an image produced by the image endpoint.
    pub fn download(&self, url: &str, timeout: Duration) -> RequestBuilder {
        self.client.get(url).timeout(timeout)
    }
}

impl<S, T> FreeGptRequestBuilder<S, T> {
    /// Sets the Bearer authentication token (API key) for this request
    pub fn bearer_auth<K: Display>(self, api_key: K) -> Self {
        self.0.bearer_auth(api_key).into()
    }

    /// Applies the Bearer token only when one is configured. Most self-hosted
    /// aggregation services accept anonymous requests.
    pub fn maybe_bearer_auth<K: Display>(self, api_key: Option<K>) -> Self {
        match api_key {
            Some(key) => self.bearer_auth(key),
            None => self,
        }
    }
}

impl<T: Serialize> FreeGptRequestBuilder<PayloadPending, T> {
    /// Sets the JSON payload for the request
    pub fn json(self, payload: T) -> FreeGptRequestBuilder<Ready, T> {
        self.0.json(&payload).into()
    }
}

impl<T> FreeGptRequestBuilder<Ready, T> {
    /// Sends the configured request and returns the raw response.
    ///
    /// Status codes are not inspected here; callers decide how to map them.
    pub fn send(self) -> impl Future<Output = Result<reqwest::Response, reqwest::Error>> {
        self.0.send()
    }
}

impl<S, T> From<RequestBuilder> for FreeGptRequestBuilder<S, T> {
    fn from(value: RequestBuilder) -> Self {
        FreeGptRequestBuilder(value, PhantomData, PhantomData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_uses_default_base() {
        let client = FreeGptClient::new();
        assert_eq!(
            client.url("/v1/models"),
            "http://localhost:1337/v1/models"
        );
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = FreeGptClient::with_base_url("https://g4f.example.org/");
        assert_eq!(
            client.url("/v1/chat/completions"),
            "https://g4f.example.org/v1/chat/completions"
        );
    }
}
