use serde::{Deserialize, Serialize};

use crate::client::{FreeGptClient, FreeGptRequestBuilder, Ready};

/// Response type for listing models via `GET /v1/models`.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ModelEntry {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
    #[serde(default)]
    pub image: Option<bool>,
}

impl ModelList {
    /// Model identifiers in the order the service listed them.
    pub fn ids(&self) -> Vec<String> {
        self.data.iter().map(|m| m.id.clone()).collect()
    }
}

impl FreeGptClient {
    pub fn models(self) -> FreeGptRequestBuilder<Ready, ()> {
        let url = self.url("/v1/models");
        self.client.get(&url).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_list_ids() {
        let list: ModelList = serde_json::from_str(
            r#"{"object":"list","data":[{"id":"gpt-4o-mini","object":"model","owned_by":"OpenAI"},{"id":"flux","image":true}]}"#,
        )
        .unwrap();
        assert_eq!(list.ids(), vec!["gpt-4o-mini", "flux"]);
        assert_eq!(list.data[1].image, Some(true));
    }
}
