//! Scraped content records consumed by the indexing pipeline.

use serde::{Deserialize, Serialize};

use crate::utils::{content_id, non_empty};

/// A scraped product page as stored by the content store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
}

impl ContentRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }

    pub fn price(&self) -> Option<&str> {
        non_empty(self.price.as_deref())
    }

    pub fn main_image(&self) -> Option<&str> {
        non_empty(self.main_image.as_deref())
    }

    /// Deterministic identifier shared by every vector of this record.
    ///
    /// Derived from the URL, or the record id when there is no URL. A record
    /// with neither gets a random id, so it can never be deduplicated.
    pub fn content_id(&self) -> String {
        match self.url().or_else(|| non_empty(Some(self.id.as_str()))) {
            Some(source) => content_id(source),
            None => content_id(&uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Human-readable label for logs.
    pub fn label(&self) -> &str {
        self.url().unwrap_or(&self.id)
    }
}
