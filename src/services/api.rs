use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use url::Url;

use crate::core::model::{ElementCategoryMap, StoryResponse};

#[cfg(target_arch = "wasm32")]
pub trait ApiBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> ApiBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait ApiBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> ApiBounds for T {}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait StoryApi: ApiBounds {
    async fn fetch_elements(&self) -> Result<ElementCategoryMap>;
    async fn fetch_story(&self) -> Result<StoryResponse>;
}

pub const ELEMENTS_PATH: &str = "api/elements";
pub const STORY_PATH: &str = "api/story";

/// `StoryApi` over HTTP. Uses the browser's fetch on wasm and a native client elsewhere.
#[derive(Debug, Clone)]
pub struct HttpStoryApi {
    client: reqwest::Client,
    elements_url: Url,
    story_url: Url,
}

impl HttpStoryApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL: {}", base_url))?;
        // Without a trailing slash `join` would replace the last path segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            elements_url: base.join(ELEMENTS_PATH)?,
            story_url: base.join(STORY_PATH)?,
        })
    }

    pub fn elements_url(&self) -> &Url {
        &self.elements_url
    }

    pub fn story_url(&self) -> &Url {
        &self.story_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))?;

        // A JSON error body on a non-2xx status still carries the server's message.
        match serde_json::from_str::<T>(&body) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(anyhow!("{} returned HTTP {}", url, status)),
            Err(e) => Err(anyhow!("Failed to parse response from {}: {}", url, e)),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl StoryApi for HttpStoryApi {
    async fn fetch_elements(&self) -> Result<ElementCategoryMap> {
        self.get_json(&self.elements_url).await
    }

    async fn fetch_story(&self) -> Result<StoryResponse> {
        self.get_json(&self.story_url).await
    }
}
