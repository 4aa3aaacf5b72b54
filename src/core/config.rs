use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub elements: ElementIds,

    #[serde(default)]
    pub labels: Labels,

    /// Where the native runner writes the rendered page.
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

/// DOM ids of the three handles the page binds to.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ElementIds {
    #[serde(default = "default_trigger_id")]
    pub trigger_id: String,
    #[serde(default = "default_story_id")]
    pub story_id: String,
    #[serde(default = "default_elements_id")]
    pub elements_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Labels {
    #[serde(default = "default_idle_label")]
    pub idle: String,
    #[serde(default = "default_busy_label")]
    pub busy: String,
    #[serde(default = "default_error_message")]
    pub default_error: String,
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000/".to_string()
}
fn default_output_file() -> String {
    "story.html".to_string()
}
fn default_trigger_id() -> String {
    "generate-btn".to_string()
}
fn default_story_id() -> String {
    "story-content".to_string()
}
fn default_elements_id() -> String {
    "elements-content".to_string()
}
fn default_idle_label() -> String {
    "生成新故事".to_string()
}
fn default_busy_label() -> String {
    "生成中...".to_string()
}
fn default_error_message() -> String {
    "生成故事失败".to_string()
}
fn default_error_prefix() -> String {
    "生成故事时发生错误: ".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            elements: ElementIds::default(),
            labels: Labels::default(),
            output_file: default_output_file(),
        }
    }
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            trigger_id: default_trigger_id(),
            story_id: default_story_id(),
            elements_id: default_elements_id(),
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            idle: default_idle_label(),
            busy: default_busy_label(),
            default_error: default_error_message(),
            error_prefix: default_error_prefix(),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid "all defaults" config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content).context("Failed to parse config.yml")
    }

    /// Reads `config.yml` from the working directory, falling back to defaults when it is absent.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.yml"))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using default settings", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }
}
