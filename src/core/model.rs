use anyhow::{anyhow, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Story element category. Known keys get a fixed title; anything else keeps its raw key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Scenes,
    Characters,
    Actions,
    Emotions,
    Other(String),
}

impl Category {
    pub fn from_key(key: &str) -> Self {
        match key {
            "scenes" => Category::Scenes,
            "characters" => Category::Characters,
            "actions" => Category::Actions,
            "emotions" => Category::Emotions,
            other => Category::Other(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Category::Scenes => "scenes",
            Category::Characters => "characters",
            Category::Actions => "actions",
            Category::Emotions => "emotions",
            Category::Other(key) => key,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Category::Scenes => "场景",
            Category::Characters => "角色",
            Category::Actions => "动作",
            Category::Emotions => "情绪",
            Category::Other(key) => key,
        }
    }
}

/// Category → items mapping from `/api/elements`, in the order the server sent the keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementCategoryMap {
    groups: Vec<(Category, Vec<String>)>,
}

impl ElementCategoryMap {
    pub fn iter(&self) -> impl Iterator<Item = (&Category, &[String])> {
        self.groups
            .iter()
            .map(|(category, items)| (category, items.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    // A repeated key replaces the earlier items but keeps its first position,
    // same as a JSON object would.
    fn insert(&mut self, category: Category, items: Vec<String>) {
        match self.groups.iter_mut().find(|(c, _)| *c == category) {
            Some(slot) => slot.1 = items,
            None => self.groups.push((category, items)),
        }
    }
}

impl<K: AsRef<str>, I: IntoIterator<Item = String>> FromIterator<(K, I)> for ElementCategoryMap {
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut map = ElementCategoryMap::default();
        for (key, items) in iter {
            map.insert(Category::from_key(key.as_ref()), items.into_iter().collect());
        }
        map
    }
}

impl<'de> Deserialize<'de> for ElementCategoryMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CategoryMapVisitor;

        impl<'de> Visitor<'de> for CategoryMapVisitor {
            type Value = ElementCategoryMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping category keys to lists of strings")
            }

            fn visit_map<M>(self, mut access: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut map = ElementCategoryMap::default();
                while let Some((key, items)) = access.next_entry::<String, Vec<String>>()? {
                    map.insert(Category::from_key(&key), items);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(CategoryMapVisitor)
    }
}

/// Body of `/api/story`.
///
/// Every field is kept as raw JSON: a `status` or `message` of the wrong type, or a
/// malformed `data` on a `success` status, turns into a story failure rather than a
/// parse failure of the whole body.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryData {
    pub story: String,
}

impl StoryResponse {
    pub fn is_success(&self) -> bool {
        matches!(&self.status, Some(Value::String(s)) if s == "success")
    }

    /// The server's message as display text. Empty, `false`, `0` and `null` count as absent;
    /// other scalars are shown as written.
    pub fn message(&self) -> Option<String> {
        match self.message.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    /// Extracts the story text, or fails with the server's message (or `default_error`).
    pub fn into_story(self, default_error: &str) -> Result<String> {
        let message = self.message();

        if self.is_success() {
            if let Some(data) = self.data.and_then(|d| serde_json::from_value::<StoryData>(d).ok()) {
                return Ok(data.story);
            }
        }

        Err(anyhow!(message.unwrap_or_else(|| default_error.to_string())))
    }
}
