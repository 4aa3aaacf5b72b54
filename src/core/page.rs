#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result};
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::core::config::{ElementIds, Labels};
use crate::utils::html::escape_html;

#[cfg(target_arch = "wasm32")]
pub trait PageBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> PageBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait PageBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> PageBounds for T {}

/// The three UI handles both flows write to.
pub trait Page: PageBounds {
    /// Replaces the whole content of the elements container.
    fn set_elements_html(&self, html: &str);
    /// Replaces the whole content of the story container.
    fn set_story_html(&self, html: &str);
    fn set_trigger(&self, enabled: bool, label: &str);
}

/// Trigger held in its busy state. Dropping it re-enables the control with the idle label,
/// whichever way the holder exits.
pub struct BusyTrigger<'a, P: Page + ?Sized> {
    page: &'a P,
    idle_label: &'a str,
}

impl<'a, P: Page + ?Sized> BusyTrigger<'a, P> {
    pub fn acquire(page: &'a P, labels: &'a Labels) -> Self {
        page.set_trigger(false, &labels.busy);
        Self {
            page,
            idle_label: &labels.idle,
        }
    }
}

impl<P: Page + ?Sized> Drop for BusyTrigger<'_, P> {
    fn drop(&mut self) {
        self.page.set_trigger(true, self.idle_label);
    }
}

// --- Snapshot Implementation ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerState {
    pub enabled: bool,
    pub label: String,
}

#[derive(Debug)]
struct Snapshot {
    elements_html: String,
    story_html: String,
    trigger: TriggerState,
}

/// In-memory page. The native runner renders it into a standalone HTML document.
#[derive(Debug)]
pub struct SnapshotPage {
    inner: Mutex<Snapshot>,
}

impl SnapshotPage {
    pub fn new(idle_label: &str) -> Self {
        Self {
            inner: Mutex::new(Snapshot {
                elements_html: String::new(),
                story_html: String::new(),
                trigger: TriggerState {
                    enabled: true,
                    label: idle_label.to_string(),
                },
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        // Every write is a single assignment, so a poisoned lock still holds a usable snapshot.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn elements_html(&self) -> String {
        self.lock().elements_html.clone()
    }

    pub fn story_html(&self) -> String {
        self.lock().story_html.clone()
    }

    pub fn trigger(&self) -> TriggerState {
        self.lock().trigger.clone()
    }

    pub fn to_document(&self, ids: &ElementIds) -> String {
        let snapshot = self.lock();
        let disabled = if snapshot.trigger.enabled { "" } else { " disabled" };

        format!(
            r#"<!DOCTYPE html>
<html lang="zh">
<head>
<meta charset="utf-8">
<title>随机故事生成器</title>
<style>
.fade-in {{ animation: fadeIn 1s ease-in; }}
@keyframes fadeIn {{ from {{ opacity: 0; }} to {{ opacity: 1; }} }}
.element-item {{ display: inline-block; margin: 0 6px 6px 0; }}
.alert-danger {{ color: #842029; }}
</style>
</head>
<body>
<button id="{trigger_id}"{disabled}>{label}</button>
<div id="{story_id}">{story}</div>
<div id="{elements_id}">{elements}</div>
</body>
</html>
"#,
            trigger_id = escape_html(&ids.trigger_id),
            disabled = disabled,
            label = escape_html(&snapshot.trigger.label),
            story_id = escape_html(&ids.story_id),
            story = snapshot.story_html,
            elements_id = escape_html(&ids.elements_id),
            elements = snapshot.elements_html,
        )
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SnapshotPage {
    /// Writes `to_document` to `path`, creating missing parent directories.
    pub async fn write_document(&self, ids: &ElementIds, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        tokio::fs::write(path, self.to_document(ids))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl Page for SnapshotPage {
    fn set_elements_html(&self, html: &str) {
        self.lock().elements_html = html.to_string();
    }

    fn set_story_html(&self, html: &str) {
        self.lock().story_html = html.to_string();
    }

    fn set_trigger(&self, enabled: bool, label: &str) {
        self.lock().trigger = TriggerState {
            enabled,
            label: label.to_string(),
        };
    }
}
