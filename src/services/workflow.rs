use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;

use crate::core::config::Labels;
use crate::core::page::{BusyTrigger, Page};
use crate::services::api::StoryApi;
use crate::services::render::{render_elements, render_error, render_story};

/// Drives the two request/render flows against one page.
///
/// The flows share nothing but the page handles, so they may run concurrently.
pub struct StoryWorkflow {
    api: Arc<dyn StoryApi>,
    page: Arc<dyn Page>,
    labels: Labels,
}

impl StoryWorkflow {
    pub fn new(api: Arc<dyn StoryApi>, page: Arc<dyn Page>, labels: Labels) -> Self {
        Self { api, page, labels }
    }

    /// Fetches the element categories and replaces the elements container.
    /// Failures are only logged; the container keeps whatever it showed before.
    pub async fn load_elements(&self) {
        match self.api.fetch_elements().await {
            Ok(elements) => {
                info!(
                    "Loaded {} story element categories ({} items)",
                    elements.len(),
                    elements.item_count()
                );
                self.page.set_elements_html(&render_elements(&elements));
            }
            Err(e) => error!("加载故事元素失败: {:#}", e),
        }
    }

    /// Requests a new story and renders it, or an error panel, into the story container.
    /// The trigger is disabled for the duration and always restored afterwards.
    pub async fn generate_story(&self) {
        let _busy = BusyTrigger::acquire(self.page.as_ref(), &self.labels);

        let html = match self.request_story().await {
            Ok(story) => {
                info!("Story generated ({} chars)", story.chars().count());
                render_story(&story)
            }
            Err(e) => {
                let message = format!("{:#}", e);
                warn!("生成故事失败: {}", message);
                render_error(&self.labels.error_prefix, &message)
            }
        };
        self.page.set_story_html(&html);
    }

    async fn request_story(&self) -> Result<String> {
        let response = self.api.fetch_story().await?;
        response.into_story(&self.labels.default_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ElementCategoryMap, StoryResponse};
    use crate::core::page::{SnapshotPage, TriggerState};
    use crate::services::api::test_server::refused_base_url;
    use crate::services::api::HttpStoryApi;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Reply {
        Json(&'static str),
        Fail(&'static str),
    }

    // Mock API that records the trigger state seen while each request is in flight.
    struct MockApi {
        elements: Reply,
        story: Reply,
        page: Arc<SnapshotPage>,
        seen_during_story: Mutex<Vec<TriggerState>>,
    }

    impl MockApi {
        fn new(page: Arc<SnapshotPage>, elements: Reply, story: Reply) -> Self {
            Self {
                elements,
                story,
                page,
                seen_during_story: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StoryApi for MockApi {
        async fn fetch_elements(&self) -> Result<ElementCategoryMap> {
            match self.elements {
                Reply::Json(json) => Ok(serde_json::from_str(json)?),
                Reply::Fail(msg) => Err(anyhow!(msg)),
            }
        }

        async fn fetch_story(&self) -> Result<StoryResponse> {
            self.seen_during_story.lock().unwrap().push(self.page.trigger());
            match self.story {
                Reply::Json(json) => Ok(serde_json::from_str(json)?),
                Reply::Fail(msg) => Err(anyhow!(msg)),
            }
        }
    }

    // Page that records every write in order.
    #[derive(Default)]
    struct RecordingPage {
        events: Mutex<Vec<String>>,
    }

    impl Page for RecordingPage {
        fn set_elements_html(&self, html: &str) {
            self.events.lock().unwrap().push(format!("elements:{}", html));
        }
        fn set_story_html(&self, html: &str) {
            self.events.lock().unwrap().push(format!("story:{}", html));
        }
        fn set_trigger(&self, enabled: bool, label: &str) {
            self.events.lock().unwrap().push(format!("trigger:{}:{}", enabled, label));
        }
    }

    fn setup(elements: Reply, story: Reply) -> (StoryWorkflow, Arc<SnapshotPage>, Arc<MockApi>) {
        let labels = Labels::default();
        let page = Arc::new(SnapshotPage::new(&labels.idle));
        let api = Arc::new(MockApi::new(page.clone(), elements, story));
        let workflow = StoryWorkflow::new(api.clone(), page.clone(), labels);
        (workflow, page, api)
    }

    fn idle() -> TriggerState {
        TriggerState { enabled: true, label: "生成新故事".to_string() }
    }

    fn busy() -> TriggerState {
        TriggerState { enabled: false, label: "生成中...".to_string() }
    }

    #[tokio::test]
    async fn test_load_elements_renders_groups() {
        let (workflow, page, _) = setup(
            Reply::Json(r#"{"scenes": ["forest", "castle"], "characters": ["knight"]}"#),
            Reply::Fail("unused"),
        );

        workflow.load_elements().await;

        let html = page.elements_html();
        assert!(html.contains("<h5>场景</h5>"));
        assert!(html.contains("<h5>角色</h5>"));
        assert_eq!(html.matches("element-item").count(), 3);
        assert_eq!(page.trigger(), idle());
    }

    #[tokio::test]
    async fn test_load_elements_failure_keeps_previous_content() {
        let (workflow, page, _) = setup(Reply::Fail("connection refused"), Reply::Fail("unused"));
        page.set_elements_html("<p>previous</p>");

        workflow.load_elements().await;

        assert_eq!(page.elements_html(), "<p>previous</p>");
        assert_eq!(page.story_html(), "");
    }

    #[tokio::test]
    async fn test_load_elements_malformed_payload_is_swallowed() {
        let (workflow, page, _) = setup(Reply::Json(r#"{"scenes": "forest"}"#), Reply::Fail("unused"));

        workflow.load_elements().await;

        assert_eq!(page.elements_html(), "");
    }

    #[tokio::test]
    async fn test_load_elements_replaces_previous_content() {
        let (workflow, page, _) = setup(Reply::Json(r#"{"emotions": ["喜悦"]}"#), Reply::Fail("unused"));
        page.set_elements_html("<p>stale</p>");

        workflow.load_elements().await;

        let html = page.elements_html();
        assert!(!html.contains("stale"));
        assert!(html.contains("<h5>情绪</h5>"));
    }

    #[tokio::test]
    async fn test_generate_story_success() {
        let (workflow, page, api) = setup(
            Reply::Fail("unused"),
            Reply::Json(r#"{"status": "success", "data": {"story": "A.\nB."}}"#),
        );

        workflow.generate_story().await;

        assert_eq!(page.story_html(), "<div class=\"fade-in\"><p>A.</p><p>B.</p></div>");
        assert_eq!(*api.seen_during_story.lock().unwrap(), vec![busy()]);
        assert_eq!(page.trigger(), idle());
    }

    #[tokio::test]
    async fn test_generate_story_error_status() {
        let (workflow, page, api) = setup(
            Reply::Fail("unused"),
            Reply::Json(r#"{"status": "error", "message": "quota exceeded"}"#),
        );

        workflow.generate_story().await;

        let html = page.story_html();
        assert!(html.starts_with("<div class=\"alert alert-danger\">"));
        assert!(html.contains("生成故事时发生错误: quota exceeded"));
        assert_eq!(*api.seen_during_story.lock().unwrap(), vec![busy()]);
        assert_eq!(page.trigger(), idle());
    }

    #[tokio::test]
    async fn test_generate_story_default_message() {
        let (workflow, page, _) = setup(Reply::Fail("unused"), Reply::Json(r#"{"status": "success"}"#));

        workflow.generate_story().await;

        assert!(page.story_html().contains("生成故事失败"));
        assert_eq!(page.trigger(), idle());
    }

    #[tokio::test]
    async fn test_generate_story_malformed_json() {
        let (workflow, page, _) = setup(Reply::Fail("unused"), Reply::Json(r#"{"status": "succ"#));

        workflow.generate_story().await;

        assert!(page.story_html().contains("alert-danger"));
        assert_eq!(page.trigger(), idle());
    }

    #[tokio::test]
    async fn test_generate_story_non_string_status_shows_message() {
        let (workflow, page, api) = setup(
            Reply::Fail("unused"),
            Reply::Json(r#"{"status": 7, "message": "quota exceeded"}"#),
        );

        workflow.generate_story().await;

        assert!(page.story_html().contains("生成故事时发生错误: quota exceeded"));
        assert_eq!(*api.seen_during_story.lock().unwrap(), vec![busy()]);
        assert_eq!(page.trigger(), idle());
    }

    #[tokio::test]
    async fn test_generate_story_network_failure() {
        let (workflow, page, api) = setup(Reply::Fail("unused"), Reply::Fail("connection refused"));

        workflow.generate_story().await;

        assert!(page.story_html().contains("connection refused"));
        assert_eq!(*api.seen_during_story.lock().unwrap(), vec![busy()]);
        assert_eq!(page.trigger(), idle());
    }

    #[tokio::test]
    async fn test_generate_story_repeated_clicks_restore_each_time() {
        let (workflow, page, api) = setup(
            Reply::Fail("unused"),
            Reply::Json(r#"{"status": "success", "data": {"story": "once"}}"#),
        );

        workflow.generate_story().await;
        assert_eq!(page.trigger(), idle());
        workflow.generate_story().await;
        assert_eq!(page.trigger(), idle());

        assert_eq!(*api.seen_during_story.lock().unwrap(), vec![busy(), busy()]);
    }

    #[tokio::test]
    async fn test_generate_story_write_order() {
        let page = Arc::new(RecordingPage::default());
        let snapshot = Arc::new(SnapshotPage::new("unused"));
        let api = Arc::new(MockApi::new(
            snapshot,
            Reply::Fail("unused"),
            Reply::Json(r#"{"status": "success", "data": {"story": "x"}}"#),
        ));
        let workflow = StoryWorkflow::new(api, page.clone(), Labels::default());

        workflow.generate_story().await;

        assert_eq!(
            *page.events.lock().unwrap(),
            vec![
                "trigger:false:生成中...".to_string(),
                "story:<div class=\"fade-in\"><p>x</p></div>".to_string(),
                "trigger:true:生成新故事".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_story_connection_refused_over_http() -> Result<()> {
        let labels = Labels::default();
        let page = Arc::new(SnapshotPage::new(&labels.idle));
        let api = Arc::new(HttpStoryApi::new(&refused_base_url().await)?);
        let workflow = StoryWorkflow::new(api, page.clone(), labels);

        workflow.generate_story().await;

        let html = page.story_html();
        assert!(html.contains("alert-danger"));
        assert!(html.contains("Request to"), "got: {}", html);
        assert_eq!(page.trigger(), idle());
        Ok(())
    }

    #[tokio::test]
    async fn test_flows_run_concurrently() {
        let (workflow, page, _) = setup(
            Reply::Json(r#"{"scenes": ["海边"]}"#),
            Reply::Json(r#"{"status": "success", "data": {"story": "海风"}}"#),
        );

        futures_util::join!(workflow.load_elements(), workflow.generate_story());

        assert!(page.elements_html().contains("海边"));
        assert!(page.story_html().contains("<p>海风</p>"));
        assert_eq!(page.trigger(), idle());
    }
}
