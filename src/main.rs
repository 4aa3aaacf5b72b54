#[cfg(not(target_arch = "wasm32"))]
use anyhow::Result;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use story_spark::core::{config::Config, page::SnapshotPage};
#[cfg(not(target_arch = "wasm32"))]
use story_spark::services::{api::HttpStoryApi, workflow::StoryWorkflow};

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load()?;
    log::info!("Using story API at {}", config.api_base_url);

    let api = Arc::new(HttpStoryApi::new(&config.api_base_url)?);
    let page = Arc::new(SnapshotPage::new(&config.labels.idle));
    let workflow = StoryWorkflow::new(api, page.clone(), config.labels.clone());

    // Same as the browser: the elements load and one story click, in flight together.
    futures_util::join!(workflow.load_elements(), workflow.generate_story());

    let path = std::path::Path::new(&config.output_file);
    page.write_document(&config.elements, path).await?;

    log::info!("Story page written to {}", path.display());
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
