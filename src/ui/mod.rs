use anyhow::{anyhow, Result};
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlButtonElement};

use crate::core::config::{Config, ElementIds};
use crate::core::page::Page;
use crate::services::api::HttpStoryApi;
use crate::services::workflow::StoryWorkflow;

/// The page's live DOM handles.
pub struct DomPage {
    trigger: HtmlButtonElement,
    story: Element,
    elements: Element,
}

impl DomPage {
    pub fn from_document(document: &Document, ids: &ElementIds) -> Result<Self> {
        let trigger = find_element(document, &ids.trigger_id)?
            .dyn_into::<HtmlButtonElement>()
            .map_err(|_| anyhow!("#{} is not a button", ids.trigger_id))?;

        Ok(Self {
            trigger,
            story: find_element(document, &ids.story_id)?,
            elements: find_element(document, &ids.elements_id)?,
        })
    }
}

fn find_element(document: &Document, id: &str) -> Result<Element> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("Element #{} not found", id))
}

impl Page for DomPage {
    fn set_elements_html(&self, html: &str) {
        self.elements.set_inner_html(html);
    }

    fn set_story_html(&self, html: &str) {
        self.story.set_inner_html(html);
    }

    fn set_trigger(&self, enabled: bool, label: &str) {
        self.trigger.set_disabled(!enabled);
        self.trigger.set_inner_html(label);
    }
}

/// Keeps the click handler alive. Dropping it (or calling `dispose`) unbinds the handler.
pub struct PageBindings {
    trigger: HtmlButtonElement,
    on_click: Option<Closure<dyn FnMut(Event)>>,
}

impl PageBindings {
    pub fn dispose(self) {
        drop(self);
    }

    fn release(&mut self) {
        if let Some(on_click) = self.on_click.take() {
            if let Err(e) = self
                .trigger
                .remove_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            {
                log::warn!("Failed to unbind click handler: {:?}", e);
            }
        }
    }
}

impl Drop for PageBindings {
    fn drop(&mut self) {
        self.release();
    }
}

/// Binds the story page to `document`: wires the trigger's click to story generation
/// and starts the initial elements load.
pub fn initialize(document: &Document, config: &Config) -> Result<PageBindings> {
    let page = Arc::new(DomPage::from_document(document, &config.elements)?);
    let api = Arc::new(HttpStoryApi::new(&config.api_base_url)?);
    let workflow = Rc::new(StoryWorkflow::new(api, page.clone(), config.labels.clone()));

    let on_click = {
        let workflow = workflow.clone();
        Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            let workflow = workflow.clone();
            spawn_local(async move {
                workflow.generate_story().await;
            });
        })
    };

    page.trigger
        .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
        .map_err(|e| anyhow!("Failed to bind click handler: {:?}", e))?;

    spawn_local(async move {
        workflow.load_elements().await;
    });

    log::info!("Story page bound to #{}", config.elements.trigger_id);
    Ok(PageBindings {
        trigger: page.trigger.clone(),
        on_click: Some(on_click),
    })
}
