//! HTML fragments for the elements and story containers.
//!
//! The markup (classes, nesting, `<p>` per line) is the same as the plain page script
//! produces. Unlike that script, which interpolates server strings into `innerHTML` raw,
//! every server-supplied string here (titles, items, story lines, error text) goes
//! through `escape_html` first. The visible text is unchanged; a `<` in a story line
//! shows as `<` instead of opening a tag.

use crate::core::model::ElementCategoryMap;
use crate::utils::html::escape_html;

pub fn render_elements(elements: &ElementCategoryMap) -> String {
    let mut html = String::new();
    for (category, items) in elements.iter() {
        html.push_str("<div class=\"element-category\"><h5>");
        html.push_str(&escape_html(category.title()));
        html.push_str("</h5><div>");
        for item in items {
            html.push_str("<span class=\"element-item\">");
            html.push_str(&escape_html(item));
            html.push_str("</span>");
        }
        html.push_str("</div></div>");
    }
    html
}

/// One segment per `\n`; empty segments are kept so `n` newlines always give `n + 1` paragraphs.
pub fn story_paragraphs(story: &str) -> Vec<&str> {
    story.split('\n').collect()
}

pub fn render_story(story: &str) -> String {
    let paragraphs: String = story_paragraphs(story)
        .into_iter()
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect();
    format!("<div class=\"fade-in\">{}</div>", paragraphs)
}

pub fn render_error(prefix: &str, message: &str) -> String {
    format!(
        "<div class=\"alert alert-danger\">{}{}</div>",
        escape_html(prefix),
        escape_html(message)
    )
}
