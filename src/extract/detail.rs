// Thread detail page: body text, inline photos, created time.

use anyhow::Result;
use scraper::Html;

use super::{selector, select_text};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadDetail {
    pub content: String,
    pub photos: Vec<String>,
    /// Raw created-time text; empty when the page doesn't carry one.
    pub created: String,
}

pub fn parse_thread_detail(html: &str) -> Result<ThreadDetail> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let content = select_text(root, &selector("div.topic-content")?);

    let photos = root
        .select(&selector("div.topic-content img")?)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect();

    let created = select_text(root, &selector(".create-time")?);

    Ok(ThreadDetail {
        content,
        photos,
        created,
    })
}
