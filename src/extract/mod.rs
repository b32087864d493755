// Page extraction: raw HTML in, loosely-typed records out.
//
// A missing element yields an empty string, zero, or "now", never an error.
// The only errors are malformed selector or pattern literals.
//
// All extractors are synchronous and own their parsed document internally.
// scraper's `Html` is not Send, so it must never live across an .await.

pub mod comments;
pub mod detail;
pub mod group;
pub mod listing;

pub use comments::{parse_comments, ExtractedComment};
pub use detail::{parse_thread_detail, ThreadDetail};
pub use group::{parse_group_info, GroupInfo};
pub use listing::{parse_listing, ListingRow};

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css:?}: {e:?}"))
}

/// All text beneath an element, concatenated.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Text of every match of `sel` under `scope`, concatenated and trimmed.
pub(crate) fn select_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope
        .select(sel)
        .map(element_text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text of the first match of `sel` under `scope`, trimmed.
pub(crate) fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope
        .select(sel)
        .next()
        .map(|el| element_text(el).trim().to_string())
        .unwrap_or_default()
}

/// `attr` of the first match of `sel` under `scope`.
pub(crate) fn first_attr(scope: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    scope
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// The first run of ASCII digits in `text`, parsed.
pub(crate) fn first_number(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
