// Comment rows on a thread page.
//
// IDs come from the element's `data-id`, else from a `comment/<id>` link.
// When neither exists we derive a stable ID from the thread, author, content
// and position so that re-crawling the same page produces the same ID and
// the store's unique key still deduplicates it.

use anyhow::Result;
use regex_lite::Regex;
use scraper::{ElementRef, Html};
use sha2::{Digest, Sha256};

use super::{element_text, first_attr, first_number, first_text, selector, select_text};
use crate::db::models::{now_local, DATETIME_FORMAT};

/// Prefix marking an ID we derived rather than read from the page.
pub const SYNTHETIC_ID_PREFIX: &str = "synth-";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedComment {
    pub comment_id: String,
    /// True when `comment_id` was derived, not read from the page.
    pub synthetic_id: bool,
    pub content: String,
    pub author_name: String,
    pub author_url: String,
    pub reply_to_id: Option<String>,
    pub like_count: i64,
    /// Raw time text, or the current time when absent.
    pub created: String,
}

/// Extract comments in page order. Items with no text content are dropped.
pub fn parse_comments(html: &str, post_id: &str) -> Result<Vec<ExtractedComment>> {
    let doc = Html::parse_document(html);
    let item_sel = selector(".comment-item, .reply-item")?;
    let first_link_sel = selector("a")?;
    let content_sel = selector(".reply-content, .comment-content, p")?;
    let div_sel = selector("div")?;
    let author_sel = selector(r#".author, .comment-author, a[href*="/people/"]"#)?;
    let people_sel = selector(r#"a[href*="/people/"]"#)?;
    let reply_link_sel = selector(r##"a[href*="#comment"]"##)?;
    let like_sel = selector(".like-count, .vote-count")?;
    let time_sel = selector(".time, .comment-time, .pubtime")?;
    let link_id_re = Regex::new(r"comment/(\d+)")?;
    let anchor_re = Regex::new(r"#comment-(\d+)")?;

    let mut comments = Vec::new();
    for (position, item) in doc.select(&item_sel).enumerate() {
        let mut content = select_text(item, &content_sel);
        if content.is_empty() {
            content = fallback_content(item, &div_sel);
        }
        if content.is_empty() {
            continue;
        }

        let author_name = first_text(item, &author_sel);
        let author_url = first_attr(item, &people_sel, "href").unwrap_or_default();

        let page_id = item
            .value()
            .attr("data-id")
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| {
                first_attr(item, &first_link_sel, "href")
                    .and_then(|href| link_id_re.captures(&href).map(|caps| caps[1].to_string()))
            });
        let (comment_id, synthetic_id) = match page_id {
            Some(id) => (id, false),
            None => (
                synthetic_comment_id(post_id, &author_name, &content, position),
                true,
            ),
        };

        let reply_to_id = first_attr(item, &reply_link_sel, "href")
            .and_then(|href| anchor_re.captures(&href).map(|caps| caps[1].to_string()));

        let like_count = first_number(&select_text(item, &like_sel)).unwrap_or(0);

        let time_text = select_text(item, &time_sel);
        let created = if time_text.is_empty() {
            now_local().format(DATETIME_FORMAT).to_string()
        } else {
            time_text
        };

        comments.push(ExtractedComment {
            comment_id,
            synthetic_id,
            content,
            author_name,
            author_url,
            reply_to_id,
            like_count,
            created,
        });
    }

    Ok(comments)
}

/// Text of nested divs that aren't the author or time blocks.
fn fallback_content(item: ElementRef<'_>, div_sel: &scraper::Selector) -> String {
    item.select(div_sel)
        .filter(|div| {
            let classes: Vec<&str> = div.value().classes().collect();
            !classes.contains(&"author") && !classes.contains(&"time")
        })
        .map(element_text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Deterministic ID for a comment the page gave no ID for.
pub fn synthetic_comment_id(post_id: &str, author: &str, content: &str, position: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(post_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(author.as_bytes());
    hasher.update([0x1f]);
    hasher.update(content.as_bytes());
    hasher.update([0x1f]);
    hasher.update(position.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{SYNTHETIC_ID_PREFIX}{}", &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
    <ul id="comments">
      <li class="comment-item" data-id="3001">
        <div class="bg-img-green"><h4><a href="https://www.douban.com/people/carol/">carol</a>
          <span class="pubtime">2024-05-31 08:00:01</span></h4></div>
        <div class="reply-doc">
          <p class="reply-content">Is it still available?</p>
          <div class="operation"><span class="like-count">赞 (4)</span></div>
        </div>
      </li>
      <li class="comment-item" data-id="3002">
        <a href="https://www.douban.com/people/dave/">dave</a>
        <div class="reply-quote"><a href="#comment-3001">carol</a></div>
        <p class="reply-content">Yes it is!</p>
      </li>
      <li class="reply-item">
        <a href="https://www.douban.com/group/topic/999/comment/3003">#</a>
        <p>third</p>
      </li>
      <li class="comment-item">
        <span class="author">erin</span>
        <p>no id anywhere</p>
      </li>
      <li class="comment-item" data-id="3005"></li>
    </ul>"##;

    #[test]
    fn test_parse_comments() {
        let comments = parse_comments(PAGE, "999").unwrap();
        assert_eq!(comments.len(), 4);

        let first = &comments[0];
        assert_eq!(first.comment_id, "3001");
        assert!(!first.synthetic_id);
        assert_eq!(first.content, "Is it still available?");
        assert_eq!(first.author_name, "carol");
        assert_eq!(first.author_url, "https://www.douban.com/people/carol/");
        assert_eq!(first.like_count, 4);
        assert_eq!(first.created, "2024-05-31 08:00:01");
        assert_eq!(first.reply_to_id, None);

        assert_eq!(comments[1].comment_id, "3002");
        assert_eq!(comments[1].reply_to_id.as_deref(), Some("3001"));
        assert_eq!(comments[1].like_count, 0);

        assert_eq!(comments[2].comment_id, "3003");
        assert!(!comments[2].synthetic_id);

        assert!(comments[3].synthetic_id);
        assert!(comments[3].comment_id.starts_with(SYNTHETIC_ID_PREFIX));
        assert_eq!(comments[3].author_name, "erin");
    }

    #[test]
    fn test_synthetic_ids_are_stable_across_runs() {
        let a = parse_comments(PAGE, "999").unwrap();
        let b = parse_comments(PAGE, "999").unwrap();
        assert_eq!(a[3].comment_id, b[3].comment_id);

        let other_thread = parse_comments(PAGE, "1000").unwrap();
        assert_ne!(a[3].comment_id, other_thread[3].comment_id);
    }

    #[test]
    fn test_missing_time_defaults_to_now() {
        let comments = parse_comments(PAGE, "999").unwrap();
        assert!(crate::db::models::parse_datetime(&comments[1].created).is_some());
    }

    #[test]
    fn test_fallback_content_skips_author_and_time_divs() {
        let html = r#"<div class="comment-item" data-id="1">
            <div class="author">frank</div><div class="time">2024-01-01 00:00:00</div>
            <div class="body">actual words</div></div>"#;
        let comments = parse_comments(html, "1").unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "actual words");
    }

    #[test]
    fn test_no_comments() {
        assert!(parse_comments("<html></html>", "1").unwrap().is_empty());
    }
}
