// Page extraction tests: realistic page fragments in, records out.

use chrono::NaiveDate;

use threadwatch::extract::comments::{synthetic_comment_id, SYNTHETIC_ID_PREFIX};
use threadwatch::extract::group::parse_member_count;
use threadwatch::extract::listing::listing_url;
use threadwatch::extract::{parse_comments, parse_group_info, parse_listing, parse_thread_detail};

// ============================================================
// Group page
// ============================================================

#[test]
fn member_count_formats() {
    assert_eq!(parse_member_count("12345"), Some(12345));
    assert_eq!(parse_member_count("3万"), Some(30000));
    assert_eq!(parse_member_count("3万+"), Some(30000));
    assert_eq!(parse_member_count("1.25万+"), Some(12500));
    assert_eq!(parse_member_count(""), None);
}

#[test]
fn group_page_without_details_degrades() {
    let info = parse_group_info("<html><body><h1>Only a name</h1></body></html>", "g1").unwrap();
    assert_eq!(info.name, "Only a name");
    assert_eq!(info.member_count, 0);
}

// ============================================================
// Listing
// ============================================================

#[test]
fn listing_urls_step_by_25() {
    assert_eq!(
        listing_url("https://www.douban.com", "abc123", 0),
        "https://www.douban.com/group/abc123/discussion?start=0"
    );
    assert_eq!(
        listing_url("https://www.douban.com", "abc123", 3),
        "https://www.douban.com/group/abc123/discussion?start=75"
    );
}

#[test]
fn empty_listing_is_not_an_error() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert!(parse_listing("<html></html>", "https://www.douban.com", today).unwrap().is_empty());
    assert!(parse_listing(r#"<table class="olt"></table>"#, "https://www.douban.com", today)
        .unwrap()
        .is_empty());
}

#[test]
fn listing_keeps_full_timestamps_as_is() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let html = r#"<table class="olt"><tr>
        <td class="title"><a href="https://www.douban.com/group/topic/42/">t</a></td>
        <td></td><td></td><td>2023-12-31 23:59:00</td>
    </tr></table>"#;
    let rows = parse_listing(html, "https://www.douban.com", today).unwrap();
    assert_eq!(rows[0].updated, "2023-12-31 23:59:00");
    assert_eq!(rows[0].author_name, "");
}

// ============================================================
// Detail and comments
// ============================================================

#[test]
fn detail_of_unrelated_page_is_empty() {
    let detail = parse_thread_detail("<p>404 not found</p>").unwrap();
    assert!(detail.content.is_empty());
    assert!(detail.photos.is_empty());
    assert!(detail.created.is_empty());
}

#[test]
fn comments_without_ids_get_stable_synthetic_ids() {
    let html = r#"<ul>
        <li class="comment-item"><span class="author">dave</span><p>first words</p></li>
        <li class="comment-item"><span class="author">dave</span><p>first words</p></li>
    </ul>"#;
    let first = parse_comments(html, "999").unwrap();
    let second = parse_comments(html, "999").unwrap();

    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|c| c.synthetic_id));
    assert!(first[0].comment_id.starts_with(SYNTHETIC_ID_PREFIX));
    // Same author and text at different positions are different comments
    assert_ne!(first[0].comment_id, first[1].comment_id);
    // Re-extracting the same page reproduces the IDs
    assert_eq!(first[0].comment_id, second[0].comment_id);
    assert_eq!(
        first[0].comment_id,
        synthetic_comment_id("999", "dave", "first words", 0)
    );
}

#[test]
fn reply_reference_comes_from_in_page_anchor() {
    let html = r##"<ul>
        <li class="comment-item" data-id="11"><p>question</p></li>
        <li class="comment-item" data-id="12">
            <a href="#comment-11">reply to</a><p>answer</p>
            <span class="like-count">赞 (7)</span>
        </li>
    </ul>"##;
    let comments = parse_comments(html, "999").unwrap();
    assert_eq!(comments[0].reply_to_id, None);
    assert_eq!(comments[1].reply_to_id.as_deref(), Some("11"));
    assert_eq!(comments[1].like_count, 7);
}
