// Group page: name, member count, creation date.

use anyhow::Result;
use chrono::NaiveDate;
use regex_lite::Regex;
use scraper::Html;

use super::{element_text, selector, select_text};
use crate::db::models::{now_local, DATE_FORMAT};

/// Group metadata as shown on its landing page.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInfo {
    pub name: String,
    pub member_count: i64,
    /// Falls back to today when the page doesn't say.
    pub created: NaiveDate,
}

pub fn parse_group_info(html: &str, group_id: &str) -> Result<GroupInfo> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let name = select_text(root, &selector("h1")?);

    // The members link reads like "浏览所有成员 (12345)" or "(1.2万+)"
    let members_path = format!("/group/{group_id}/members");
    let count_re = Regex::new(r"\(([\d.万+]+)\)")?;
    let member_count = root
        .select(&selector("a[href]")?)
        .filter(|a| {
            a.value()
                .attr("href")
                .is_some_and(|href| href.contains(&members_path))
        })
        .find_map(|a| {
            let text = element_text(a);
            count_re
                .captures(&text)
                .and_then(|caps| parse_member_count(&caps[1]))
        })
        .unwrap_or(0);

    let created_re = Regex::new(r"创建于\s*(\d{4}-\d{1,2}-\d{1,2})")?;
    let created = root
        .select(&selector(".group-loc")?)
        .find_map(|el| {
            let text = element_text(el);
            created_re
                .captures(&text)
                .and_then(|caps| NaiveDate::parse_from_str(&caps[1], DATE_FORMAT).ok())
        })
        .unwrap_or_else(|| now_local().date());

    Ok(GroupInfo {
        name,
        member_count,
        created,
    })
}

/// "12345" → 12345, "1.2万" → 12000, "3万+" → 30000.
pub fn parse_member_count(raw: &str) -> Option<i64> {
    let cleaned = raw.replace('+', "");
    if let Some(number) = cleaned.strip_suffix('万') {
        let value: f64 = number.trim().parse().ok()?;
        return Some((value * 10_000.0).round() as i64);
    }
    cleaned.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
          <h1> 北京租房 </h1>
          <div class="mod side-nav">
            <a href="https://www.douban.com/group/abc123/members">浏览所有成员 (1.2万+)</a>
          </div>
          <div class="group-loc">创建于2008-06-17 &nbsp; 组长：<a href="#">someone</a></div>
        </body></html>
    "##;

    #[test]
    fn test_parse_group_info() {
        let info = parse_group_info(PAGE, "abc123").unwrap();
        assert_eq!(info.name, "北京租房");
        assert_eq!(info.member_count, 12000);
        assert_eq!(info.created, NaiveDate::from_ymd_opt(2008, 6, 17).unwrap());
    }

    #[test]
    fn test_members_link_for_other_group_ignored() {
        let info = parse_group_info(PAGE, "zzz999").unwrap();
        assert_eq!(info.member_count, 0);
    }

    #[test]
    fn test_missing_everything_degrades() {
        let info = parse_group_info("<html><body></body></html>", "abc123").unwrap();
        assert_eq!(info.name, "");
        assert_eq!(info.member_count, 0);
        assert_eq!(info.created, now_local().date());
    }

    #[test]
    fn test_parse_member_count_variants() {
        assert_eq!(parse_member_count("345"), Some(345));
        assert_eq!(parse_member_count("345+"), Some(345));
        assert_eq!(parse_member_count("3万"), Some(30000));
        assert_eq!(parse_member_count("1.25万+"), Some(12500));
        assert_eq!(parse_member_count("万"), None);
        assert_eq!(parse_member_count(""), None);
    }
}
