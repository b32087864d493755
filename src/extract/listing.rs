// Group discussion listing: one row per thread.
//
// Listing pages often show only a time of day ("14:07") for the last update.
// That is combined with today's date, so a thread last touched yesterday at
// 14:07 is stamped as today 14:07. "MM-DD HH:MM" cells get the current year.
// Anything else is passed through for the caller to parse (or replace with
// "now").

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use regex_lite::Regex;
use scraper::Html;

use super::{element_text, first_attr, first_text, selector};

/// Pattern for thread URLs on the configured site, e.g.
/// `https://www.douban.com/group/topic/123456789/`. Either scheme matches.
pub fn thread_url_pattern(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let host = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"))
        .unwrap_or(base);
    format!(r"https?://{}/group/topic/(\d+)/", regex_lite::escape(host))
}

/// One thread row from a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub post_id: String,
    pub title: String,
    pub url: String,
    pub author_name: String,
    pub author_url: String,
    /// Update time as text, already widened to a full timestamp when possible.
    pub updated: String,
}

/// Extract thread rows. Rows without a thread-shaped title link are skipped;
/// a page with no rows is an empty result, not an error.
pub fn parse_listing(html: &str, base_url: &str, today: NaiveDate) -> Result<Vec<ListingRow>> {
    let doc = Html::parse_document(html);
    let row_sel = selector("table.olt tr")?;
    let title_sel = selector("td.title a")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;
    let url_re = Regex::new(&thread_url_pattern(base_url))?;
    let time_re = Regex::new(r"^\d{1,2}:\d{2}$")?;
    let month_day_re = Regex::new(r"^\d{1,2}-\d{1,2} \d{1,2}:\d{2}$")?;

    let mut rows = Vec::new();
    for tr in doc.select(&row_sel) {
        let Some(link) = tr.select(&title_sel).next() else {
            continue;
        };
        let url = link.value().attr("href").unwrap_or_default().to_string();
        let Some(post_id) = url_re.captures(&url).map(|caps| caps[1].to_string()) else {
            continue;
        };
        let title = link
            .value()
            .attr("title")
            .map(str::to_string)
            .unwrap_or_else(|| element_text(link))
            .trim()
            .to_string();

        let cells: Vec<_> = tr.select(&cell_sel).collect();
        let (author_name, author_url) = match cells.get(1) {
            Some(cell) => (
                first_text(*cell, &link_sel),
                first_attr(*cell, &link_sel, "href").unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        let raw_time = cells
            .get(3)
            .map(|cell| element_text(*cell).trim().to_string())
            .unwrap_or_default();
        let updated = widen_listing_time(&raw_time, today, &time_re, &month_day_re);

        rows.push(ListingRow {
            post_id,
            title,
            url,
            author_name,
            author_url,
            updated,
        });
    }

    Ok(rows)
}

fn widen_listing_time(raw: &str, today: NaiveDate, time_re: &Regex, month_day_re: &Regex) -> String {
    let raw = raw.trim();
    if time_re.is_match(raw) {
        format!("{} {raw}:00", today.format("%Y-%m-%d"))
    } else if month_day_re.is_match(raw) {
        format!("{}-{raw}:00", today.year())
    } else {
        raw.to_string()
    }
}

/// Listing URL for page `page` (0-based, 25 rows per page).
pub fn listing_url(base_url: &str, group_id: &str, page: u32) -> String {
    format!("{base_url}/group/{group_id}/discussion?start={}", page * 25)
}
