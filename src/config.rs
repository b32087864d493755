use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::fetch::pacing::PaceWindow;

/// Default site root. Group and listing URLs are built from it.
pub const DEFAULT_BASE_URL: &str = "https://www.douban.com";

/// Fixed desktop browser identity sent with every page request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.4692.71 Safari/537.36";

/// Connection settings for the forum site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    /// Operator-supplied session cookie, sent verbatim.
    pub cookie: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// What to crawl and how fast.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub groups: Vec<String>,
    pub keywords: Vec<String>,
    pub exclude: Vec<String>,
    pub pages: u32,
    pub poll_interval: Duration,
    pub listing_delay: PaceWindow,
    pub detail_delay: PaceWindow,
    pub comment_delay: PaceWindow,
}

/// Reply drafting settings.
#[derive(Debug, Clone)]
pub struct ReplyConfig {
    pub enabled: bool,
    /// If non-empty, a thread must contain at least one of these (plain substring).
    pub reply_keywords: Vec<String>,
    pub reply_delay: PaceWindow,
    pub max_history_posts: u32,
    pub max_history_comments: u32,
}

/// OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Central configuration loaded from environment variables.
///
/// Secrets (cookie, API key) come from env vars only. The .env file is
/// loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub site: SiteConfig,
    pub crawl: CrawlConfig,
    pub reply: ReplyConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Everything has a default; malformed numbers and inverted delay
    /// ranges are errors naming the offending variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let site = SiteConfig {
            base_url: get("THREADWATCH_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            cookie: get("THREADWATCH_COOKIE", ""),
            user_agent: get("THREADWATCH_USER_AGENT", DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(parse_var(&lookup, "THREADWATCH_HTTP_TIMEOUT_SECS", 30)?),
        };

        let crawl = CrawlConfig {
            groups: split_list(&get("THREADWATCH_GROUPS", "")),
            keywords: split_list(&get("THREADWATCH_KEYWORDS", "")),
            exclude: split_list(&get("THREADWATCH_EXCLUDE", "")),
            pages: parse_var(&lookup, "THREADWATCH_PAGES", 10)?,
            poll_interval: Duration::from_secs(parse_var(&lookup, "THREADWATCH_POLL_SECS", 900)?),
            listing_delay: parse_window_ms(&lookup, "THREADWATCH_LISTING_DELAY_MS", (5000, 8000))?,
            detail_delay: parse_window_ms(&lookup, "THREADWATCH_DETAIL_DELAY_MS", (2500, 7500))?,
            comment_delay: parse_window_ms(&lookup, "THREADWATCH_COMMENT_DELAY_MS", (2000, 5000))?,
        };

        let min_reply: u64 = parse_var(&lookup, "THREADWATCH_MIN_REPLY_DELAY", 30)?;
        let max_reply: u64 = parse_var(&lookup, "THREADWATCH_MAX_REPLY_DELAY", 300)?;
        if min_reply > max_reply {
            anyhow::bail!(
                "THREADWATCH_MIN_REPLY_DELAY ({min_reply}) is greater than \
                 THREADWATCH_MAX_REPLY_DELAY ({max_reply})"
            );
        }

        let reply = ReplyConfig {
            enabled: parse_bool(&get("THREADWATCH_REPLY_ENABLED", "false")),
            reply_keywords: split_list(&get("THREADWATCH_REPLY_KEYWORDS", "")),
            reply_delay: PaceWindow::from_secs(min_reply, max_reply),
            max_history_posts: parse_var(&lookup, "THREADWATCH_MAX_HISTORY_POSTS", 50)?,
            max_history_comments: parse_var(&lookup, "THREADWATCH_MAX_HISTORY_COMMENTS", 200)?,
        };

        let llm = LlmConfig {
            api_base: get("LLM_API_BASE", "https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            api_key: get("LLM_API_KEY", ""),
            model: get("LLM_MODEL", "gpt-3.5-turbo"),
            temperature: parse_var(&lookup, "LLM_TEMPERATURE", 0.7)?,
            max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS", 500)?,
        };

        Ok(Self {
            db_path: get("THREADWATCH_DB_PATH", "./threadwatch.db"),
            site,
            crawl,
            reply,
            llm,
        })
    }

    /// Check that at least one group is configured.
    /// Call this before crawling.
    pub fn require_groups(&self) -> Result<()> {
        if self.crawl.groups.is_empty() {
            anyhow::bail!(
                "THREADWATCH_GROUPS not set. Add a comma-separated list of group IDs \
                 to your .env file or pass --groups."
            );
        }
        Ok(())
    }

    /// Check that the generation API key is configured.
    /// Only the one-off draft command requires it; the crawl loop logs
    /// each failed draft and keeps going.
    pub fn require_llm(&self) -> Result<()> {
        if self.llm.api_key.is_empty() {
            anyhow::bail!(
                "LLM_API_KEY not set. Reply drafting needs an OpenAI-compatible API key.\n\
                 Add it to your .env file."
            );
        }
        Ok(())
    }
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        _ => Ok(default),
    }
}

/// Parse a `min-max` millisecond range (a single number means a fixed delay).
fn parse_window_ms<F>(lookup: &F, key: &str, default: (u64, u64)) -> Result<PaceWindow>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key).filter(|r| !r.trim().is_empty()) else {
        return Ok(PaceWindow::from_millis(default.0, default.1));
    };

    let (min, max) = match raw.split_once('-') {
        Some((lo, hi)) => (lo.trim(), hi.trim()),
        None => (raw.trim(), raw.trim()),
    };
    let min: u64 = min
        .parse()
        .with_context(|| format!("{key} has an invalid range: {raw:?}"))?;
    let max: u64 = max
        .parse()
        .with_context(|| format!("{key} has an invalid range: {raw:?}"))?;
    if min > max {
        anyhow::bail!("{key} range is inverted: {raw:?}");
    }
    Ok(PaceWindow::from_millis(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, "./threadwatch.db");
        assert_eq!(config.site.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.crawl.pages, 10);
        assert_eq!(config.crawl.poll_interval, Duration::from_secs(900));
        assert_eq!(config.crawl.listing_delay, PaceWindow::from_millis(5000, 8000));
        assert!(!config.reply.enabled);
        assert_eq!(config.reply.reply_delay, PaceWindow::from_secs(30, 300));
        assert_eq!(config.reply.max_history_comments, 200);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!(config.require_groups().is_err());
        assert!(config.require_llm().is_err());
    }

    #[test]
    fn test_lists_are_trimmed_and_empties_dropped() {
        let config = config_from(&[
            ("THREADWATCH_GROUPS", "abc123, def456,,"),
            ("THREADWATCH_KEYWORDS", " room ,整租"),
        ])
        .unwrap();
        assert_eq!(config.crawl.groups, vec!["abc123", "def456"]);
        assert_eq!(config.crawl.keywords, vec!["room", "整租"]);
        assert!(config.crawl.exclude.is_empty());
        assert!(config.require_groups().is_ok());
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let err = config_from(&[("THREADWATCH_PAGES", "ten")]).unwrap_err();
        assert!(err.to_string().contains("THREADWATCH_PAGES"));
    }

    #[test]
    fn test_delay_ranges() {
        let config = config_from(&[
            ("THREADWATCH_DETAIL_DELAY_MS", "0-0"),
            ("THREADWATCH_COMMENT_DELAY_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.crawl.detail_delay, PaceWindow::from_millis(0, 0));
        assert_eq!(config.crawl.comment_delay, PaceWindow::from_millis(250, 250));

        assert!(config_from(&[("THREADWATCH_LISTING_DELAY_MS", "9-1")]).is_err());
        assert!(config_from(&[
            ("THREADWATCH_MIN_REPLY_DELAY", "60"),
            ("THREADWATCH_MAX_REPLY_DELAY", "10"),
        ])
        .is_err());
    }

    #[test]
    fn test_reply_flag_and_trailing_slashes() {
        let config = config_from(&[
            ("THREADWATCH_REPLY_ENABLED", "yes"),
            ("THREADWATCH_BASE_URL", "https://example.com/"),
            ("LLM_API_BASE", "http://localhost:8080/v1/"),
            ("LLM_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert!(config.reply.enabled);
        assert_eq!(config.site.base_url, "https://example.com");
        assert_eq!(config.llm.api_base, "http://localhost:8080/v1");
        assert!(config.require_llm().is_ok());
    }
}
