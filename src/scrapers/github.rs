//! GitHub Trending scraper.
//!
//! GitHub has no API for the trending page, so this module scrapes the HTML at
//! `https://github.com/trending[/<language>]?since=daily`. Each repository is
//! an `article.Box-row`; the repository path in its heading link is the
//! natural key.

use crate::models::{Category, Item};
use crate::scrapers::{ScrapeError, SourceAdapter, get_text};
use crate::utils::now_millis;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const TRENDING_URL: &str = "https://github.com/trending";
const TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REPOS: usize = 15;

/// Trending repositories, optionally restricted to one language.
pub struct GithubTrending {
    client: Client,
    language: Option<&'static str>,
    name: String,
}

impl GithubTrending {
    pub fn new(client: Client, language: Option<&'static str>) -> Self {
        let name = match language {
            Some(lang) => format!("GitHub Trending ({lang})"),
            None => "GitHub Trending".to_string(),
        };
        Self {
            client,
            language,
            name,
        }
    }

    fn page_url(&self) -> String {
        match self.language {
            Some(lang) => format!(
                "{}/{}?since=daily",
                TRENDING_URL,
                urlencoding::encode(lang)
            ),
            None => format!("{TRENDING_URL}?since=daily"),
        }
    }
}

#[async_trait]
impl SourceAdapter for GithubTrending {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "info", skip_all, fields(language = ?self.language))]
    async fn fetch_items(&self) -> Result<Vec<Item>, ScrapeError> {
        let url = self.page_url();
        let html = get_text(&self.client, &url, TIMEOUT).await?;
        let repos = parse_trending(&html, self.language, now_millis())?;
        info!(count = repos.len(), source = %url, "Parsed GitHub trending repositories");
        Ok(repos)
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("selector {css}: {e}")))
}

fn squash(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the last match; the stars-today badge is the row's final counter.
fn text_of(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel)
        .last()
        .map(squash)
        .filter(|t| !t.is_empty())
}

/// Text of every match, joined.
fn all_text_of(el: ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel)
        .map(squash)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a trending page into items. `fallback_language` fills in repositories
/// whose row carries no language badge.
pub fn parse_trending(
    html: &str,
    fallback_language: Option<&str>,
    now: i64,
) -> Result<Vec<Item>, ScrapeError> {
    let base = Url::parse("https://github.com")?;
    let document = Html::parse_document(html);
    let row_sel = selector("article.Box-row")?;
    let link_sel = selector("h2 a")?;
    let desc_sel = selector("p.col-9")?;
    let lang_sel = selector(r#"[itemprop="programmingLanguage"]"#)?;
    let today_sel = selector(".float-sm-right, .Link--muted.d-inline-block.mr-3")?;
    let total_sel = selector(r#"a.Link--muted[href$="/stargazers"]"#)?;

    let mut repos = Vec::new();
    for row in document.select(&row_sel).take(MAX_REPOS) {
        let Some(path) = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|p| !p.is_empty())
        else {
            debug!("Trending row without repository link");
            continue;
        };

        let full_name = path.trim_start_matches('/');
        let mut item = Item::new(
            format!("gh-{}", full_name.replacen('/', "-", 1)),
            full_name,
            base.join(path)?.to_string(),
            "GitHub",
            Category::Github,
            now,
        );
        item.description = Some(all_text_of(row, &desc_sel));
        item.language = Some(
            text_of(row, &lang_sel)
                .or_else(|| fallback_language.map(str::to_string))
                .unwrap_or_else(|| "Unknown".to_string()),
        );
        item.stars_today = text_of(row, &today_sel);
        item.total_stars = text_of(row, &total_sel);
        repos.push(item);
    }
    Ok(repos)
}
