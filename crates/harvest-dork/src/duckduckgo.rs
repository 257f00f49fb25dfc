//! `DuckDuckGo` HTML search backend.
//!
//! Posts the query form to the `/html/` endpoint, which needs no script, and
//! scrapes `result__a` / `result__snippet` pairs from the page.

use std::sync::OnceLock;

use harvest_core::{RecordMetadata, ResultRecord, Retrieved, WebEngine, WebSearchRecord};
use regex::Regex;

use crate::DorkClient;
use crate::error::DorkError;
use crate::html::text_content;
use crate::http::{check_response, endpoint};

const HTML_PATH: &str = "/html/";
/// All regions.
const REGION: &str = "wt-wt";
/// Safe search off.
const SAFE_SEARCH_OFF: &str = "-2";

fn result_link() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#)
            .expect("result link pattern is valid")
    })
}

fn href_attribute() -> &'static Regex {
    static HREF: OnceLock<Regex> = OnceLock::new();
    HREF.get_or_init(|| Regex::new(r#"href="([^"]*)""#).expect("href pattern is valid"))
}

fn snippet_pattern() -> &'static Regex {
    static SNIPPET: OnceLock<Regex> = OnceLock::new();
    SNIPPET.get_or_init(|| {
        Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
            .expect("snippet pattern is valid")
    })
}

/// Recency filter code (`df`) for a day range.
///
/// 365 maps to a year, 28 to 31 to a month and anything else of at least 7
/// days to a week. Shorter ranges, including a single day, are unfiltered.
#[must_use]
pub const fn recency_code(days: u32) -> Option<&'static str> {
    match days {
        365 => Some("y"),
        28..=31 => Some("m"),
        7.. => Some("w"),
        _ => None,
    }
}

/// One hit on a result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl DorkClient {
    /// Run one rendered query against `DuckDuckGo`.
    ///
    /// # Errors
    ///
    /// Returns [`DorkError::Api`] for a non-success status and
    /// [`DorkError::Http`] on transport failure.
    pub async fn query_duckduckgo(
        &self,
        formatted_query: &str,
        label: &str,
        entity: &str,
    ) -> Result<Vec<ResultRecord>, DorkError> {
        let url = endpoint(&self.config.duckduckgo_url, HTML_PATH, &[])?;
        let mut form = vec![
            ("q", formatted_query),
            ("kl", REGION),
            ("kp", SAFE_SEARCH_OFF),
        ];
        if let Some(code) = recency_code(self.settings.query_date_range) {
            form.push(("df", code));
        }
        tracing::debug!(%url, formatted_query, label, entity, "querying duckduckgo");

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await?;
        let page = check_response(resp).await?.text().await?;

        let hits = parse_results(&page, self.config.max_results);
        let summary = format!("{} of {} requested", hits.len(), self.config.max_results);
        tracing::info!(label, entity, count = hits.len(), "returning duckduckgo results");

        Ok(hits
            .into_iter()
            .map(|hit| {
                ResultRecord::WebSearch(WebSearchRecord {
                    engine: WebEngine::DuckDuckGo,
                    title: hit.title,
                    url: hit.url,
                    description: hit.description,
                    metadata: RecordMetadata::new(label, entity)
                        .with_retrieved(Retrieved::Summary(summary.clone()))
                        .with_query(formatted_query),
                })
            })
            .collect())
    }
}

/// Extract up to `limit` hits from an HTML result page, skipping ads.
#[must_use]
pub fn parse_results(page: &str, limit: usize) -> Vec<Hit> {
    let links: Vec<_> = result_link().captures_iter(page).collect();
    let mut hits = Vec::new();

    for (i, caps) in links.iter().enumerate() {
        if hits.len() >= limit {
            break;
        }
        let Some(url) = href_attribute()
            .captures(&caps[1])
            .and_then(|h| resolve_link(&h[1]))
        else {
            continue;
        };
        let title = text_content(&caps[2]);

        let block_start = caps.get(0).map_or(0, |m| m.end());
        let block_end = links
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(page.len(), |m| m.start());
        let description = snippet_pattern()
            .captures(&page[block_start..block_end])
            .map(|c| text_content(&c[1]))
            .unwrap_or_default();

        hits.push(Hit {
            url,
            title,
            description,
        });
    }
    hits
}

/// Turn a result `href` into the target URL.
///
/// Redirect links (`/l/?uddg=<target>`) are unwrapped; ad links (`/y.js`) and
/// anything that does not end up absolute are dropped.
fn resolve_link(href: &str) -> Option<String> {
    let href = html_escape::decode_html_entities(href).into_owned();
    let href = href
        .strip_prefix("//")
        .map_or_else(|| href.clone(), |rest| format!("https://{rest}"));

    if href.contains("/y.js?") {
        return None;
    }
    let target = if href.contains("/l/?") {
        let (_, query) = href.split_once('?')?;
        let encoded = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("uddg="))?;
        urlencoding::decode(encoded).ok()?.into_owned()
    } else {
        href
    };
    target.starts_with("http").then_some(target)
}
