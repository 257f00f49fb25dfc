//! Google web search backend.
//!
//! Scrapes the basic (no-script) result page. Each organic hit is an anchor
//! pointing at `/url?q=<target>&...` that wraps an `<h3>` title, followed by a
//! `BNeawe s3v9rd AP7Wnd` block holding the snippet.

use std::sync::OnceLock;

use harvest_core::{RecordMetadata, ResultRecord, Retrieved, WebEngine, WebSearchRecord};
use regex::Regex;

use crate::DorkClient;
use crate::error::DorkError;
use crate::html::text_content;
use crate::http::{check_response, endpoint, is_retryable, random_delay};

const SEARCH_PATH: &str = "/search";

fn result_anchor() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| {
        Regex::new(r#"<a href="/url\?q=([^"&]+)[^"]*"[^>]*>"#).expect("anchor pattern is valid")
    })
}

fn title_pattern() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| Regex::new(r"(?s)<h3[^>]*>(.*?)</h3>").expect("title pattern is valid"))
}

fn snippet_pattern() -> &'static Regex {
    static SNIPPET: OnceLock<Regex> = OnceLock::new();
    SNIPPET.get_or_init(|| {
        Regex::new(r#"(?s)<div class="BNeawe s3v9rd AP7Wnd">(.*?)</div>"#)
            .expect("snippet pattern is valid")
    })
}

/// One organic hit on a result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl DorkClient {
    /// Run one rendered query against Google web search.
    ///
    /// Retries while Google answers 429 or 5xx, pausing a random
    /// `retry_min_secs..=retry_max_secs` between attempts.
    ///
    /// # Errors
    ///
    /// Returns [`DorkError::Api`] for a final non-success status and
    /// [`DorkError::Http`] on transport failure.
    pub async fn query_google(
        &self,
        formatted_query: &str,
        label: &str,
        entity: &str,
    ) -> Result<Vec<ResultRecord>, DorkError> {
        let num = (self.config.max_results + 1).to_string();
        let tbs = format!("qdr:d{}", self.settings.query_date_range);
        let mut params = vec![("q", formatted_query), ("num", num.as_str()), ("hl", "en")];
        if self.settings.query_date_range > 0 {
            params.push(("tbs", tbs.as_str()));
        }
        let url = endpoint(&self.config.google_url, SEARCH_PATH, &params)?;
        tracing::debug!(%url, "querying google");

        let attempts = self.config.google_attempts.max(1);
        let mut attempt = 1;
        let resp = loop {
            let resp = self.http.get(url.clone()).send().await?;
            if attempt < attempts && is_retryable(resp.status()) {
                tracing::debug!(attempt, status = resp.status().as_u16(), "google throttled");
                tokio::time::sleep(random_delay(
                    self.config.retry_min_secs,
                    self.config.retry_max_secs,
                ))
                .await;
                attempt += 1;
                continue;
            }
            break check_response(resp).await?;
        };

        let page = resp.text().await?;
        let hits = parse_results(&page, self.config.max_results);
        let summary = format!(
            "{} of {} requested",
            hits.len(),
            self.config.max_results.saturating_sub(1)
        );
        tracing::info!(label, entity, count = hits.len(), "returning google results");

        Ok(hits
            .into_iter()
            .map(|hit| {
                ResultRecord::WebSearch(WebSearchRecord {
                    engine: WebEngine::Google,
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

/// Extract up to `limit` organic hits from a result page.
///
/// Anchors without an `<h3>` title (navigation, related searches) and links
/// back into Google itself are skipped, as are repeated URLs.
#[must_use]
pub fn parse_results(page: &str, limit: usize) -> Vec<Hit> {
    let anchors: Vec<_> = result_anchor().captures_iter(page).collect();
    let mut hits: Vec<Hit> = Vec::new();

    for (i, caps) in anchors.iter().enumerate() {
        if hits.len() >= limit {
            break;
        }
        let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let block_end = anchors
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(page.len(), |m| m.start());
        let block = &page[whole.end()..block_end];

        let url = urlencoding::decode(target.as_str())
            .map_or_else(|_| target.as_str().to_string(), |u| u.into_owned());
        if is_internal(&url) || hits.iter().any(|h| h.url == url) {
            continue;
        }
        let Some(title) = title_pattern()
            .captures(block)
            .map(|c| text_content(&c[1]))
            .filter(|t| !t.is_empty())
        else {
            continue;
        };
        let description = snippet_pattern()
            .captures(block)
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

fn is_internal(url: &str) -> bool {
    !url.starts_with("http")
        || url
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .is_some_and(|host| host == "google.com" || host.ends_with(".google.com"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><body>
<div><a href="/search?q=site:acme.com&amp;tbm=isch">Images</a></div>
<div class="ZINbbc"><div class="kCrYT">
<a href="/url?q=https://acme.com/login%3Fnext%3D/&amp;sa=U&amp;ved=2ah"><h3 class="zBAuLc"><div class="BNeawe vvjwJb AP7Wnd">Acme &amp; Co Login</div></h3><div class="BNeawe UPmit AP7Wnd">acme.com</div></a>
</div><div class="kCrYT"><div><div class="BNeawe s3v9rd AP7Wnd"><div><div><div class="BNeawe s3v9rd AP7Wnd">Sign in to the
  Acme portal.</div></div></div></div></div></div></div>
<div class="ZINbbc"><div class="kCrYT">
<a href="/url?q=https://maps.google.com/maps%3Fq%3Dacme&amp;sa=U"><h3>Map</h3></a>
</div></div>
<div class="ZINbbc"><div class="kCrYT">
<a href="/url?q=https://files.acme.com/report.pdf&amp;sa=U"><h3><div>Quarterly report</div></h3></a>
</div></div>
<div class="ZINbbc"><div class="kCrYT">
<a href="/url?q=https://acme.com/login%3Fnext%3D/&amp;sa=U"><h3>Duplicate</h3></a>
</div></div>
<a href="/url?q=https://acme.com/footer&amp;sa=U">no title here</a>
</body></html>"#;

    #[test]
    fn extracts_organic_hits() {
        let hits = parse_results(PAGE, 20);
        assert_eq!(
            hits,
            vec![
                Hit {
                    url: "https://acme.com/login?next=/".into(),
                    title: "Acme & Co Login".into(),
                    description: "Sign in to the Acme portal.".into(),
                },
                Hit {
                    url: "https://files.acme.com/report.pdf".into(),
                    title: "Quarterly report".into(),
                    description: String::new(),
                },
            ]
        );
    }

    #[test]
    fn respects_limit() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
        assert!(parse_results(PAGE, 0).is_empty());
    }

    #[test]
    fn empty_page_has_no_hits() {
        assert!(parse_results("<html></html>", 20).is_empty());
    }

    #[test]
    fn internal_links() {
        assert!(is_internal("https://www.google.com/preferences"));
        assert!(is_internal("https://google.com/"));
        assert!(is_internal("/search?q=x"));
        assert!(!is_internal("https://notgoogle.com/"));
        assert!(!is_internal("https://acme.com/google.com"));
    }
}
