//! Generic web page scraping: just enough to read a product page's title.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;

use crate::error::ProviderError;
use crate::http::{check_status, HttpSettings};
use crate::retry::retry_with_backoff;

pub const PROVIDER: &str = "website";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));

pub struct PageClient {
    client: Client,
    settings: HttpSettings,
}

impl PageClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: settings.build_client(PROVIDER)?,
            settings,
        })
    }

    /// Fetches `url` and returns the text of its first `<title>` element.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::EmptyResponse`] if the page has no non-empty
    /// title, or any transport error from the fetch.
    pub async fn fetch_title(&self, url: &str) -> Result<String, ProviderError> {
        let client = &self.client;
        let html = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async move {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
                let response = check_status(PROVIDER, response).await?;
                response
                    .text()
                    .await
                    .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))
            },
        )
        .await?;

        extract_title(&html).ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}

/// First `<title>` text with tags stripped, entities decoded and whitespace
/// collapsed. `None` when missing or blank.
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?.get(1)?.as_str();
    let no_tags = TAG_RE.replace_all(raw, " ");
    let text = decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Decode the named entities that show up in titles plus numeric references.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
