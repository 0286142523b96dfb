//! Raw input classification.
//!
//! Every string the caller submits is one of four kinds. Classification is
//! total: anything that does not parse as an absolute URL is free text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::CoreError;

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "youtu.be"];
const TIKTOK_HOSTS: &[&str] = &["tiktok.com", "vt.tiktok.com"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Youtube,
    Tiktok,
    Website,
    Text,
}

impl InputType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Youtube => "youtube",
            InputType::Tiktok => "tiktok",
            InputType::Website => "website",
            InputType::Text => "text",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(InputType::Youtube),
            "tiktok" => Ok(InputType::Tiktok),
            "website" => Ok(InputType::Website),
            "text" => Ok(InputType::Text),
            other => Err(CoreError::UnknownInputType(other.to_string())),
        }
    }
}

/// Classify a raw input string.
///
/// Hostnames are matched by suffix on a label boundary, so `m.youtube.com`
/// is `YouTube` but `notyoutube.com` is a plain website.
#[must_use]
pub fn classify(input: &str) -> InputType {
    let Ok(url) = Url::parse(input.trim()) else {
        return InputType::Text;
    };

    let host = url
        .host_str()
        .unwrap_or_default()
        .trim_end_matches('.')
        .to_ascii_lowercase();

    if matches_any(&host, YOUTUBE_HOSTS) {
        InputType::Youtube
    } else if matches_any(&host, TIKTOK_HOSTS) {
        InputType::Tiktok
    } else {
        InputType::Website
    }
}

fn matches_any(host: &str, domains: &[&str]) -> bool {
    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
