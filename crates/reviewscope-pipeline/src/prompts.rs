//! Prompt text sent to the generative backends.

use reviewscope_core::Locale;

/// Platform a discovery prompt asks the model to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPlatform {
    YouTube,
    TikTok,
}

impl VideoPlatform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VideoPlatform::YouTube => "youtube",
            VideoPlatform::TikTok => "tiktok",
        }
    }
}

const PRODUCT_FORMAT: &str = r#"{"products":[{"name":"","price":"","description":"","brand":"","likeCount":0,"commentCount":0,"shareCount":0,"viewCount":0,"favoriteCount":0,"videoUrl":"","thumbnails":"","cover":""}]}"#;

#[must_use]
pub fn clean_name_prompt(raw_name: &str) -> String {
    format!(
        "Extract the product name from this text and return only the product name, \
         without review words, channel names, emoji or hashtags: \"{raw_name}\". \
         Return json format: {{\"name\": \"Product Name\"}}"
    )
}

#[must_use]
pub fn trace_product_prompt(url: &str) -> String {
    format!(
        "Trace the product sold or described at this url: {url}. \
         Return json format: {{\"productName\": \"\", \"price\": \"\", \"description\": \"\", \
         \"brand\": \"\", \"likeCount\": 0, \"commentCount\": 0, \"shareCount\": 0, \
         \"viewCount\": 0, \"favoriteCount\": 0}}"
    )
}

/// Missing locale falls back to Vietnamese.
#[must_use]
pub fn discovery_prompt(
    platform: VideoPlatform,
    product_name: &str,
    locale: Option<Locale>,
) -> String {
    format!(
        "help me find video {platform} review {product_name}, and locale '{language}', \
         and no nonsense and return json format {PRODUCT_FORMAT}",
        platform = platform.as_str(),
        language = Locale::language_name_or_default(locale),
    )
}
