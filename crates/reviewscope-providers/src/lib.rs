//! HTTP clients for the external services the pipeline depends on: the
//! `YouTube` Data API, `TikTok` oEmbed, arbitrary product pages, Gemini, and
//! OpenAI-compatible chat completions.
//!
//! Clients bound to a fixed API host have a `with_base_url` constructor for
//! pointing them at a mock server. All of them retry transient failures with
//! jittered exponential back-off.

pub mod chat;
pub mod error;
pub mod gemini;
pub mod http;
pub mod page;
pub(crate) mod retry;
pub mod tiktok;
pub mod youtube;

pub use chat::ChatCompletionsClient;
pub use error::ProviderError;
pub use gemini::GeminiClient;
pub use http::HttpSettings;
pub use page::PageClient;
pub use tiktok::{TikTokClient, TikTokVideo};
pub use youtube::{extract_video_id, SearchPrefix, ThumbnailSet, YouTubeClient, YouTubeVideo};
