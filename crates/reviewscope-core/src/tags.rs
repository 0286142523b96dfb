use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Locale tag attached to an analysis and its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Vi,
    En,
    Cn,
    Zh,
    Ja,
}

impl Locale {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Vi => "vi",
            Locale::En => "en",
            Locale::Cn => "cn",
            Locale::Zh => "zh",
            Locale::Ja => "ja",
        }
    }

    /// Language name used when asking a model for locale-specific results.
    #[must_use]
    pub fn language_name(self) -> &'static str {
        match self {
            Locale::Vi => "Vietnamese",
            Locale::En => "English",
            Locale::Cn | Locale::Zh => "Chinese",
            Locale::Ja => "Japanese",
        }
    }

    /// Language name for an optional locale; unset means Vietnamese.
    #[must_use]
    pub fn language_name_or_default(locale: Option<Self>) -> &'static str {
        locale.unwrap_or(Locale::Vi).language_name()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vi" => Ok(Locale::Vi),
            "en" => Ok(Locale::En),
            "cn" => Ok(Locale::Cn),
            "zh" => Ok(Locale::Zh),
            "ja" => Ok(Locale::Ja),
            _ => Err(CoreError::UnknownLocale(s.to_string())),
        }
    }
}

/// Model tag attached to an analysis. Only a classification label: it does
/// not select which backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    Openrouter,
    Gemini,
    Openai,
    Chatgpt,
    Anthropic,
    Claude,
    Deepseek,
    Huggingface,
    Vllm,
    Mistral,
}

impl LlmType {
    pub const ALL: [LlmType; 10] = [
        LlmType::Openrouter,
        LlmType::Gemini,
        LlmType::Openai,
        LlmType::Chatgpt,
        LlmType::Anthropic,
        LlmType::Claude,
        LlmType::Deepseek,
        LlmType::Huggingface,
        LlmType::Vllm,
        LlmType::Mistral,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LlmType::Openrouter => "openrouter",
            LlmType::Gemini => "gemini",
            LlmType::Openai => "openai",
            LlmType::Chatgpt => "chatgpt",
            LlmType::Anthropic => "anthropic",
            LlmType::Claude => "claude",
            LlmType::Deepseek => "deepseek",
            LlmType::Huggingface => "huggingface",
            LlmType::Vllm => "vllm",
            LlmType::Mistral => "mistral",
        }
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| CoreError::UnknownModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("VI".parse::<Locale>().unwrap(), Locale::Vi);
        assert_eq!("ja".parse::<Locale>().unwrap(), Locale::Ja);
        assert_eq!(
            "fr".parse::<Locale>().unwrap_err(),
            CoreError::UnknownLocale("fr".to_string())
        );
    }

    #[test]
    fn chinese_tags_share_a_language_name() {
        assert_eq!(Locale::Cn.language_name(), "Chinese");
        assert_eq!(Locale::Zh.language_name(), "Chinese");
    }

    #[test]
    fn missing_locale_defaults_to_vietnamese() {
        assert_eq!(Locale::language_name_or_default(None), "Vietnamese");
        assert_eq!(
            Locale::language_name_or_default(Some(Locale::En)),
            "English"
        );
    }

    #[test]
    fn llm_type_round_trips() {
        for t in LlmType::ALL {
            assert_eq!(t.as_str().parse::<LlmType>().unwrap(), t);
        }
        assert!("gpt".parse::<LlmType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&Locale::En).unwrap();
        assert_eq!(json, "\"en\"");
        let model: LlmType = serde_json::from_str("\"deepseek\"").unwrap();
        assert_eq!(model, LlmType::Deepseek);
    }
}
