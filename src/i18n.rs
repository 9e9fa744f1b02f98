//! Message catalog for the terminal front-end.
//!
//! The library reports problems as symbolic keys (see
//! [`crate::error::ReaderError::key`]); this module turns those keys into
//! text in the configured language.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Ru,
}

#[derive(Debug, Error)]
#[error("Unsupported language: {0} (expected \"en\" or \"ru\")")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::En => "en",
            Language::Ru => "ru",
        })
    }
}

/// Looks up `key` in the catalog for `lang`.
///
/// Unknown keys come back unchanged so a missing translation is visible
/// rather than silent.
pub fn t(lang: Language, key: &str) -> &str {
    let text = match lang {
        Language::En => en(key),
        Language::Ru => ru(key),
    };
    text.unwrap_or(key)
}

fn en(key: &str) -> Option<&'static str> {
    Some(match key {
        "title" => "RSS aggregator",
        "successMessage" => "RSS downloaded successfully",
        "feeds" => "Feeds",
        "posts" => "Posts",
        "alreadyExists" => "RSS already exists",
        "invalidURL" => "The link must be a valid URL",
        "invalidRSS" => "The resource doesn't contain valid RSS",
        "badNetwork" => "Network error",
        "emptyField" => "Fill in the field",
        _ => return None,
    })
}

fn ru(key: &str) -> Option<&'static str> {
    Some(match key {
        "title" => "RSS агрегатор",
        "successMessage" => "RSS успешно загружен",
        "feeds" => "Фиды",
        "posts" => "Посты",
        "alreadyExists" => "RSS уже существует",
        "invalidURL" => "Ссылка должна быть валидным URL",
        "invalidRSS" => "Ресурс не содержит валидный RSS",
        "badNetwork" => "Ошибка сети",
        "emptyField" => "Не должно быть пустым",
        _ => return None,
    })
}
