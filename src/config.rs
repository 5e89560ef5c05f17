//! Tracker configuration.
//!
//! ```json
//! {
//!   "weather": { "provider": "static" },
//!   "pagination": { "page_size": 10, "max_page_size": 100 },
//!   "search": { "strict_lexing": false }
//! }
//! ```
//!
//! Every section and key is optional; missing values take the defaults
//! shown above, except `weather.provider` which defaults to none (runs get
//! the `"?"` placeholder).

use serde::{Deserialize, Serialize};

use crate::search::lexer::LexMode;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub weather: WeatherConfig,
    pub pagination: PaginationConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Registry name of the provider to use.
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { page_size: 10, max_page_size: 100 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Reject characters that match no token instead of skipping them.
    pub strict_lexing: bool,
}

impl SearchConfig {
    pub fn lex_mode(&self) -> LexMode {
        if self.strict_lexing { LexMode::Strict } else { LexMode::Permissive }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_weather_provider(mut self, name: impl Into<String>) -> Self {
        self.weather.provider = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.pagination;
        if p.page_size == 0 {
            return Err(Error::Config("pagination.page_size must be at least 1".into()));
        }
        if p.max_page_size < p.page_size {
            return Err(Error::Config(format!(
                "pagination.max_page_size ({}) is smaller than page_size ({})",
                p.max_page_size, p.page_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.search.lex_mode(), LexMode::Permissive);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_json(
            r#"{"weather": {"provider": "static"}, "search": {"strict_lexing": true}}"#,
        )
        .unwrap();
        assert_eq!(config.weather.provider.as_deref(), Some("static"));
        assert_eq!(config.search.lex_mode(), LexMode::Strict);
        assert_eq!(config.pagination.max_page_size, 100);
    }

    #[test]
    fn test_rejects_bad_pagination() {
        assert!(matches!(
            Config::from_json(r#"{"pagination": {"page_size": 0}}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"pagination": {"page_size": 50, "max_page_size": 20}}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(Config::from_json(r#"{"wether": {}}"#), Err(Error::Json(_))));
    }
}
