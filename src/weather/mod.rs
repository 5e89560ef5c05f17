//! # Weather Enrichment
//!
//! Runs are tagged with a short description of the day's weather. Where
//! that description comes from is a [`WeatherProvider`]; providers are
//! registered by name in a [`WeatherRegistry`] and the configured one is
//! resolved once, when the tracker is built.
//!
//! | Provider | Name | Description |
//! |----------|------|-------------|
//! | `StaticWeather` | `"static"` | Fixed table, for tests and offline use |

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use hashbrown::HashMap;
use parking_lot::RwLock;

/// A short weather description, e.g. `"Light Rain"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weather(pub String);

impl Weather {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a weather lookup produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("unknown weather provider '{0}'")]
    UnknownProvider(String),

    #[error("no weather known for {location} on {date}")]
    NotFound { location: String, date: NaiveDate },

    #[error("weather provider unavailable: {0}")]
    Unavailable(String),
}

/// A source of historical weather.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn weather(&self, location: &str, date: NaiveDate) -> Result<Weather, LookupError>;
}

// ============================================================================
// Registry
// ============================================================================

/// Name → provider mapping, filled at configuration time.
#[derive(Clone, Default)]
pub struct WeatherRegistry {
    providers: HashMap<String, Arc<dyn WeatherProvider>>,
}

impl WeatherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn WeatherProvider>) -> &mut Self {
        self.providers.insert(name.into(), provider);
        self
    }

    pub fn with(mut self, name: impl Into<String>, provider: Arc<dyn WeatherProvider>) -> Self {
        self.register(name, provider);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn WeatherProvider>, LookupError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::UnknownProvider(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for WeatherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherRegistry").field("providers", &self.names()).finish()
    }
}

// ============================================================================
// StaticWeather
// ============================================================================

/// Table-backed provider. Locations match case-insensitively; a lookup
/// falls back to the location's any-day entry, then to the default.
#[derive(Default)]
pub struct StaticWeather {
    by_day: RwLock<HashMap<(String, NaiveDate), String>>,
    by_location: RwLock<HashMap<String, String>>,
    default: Option<String>,
}

impl StaticWeather {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every otherwise-unknown lookup with `weather`.
    pub fn with_default(mut self, weather: impl Into<String>) -> Self {
        self.default = Some(weather.into());
        self
    }

    pub fn insert_day(&self, location: &str, date: NaiveDate, weather: impl Into<String>) {
        self.by_day.write().insert((location.to_lowercase(), date), weather.into());
    }

    pub fn insert_location(&self, location: &str, weather: impl Into<String>) {
        self.by_location.write().insert(location.to_lowercase(), weather.into());
    }
}

#[async_trait]
impl WeatherProvider for StaticWeather {
    async fn weather(&self, location: &str, date: NaiveDate) -> Result<Weather, LookupError> {
        let key = location.to_lowercase();
        if let Some(w) = self.by_day.read().get(&(key.clone(), date)) {
            return Ok(Weather(w.clone()));
        }
        if let Some(w) = self.by_location.read().get(&key) {
            return Ok(Weather(w.clone()));
        }
        self.default.clone().map(Weather).ok_or_else(|| LookupError::NotFound {
            location: location.to_string(),
            date,
        })
    }
}
