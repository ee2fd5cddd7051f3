use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::{KataError, Result};
use crate::weather_api_utils::Units;

const DEFAULT_CONFIG_REL_PATH: &str = "katapy.toml";
const GITHUB_API_URL: &str = "https://api.github.com";
const OPENWEATHER_API_URL: &str = "https://api.openweathermap.org";
const ALPHA_VANTAGE_API_URL: &str = "https://www.alphavantage.co";
const DEFAULT_USER_AGENT: &str = "katapy";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STOCK_DAYS: usize = 5;
const DEFAULT_TOP_WORDS: usize = 5;

pub const OPENWEATHER_API_KEY_VAR: &str = "OPENWEATHER_API_KEY";
pub const ALPHA_VANTAGE_API_KEY_VAR: &str = "ALPHA_VANTAGE_API_KEY";

/// Everything the kata need from the outside world, resolved once at startup.
/// Precedence is environment (and `.env`) over `katapy.toml` over defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub request_timeout: Duration,
    pub github: GithubConfig,
    pub weather: WeatherConfig,
    pub stock: StockConfig,
    pub reviews: ReviewsConfig,
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Optional, unauthenticated requests work with a lower rate limit.
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_units: Units,
}

#[derive(Debug, Clone)]
pub struct StockConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub days: usize,
}

#[derive(Debug, Clone)]
pub struct ReviewsConfig {
    /// Local csv file, directory holding one, or http(s) url to download it from.
    pub dataset: Option<String>,
    pub top_words: usize,
}

impl WeatherConfig {
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(KataError::MissingCredential {
                var: OPENWEATHER_API_KEY_VAR,
            })
    }
}

impl StockConfig {
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(KataError::MissingCredential {
                var: ALPHA_VANTAGE_API_KEY_VAR,
            })
    }
}

// On-disk layout, every key is optional
#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    request_timeout_secs: Option<u64>,
    github: GithubSection,
    weather: WeatherSection,
    stock: StockSection,
    reviews: ReviewsSection,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct GithubSection {
    base_url: Option<String>,
    user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct WeatherSection {
    base_url: Option<String>,
    units: Option<Units>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct StockSection {
    base_url: Option<String>,
    days: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct ReviewsSection {
    dataset: Option<String>,
    top_words: Option<usize>,
}

impl Config {
    /// Reads the config file pointed by *KATAPY_CONFIG* (or `katapy.toml` if present
    /// in the working dir) and overlays the process environment on top of it.
    pub fn load() -> Result<Config> {
        let file = match std::env::var("KATAPY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => read_config_file(Path::new(path.trim()))?,
            _ if Path::new(DEFAULT_CONFIG_REL_PATH).exists() => {
                read_config_file(Path::new(DEFAULT_CONFIG_REL_PATH))?
            }
            _ => FileConfig::default(),
        };
        Config::from_sources(file, |var| std::env::var(var).ok())
    }

    pub(crate) fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Config> {
        // blank values count as unset
        let lookup = |var: &str| {
            env(var)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let timeout_secs = match lookup("KATAPY_TIMEOUT_SECS") {
            Some(secs) => secs.parse::<u64>().map_err(|err| KataError::Config {
                message: format!("KATAPY_TIMEOUT_SECS '{secs}' is not a number of seconds: {err}"),
            })?,
            None => file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        // a zero timeout fails every request
        if timeout_secs == 0 {
            return Err(KataError::Config {
                message: String::from("request timeout must be at least 1 second"),
            });
        }

        let default_units = match lookup("OPENWEATHER_UNITS") {
            Some(units) => units
                .parse::<Units>()
                .map_err(|message| KataError::Config { message })?,
            None => file.weather.units.unwrap_or_default(),
        };

        Ok(Config {
            request_timeout: Duration::from_secs(timeout_secs),
            github: GithubConfig {
                base_url: lookup("GH_API_BASE_URL")
                    .or(file.github.base_url)
                    .unwrap_or_else(|| GITHUB_API_URL.to_owned()),
                user_agent: lookup("GH_API_USER_AGENT")
                    .or(file.github.user_agent)
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
                token: lookup("GH_API_KEY"),
            },
            weather: WeatherConfig {
                base_url: lookup("OPENWEATHER_BASE_URL")
                    .or(file.weather.base_url)
                    .unwrap_or_else(|| OPENWEATHER_API_URL.to_owned()),
                api_key: lookup(OPENWEATHER_API_KEY_VAR),
                default_units,
            },
            stock: StockConfig {
                base_url: lookup("ALPHA_VANTAGE_BASE_URL")
                    .or(file.stock.base_url)
                    .unwrap_or_else(|| ALPHA_VANTAGE_API_URL.to_owned()),
                api_key: lookup(ALPHA_VANTAGE_API_KEY_VAR),
                days: file.stock.days.unwrap_or(DEFAULT_STOCK_DAYS),
            },
            reviews: ReviewsConfig {
                dataset: lookup("REVIEWS_DATASET").or(file.reviews.dataset),
                top_words: file.reviews.top_words.unwrap_or(DEFAULT_TOP_WORDS),
            },
        })
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path).map_err(|err| KataError::Config {
        message: format!("couldn't read {}: {err}", path.display()),
    })?;
    let file = toml::from_str(&content).map_err(|err| KataError::Config {
        message: format!("invalid {}: {err}", path.display()),
    })?;
    debug!("Loaded config file {}", path.display());
    Ok(file)
}
