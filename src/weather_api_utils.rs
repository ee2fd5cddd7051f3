use std::{fmt, str::FromStr};

use serde::Deserialize;

pub mod weather_helper;

/// Unit system understood by the OpenWeatherMap `units` query parameter.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    #[default]
    Imperial,
    Standard,
}

impl Units {
    pub fn as_query(&self) -> &'static str {
        match *self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match *self {
            Units::Metric => "ºC",
            Units::Imperial => "ºF",
            Units::Standard => "ºK",
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            other => Err(format!(
                "Unknown unit system '{other}', expected metric, imperial or standard"
            )),
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

pub(crate) mod current_weather_api_response {
    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct Main {
        pub(crate) temp: f64,
        pub(crate) feels_like: f64,
        pub(crate) humidity: u32,
    }

    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct Weather {
        pub(crate) description: String,
    }

    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct GetWeatherResponse {
        pub(crate) main: Main,
        #[serde(rename = "weather")]
        pub(crate) conditions: Vec<Weather>,
    }
}
