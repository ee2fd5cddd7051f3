use std::io::{BufRead, Write};

use reqwest::Client;

use super::current_weather_api_response::GetWeatherResponse;
use super::Units;
use crate::config::WeatherConfig;
use crate::error::{KataError, Result};
use crate::prompt_utils::Prompt;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub units: Units,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u32,
    pub description: String,
}

impl WeatherReport {
    fn from_response(city: &str, units: Units, response: GetWeatherResponse) -> Result<Self> {
        let description = response
            .conditions
            .into_iter()
            .next()
            .map(|weather| weather.description)
            .ok_or_else(|| KataError::malformed("response has an empty 'weather' list"))?;
        Ok(WeatherReport {
            city: city.to_owned(),
            units,
            temp: response.main.temp,
            feels_like: response.main.feels_like,
            humidity: response.main.humidity,
            description,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "Weather Report\nCity: {}\nTemperature ({}): {}\nFeels Like: {}\nHumidity: {}\nDescription: {}",
            self.city,
            self.units.temperature_symbol(),
            self.temp,
            self.feels_like,
            self.humidity,
            self.description
        )
    }
}

/// Current weather by city name from OpenWeatherMap.
pub struct WeatherService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherService {
    /// Fails with `MissingCredential` when *OPENWEATHER_API_KEY* is not set.
    pub fn new(client: Client, config: &WeatherConfig) -> Result<Self> {
        Ok(WeatherService {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key()?.to_owned(),
        })
    }

    pub async fn fetch_by_city(&self, city: &str, units: Units) -> Result<WeatherReport> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        debug!("Requesting weather for {city} in {units} units");

        let response = self
            .client
            .get(url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", units.as_query()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Request failed: {}", status);
            return Err(KataError::from_status(status));
        }
        info!("Request successful: {}", status);

        let response_body = response.text().await?;
        let weather: GetWeatherResponse = serde_json::from_str(&response_body)?;
        WeatherReport::from_response(city, units, weather)
    }
}

/// Entry point of the `weather` subcommand: one report for `city`,
/// or the interactive loop when no city was given.
pub async fn run_weather_kata<R: BufRead, W: Write>(
    service: &WeatherService,
    default_units: Units,
    prompt: &mut Prompt<R, W>,
    city: Option<String>,
) -> Result<()> {
    if let Some(city) = city {
        let report = service.fetch_by_city(city.trim(), default_units).await?;
        return prompt.say(&report.render());
    }

    loop {
        let city = match prompt.ask("Enter the city name: ")? {
            Some(city) if city.is_empty() => continue,
            Some(city) => city,
            None => break,
        };
        let units = match prompt.ask_or(
            "Enter the unit system(metric/imperial/standard): ",
            default_units.as_query(),
        )? {
            Some(units) => units,
            None => break,
        };

        match units.parse::<Units>() {
            Ok(units) => {
                let outcome = service
                    .fetch_by_city(&city, units)
                    .await
                    .map(|report| report.render());
                prompt.show_outcome(outcome)?;
            }
            Err(message) => prompt.say(&message)?,
        }

        if !prompt.confirm("\nWould you like to continue? (y/n): ", true)? {
            break;
        }
    }
    Ok(())
}
