use std::io::{BufRead, Write};
use std::str::FromStr;

use chrono::NaiveDate;
use reqwest::Client;

use super::daily_series_api_response::{DailyBar, GetDailySeriesResponse};
use crate::config::StockConfig;
use crate::error::{KataError, Result};
use crate::prompt_utils::Prompt;

const DAILY_SERIES_FUNCTION: &str = "TIME_SERIES_DAILY";

#[derive(Debug, Clone, PartialEq)]
pub struct DailyQuote {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockReport {
    pub symbol: String,
    pub last_refreshed: String,
    /// Newest first.
    pub days: Vec<DailyQuote>,
}

fn parse_field<T: FromStr>(date: &str, name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| KataError::malformed(format!("{date}: '{name}' is not a number: {value}")))
}

impl DailyQuote {
    fn from_bar(date: &str, bar: &DailyBar) -> Result<Self> {
        Ok(DailyQuote {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|err| KataError::malformed(format!("invalid date '{date}': {err}")))?,
            open: parse_field(date, "open", &bar.open)?,
            high: parse_field(date, "high", &bar.high)?,
            low: parse_field(date, "low", &bar.low)?,
            close: parse_field(date, "close", &bar.close)?,
            volume: parse_field(date, "volume", &bar.volume)?,
        })
    }
}

impl StockReport {
    fn from_response(response: GetDailySeriesResponse) -> Result<Self> {
        if let Some(message) = response.error_message {
            return Err(KataError::Api { message });
        }
        if let Some(note) = response.note.or(response.information) {
            warn!("{note}");
            return Err(KataError::RateLimited {
                service: "Alpha Vantage",
                reset_at: None,
            });
        }

        let meta_data = response
            .meta_data
            .ok_or_else(|| KataError::malformed("missing field `Meta Data`"))?;
        let series = response
            .series
            .ok_or_else(|| KataError::malformed("missing field `Time Series (Daily)`"))?;

        let mut days = series
            .iter()
            .map(|(date, bar)| DailyQuote::from_bar(date, bar))
            .collect::<Result<Vec<_>>>()?;
        days.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(StockReport {
            symbol: meta_data.symbol,
            last_refreshed: meta_data.last_refreshed,
            days,
        })
    }

    /// Header plus the `days` most recent sessions.
    pub fn render(&self, days: usize) -> String {
        let mut lines = vec![
            String::from("Stock Report"),
            format!("Symbol: {}", self.symbol),
            format!("Last Refreshed: {}", self.last_refreshed),
        ];
        lines.extend(self.days.iter().take(days).map(|quote| {
            format!(
                "{}  open: {:.2}  high: {:.2}  low: {:.2}  close: {:.2}  volume: {}",
                quote.date, quote.open, quote.high, quote.low, quote.close, quote.volume
            )
        }));
        lines.join("\n")
    }
}

/// Daily time series from Alpha Vantage.
pub struct StockData {
    client: Client,
    base_url: String,
    api_key: String,
}

impl StockData {
    /// Fails with `MissingCredential` when *ALPHA_VANTAGE_API_KEY* is not set.
    pub fn new(client: Client, config: &StockConfig) -> Result<Self> {
        Ok(StockData {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key()?.to_owned(),
        })
    }

    pub async fn fetch_daily(&self, symbol: &str) -> Result<StockReport> {
        let url = format!("{}/query", self.base_url);
        debug!("Requesting {DAILY_SERIES_FUNCTION} for {symbol}");

        let response = self
            .client
            .get(url)
            .query(&[
                ("function", DAILY_SERIES_FUNCTION),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
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
        let series: GetDailySeriesResponse = serde_json::from_str(&response_body)?;
        StockReport::from_response(series)
    }
}

/// Entry point of the `stock` subcommand: one report for `symbol`,
/// or the interactive loop when no symbol was given.
pub async fn run_stock_kata<R: BufRead, W: Write>(
    stock_data: &StockData,
    days: usize,
    prompt: &mut Prompt<R, W>,
    symbol: Option<String>,
) -> Result<()> {
    if let Some(symbol) = symbol {
        let report = stock_data
            .fetch_daily(&symbol.trim().to_ascii_uppercase())
            .await?;
        return prompt.say(&report.render(days));
    }

    loop {
        let symbol = match prompt.ask("Enter a stock symbol: ")? {
            Some(symbol) if symbol.is_empty() => continue,
            Some(symbol) => symbol.to_ascii_uppercase(),
            None => break,
        };

        let outcome = stock_data
            .fetch_daily(&symbol)
            .await
            .map(|report| report.render(days));
        prompt.show_outcome(outcome)?;

        if !prompt.confirm("Would you like to continue? (y/n): ", false)? {
            break;
        }
    }
    Ok(())
}
