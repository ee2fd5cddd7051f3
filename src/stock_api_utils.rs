pub mod stock_helper;

pub(crate) mod daily_series_api_response {
    use std::collections::BTreeMap;

    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct MetaData {
        #[serde(rename = "2. Symbol")]
        pub(crate) symbol: String,
        #[serde(rename = "3. Last Refreshed")]
        pub(crate) last_refreshed: String,
    }

    // Alpha Vantage sends every number as a string
    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct DailyBar {
        #[serde(rename = "1. open")]
        pub(crate) open: String,
        #[serde(rename = "2. high")]
        pub(crate) high: String,
        #[serde(rename = "3. low")]
        pub(crate) low: String,
        #[serde(rename = "4. close")]
        pub(crate) close: String,
        #[serde(rename = "5. volume")]
        pub(crate) volume: String,
    }

    /// Errors and quota notes come back with a 200 status, hence the optional fields.
    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct GetDailySeriesResponse {
        #[serde(rename = "Meta Data")]
        pub(crate) meta_data: Option<MetaData>,
        #[serde(rename = "Time Series (Daily)")]
        pub(crate) series: Option<BTreeMap<String, DailyBar>>,
        #[serde(rename = "Error Message")]
        pub(crate) error_message: Option<String>,
        #[serde(rename = "Note")]
        pub(crate) note: Option<String>,
        #[serde(rename = "Information")]
        pub(crate) information: Option<String>,
    }
}
