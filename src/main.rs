mod config;
mod error;
mod github_api_utils;
mod prompt_utils;
mod reviews_utils;
mod stock_api_utils;
mod weather_api_utils;

use config::Config;
use error::Result;
use github_api_utils::{github_api_helper::GithubClient, repos_report::run_repos_kata};
use prompt_utils::Prompt;
use reviews_utils::reviews_helper::{run_reviews_kata, ReviewsDataset};
use stock_api_utils::stock_helper::{run_stock_kata, StockData};
use weather_api_utils::weather_helper::{run_weather_kata, WeatherService};

use dotenv::dotenv;
use reqwest::Client;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

const USAGE: &str = "Usage: katapy <github|weather|stock|reviews> [username|city|symbol|dataset]";

enum Kata {
    Github,
    Weather,
    Stock,
    Reviews,
}

impl Kata {
    fn from_arg(arg: &str) -> Option<Kata> {
        match arg {
            "github" => Some(Kata::Github),
            "weather" => Some(Kata::Weather),
            "stock" => Some(Kata::Stock),
            "reviews" => Some(Kata::Reviews),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() {
    // load env variables
    dotenv().ok();
    pretty_env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let query = args.get(2).cloned();

    let Some(kata) = Kata::from_arg(command) else {
        error!("Unrecognized argument {}, closing...", command);
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    if let Err(err) = run(kata, query).await {
        debug!("{err:?}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(kata: Kata, query: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let client = Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let mut prompt = Prompt::stdio();

    match kata {
        Kata::Github => {
            let github = GithubClient::new(client, &config.github)?;
            run_repos_kata(&github, &mut prompt, query).await
        }
        Kata::Weather => {
            let service = WeatherService::new(client, &config.weather)?;
            run_weather_kata(&service, config.weather.default_units, &mut prompt, query).await
        }
        Kata::Stock => {
            let stock_data = StockData::new(client, &config.stock)?;
            run_stock_kata(&stock_data, config.stock.days, &mut prompt, query).await
        }
        Kata::Reviews => {
            let dataset = ReviewsDataset::new(client);
            let location = query.or(config.reviews.dataset);
            run_reviews_kata(&dataset, location, config.reviews.top_words, &mut prompt).await
        }
    }
}
