use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use reqwest::Client;

use super::reviews_dataset_record::{ReviewRecord, RATING_COLUMN, TEXT_COLUMN};
use crate::error::{KataError, Result};
use crate::prompt_utils::Prompt;

/// Common english words (and the fragments left by splitting contractions)
/// that say nothing about a product.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "could", "couldn", "did", "didn", "do", "does", "doesn",
    "doing", "don", "down", "during", "each", "even", "few", "for", "from", "further", "get",
    "got", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "isn", "it", "its", "itself",
    "just", "ll", "m", "me", "more", "most", "much", "my", "myself", "no", "nor", "not", "now",
    "of", "off", "on", "once", "one", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "re", "really", "s", "same", "she", "should", "so", "some", "such", "t",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up", "us", "ve", "very",
    "was", "wasn", "we", "well", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "won", "would", "wouldn", "you", "your", "yours", "yourself",
    "yourselves", "d",
];

/// A review that survived cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub rating: f64,
    pub text: String,
}

/// Drops rows missing a rating or a text (or whose rating is not a number),
/// then rows repeating an earlier (rating, text) pair. Order is kept.
pub fn clean(records: impl IntoIterator<Item = ReviewRecord>) -> Vec<Review> {
    let mut seen: HashSet<(u64, String)> = HashSet::new();
    records
        .into_iter()
        .filter_map(|record| {
            let rating = record
                .rating?
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|rating| rating.is_finite())?;
            let text = record.text.filter(|text| !text.trim().is_empty())?;
            Some(Review { rating, text })
        })
        .filter(|review| seen.insert((review.rating.to_bits(), review.text.clone())))
        .collect()
}

/// `None` for an empty dataset.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: f64 = reviews.iter().map(|review| review.rating).sum();
    Some(sum / reviews.len() as f64)
}

/// The `top_n` most used alphabetic words that are not stop words, with their count.
/// Ties keep the order in which the words first appear.
pub fn top_words(reviews: &[Review], top_n: usize) -> Vec<(String, usize)> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut ranked: Vec<(String, usize)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for review in reviews {
        let text = review.text.to_lowercase();
        let words = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|word| !word.is_empty() && !stop_words.contains(word));
        for word in words {
            match position.get(word) {
                Some(&idx) => ranked[idx].1 += 1,
                None => {
                    position.insert(word.to_owned(), ranked.len());
                    ranked.push((word.to_owned(), 1));
                }
            }
        }
    }

    // stable sort, ties stay in first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(top_n);
    ranked
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStats {
    pub total: usize,
    pub average: Option<f64>,
    pub top_words: Vec<(String, usize)>,
}

impl ReviewStats {
    pub fn compute(reviews: &[Review], top_n: usize) -> Self {
        ReviewStats {
            total: reviews.len(),
            average: average_rating(reviews),
            top_words: top_words(reviews, top_n),
        }
    }

    pub fn render(&self) -> String {
        let average = match self.average {
            Some(average) => format!("{average:.2}"),
            None => String::from("n/a"),
        };
        let words: Vec<&str> = self.top_words.iter().map(|(word, _)| word.as_str()).collect();
        [
            String::from("Product Reviews Report"),
            String::from("----------------"),
            format!("Total: {}", self.total),
            format!("Average: {average}"),
            format!("Words: {}", words.join(", ")),
        ]
        .join("\n")
    }
}

/// Parses the csv, requiring both review columns in the header row.
fn read_records<R: Read>(source: R) -> Result<Vec<ReviewRecord>> {
    let mut reader = ReaderBuilder::new().from_reader(source);
    let headers = reader.headers()?;
    for column in [RATING_COLUMN, TEXT_COLUMN] {
        if !headers.iter().any(|header| header == column) {
            return Err(KataError::InvalidInput {
                message: format!("dataset has no '{column}' column"),
            });
        }
    }
    Ok(reader.deserialize().collect::<csv::Result<Vec<ReviewRecord>>>()?)
}

/// A directory stands for the first csv file it holds, by name.
fn resolve_csv(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_owned());
    }
    let mut csv_files = Vec::new();
    for entry in fs::read_dir(path)? {
        let file = entry?.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "csv") {
            csv_files.push(file);
        }
    }
    csv_files.sort();
    csv_files.into_iter().next().ok_or_else(|| KataError::InvalidInput {
        message: format!("no csv file in {}", path.display()),
    })
}

/// Reads the reviews dataset from disk or downloads it.
pub struct ReviewsDataset {
    client: Client,
}

impl ReviewsDataset {
    pub fn new(client: Client) -> Self {
        ReviewsDataset { client }
    }

    pub async fn load(&self, location: &str) -> Result<Vec<ReviewRecord>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return self.download(location).await;
        }
        let path = resolve_csv(Path::new(location))?;
        debug!("Reading dataset {}", path.display());
        read_records(File::open(&path)?)
    }

    async fn download(&self, url: &str) -> Result<Vec<ReviewRecord>> {
        info!("Downloading dataset from {url}");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            error!("Request failed: {}", response.status());
            return Err(KataError::from_status(response.status()));
        }
        let body = response.text().await?;
        read_records(body.as_bytes())
    }
}

/// Entry point of the `reviews` subcommand: one report over the whole dataset.
pub(crate) async fn run_reviews_kata<R: BufRead, W: Write>(
    dataset: &ReviewsDataset,
    location: Option<String>,
    top_n: usize,
    prompt: &mut Prompt<R, W>,
) -> Result<()> {
    let location = location.ok_or_else(|| KataError::Config {
        message: String::from("no reviews dataset, pass its path or url or set REVIEWS_DATASET"),
    })?;

    let records = dataset.load(&location).await?;
    let row_count = records.len();
    let reviews = clean(records);
    info!("Kept {} of {row_count} rows after cleaning", reviews.len());

    let stats = ReviewStats::compute(&reviews, top_n);
    prompt.say(&stats.render())
}
