pub mod reviews_helper;

pub(crate) mod reviews_dataset_record {
    pub(crate) const RATING_COLUMN: &str = "reviews.rating";
    pub(crate) const TEXT_COLUMN: &str = "reviews.text";

    /// One row of the product reviews dataset, every other column is ignored.
    /// Empty cells come back as `None`.
    #[derive(serde::Deserialize, Debug, Clone, PartialEq)]
    pub(crate) struct ReviewRecord {
        #[serde(rename = "reviews.rating")]
        pub(crate) rating: Option<String>,
        #[serde(rename = "reviews.text")]
        pub(crate) text: Option<String>,
    }
}
