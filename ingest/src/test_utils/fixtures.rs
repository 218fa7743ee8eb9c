use config::shared::IngestConfig;
use serde_json::{Value, json};

use crate::catalog::ReviewCatalog;
use crate::store::StoreConnector;

/// Builds one item input line.
#[derive(Debug, Clone)]
pub struct ItemLine {
    fields: serde_json::Map<String, Value>,
}

impl ItemLine {
    pub fn new(asin: &str) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("asin".to_owned(), json!(asin));
        Self { fields }
    }

    pub fn title(self, title: &str) -> Self {
        self.field("title", json!(title))
    }

    pub fn image_url(self, url: &str) -> Self {
        self.field("imageURL", json!(url))
    }

    pub fn description(self, description: &str) -> Self {
        self.field("description", json!(description))
    }

    pub fn categories(self, categories: &[&[&str]]) -> Self {
        self.field("categories", json!(categories))
    }

    /// Sets an arbitrary field, including ones the loader does not know.
    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_owned(), value);
        self
    }

    pub fn build(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

/// Builds one review input line.
#[derive(Debug, Clone)]
pub struct ReviewLine {
    fields: serde_json::Map<String, Value>,
}

impl ReviewLine {
    pub fn new(reviewer_id: &str, asin: &str, unix_review_time: i64) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("reviewerId".to_owned(), json!(reviewer_id));
        fields.insert("asin".to_owned(), json!(asin));
        fields.insert("unixReviewTime".to_owned(), json!(unix_review_time));
        Self { fields }
    }

    pub fn reviewer_name(self, name: &str) -> Self {
        self.field("reviewerName", json!(name))
    }

    pub fn rating(self, rating: i64) -> Self {
        self.field("rating", json!(rating))
    }

    pub fn summary(self, summary: &str) -> Self {
        self.field("summary", json!(summary))
    }

    pub fn review_text(self, text: &str) -> Self {
        self.field("reviewText", json!(text))
    }

    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_owned(), value);
        self
    }

    /// Removes a field so the loader falls back to its default.
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    pub fn build(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

/// Joins lines into newline-delimited input.
pub fn ndjson<I, T>(lines: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut input = String::new();
    for line in lines {
        input.push_str(line.as_ref());
        input.push('\n');
    }
    input
}

/// Returns a catalog that is connected, has its tables and is initialized.
pub async fn ready_catalog<C: StoreConnector>(
    connector: C,
    config: IngestConfig,
) -> ReviewCatalog<C> {
    let mut catalog = ReviewCatalog::new(connector, config);
    catalog.connect().await.unwrap();
    catalog.create_tables().await.unwrap();
    catalog.initialize().await.unwrap();
    catalog
}

/// Pipeline settings with a given pool size and the default drain timeout.
pub fn ingest_config(worker_count: usize) -> IngestConfig {
    IngestConfig {
        worker_count,
        ..IngestConfig::default()
    }
}
