use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

// a single arXiv record. only title, summary and url are used for matching and notification.

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Paper {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub authors: Vec<String>,
    pub published: Option<DateTime<Utc>>
}

impl Paper {
    pub fn new(title: &str, summary: &str, url: &str) -> Self {
        Paper {
            title: title.to_string(),
            summary: summary.to_string(),
            url: url.to_string(),
            authors: Vec::new(),
            published: None
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }
}
