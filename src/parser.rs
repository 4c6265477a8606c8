use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use quick_xml::de::from_str;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::{
    config::ArxivConfig,
    error::{Error, Result},
    model::Paper
};

/// Anything that can hand the pipeline its candidate papers.
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn fetch_recent_papers(&self) -> Result<Vec<Paper>>;
}

#[derive(Debug)]
pub struct ArxivParser {
    config: ArxivConfig,
    client: Client
}

impl ArxivParser {
    pub fn new(config: ArxivConfig) -> Self {
        ArxivParser {
            config,
            client: Client::new()
        }
    }

    fn search_query(&self, now: NaiveDateTime) -> String {
        let dates = format!("submittedDate:{}", date_range(now));
        if self.config.categories.is_empty() {
            return dates;
        }
        // search categories.
        let categories = self.config.categories.iter()
            .map(|cat| format!("cat:{}", cat))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("({}) AND {}", categories, dates)
    }

    fn query_params(&self, now: NaiveDateTime, start: usize, count: usize) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", self.search_query(now)),
            ("start", start.to_string()),
            ("max_results", count.to_string()),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ]
    }

    async fn get_raw_xml(&self, now: NaiveDateTime, start: usize, count: usize) -> Result<String> {
        let params = self.query_params(now, start, count);
        debug!(start, count, query = %params[0].1, "querying arXiv");
        let response = self.client
            .get(self.config.base_url.as_str())
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Source(format!("arXiv responded with status {}", status)));
        }
        Ok(response.text().await?)
    }

    /// Fetches every paper submitted in the day before `now`, newest first,
    /// up to `max_results`. Pages after the first wait `page_delay`.
    pub async fn get_arxiv_results(&self, now: NaiveDateTime) -> Result<Vec<Paper>> {
        let max_results = self.config.max_results;
        let page_size = self.config.page_size.min(max_results);
        let mut results: Vec<Paper> = Vec::new();

        while results.len() < max_results {
            let start = results.len();
            let count = page_size.min(max_results - start);
            if start > 0 {
                sleep(self.config.page_delay).await;
            }
            let xml = self.get_raw_xml(now, start, count).await?;
            let mut page = parse_feed(&xml)?;
            let page_len = page.len();
            debug!(start, documents = page_len, "received arXiv page");
            results.append(&mut page);
            if page_len < count {
                break;
            }
        }
        results.truncate(max_results);
        Ok(results)
    }
}

#[async_trait]
impl PaperSource for ArxivParser {
    async fn fetch_recent_papers(&self) -> Result<Vec<Paper>> {
        let papers = self.get_arxiv_results(Utc::now().naive_utc()).await?;
        info!(count = papers.len(), "fetched recent arXiv papers");
        Ok(papers)
    }
}

/// The arXiv date-range clause for the day ending at `now`.
pub fn date_range(now: NaiveDateTime) -> String {
    let yesterday = now - Duration::days(1);
    format!("[{} TO {}]", yesterday.format("%Y%m%d"), now.format("%Y%m%d"))
}

pub fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let feed: ArxivDocument = from_str(xml)?;
    feed.entries.into_iter()
        .map(Paper::try_from)
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Arxiv Raw XML Model

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArxivDocument {
    #[serde(rename = "entry")]
    entries: Vec<ArxivEntry>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArxivEntry {
    id: String,
    title: String,
    summary: String,
    published: String,
    #[serde(rename = "author")]
    authors: Vec<AuthorField>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthorField {
    name: String
}

impl TryFrom<ArxivEntry> for Paper {
    type Error = Error;

    fn try_from(entry: ArxivEntry) -> Result<Self> {
        // arXiv reports bad queries as a single entry pointing at its error docs.
        if entry.id.contains("/api/errors") {
            return Err(Error::Source(collapse_whitespace(&entry.summary)));
        }

        let paper = Paper::new(
            &collapse_whitespace(&entry.title),
            &collapse_whitespace(&entry.summary),
            entry.id.trim()
        ).with_authors(entry.authors.into_iter().map(|a| a.name.trim().to_string()).collect());

        Ok(match DateTime::parse_from_rfc3339(entry.published.trim()) {
            Ok(published) => paper.with_published(published.with_timezone(&Utc)),
            Err(e) => {
                debug!(url = %paper.url, error = %e, "entry has no usable published date");
                paper
            }
        })
    }
}

// end Arxiv Raw XML Model
