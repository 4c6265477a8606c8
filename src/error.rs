use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration. Always fatal.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse arXiv feed: {0}")]
    Feed(#[from] quick_xml::DeError),

    /// arXiv answered, but with an error status or an error entry.
    #[error("arXiv API error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, Error>;
