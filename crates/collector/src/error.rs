#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read location list: {0}")]
    LocationFile(#[from] std::io::Error),
    #[error("Failed to parse location list: {0}")]
    LocationParse(#[from] serde_json::Error),
    #[error("Failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Browser session failed: {0}")]
    Browser(String),
    #[error("Failed to scrape {url}: {reason}")]
    Scrape { url: String, reason: String },
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Browser(err.to_string())
    }
}
