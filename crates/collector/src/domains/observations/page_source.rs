use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use slog::{debug, warn, Logger};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::Error;

/// Something that can render a page and hand back its table rows. The scraper
/// only sees this pair of traits, never the browser behind it.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Loads `url` and resolves once at least one `ready_selector` match exists
    async fn load(&self, url: &str, ready_selector: &str) -> Result<Box<dyn LoadedPage>, Error>;
}

#[async_trait]
pub trait LoadedPage: Send + Sync {
    /// Text of every `cell_selector` match inside each `row_selector` match
    async fn extract_rows(
        &self,
        row_selector: &str,
        cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, Error>;

    /// Releases the session; must be called once extraction is done
    async fn close(self: Box<Self>) -> Result<(), Error>;
}

/// Launches one headless Chromium per loaded page
pub struct ChromiumPageSource {
    logger: Logger,
    chrome_path: Option<PathBuf>,
    ready_timeout: Duration,
}

impl ChromiumPageSource {
    pub fn new(logger: Logger, chrome_path: Option<PathBuf>, ready_timeout: Duration) -> Self {
        ChromiumPageSource {
            logger,
            chrome_path,
            ready_timeout,
        }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), Error> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        Ok((browser, handler_task))
    }
}

#[async_trait]
impl PageSource for ChromiumPageSource {
    async fn load(&self, url: &str, ready_selector: &str) -> Result<Box<dyn LoadedPage>, Error> {
        let (browser, handler) = self.launch().await?;
        debug!(self.logger, "browser launched, loading {}", url);

        let page = match open_page(&browser, url, ready_selector, self.ready_timeout).await {
            Ok(page) => page,
            Err(err) => {
                shutdown(&self.logger, browser, handler).await;
                return Err(err);
            }
        };

        Ok(Box::new(ChromiumPage {
            logger: self.logger.clone(),
            browser,
            page,
            handler,
        }))
    }
}

async fn open_page(
    browser: &Browser,
    url: &str,
    ready_selector: &str,
    timeout: Duration,
) -> Result<Page, Error> {
    let page = browser.new_page(url).await?;
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(found) = page.find_elements(ready_selector).await {
            if !found.is_empty() {
                return Ok(page);
            }
        }
        if Instant::now() >= deadline {
            return Err(Error::Scrape {
                url: url.to_string(),
                reason: format!("no element matched {} within {:?}", ready_selector, timeout),
            });
        }
        sleep(Duration::from_millis(250)).await;
    }
}

async fn shutdown(logger: &Logger, mut browser: Browser, handler: JoinHandle<()>) {
    if let Err(err) = browser.close().await {
        warn!(logger, "error closing browser: {}", err);
    }
    if let Err(err) = browser.wait().await {
        warn!(logger, "error waiting for browser exit: {}", err);
    }
    handler.abort();
}

struct ChromiumPage {
    logger: Logger,
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[async_trait]
impl LoadedPage for ChromiumPage {
    async fn extract_rows(
        &self,
        row_selector: &str,
        cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, Error> {
        let rows = self.page.find_elements(row_selector).await?;
        let mut extracted = Vec::with_capacity(rows.len());
        for row in rows {
            let cells = row.find_elements(cell_selector).await?;
            let mut texts = Vec::with_capacity(cells.len());
            for cell in cells {
                texts.push(cell.inner_text().await?.unwrap_or_default());
            }
            extracted.push(texts);
        }
        Ok(extracted)
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        let ChromiumPage {
            logger,
            browser,
            page: _,
            handler,
        } = *self;
        shutdown(&logger, browser, handler).await;
        Ok(())
    }
}
