mod page_source;
mod scrape_observations;

pub use page_source::*;
pub use scrape_observations::*;
