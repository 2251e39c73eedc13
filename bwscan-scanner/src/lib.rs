pub mod config;
pub mod error;
pub mod fetcher;
pub mod result;

pub use config::FetchConfig;
pub use error::ScanError;
pub use fetcher::{Fetch, FetchOptions, PageFetcher, strip_html_comments};
pub use result::FetchResult;
