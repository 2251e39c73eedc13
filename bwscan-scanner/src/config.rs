use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, CONNECTION, HeaderMap, HeaderValue, REFERER, USER_AGENT,
};
use std::time::Duration;

/// Connect/read timeout used when the caller does not pick one
pub const DEFAULT_TIMEOUT_SECS: u64 = 7;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36 Edg/116.0.100.0";

/// Headers and timeout shared by every request a fetcher makes.
///
/// Built once and handed to [`crate::PageFetcher::new`]; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub headers: HeaderMap,
    /// Applied separately to connecting and to each socket read; zero disables both
    pub timeout: Duration,
}

impl FetchConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            headers: browser_headers(),
            timeout,
        }
    }

    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self::new(Duration::from_secs(timeout_secs))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::with_timeout_secs(DEFAULT_TIMEOUT_SECS)
    }
}

/// Header set of a desktop Edge browser, enough to get past basic bot filters
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(REFERER, HeaderValue::from_static("https://google.com/"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}
