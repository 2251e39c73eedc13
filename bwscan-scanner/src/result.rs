/// A page that was fetched with status 200.
///
/// Failed fetches have no counterpart: the fetcher hands back `None` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub body: String,
}

impl FetchResult {
    pub fn new(url: String, body: String) -> Self {
        Self { url, body }
    }
}
