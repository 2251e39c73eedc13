use crate::config::FetchConfig;
use crate::error::Result;
use crate::result::FetchResult;
use regex::Regex;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::borrow::Cow;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

// `<!-->` and `<!--->` close immediately, like a browser's tokenizer treats them
static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--(?:>|->|(?s:.*?)-->)").expect("static comment pattern"));

/// Per-request switches for a single fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Strip `<!-- ... -->` spans from the body before handing it back
    pub remove_comments: bool,
    pub allow_redirects: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            remove_comments: false,
            allow_redirects: true,
        }
    }
}

/// Anything that can turn a URL into a page body or nothing.
///
/// Implementations must absorb every failure: a site that is down, blocked, slow
/// or answering with anything but 200 is `None`, never an error.
pub trait Fetch {
    fn fetch(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> impl Future<Output = Option<FetchResult>> + Send;
}

/// HTTP fetcher that looks like a desktop browser to the sites it visits
pub struct PageFetcher {
    client: Client,
    /// Same configuration as `client`, but never follows redirects
    direct_client: Client,
}

impl PageFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Self::build_client(&config, Policy::default())?;
        let direct_client = Self::build_client(&config, Policy::none())?;

        Ok(Self {
            client,
            direct_client,
        })
    }

    fn build_client(config: &FetchConfig, redirect: Policy) -> Result<Client> {
        let mut builder = Client::builder()
            .default_headers(config.headers.clone())
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(redirect);

        // Zero means wait as long as the peer takes
        if !config.timeout.is_zero() {
            builder = builder
                .connect_timeout(config.timeout)
                .read_timeout(config.timeout);
        }

        Ok(builder.build()?)
    }
}

impl Fetch for PageFetcher {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Option<FetchResult> {
        let client = if options.allow_redirects {
            &self.client
        } else {
            &self.direct_client
        };

        debug!("Fetching {}", url);
        let response = client.get(url).send().await.ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }

        // Decodes with the declared charset (utf-8 by default), replacing bad sequences
        let body = response.text().await.ok()?;
        let body = if options.remove_comments {
            strip_html_comments(&body).into_owned()
        } else {
            body
        };

        Some(FetchResult::new(url.to_string(), body))
    }
}

/// Remove every HTML comment, including ones spanning several lines
pub fn strip_html_comments(html: &str) -> Cow<'_, str> {
    HTML_COMMENT.replace_all(html, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn fetcher_with_timeout(timeout: Duration) -> PageFetcher {
        PageFetcher::new(FetchConfig::new(timeout)).unwrap()
    }

    #[test]
    fn test_strip_html_comments_inline() {
        assert_eq!(
            strip_html_comments("<div>X<!-- hidden -->Y</div>"),
            "<div>XY</div>"
        );
    }

    #[test]
    fn test_strip_html_comments_multiline_non_greedy() {
        let html = "<p>a</p><!-- one\nline two\n--><p>b</p><!--\nthree--><p>c</p>";
        assert_eq!(strip_html_comments(html), "<p>a</p><p>b</p><p>c</p>");
    }

    #[test]
    fn test_strip_html_comments_abrupt_close() {
        assert_eq!(strip_html_comments("a<!-->b<!--->c"), "abc");
    }

    #[test]
    fn test_strip_html_comments_untouched_without_comments() {
        let html = "<p>nothing to see</p>";
        assert!(matches!(strip_html_comments(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_html_comments_unterminated_is_kept() {
        let html = "<p>a</p><!-- never closed";
        assert_eq!(strip_html_comments(html), html);
    }

    #[tokio::test]
    async fn test_fetch_ok_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html><body>React</body></html>"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_timeout(Duration::from_secs(5));
        let url = format!("{}/", mock_server.uri());
        let result = fetcher.fetch(&url, FetchOptions::default()).await;

        assert_eq!(
            result,
            Some(FetchResult::new(
                url,
                "<html><body>React</body></html>".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("referer", "https://google.com/"))
            .and(header("accept", "*/*"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_timeout(Duration::from_secs(5));
        let result = fetcher
            .fetch(&mock_server.uri(), FetchOptions::default())
            .await;

        assert!(result.is_some(), "headers should have matched the mock");

        let requests = mock_server.received_requests().await.unwrap();
        let user_agent = requests[0].headers.get("user-agent").unwrap();
        assert!(user_agent.to_str().unwrap().contains("Chrome/116.0.0.0"));
    }

    #[tokio::test]
    async fn test_fetch_removes_comments_when_asked() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<div>X<!-- hidden -->Y</div>"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_timeout(Duration::from_secs(5));

        let stripped = fetcher
            .fetch(
                &mock_server.uri(),
                FetchOptions {
                    remove_comments: true,
                    ..FetchOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(stripped.body, "<div>XY</div>");

        let kept = fetcher
            .fetch(&mock_server.uri(), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(kept.body, "<div>X<!-- hidden -->Y</div>");
    }

    #[tokio::test]
    async fn test_fetch_invalid_utf8_is_replaced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_bytes(vec![b'o', b'k', 0xff, 0xfe, b'!']),
            )
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_timeout(Duration::from_secs(5));
        let result = fetcher
            .fetch(&mock_server.uri(), FetchOptions::default())
            .await
            .unwrap();

        assert!(result.body.starts_with("ok"));
        assert!(result.body.ends_with('!'));
        assert!(result.body.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_none() {
        let mock_server = MockServer::start().await;

        for (route, status) in [("/missing", 404), ("/broken", 500), ("/empty", 204)] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&mock_server)
                .await;
        }

        let fetcher = fetcher_with_timeout(Duration::from_secs(5));
        for route in ["/missing", "/broken", "/empty"] {
            let url = format!("{}{}", mock_server.uri(), route);
            assert_eq!(
                fetcher.fetch(&url, FetchOptions::default()).await,
                None,
                "{} should be treated as a failure",
                route
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_redirect_policy() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_timeout(Duration::from_secs(5));
        let url = format!("{}/old", mock_server.uri());

        let followed = fetcher.fetch(&url, FetchOptions::default()).await.unwrap();
        assert_eq!(followed.url, url);
        assert_eq!(followed.body, "moved here");

        let direct = fetcher
            .fetch(
                &url,
                FetchOptions {
                    allow_redirects: false,
                    ..FetchOptions::default()
                },
            )
            .await;
        assert_eq!(direct, None);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("too late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_with_timeout(Duration::from_millis(200));
        let result = fetcher
            .fetch(&mock_server.uri(), FetchOptions::default())
            .await;

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_fetch_zero_timeout_waits() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/instant"))
            .respond_with(ResponseTemplate::new(200).set_body_string("instant"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new(FetchConfig::with_timeout_secs(0)).unwrap();

        let instant = fetcher
            .fetch(&format!("{}/instant", mock_server.uri()), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(instant.body, "instant");

        let slow = fetcher
            .fetch(&format!("{}/slow", mock_server.uri()), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(slow.body, "slow");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_none() {
        // Grab a free port, then close it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let fetcher = fetcher_with_timeout(Duration::from_secs(2));
        let url = format!("http://127.0.0.1:{}/", port);

        assert_eq!(fetcher.fetch(&url, FetchOptions::default()).await, None);
    }

    #[tokio::test]
    async fn test_fetch_malformed_url_is_none() {
        let fetcher = fetcher_with_timeout(Duration::from_secs(2));
        assert_eq!(
            fetcher.fetch("not a url", FetchOptions::default()).await,
            None
        );
    }
}
