//! HTTP session client for account.altvr.com
//!
//! Wraps a reqwest client that never follows redirects on its own.
//! GET requests follow same-site redirects by hand so a bounce to the
//! sign-in page can be recognised as a rejected session and a bounce to
//! another origin is refused; form posts can stop at the first response
//! to expose its `Set-Cookie` headers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ::url::Url;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, LOCATION, SET_COOKIE};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{AltvrError, Result};
use crate::session::Session;
use crate::url::{is_login_url, is_same_site, parse_base_url, resolve_href};

const MAX_REDIRECTS: usize = 5;

/// Rate limiter to control request frequency
///
/// Ensures requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// Non-positive rates disable limiting.
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second > 0.0 {
            // Rates too small to invert fall back to the longest wait
            Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Acquire permission to make a request
    ///
    /// If called before the minimum interval has passed since the last request,
    /// this method will sleep until the interval has elapsed.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Response to a form post
#[derive(Debug)]
pub struct FormResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl FormResponse {
    /// Raw `Set-Cookie` header values, in the order received
    pub fn set_cookies(&self) -> Vec<&str> {
        set_cookie_values(&self.headers)
    }
}

fn set_cookie_values(headers: &HeaderMap) -> Vec<&str> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect()
}

/// HTTP client wrapper for account.altvr.com
///
/// Handles all HTTP communication with the site, including:
/// - Rate limiting to avoid overwhelming the server
/// - Fixed browser-like headers (User-Agent, Content-Type)
/// - Carrying the session cookie when one is supplied
/// - Refusing redirects that leave the configured origin
///
/// Failures are returned as-is; nothing is retried.
pub struct AltvrClient {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: Url,
}

impl AltvrClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// - `Config` - `base_url` is not an absolute http(s) URL
    /// - `HttpError` - reqwest client initialization failed
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .map_err(AltvrError::HttpError)?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.requests_per_second),
            base_url,
        })
    }

    /// Site origin requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch a page body
    ///
    /// Follows up to five same-site redirects, sending the session cookie
    /// on each hop.
    ///
    /// # Errors
    /// - `HttpError` - Network errors and timeouts
    /// - `RateLimited` - Server returned 429
    /// - `SessionRejected` - 401/403 or a redirect to the sign-in page
    /// - `ForeignRedirect` - Redirect to another origin; it is not followed
    /// - `NotFound` / `UnexpectedStatus` - Other non-success statuses
    pub async fn get(&self, url: &Url, session: Option<&Session>) -> Result<String> {
        let mut current_url = url.clone();
        let mut last_status = StatusCode::FOUND;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.send_get(&current_url, session).await?;
            let status = response.status();
            last_status = status;

            if status.is_redirection() {
                match Self::location(&response) {
                    Some(location) => {
                        let target = self.redirect_target(&current_url, &location)?;
                        if session.is_some() && is_login_url(&target) {
                            return Err(AltvrError::SessionRejected(format!(
                                "{} redirected to the sign-in page",
                                current_url
                            )));
                        }
                        current_url = target;
                        continue;
                    }
                    // No usable Location header; hand the body back as-is
                    None => return response.text().await.map_err(AltvrError::HttpError),
                }
            }

            Self::check_status(status, &current_url, session.is_some())?;
            return response.text().await.map_err(AltvrError::HttpError);
        }

        Err(AltvrError::UnexpectedStatus {
            status: last_status.as_u16(),
            url: format!("{} (too many redirects)", url),
        })
    }

    /// Post url-encoded form fields
    ///
    /// With `follow_redirects == false` the first response is returned
    /// unchanged, including its `Set-Cookie` headers. Otherwise a
    /// same-site redirect is followed with a GET carrying the cookies the
    /// post just set: they are added to `session` when one is given, or
    /// form a fresh one. The final page is returned together with the
    /// post's headers.
    ///
    /// # Errors
    /// - `HttpError` - Network errors and timeouts
    /// - `RateLimited` - Server returned 429
    /// - `UnexpectedStatus` - Server returned 5xx
    /// - `ForeignRedirect` - Followed redirect would leave the site
    pub async fn post_form(
        &self,
        url: &Url,
        fields: &[(&str, &str)],
        session: Option<&Session>,
        follow_redirects: bool,
    ) -> Result<FormResponse> {
        self.rate_limiter.acquire().await;
        debug!(%url, "POST");

        let mut request = self.client.post(url.clone()).form(fields);
        if let Some(cookie) = session.and_then(|s| s.cookie_header(url)) {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(AltvrError::HttpError)?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AltvrError::RateLimited);
        }
        if status.is_server_error() {
            return Err(AltvrError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let headers = response.headers().clone();

        if follow_redirects
            && status.is_redirection()
            && let Some(location) = Self::location(&response)
        {
            let target = self.redirect_target(url, &location)?;
            let set_cookies = set_cookie_values(&headers);
            let carried = match session {
                Some(session) => {
                    session.absorb(set_cookies, url);
                    Some(session.clone())
                }
                None => Session::from_set_cookie(set_cookies, url),
            };

            let body = self.get(&target, carried.as_ref()).await?;
            return Ok(FormResponse {
                status: StatusCode::OK,
                headers,
                body,
            });
        }

        let body = response.text().await.map_err(AltvrError::HttpError)?;
        Ok(FormResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_get(&self, url: &Url, session: Option<&Session>) -> Result<reqwest::Response> {
        self.rate_limiter.acquire().await;

        let cookie = session.and_then(|s| s.cookie_header(url));
        debug!(%url, with_session = cookie.is_some(), "GET");

        let mut request = self.client.get(url.clone());
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        request.send().await.map_err(AltvrError::HttpError)
    }

    fn location(response: &reqwest::Response) -> Option<String> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    /// Resolve a `Location` header against the URL that sent it
    ///
    /// Only targets on the configured origin are returned.
    fn redirect_target(&self, current: &Url, location: &str) -> Result<Url> {
        let target = resolve_href(current, location)?;
        if !is_same_site(&self.base_url, &target) {
            warn!(from = %current, to = %target, "refusing redirect to another site");
            return Err(AltvrError::ForeignRedirect(format!("{} -> {}", current, target)));
        }
        Ok(target)
    }

    /// Map a final (non-redirect) status onto an error
    fn check_status(status: StatusCode, url: &Url, with_session: bool) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(AltvrError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if with_session => Err(
                AltvrError::SessionRejected(format!("{} answered {}", url, status.as_u16())),
            ),
            StatusCode::NOT_FOUND => Err(AltvrError::NotFound(url.to_string())),
            _ => Err(AltvrError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }

    /// Rate limiter shared by every request of this client
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::build_login_url;
    use wiremock::matchers::{any, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AltvrClient {
        let config = ClientConfig {
            requests_per_second: 0.0,
            ..ClientConfig::with_base_url(&server.uri())
        };
        AltvrClient::with_config(config).unwrap()
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(2.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_rate_limiter_disabled() {
        let limiter = RateLimiter::new(0.0);
        assert_eq!(limiter.min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(-1.0).min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(f64::NAN).min_interval(), Duration::ZERO);
    }

    #[test]
    fn test_rate_limiter_tiny_rate_does_not_panic() {
        // 1.0 / 1e-320 overflows to infinity
        let limiter = RateLimiter::new(1e-320);
        assert_eq!(limiter.min_interval(), Duration::MAX);
    }

    #[test]
    fn test_client_creation() {
        let client = AltvrClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url().as_str(), "https://account.altvr.com/");
    }

    #[test]
    fn test_client_uses_configured_rate() {
        let config = ClientConfig {
            requests_per_second: 4.0,
            ..ClientConfig::default()
        };
        let client = AltvrClient::with_config(config).unwrap();
        assert_eq!(client.rate_limiter().min_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_client_trailing_slash_is_same_origin() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9000/".to_string(),
            ..ClientConfig::default()
        };
        let client = AltvrClient::with_config(config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        let error = AltvrClient::with_config(config).err().unwrap();
        assert!(matches!(error, AltvrError::Config(_)));
    }

    #[test]
    fn test_check_status() {
        let url = Url::parse("https://account.altvr.com/worlds/search").unwrap();
        assert!(AltvrClient::check_status(StatusCode::OK, &url, true).is_ok());
        assert!(matches!(
            AltvrClient::check_status(StatusCode::TOO_MANY_REQUESTS, &url, true),
            Err(AltvrError::RateLimited)
        ));
        assert!(matches!(
            AltvrClient::check_status(StatusCode::FORBIDDEN, &url, true),
            Err(AltvrError::SessionRejected(_))
        ));
        assert!(matches!(
            AltvrClient::check_status(StatusCode::FORBIDDEN, &url, false),
            Err(AltvrError::UnexpectedStatus { status: 403, .. })
        ));
        assert!(matches!(
            AltvrClient::check_status(StatusCode::NOT_FOUND, &url, true),
            Err(AltvrError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_refuses_foreign_redirect() {
        let server = MockServer::start().await;
        let other = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/sign_in"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/users/sign_in", other.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&other)
            .await;

        let client = client_for(&server);
        let url = build_login_url(client.base_url()).unwrap();
        let error = client.get(&url, None).await.unwrap_err();

        assert!(matches!(error, AltvrError::ForeignRedirect(_)));
    }

    #[tokio::test]
    async fn test_post_form_without_follow_returns_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/sign_in"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/welcome")
                    .insert_header("set-cookie", "_altvr_session=fresh; path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/welcome"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = build_login_url(client.base_url()).unwrap();
        let response = client.post_form(&url, &[("a", "b")], None, false).await.unwrap();

        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.set_cookies(), vec!["_altvr_session=fresh; path=/"]);
    }

    #[tokio::test]
    async fn test_post_form_follow_carries_new_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/sign_in"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/welcome")
                    .insert_header("set-cookie", "_altvr_session=fresh; path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/welcome"))
            .and(header("cookie", "_altvr_session=fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome aboard"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = build_login_url(client.base_url()).unwrap();
        let response = client.post_form(&url, &[("a", "b")], None, true).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "welcome aboard");
        assert_eq!(response.set_cookies().len(), 1);
    }

    #[tokio::test]
    async fn test_post_form_follow_updates_given_session() {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/users/sign_in", server.uri())).unwrap();
        let session = Session::from_set_cookie(["_altvr_session=stale; path=/"], &url).unwrap();

        Mock::given(method("POST"))
            .and(path("/users/sign_in"))
            .and(header("cookie", "_altvr_session=stale"))
            .respond_with(
                ResponseTemplate::new(303)
                    .insert_header("location", "/welcome")
                    .insert_header("set-cookie", "_altvr_session=fresh; path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/welcome"))
            .and(header("cookie", "_altvr_session=fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome back"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client
            .post_form(&url, &[("a", "b")], Some(&session), true)
            .await
            .unwrap();

        assert_eq!(response.body, "welcome back");
        let cookie = session.cookie_header(&url).unwrap();
        assert_eq!(cookie.to_str().unwrap(), "_altvr_session=fresh");
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(10.0); // 100ms interval

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        // Second acquire should wait at least 100ms
        assert!(elapsed >= Duration::from_millis(90)); // Allow small tolerance
    }

    #[tokio::test]
    async fn test_rate_limiter_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(0.5); // 2s interval

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
