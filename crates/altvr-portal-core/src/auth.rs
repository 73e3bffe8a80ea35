//! Sign-in negotiation
//!
//! Two sequential steps: read the anti-forgery token from the sign-in
//! page, then post it with the credentials and keep the cookies the
//! redirect response sets.

use tracing::{debug, info};

use crate::client::AltvrClient;
use crate::config::Credentials;
use crate::error::{AltvrError, Result, Stage};
use crate::parser::parse_csrf_token;
use crate::session::Session;
use crate::url::build_login_url;

/// Offset (minutes) reported in the sign-in form
const TZ_OFFSET: &str = "-480";

/// Fetch the anti-forgery token from the sign-in page
///
/// # Errors
/// Errors are tagged with [`Stage::FetchToken`]:
/// - `HttpError` etc. if the page cannot be fetched
/// - `ElementNotFound` if the page carries no token
pub async fn fetch_token(client: &AltvrClient) -> Result<String> {
    let url = build_login_url(client.base_url()).map_err(|e| e.in_stage(Stage::FetchToken))?;

    let html = client
        .get(&url, None)
        .await
        .map_err(|e| e.in_stage(Stage::FetchToken))?;

    let token = parse_csrf_token(&html).map_err(|e| e.in_stage(Stage::FetchToken))?;
    debug!("fetched anti-forgery token");
    Ok(token)
}

/// Exchange credentials and token for a session
///
/// The post is sent without following redirects; a successful sign-in
/// answers with a redirect whose `Set-Cookie` headers carry the session.
///
/// # Errors
/// Errors are tagged with [`Stage::Login`]:
/// - `AuthError` if the response sets no cookie that the site would
///   accept back
/// - `HttpError` / `RateLimited` / `UnexpectedStatus` for transport failures
pub async fn login(client: &AltvrClient, credentials: &Credentials, token: &str) -> Result<Session> {
    let url = build_login_url(client.base_url()).map_err(|e| e.in_stage(Stage::Login))?;
    let fields = [
        ("utf8", "\u{2713}"),
        ("user[tz_offset]", TZ_OFFSET),
        ("user[remember_me]", "1"),
        ("authenticity_token", token),
        ("user[email]", credentials.email()),
        ("user[password]", credentials.password()),
    ];

    let response = client
        .post_form(&url, &fields, None, false)
        .await
        .map_err(|e| e.in_stage(Stage::Login))?;

    let session = Session::from_set_cookie(response.set_cookies(), &url).ok_or_else(|| {
        AltvrError::AuthError(format!(
            "sign-in answered {} without a session cookie",
            response.status.as_u16()
        ))
        .in_stage(Stage::Login)
    })?;

    info!(cookies = response.set_cookies().len(), "signed in");
    Ok(session)
}

/// Run both steps: token fetch, then login
pub async fn authenticate(client: &AltvrClient, credentials: &Credentials) -> Result<Session> {
    let token = fetch_token(client).await?;
    login(client, credentials, &token).await
}
