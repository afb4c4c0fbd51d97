//! Session authentication extractors.
//!
//! The session cookie holds a signed token naming the user. Handlers receive the
//! principal explicitly:
//! ```ignore
//! async fn page(current: CurrentUser) -> impl Responder { /* current.0: Option<User> */ }
//! async fn form(LoginRequired(user): LoginRequired) -> impl Responder { /* user: User */ }
//! ```

use std::future::{Future, ready};
use std::pin::Pin;

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::dev::Payload;
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use yatube_core::domain::User;
use yatube_core::ports::{BaseRepository, TokenClaims};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Where anonymous visitors of protected pages are sent.
pub const LOGIN_URL: &str = "/auth/login/";

type ExtractFuture<T> = Pin<Box<dyn Future<Output = Result<T, actix_web::Error>>>>;

/// The caller, if they hold a valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

/// The caller, who must hold a valid session.
///
/// Rejection redirects to the login page with the requested path as `next`.
#[derive(Debug, Clone)]
pub struct LoginRequired(pub User);

/// Rejection of [`LoginRequired`].
#[derive(Debug, thiserror::Error)]
#[error("login required to access {next}")]
pub struct LoginRedirect {
    next: String,
}

impl LoginRedirect {
    pub fn new(next: impl Into<String>) -> Self {
        Self { next: next.into() }
    }

    /// `/auth/login/?next=<next>`, percent-encoded with `/` left as is.
    pub fn location(&self) -> String {
        let next = self
            .next
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!("{LOGIN_URL}?next={next}")
    }
}

impl ResponseError for LoginRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, self.location()))
            .finish()
    }
}

fn session_claims(req: &HttpRequest, state: &AppState) -> Option<TokenClaims> {
    let cookie = req.cookie(SESSION_COOKIE)?;

    match state.tokens.validate_token(cookie.value()) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session cookie");
            None
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = ExtractFuture<Self>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
            tracing::error!("AppState not found in app data");
            let err = AppError::Internal("Server configuration error".to_string());
            return Box::pin(ready(Err(err.into())));
        };

        let claims = session_claims(req, &state);

        Box::pin(async move {
            let Some(claims) = claims else {
                return Ok(CurrentUser(None));
            };

            let user = state
                .users
                .find_by_id(claims.user_id)
                .await
                .map_err(AppError::from)?;

            // A token for a since-renamed or deleted account no longer identifies anyone.
            Ok(CurrentUser(user.filter(|u| u.username == claims.username)))
        })
    }
}

impl FromRequest for LoginRequired {
    type Error = actix_web::Error;
    type Future = ExtractFuture<Self>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let next = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| req.path().to_owned());
        let current = CurrentUser::from_request(req, payload);

        Box::pin(async move {
            match current.await? {
                CurrentUser(Some(user)) => Ok(LoginRequired(user)),
                CurrentUser(None) => Err(LoginRedirect::new(next).into()),
            }
        })
    }
}

/// Session cookie for a freshly issued token.
pub fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies)
        .max_age(Duration::seconds(state.tokens.expiration_seconds()))
        .finish()
}

/// Cookie that, added as a removal cookie, ends the session.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "").path("/").finish()
}

/// Only same-site absolute paths are accepted as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}
