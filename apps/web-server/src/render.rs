//! Binding view models to responses.

use actix_web::HttpResponse;
use actix_web::http::header::{self, ContentType};
use yatube_core::views::Template;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

impl AppState {
    /// Render `context` through its template as a `200 OK` HTML page.
    pub fn render<C: Template>(&self, context: &C) -> AppResult<HttpResponse> {
        let value =
            serde_json::to_value(context).map_err(|e| AppError::Internal(e.to_string()))?;
        let html = self.renderer.render(C::NAME, &value)?;

        Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(html))
    }
}

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

/// Usernames may contain `@` and `+`, which are legal in a path segment and stay
/// as typed; anything outside the segment character set is percent-encoded.
pub fn profile_url(username: &str) -> String {
    let mut segment = String::with_capacity(username.len());
    for c in username.chars() {
        if is_segment_char(c) {
            segment.push(c);
        } else {
            let mut buf = [0u8; 4];
            segment.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    format!("/profile/{segment}/")
}

/// RFC 3986 `pchar`: unreserved, sub-delims, `:` and `@`.
fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '.' | '_' | '~' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';'
                | '=' | ':' | '@'
        )
}
