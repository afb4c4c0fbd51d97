//! Error handling - failed requests render `errors/error.html`.

use std::sync::LazyLock;

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use yatube_core::ports::{AuthError, RenderError, TemplateRenderer};
use yatube_infra::TeraRenderer;
use yatube_shared::ErrorPage;

/// Error pages use the built-in templates; app state is not reachable from `ResponseError`.
static ERROR_PAGES: LazyLock<Result<TeraRenderer, RenderError>> =
    LazyLock::new(TeraRenderer::embedded);

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn page(&self) -> ErrorPage {
        match self {
            AppError::NotFound(detail) => ErrorPage::not_found(detail),
            AppError::Conflict(detail) => ErrorPage::conflict(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorPage::server_error()
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let page = self.page();

        let body = match ERROR_PAGES.as_ref() {
            Ok(renderer) => serde_json::to_value(&page)
                .map_err(|e| RenderError::Serialization(e.to_string()))
                .and_then(|context| renderer.render("errors/error.html", &context)),
            Err(e) => Err(e.clone()),
        };

        match body {
            Ok(html) => HttpResponse::build(self.status_code())
                .content_type(ContentType::html())
                .body(html),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                HttpResponse::build(self.status_code())
                    .content_type(ContentType::plaintext())
                    .body(page.title)
            }
        }
    }
}

impl From<yatube_core::DomainError> for AppError {
    fn from(err: yatube_core::DomainError) -> Self {
        use yatube_core::DomainError;

        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} {} not found", entity_type, key))
            }
        }
    }
}

impl From<yatube_core::error::RepoError> for AppError {
    fn from(err: yatube_core::error::RepoError) -> Self {
        use yatube_core::error::RepoError;

        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(format!("Authentication backend failed: {err}"))
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Internal(format!("Rendering failed: {err}"))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use yatube_core::DomainError;
    use yatube_core::error::RepoError;

    use super::*;

    async fn body_of(err: AppError) -> String {
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn test_domain_not_found_is_404() {
        let err = AppError::from(DomainError::not_found("Post", 9));

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not found: Post 9 not found");
    }

    #[test]
    fn test_storage_failures_are_500() {
        let err = AppError::from(RepoError::Query("boom".to_string()));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_constraint_violation_is_409() {
        let err = AppError::from(RepoError::Constraint("slug taken".to_string()));

        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_error_page_renders_template() {
        let html = body_of(AppError::NotFound("nothing <here>".to_string())).await;

        assert!(html.contains(r#"data-template="errors/error.html""#));
        assert!(html.contains(r#"<h1 data-status="404">404 Page not found</h1>"#));
        assert!(html.contains("nothing &lt;here&gt;"));
    }

    #[actix_web::test]
    async fn test_server_error_page_hides_detail() {
        let html = body_of(AppError::Internal("db password is hunter2".to_string())).await;

        assert!(html.contains(r#"data-status="500""#));
        assert!(!html.contains("hunter2"));
        assert!(!html.contains("error-detail"));
    }
}
