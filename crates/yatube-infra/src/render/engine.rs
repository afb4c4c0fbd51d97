//! Tera-backed page renderer.

use tera::{Context, Tera};
use yatube_core::ports::{RenderError, TemplateRenderer};

macro_rules! embedded {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../../templates/", $name)))),*]
    };
}

/// Templates compiled into the binary, keyed by the name handlers render.
const EMBEDDED: &[(&str, &str)] = embedded![
    "base.html",
    "includes/paginator.html",
    "posts/includes/post_card.html",
    "posts/index.html",
    "posts/group_list.html",
    "posts/profile.html",
    "posts/post_detail.html",
    "posts/create_post.html",
    "users/login.html",
    "users/signup.html",
    "users/logged_out.html",
    "errors/error.html",
];

/// Renders pages through Tera with HTML autoescaping.
#[derive(Debug, Clone)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// The templates shipped inside the binary.
    pub fn embedded() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(EMBEDDED.iter().copied())
            .map_err(template_error)?;

        Ok(Self { tera })
    }

    /// Templates read from `dir` (same layout as the embedded set), so markup
    /// can be edited without a rebuild.
    pub fn from_dir(dir: &str) -> Result<Self, RenderError> {
        let tera = Tera::new(&format!("{}/**/*.html", dir.trim_end_matches('/')))
            .map_err(template_error)?;
        tracing::info!(
            dir,
            templates = tera.get_template_names().count(),
            "Loaded templates"
        );

        Ok(Self { tera })
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, RenderError> {
        if !self.tera.get_template_names().any(|name| name == template) {
            return Err(RenderError::UnknownTemplate(template.to_string()));
        }

        let context = Context::from_value(context.clone())
            .map_err(|e| RenderError::Serialization(e.to_string()))?;

        self.tera.render(template, &context).map_err(template_error)
    }
}

/// Tera keeps the useful part of a failure (missing variable, bad filter) in
/// the error's source chain.
fn template_error(e: tera::Error) -> RenderError {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(&e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    RenderError::Template(message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn renderer() -> TeraRenderer {
        TeraRenderer::embedded().unwrap()
    }

    fn page(number: usize, posts: serde_json::Value) -> serde_json::Value {
        json!({
            "number": number,
            "num_pages": 2,
            "count": 11,
            "has_next": number < 2,
            "has_previous": number > 1,
            "next_page_number": if number < 2 { json!(number + 1) } else { json!(null) },
            "previous_page_number": if number > 1 { json!(number - 1) } else { json!(null) },
            "object_list": posts,
        })
    }

    fn post(id: i64, text: &str) -> serde_json::Value {
        json!({
            "id": id,
            "text": text,
            "pub_date": "2026-10-16T12:30:00Z",
            "author_id": 1,
            "group_id": null,
        })
    }

    #[test]
    fn test_index_lists_posts_and_names_template() {
        let html = renderer()
            .render(
                "posts/index.html",
                &json!({
                    "title": "Latest updates on the site",
                    "page_obj": page(1, json!([post(2, "second"), post(1, "first")])),
                    "posts": [],
                }),
            )
            .unwrap();

        assert!(html.contains(r#"data-template="posts/index.html""#));
        assert!(html.contains("<title>Latest updates on the site | Yatube</title>"));
        assert!(html.contains(r#"data-post-id="2""#));
        assert!(html.contains("16 October 2026"));
        assert!(html.contains(r#"href="?page=2""#));
    }

    #[test]
    fn test_post_text_is_escaped() {
        let html = renderer()
            .render(
                "posts/post_detail.html",
                &json!({
                    "post": post(7, "<script>alert(1)</script>"),
                    "author": {"id": 1, "username": "Author", "date_joined": "2026-01-01T00:00:00Z"},
                    "count": 1,
                }),
            )
            .unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_form_marks_errors_and_selected_group() {
        let html = renderer()
            .render(
                "posts/create_post.html",
                &json!({
                    "form": {"text": "", "group": 3},
                    "errors": {"text": ["This field is required."]},
                    "groups": [{"id": 3, "title": "Cats", "slug": "cats", "description": ""}],
                    "is_edit": true,
                    "post_id": 9,
                }),
            )
            .unwrap();

        assert!(html.contains(r#"data-field="text""#));
        assert!(!html.contains(r#"data-field="group""#));
        assert!(html.contains(r#"<option value="3" selected>"#));
        assert!(html.contains(r#"action="/posts/9/edit/""#));
    }

    #[test]
    fn test_error_page_without_detail() {
        let html = renderer()
            .render(
                "errors/error.html",
                &json!({"status": 500, "title": "Server error", "detail": null}),
            )
            .unwrap();

        assert!(html.contains(r#"data-status="500""#));
        assert!(!html.contains("error-detail"));
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let result = renderer().render("posts/missing.html", &json!({}));

        assert!(matches!(result, Err(RenderError::UnknownTemplate(_))));
    }

    #[test]
    fn test_missing_context_field_is_a_template_error() {
        let result = renderer().render("posts/profile.html", &json!({}));

        assert!(matches!(result, Err(RenderError::Template(_))));
    }
}
