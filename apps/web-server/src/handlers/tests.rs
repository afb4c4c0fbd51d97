//! URL behaviour: status codes, redirects and bound templates per caller.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde::Serialize;
use yatube_core::domain::{Group, Post, PostDraft, User};
use yatube_core::ports::{BaseRepository, PasswordService, PostRepository, TokenService};
use yatube_infra::{
    Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService, TeraRenderer,
};

use crate::config::AppConfig;
use crate::handlers::{configure_routes, not_found};
use crate::middleware::auth::SESSION_COOKIE;
use crate::state::AppState;

struct Fixture {
    state: AppState,
    store: Arc<InMemoryStore>,
    tokens: Arc<JwtTokenService>,
    /// Logged in, but authored nothing.
    auth: User,
    author: User,
    group: Group,
    post: Post,
}

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: None,
        posts_per_page: 10,
        secure_cookies: false,
        templates_dir: None,
    }
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let tokens = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret".to_string(),
        ..JwtConfig::default()
    }));

    let auth: User = store
        .save(User::new("Auth".to_string(), String::new()))
        .await
        .unwrap();
    let author: User = store
        .save(User::new("Author".to_string(), String::new()))
        .await
        .unwrap();
    let group: Group = store
        .save(Group::new(
            "Test group".to_string(),
            "Test_slag".to_string(),
            "Test description".to_string(),
        ))
        .await
        .unwrap();
    let post: Post = store
        .save(Post::new(
            author.id,
            PostDraft {
                text: "Test post".to_string(),
                group_id: Some(group.id),
            },
        ))
        .await
        .unwrap();

    let renderer = Arc::new(TeraRenderer::embedded().unwrap());
    let state = AppState::in_memory(store.clone(), tokens.clone(), renderer, &test_config());

    Fixture {
        state,
        store,
        tokens,
        auth,
        author,
        group,
        post,
    }
}

impl Fixture {
    fn session(&self, user: &User) -> Cookie<'static> {
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        Cookie::new(SESSION_COOKIE, token)
    }

    async fn add_posts(&self, author: &User, n: i64) -> Vec<Post> {
        let start = Utc::now() - Duration::days(1);
        let mut posts = Vec::new();
        for i in 0..n {
            let mut post = Post::new(
                author.id,
                PostDraft {
                    text: format!("post {i}"),
                    group_id: None,
                },
            );
            post.pub_date = start + Duration::minutes(i);
            posts.push(self.store.save(post).await.unwrap());
        }
        posts
    }
}

macro_rules! app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($fx.state.clone()))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

fn get(uri: &str, session: Option<Cookie<'static>>) -> test::TestRequest {
    let req = test::TestRequest::get().uri(uri);
    match session {
        Some(cookie) => req.cookie(cookie),
        None => req,
    }
}

fn post_form(
    uri: &str,
    form: &impl Serialize,
    session: Option<Cookie<'static>>,
) -> test::TestRequest {
    let req = test::TestRequest::post().uri(uri).set_form(form);
    match session {
        Some(cookie) => req.cookie(cookie),
        None => req,
    }
}

macro_rules! call {
    ($app:expr, $req:expr) => {
        test::call_service(&$app, $req.to_request()).await
    };
}

fn location(resp: &ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

async fn body_text(resp: ServiceResponse) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Every value of `attr` in document order.
fn attr_values<'a>(html: &'a str, attr: &str) -> Vec<&'a str> {
    let needle = format!(r#"{attr}=""#);
    html.match_indices(&needle)
        .map(|(i, _)| {
            let rest = &html[i + needle.len()..];
            &rest[..rest.find('"').unwrap()]
        })
        .collect()
}

/// Ids of the rendered post cards, top to bottom.
fn post_ids(html: &str) -> Vec<i64> {
    attr_values(html, "data-post-id")
        .iter()
        .map(|id| id.parse().unwrap())
        .collect()
}

/// `(number, num_pages)` from the paginator.
fn page_position(html: &str) -> (usize, usize) {
    (
        attr_values(html, "data-page")[0].parse().unwrap(),
        attr_values(html, "data-num-pages")[0].parse().unwrap(),
    )
}

fn assert_template(html: &str, template: &str) {
    assert!(
        html.contains(&format!(r#"data-template="{template}""#)),
        "expected template {template}"
    );
}

#[actix_web::test]
async fn test_url_exists_at_desired_location_for_guest() {
    let fx = fixture().await;
    let app = app!(fx);

    let cases = [
        ("/".to_string(), StatusCode::OK),
        (format!("/group/{}/", fx.group.slug), StatusCode::OK),
        (format!("/profile/{}/", fx.author.username), StatusCode::OK),
        (format!("/posts/{}/", fx.post.id), StatusCode::OK),
        (format!("/posts/{}/edit/", fx.post.id), StatusCode::FOUND),
        ("/create/".to_string(), StatusCode::FOUND),
        ("/unexisting_page/".to_string(), StatusCode::NOT_FOUND),
    ];

    for (uri, status) in cases {
        let resp = call!(app, get(&uri, None));
        assert_eq!(resp.status(), status, "GET {uri}");
    }
}

#[actix_web::test]
async fn test_unknown_page_is_404_for_logged_in_user() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        get("/unexisting_page/", Some(fx.session(&fx.author)))
    );

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_template(&body_text(resp).await, "errors/error.html");
}

#[actix_web::test]
async fn test_post_create_url_redirects_guest_to_login() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(app, get("/create/", None));

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn test_post_edit_url_redirects_guest_to_login() {
    let fx = fixture().await;
    let app = app!(fx);
    let uri = format!("/posts/{}/edit/", fx.post.id);

    let resp = call!(app, get(&uri, None));

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={uri}"));
}

#[actix_web::test]
async fn test_post_create_url_exists_for_authorized_user() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(app, get("/create/", Some(fx.session(&fx.auth))));

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_post_edit_url_redirects_non_author_to_post_detail() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        get(&format!("/posts/{}/edit/", fx.post.id), Some(fx.session(&fx.auth)))
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", fx.post.id));
}

#[actix_web::test]
async fn test_post_edit_url_exists_for_author() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        get(&format!("/posts/{}/edit/", fx.post.id), Some(fx.session(&fx.author)))
    );

    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(resp).await;
    assert!(html.contains(&format!(r#"action="/posts/{}/edit/""#, fx.post.id)));
    assert!(html.contains(">Test post</textarea>"));
    assert!(html.contains(&format!(r#"<option value="{}" selected>"#, fx.group.id)));
}

#[actix_web::test]
async fn test_urls_use_correct_template() {
    let fx = fixture().await;
    let app = app!(fx);

    let cases = [
        ("/".to_string(), "posts/index.html"),
        (format!("/group/{}/", fx.group.slug), "posts/group_list.html"),
        (format!("/profile/{}/", fx.author.username), "posts/profile.html"),
        (format!("/posts/{}/", fx.post.id), "posts/post_detail.html"),
        ("/create/".to_string(), "posts/create_post.html"),
        (format!("/posts/{}/edit/", fx.post.id), "posts/create_post.html"),
    ];

    for (uri, template) in cases {
        let resp = call!(app, get(&uri, Some(fx.session(&fx.author))));
        assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
        assert_template(&body_text(resp).await, template);
    }
}

#[actix_web::test]
async fn test_unknown_group_post_and_profile_are_404() {
    let fx = fixture().await;
    let app = app!(fx);

    for uri in ["/group/no_such_group/", "/posts/9999/", "/profile/nobody/"] {
        let resp = call!(app, get(uri, None));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {uri}");
    }
}

#[actix_web::test]
async fn test_non_numeric_post_id_is_404() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(app, get("/posts/abc/", None));

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_post_detail_counts_author_posts() {
    let fx = fixture().await;
    fx.add_posts(&fx.author, 2).await;
    let app = app!(fx);

    let resp = call!(app, get(&format!("/posts/{}/", fx.post.id), None));
    let html = body_text(resp).await;

    assert_eq!(post_ids(&html), vec![fx.post.id]);
    assert!(html.contains(r#"<span data-count="3">"#));
    assert!(html.contains("Test post"));
    assert!(html.contains(r#"href="/profile/Author/""#));
}

#[actix_web::test]
async fn test_index_paginates_most_recent_first() {
    let fx = fixture().await;
    // Twelve older posts plus the fixture post, which is the newest.
    fx.add_posts(&fx.auth, 12).await;
    let app = app!(fx);

    let first = body_text(call!(app, get("/", None))).await;
    let ids = post_ids(&first);
    assert_eq!(ids.len(), 10);
    assert_eq!(ids[0], fx.post.id);
    assert_eq!(page_position(&first), (1, 2));

    let second = body_text(call!(app, get("/?page=2", None))).await;
    assert_eq!(post_ids(&second).len(), 3);
    assert_eq!(page_position(&second), (2, 2));

    let clamped = body_text(call!(app, get("/?page=50", None))).await;
    assert_eq!(page_position(&clamped), (2, 2));

    let garbage = body_text(call!(app, get("/?page=last", None))).await;
    assert_eq!(page_position(&garbage), (1, 2));
}

#[actix_web::test]
async fn test_page_number_past_any_integer_shows_last_page() {
    let fx = fixture().await;
    fx.add_posts(&fx.auth, 12).await;
    let app = app!(fx);

    let resp = call!(app, get("/?page=99999999999999999999", None));
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(resp).await;
    assert_eq!(page_position(&html), (2, 2));
    assert_eq!(post_ids(&html).len(), 3);
}

#[actix_web::test]
async fn test_listing_order_is_stable_across_requests() {
    let fx = fixture().await;
    let added = fx.add_posts(&fx.author, 5).await;
    let app = app!(fx);

    let mut newest_first: Vec<&Post> = added.iter().chain([&fx.post]).collect();
    newest_first.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    let expected: Vec<i64> = newest_first.iter().map(|p| p.id).collect();

    for uri in ["/", "/profile/Author/"] {
        let first = post_ids(&body_text(call!(app, get(uri, None))).await);
        let second = post_ids(&body_text(call!(app, get(uri, None))).await);
        assert_eq!(first, expected, "GET {uri}");
        assert_eq!(first, second, "GET {uri}");
    }
}

#[actix_web::test]
async fn test_group_listing_only_shows_group_posts() {
    let fx = fixture().await;
    fx.add_posts(&fx.author, 3).await;
    let app = app!(fx);

    let html = body_text(call!(app, get("/group/Test_slag/", None))).await;

    assert!(html.contains("<h1>Test group</h1>"));
    assert_eq!(post_ids(&html), vec![fx.post.id]);
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile() {
    let fx = fixture().await;
    let app = app!(fx);

    let group_id = fx.group.id.to_string();
    let resp = call!(
        app,
        post_form(
            "/create/",
            &[("text", "Fresh post"), ("group", group_id.as_str())],
            Some(fx.session(&fx.auth)),
        )
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/Auth/");

    let posts = fx.store.list_by_author(fx.auth.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "Fresh post");
    assert_eq!(posts[0].group_id, Some(fx.group.id));
}

#[actix_web::test]
async fn test_create_post_with_blank_text_rerenders_form() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/create/",
            &[("text", "   "), ("group", "")],
            Some(fx.session(&fx.auth)),
        )
    );

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert_template(&html, "posts/create_post.html");
    assert!(html.contains(r#"data-field="text""#));
    assert!(html.contains(r#"action="/create/""#));
    assert_eq!(fx.store.count_by_author(fx.auth.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_guest_cannot_create_post() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(app, post_form("/create/", &[("text", "sneaky")], None));

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
    assert_eq!(fx.store.list_latest().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn test_author_edit_persists_and_redirects_to_detail() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            &format!("/posts/{}/edit/", fx.post.id),
            &[("text", "Edited post"), ("group", "")],
            Some(fx.session(&fx.author)),
        )
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", fx.post.id));

    let post: Post = fx.store.find_by_id(fx.post.id).await.unwrap().unwrap();
    assert_eq!(post.text, "Edited post");
    assert_eq!(post.group_id, None);
    assert_eq!(post.author_id, fx.author.id);
}

#[actix_web::test]
async fn test_non_author_edit_is_redirected_without_saving() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            &format!("/posts/{}/edit/", fx.post.id),
            &[("text", "Hijacked")],
            Some(fx.session(&fx.auth)),
        )
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", fx.post.id));

    let post: Post = fx.store.find_by_id(fx.post.id).await.unwrap().unwrap();
    assert_eq!(post.text, "Test post");
}

#[actix_web::test]
async fn test_invalid_edit_rerenders_with_submission() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            &format!("/posts/{}/edit/", fx.post.id),
            &[("text", ""), ("group", "9999")],
            Some(fx.session(&fx.author)),
        )
    );

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains(&format!(r#"action="/posts/{}/edit/""#, fx.post.id)));
    assert!(html.contains(r#"data-field="text""#));
    assert!(html.contains(r#"data-field="group""#));

    let post: Post = fx.store.find_by_id(fx.post.id).await.unwrap().unwrap();
    assert_eq!(post.text, "Test post");
}

#[actix_web::test]
async fn test_edit_of_missing_post_is_404_for_logged_in_user() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(app, get("/posts/9999/edit/", Some(fx.session(&fx.author))));

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_invalid_session_cookie_is_treated_as_guest() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        get("/create/", Some(Cookie::new(SESSION_COOKIE, "not-a-token")))
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn test_login_sets_session_and_follows_next() {
    let fx = fixture().await;
    let hash = Argon2PasswordService::new().hash("correct horse").unwrap();
    let _: User = fx
        .store
        .save(User::new("Writer".to_string(), hash))
        .await
        .unwrap();
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/auth/login/",
            &[
                ("username", "Writer"),
                ("password", "correct horse"),
                ("next", "/create/"),
            ],
            None,
        )
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert!(cookie.http_only().unwrap_or(false));

    let claims = fx.tokens.validate_token(cookie.value()).unwrap();
    assert_eq!(claims.username, "Writer");
}

#[actix_web::test]
async fn test_login_with_wrong_password_rerenders_form() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/auth/login/",
            &[("username", "Author"), ("password", "whatever")],
            None,
        )
    );

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert_template(&html, "users/login.html");
    assert!(html.contains(r#"<p class="form-error">"#));
    assert!(html.contains(r#"value="Author""#));
}

#[actix_web::test]
async fn test_login_as_unknown_user_rerenders_form() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/auth/login/",
            &[("username", "nobody"), ("password", "whatever")],
            None,
        )
    );

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(r#"<p class="form-error">"#));
}

#[actix_web::test]
async fn test_login_ignores_surrounding_whitespace_in_username() {
    let fx = fixture().await;
    let hash = Argon2PasswordService::new().hash("correct horse").unwrap();
    let _: User = fx
        .store
        .save(User::new("Writer".to_string(), hash))
        .await
        .unwrap();
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/auth/login/",
            &[("username", "  Writer "), ("password", "correct horse")],
            None,
        )
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    let claims = fx.tokens.validate_token(cookie.value()).unwrap();
    assert_eq!(claims.username, "Writer");
}

#[actix_web::test]
async fn test_login_upgrades_outdated_password_hash() {
    let fx = fixture().await;
    let weak = Argon2PasswordService::with_cost(1024, 1).unwrap();
    let old_hash = weak.hash("correct horse").unwrap();
    let writer: User = fx
        .store
        .save(User::new("Writer".to_string(), old_hash.clone()))
        .await
        .unwrap();
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/auth/login/",
            &[("username", "Writer"), ("password", "correct horse")],
            None,
        )
    );
    assert_eq!(resp.status(), StatusCode::FOUND);

    let stored: User = fx.store.find_by_id(writer.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, old_hash);
    assert!(!fx.state.passwords.needs_rehash(&stored.password_hash));
    assert!(
        fx.state
            .passwords
            .verify("correct horse", Some(stored.password_hash.as_str()))
            .unwrap()
    );
}

#[actix_web::test]
async fn test_signup_creates_user_and_logs_in() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/auth/signup/",
            &[("username", "newcomer"), ("password", "long-enough-pw")],
            None,
        )
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(
        resp.response()
            .cookies()
            .any(|c| c.name() == SESSION_COOKIE)
    );
}

#[actix_web::test]
async fn test_signup_rejects_taken_username() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(
        app,
        post_form(
            "/auth/signup/",
            &[("username", "Author"), ("password", "long-enough-pw")],
            None,
        )
    );

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains(r#"data-field="username""#));
    assert!(!html.contains(r#"data-field="password""#));
}

#[actix_web::test]
async fn test_logout_clears_session_cookie() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(app, get("/auth/logout/", Some(fx.session(&fx.author))));

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cookie.value(), "");
    assert_template(&body_text(resp).await, "users/logged_out.html");
}

#[actix_web::test]
async fn test_health_reports_storage() {
    let fx = fixture().await;
    let app = app!(fx);

    let resp = call!(app, get("/health/", None));
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(json["storage"], "memory");
}
