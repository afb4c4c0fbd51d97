//! Post listing, detail, create and edit pages.

use actix_web::{HttpResponse, web};
use yatube_core::DomainError;
use yatube_core::domain::{Post, PostDraft};
use yatube_core::ports::BaseRepository;
use yatube_core::views::{
    GroupListContext, IndexContext, PostDetailContext, PostFormContext, PostFormValues,
    ProfileContext,
};
use yatube_shared::dto::{PageQuery, PostFormData};

use crate::middleware::auth::LoginRequired;
use crate::middleware::error::AppResult;
use crate::render::{post_url, profile_url, redirect};
use crate::state::AppState;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state.posts.list_latest().await?;

    state.render(&IndexContext::new(
        posts,
        state.posts_per_page,
        query.page.as_deref(),
    ))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = slug.into_inner();
    let group = state
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Group", &slug))?;
    let posts = state.posts.list_by_group(group.id).await?;

    state.render(&GroupListContext::new(
        group,
        posts,
        state.posts_per_page,
        query.page.as_deref(),
    ))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = username.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", &username))?;
    let posts = state.posts.list_by_author(author.id).await?;

    state.render(&ProfileContext::new(
        author,
        posts,
        state.posts_per_page,
        query.page.as_deref(),
    ))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, post_id.into_inner()).await?;
    let count = state.posts.count_by_author(post.author_id).await?;
    let author = state.users.find_by_id(post.author_id).await?;

    state.render(&PostDetailContext {
        post,
        author,
        count,
    })
}

/// GET /create/
pub async fn post_create_form(
    LoginRequired(_user): LoginRequired,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let groups = state.groups.list_all().await?;

    state.render(&PostFormContext::create(groups))
}

/// POST /create/
pub async fn post_create(
    LoginRequired(user): LoginRequired,
    state: web::Data<AppState>,
    form: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let groups = state.groups.list_all().await?;

    match PostDraft::validate(&form.text, form.group.as_deref(), &groups) {
        Ok(draft) => {
            let post = state.posts.save(Post::new(user.id, draft)).await?;
            tracing::info!(post_id = post.id, author = %user.username, "Post created");

            Ok(redirect(&profile_url(&user.username)))
        }
        Err(errors) => {
            state.render(&PostFormContext::create(groups).with_submission(submitted(form), errors))
        }
    }
}

/// GET /posts/{post_id}/edit/
///
/// Only the author sees the form; anyone else is sent back to the post.
pub async fn post_edit_form(
    LoginRequired(user): LoginRequired,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, post_id.into_inner()).await?;
    if !post.is_authored_by(user.id) {
        return Ok(redirect(&post_url(post.id)));
    }

    let groups = state.groups.list_all().await?;
    state.render(&PostFormContext::edit(&post, groups))
}

/// POST /posts/{post_id}/edit/
///
/// Authorship is checked before the submission is looked at, so a non-author
/// can never change the post.
pub async fn post_edit(
    LoginRequired(user): LoginRequired,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    form: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let mut post = find_post(&state, post_id.into_inner()).await?;
    if !post.is_authored_by(user.id) {
        tracing::warn!(post_id = post.id, user = %user.username, "Rejected edit by non-author");
        return Ok(redirect(&post_url(post.id)));
    }

    let form = form.into_inner();
    let groups = state.groups.list_all().await?;

    match PostDraft::validate(&form.text, form.group.as_deref(), &groups) {
        Ok(draft) => {
            post.apply(draft);
            let post = state.posts.save(post).await?;
            tracing::info!(post_id = post.id, "Post updated");

            Ok(redirect(&post_url(post.id)))
        }
        Err(errors) => state.render(
            &PostFormContext::edit(&post, groups).with_submission(submitted(form), errors),
        ),
    }
}

async fn find_post(state: &AppState, post_id: i64) -> AppResult<Post> {
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    Ok(post)
}

/// Echo a rejected submission back into the form.
fn submitted(form: PostFormData) -> PostFormValues {
    PostFormValues {
        group: form.group.as_deref().and_then(|g| g.trim().parse().ok()),
        text: form.text,
    }
}
