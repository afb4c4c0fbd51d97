//! Login, logout and signup pages.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use yatube_core::domain::{FormErrors, User};
use yatube_core::error::RepoError;
use yatube_core::views::{LoggedOutContext, LoginContext, SignupContext};
use yatube_shared::dto::{LoginForm, NextQuery, SignupForm};

use crate::middleware::auth::{expired_session_cookie, safe_next, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const INVALID_LOGIN: &str = "Please enter a correct username and password.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// GET /auth/login/
pub async fn login_form(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    state.render(&LoginContext {
        next: query.into_inner().next,
        ..LoginContext::default()
    })
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim().to_string();
    let user = state.users.find_by_username(&username).await?;

    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let verified = verify_password(&state, &form.password, stored).await?;

    match user {
        Some(user) if verified => {
            tracing::info!(user = %user.username, "User logged in");
            let user = upgrade_hash(&state, user, form.password).await;
            start_session(&state, &user, safe_next(form.next.as_deref()))
        }
        _ => {
            tracing::debug!(username = %username, "Rejected login");
            state.render(&LoginContext {
                username,
                next: form.next,
                error: Some(INVALID_LOGIN.to_string()),
            })
        }
    }
}

/// GET /auth/logout/
pub async fn logout(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let mut response = state.render(&LoggedOutContext::default())?;
    response
        .add_removal_cookie(&expired_session_cookie())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

/// GET /auth/signup/
pub async fn signup_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    state.render(&SignupContext::default())
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim().to_string();

    let mut errors = match User::validate_signup(&username, &form.password) {
        Ok(()) => FormErrors::default(),
        Err(errors) => errors,
    };
    if !errors.has("username") && state.users.find_by_username(&username).await?.is_some() {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return state.render(&SignupContext { username, errors });
    }

    let passwords = state.passwords.clone();
    let password = form.password;
    let password_hash = web::block(move || passwords.hash(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let user = match state.users.save(User::new(username.clone(), password_hash)).await {
        Ok(user) => user,
        // Lost a race with another signup for the same name.
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            return state.render(&SignupContext { username, errors });
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user = %user.username, "User signed up");
    start_session(&state, &user, "/")
}

/// Argon2 verification is CPU-bound, so it runs on the blocking pool.
/// Unknown accounts still pay for one verification.
async fn verify_password(
    state: &AppState,
    password: &str,
    stored: Option<String>,
) -> AppResult<bool> {
    let passwords = state.passwords.clone();
    let password = password.to_string();

    let verified = web::block(move || passwords.verify(&password, stored.as_deref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match verified {
        Ok(verified) => Ok(verified),
        Err(e) => {
            // A malformed stored hash must not lock the account out with a 500.
            tracing::error!("Password verification failed: {}", e);
            Ok(false)
        }
    }
}

/// Re-hash a verified password stored under an outdated cost. Failures keep the old hash.
async fn upgrade_hash(state: &AppState, mut user: User, password: String) -> User {
    if !state.passwords.needs_rehash(&user.password_hash) {
        return user;
    }

    let passwords = state.passwords.clone();
    let hashed = match web::block(move || passwords.hash(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            tracing::warn!(user = %user.username, "Password re-hash failed: {}", e);
            return user;
        }
        Err(e) => {
            tracing::warn!(user = %user.username, "Password re-hash failed: {}", e);
            return user;
        }
    };

    let previous = std::mem::replace(&mut user.password_hash, hashed);
    match state.users.save(user.clone()).await {
        Ok(saved) => {
            tracing::info!(user = %saved.username, "Upgraded password hash");
            saved
        }
        Err(e) => {
            tracing::warn!(user = %user.username, "Could not store upgraded hash: {}", e);
            user.password_hash = previous;
            user
        }
    }
}

fn start_session(state: &AppState, user: &User, next: &str) -> AppResult<HttpResponse> {
    let token = state.tokens.generate_token(user.id, &user.username)?;

    Ok(HttpResponse::Found()
        .cookie(session_cookie(state, token))
        .insert_header((header::LOCATION, next))
        .finish())
}
