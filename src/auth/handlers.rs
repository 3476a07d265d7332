use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{is_acceptable_registration, AuthNotice, CredentialsForm},
        jwt::{removal_cookie, session_cookie, SessionKeys, SessionUser},
        password::{hash_password, verify_password},
        repo_types::User,
    },
    db::StoreError,
    error::AppError,
    render::{auth_page, AuthForm},
    state::AppState,
};

pub fn page_routes() -> Router<AppState> {
    Router::new().route("/", get(home))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", post(logout))
}

#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    session: Option<SessionUser>,
) -> Result<Response, AppError> {
    if session.is_some() {
        return Ok(Redirect::to("/app").into_response());
    }
    let path = state.config.frontend_dir.join("index.html");
    let body = match tokio::fs::read_to_string(&path).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "landing page missing");
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("read landing page {}", path.display()))
                .into())
        }
    };
    Ok(Html(body).into_response())
}

pub async fn login_page(session: Option<SessionUser>, Query(notice): Query<AuthNotice>) -> Response {
    if session.is_some() {
        return Redirect::to("/app").into_response();
    }
    Html(auth_page(AuthForm::Login, notice.message())).into_response()
}

pub async fn register_page(
    session: Option<SessionUser>,
    Query(notice): Query<AuthNotice>,
) -> Response {
    if session.is_some() {
        return Redirect::to("/app").into_response();
    }
    Html(auth_page(AuthForm::Register, notice.message())).into_response()
}

#[instrument(skip(state, jar, form))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let email = form.normalized_email();
    if !is_acceptable_registration(&email, &form.password) {
        warn!("registration input rejected");
        return Ok(Redirect::to("/register").into_response());
    }

    let hash = hash_password(&form.password)?;
    let user = User::new(email, hash);

    match state.store.insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::DuplicateEmail) => {
            warn!(email = %user.email, "email already registered");
            return Ok(Redirect::to("/register?exists=1").into_response());
        }
        Err(e) => return Err(e.into()),
    }

    let keys = SessionKeys::from_ref(&state);
    let token = keys.issue(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        jar.add(session_cookie(token, keys.ttl())),
        Redirect::to("/app"),
    )
        .into_response())
}

#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let email = form.normalized_email();

    let user = match state.store.find_user_by_email(&email).await? {
        Some(u) if verify_password(&form.password, &u.password_hash) => u,
        Some(u) => {
            warn!(user_id = %u.id, "login invalid password");
            return Ok(Redirect::to("/login?fail=1").into_response());
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Ok(Redirect::to("/login?fail=1").into_response());
        }
    };

    let keys = SessionKeys::from_ref(&state);
    let token = keys.issue(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        jar.add(session_cookie(token, keys.ttl())),
        Redirect::to("/app"),
    )
        .into_response())
}

#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn logout(SessionUser(user_id): SessionUser, jar: CookieJar) -> impl IntoResponse {
    info!("user logged out");
    (jar.add(removal_cookie()), Redirect::to("/"))
}
