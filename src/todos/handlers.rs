use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::jwt::{removal_cookie, SessionUser},
    error::AppError,
    render::app_page,
    state::AppState,
    todos::{
        dto::{parse_todo_id, NewTodoForm},
        repo_types::{normalize_title, Todo},
    },
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/app", get(app))
        .route("/todo", post(add_todo))
        .route("/todo/:id/toggle", post(toggle_todo))
        .route("/todo/:id/delete", post(delete_todo))
}

#[instrument(skip(state, jar))]
pub async fn app(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(user) = state.store.find_user_by_id(user_id).await? else {
        warn!(%user_id, "session refers to a missing user");
        return Ok((jar.add(removal_cookie()), Redirect::to("/login")).into_response());
    };
    let todos = state.store.list_todos_by_user(user_id).await?;
    debug!(%user_id, count = todos.len(), "todos listed");
    Ok(Html(app_page(&user.email, &todos)).into_response())
}

#[instrument(skip(state, form))]
pub async fn add_todo(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Form(form): Form<NewTodoForm>,
) -> Result<Redirect, AppError> {
    let Some(title) = normalize_title(&form.title) else {
        debug!(%user_id, "empty or oversized title ignored");
        return Ok(Redirect::to("/app"));
    };
    let todo = Todo::new(user_id, title);
    state.store.insert_todo(&todo).await?;
    info!(%user_id, todo_id = %todo.id, "todo added");
    Ok(Redirect::to("/app"))
}

/// Flips `done`. Concurrent toggles of one todo are last-write-wins.
#[instrument(skip(state))]
pub async fn toggle_todo(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let Some(id) = parse_todo_id(&raw_id) else {
        return Ok(Redirect::to("/app"));
    };
    match state.store.find_todo_by_id_and_owner(id, user_id).await? {
        Some(todo) => {
            state
                .store
                .update_todo_by_id_and_owner(id, user_id, !todo.done, OffsetDateTime::now_utc())
                .await?;
            info!(%user_id, todo_id = %id, done = !todo.done, "todo toggled");
        }
        None => debug!(%user_id, todo_id = %id, "toggle of unknown todo ignored"),
    }
    Ok(Redirect::to("/app"))
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let Some(id) = parse_todo_id(&raw_id) else {
        return Ok(Redirect::to("/app"));
    };
    if state.store.delete_todo_by_id_and_owner(id, user_id).await? {
        info!(%user_id, todo_id = %id, "todo deleted");
    } else {
        debug!(%user_id, todo_id = %id, "delete of unknown todo ignored");
    }
    Ok(Redirect::to("/app"))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{app::build_app, state::AppState, todos::repo_types::Todo};

    struct Client {
        app: Router,
        cookie: String,
    }

    impl Client {
        async fn register(app: &Router, email: &str) -> Self {
            let res = app
                .clone()
                .oneshot(
                    Request::post("/register")
                        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                        .body(Body::from(format!(
                            "email={}&password=secret1",
                            email.replace('@', "%40")
                        )))
                        .unwrap(),
                )
                .await
                .unwrap();
            let cookie = res
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .expect("session cookie")
                .to_string();
            Self {
                app: app.clone(),
                cookie,
            }
        }

        async fn post(&self, uri: &str, body: &str) -> axum::response::Response {
            self.app
                .clone()
                .oneshot(
                    Request::post(uri)
                        .header(header::COOKIE, &self.cookie)
                        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap()
        }

        async fn page(&self) -> String {
            let res = self
                .app
                .clone()
                .oneshot(
                    Request::get("/app")
                        .header(header::COOKIE, &self.cookie)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
                .await
                .unwrap();
            String::from_utf8(bytes.to_vec()).unwrap()
        }
    }

    async fn todos_of(state: &AppState, email: &str) -> Vec<Todo> {
        let user = state
            .store
            .find_user_by_email(email)
            .await
            .unwrap()
            .unwrap();
        state.store.list_todos_by_user(user.id).await.unwrap()
    }

    fn location(res: &axum::response::Response) -> &str {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn protected_routes_redirect_anonymous_callers() {
        let app = build_app(AppState::fake());
        for (method, uri) in [
            ("GET", "/app"),
            ("POST", "/todo"),
            ("POST", "/logout"),
            ("POST", "/todo/00000000-0000-0000-0000-000000000000/toggle"),
        ] {
            let res = app
                .clone()
                .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{method} {uri}");
            assert_eq!(location(&res), "/login");
        }
    }

    #[tokio::test]
    async fn corrupt_cookie_is_cleared() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::get("/app")
                    .header(header::COOKIE, "session_token=garbage.value.here")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&res), "/login");
        let set = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(set.starts_with("session_token=;"));
        assert!(set.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let app = build_app(AppState::fake());
        let me = Client::register(&app, "user@example.com").await;

        let page = me.page().await;
        assert!(page.contains("user@example.com"));
        assert!(page.contains(r#"class="empty""#));

        let res = me.post("/todo", "title=Buy+milk").await;
        assert_eq!(location(&res), "/app");
        let page = me.page().await;
        assert_eq!(page.matches(r#"<li class="todo-item"#).count(), 1);
        assert!(page.contains("Buy milk"));
        assert!(!page.contains("todo-item completed"));

        let start = page.find("/todo/").unwrap() + "/todo/".len();
        let id = &page[start..start + 36];

        me.post(&format!("/todo/{id}/toggle"), "").await;
        assert!(me.page().await.contains("todo-item completed"));

        me.post(&format!("/todo/{id}/delete"), "").await;
        let page = me.page().await;
        assert!(page.contains(r#"class="empty""#));
        assert!(!page.contains("Buy milk"));
    }

    #[tokio::test]
    async fn toggle_twice_restores_state() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let me = Client::register(&app, "twice@example.com").await;
        me.post("/todo", "title=Laundry").await;

        let original = todos_of(&state, "twice@example.com").await.remove(0);
        let id = original.id;

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        me.post(&format!("/todo/{id}/toggle"), "").await;
        let once = todos_of(&state, "twice@example.com").await.remove(0);
        assert!(once.done);
        assert_eq!(once.created_at, original.created_at);
        assert!(once.updated_at > original.updated_at);

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        me.post(&format!("/todo/{id}/toggle"), "").await;
        let twice = todos_of(&state, "twice@example.com").await.remove(0);
        assert!(!twice.done);
        assert_eq!(twice.created_at, original.created_at);
        assert!(twice.updated_at > once.updated_at);
    }

    #[tokio::test]
    async fn invalid_titles_are_not_stored() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let me = Client::register(&app, "titles@example.com").await;

        let long = "x".repeat(101);
        for body in ["title=+++".to_string(), String::new(), format!("title={long}")] {
            let res = me.post("/todo", &body).await;
            assert_eq!(location(&res), "/app");
        }
        me.post("/todo", "title=++trimmed++").await;

        let todos = todos_of(&state, "titles@example.com").await;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "trimmed");
    }

    #[tokio::test]
    async fn users_cannot_reach_each_others_todos() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let alice = Client::register(&app, "alice@example.com").await;
        let bob = Client::register(&app, "bob@example.com").await;

        alice.post("/todo", "title=Alice+secret").await;
        let id = todos_of(&state, "alice@example.com").await[0].id;

        assert!(!bob.page().await.contains("Alice secret"));

        let toggle = bob.post(&format!("/todo/{id}/toggle"), "").await;
        let delete = bob.post(&format!("/todo/{id}/delete"), "").await;
        let missing = bob
            .post(&format!("/todo/{}/delete", Uuid::new_v4()), "")
            .await;
        let malformed = bob.post("/todo/not-a-uuid/toggle", "").await;
        for res in [&toggle, &delete, &missing, &malformed] {
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(res), "/app");
        }

        let todos = todos_of(&state, "alice@example.com").await;
        assert_eq!(todos.len(), 1);
        assert!(!todos[0].done);
    }

    #[tokio::test]
    async fn listing_is_latest_first() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let me = Client::register(&app, "order@example.com").await;
        for title in ["first", "second", "third"] {
            me.post("/todo", &format!("title={title}")).await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let page = me.page().await;
        let third = page.find("third").unwrap();
        let second = page.find("second").unwrap();
        let first = page.find("first").unwrap();
        assert!(third < second && second < first);

        let todos = todos_of(&state, "order@example.com").await;
        assert!(todos.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }
}
