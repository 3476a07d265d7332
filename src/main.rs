mod app;
mod auth;
mod config;
mod db;
mod error;
mod render;
mod state;
mod todos;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "todoapp=debug,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    let addr = app_state.config.addr;
    tracing::info!(
        db = %app_state.config.db_name,
        frontend = %app_state.config.frontend_dir.display(),
        "store ready"
    );

    app::serve(app::build_app(app_state), addr).await
}
