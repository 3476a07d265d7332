use std::{future::Future, str::FromStr, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{auth::repo_types::User, config::AppConfig, todos::repo_types::Todo};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("store operation timed out")]
    Timeout,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Data access for users and todos.
///
/// Todo operations always take the owner id and match on it together with the todo id,
/// so a caller can never reach a row it does not own. "Missing" and "not yours" are
/// reported the same way (`None` / `false`).
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn insert_todo(&self, todo: &Todo) -> Result<(), StoreError>;
    async fn list_todos_by_user(&self, user_id: Uuid) -> Result<Vec<Todo>, StoreError>;
    async fn find_todo_by_id_and_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Todo>, StoreError>;
    async fn update_todo_by_id_and_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> Result<bool, StoreError>;
    async fn delete_todo_by_id_and_owner(&self, id: Uuid, user_id: Uuid)
        -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let options = PgConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .database(&config.db_name);
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(config.store_timeout)
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self {
            pool,
            timeout: config.store_timeout,
        })
    }

    /// Creates the tables and the unique/listing indexes.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = sqlx::Result<T>> + Send,
    {
        with_deadline(self.timeout, fut).await
    }
}

/// Runs one store call under `limit`; an elapsed deadline is `StoreError::Timeout`.
async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = sqlx::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout),
    }
}

fn is_unique_violation(err: &StoreError) -> bool {
    matches!(err, StoreError::Database(sqlx::Error::Database(db)) if db.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.bounded(user.insert(&self.pool)).await.map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                e
            }
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.bounded(User::find_by_email(&self.pool, email)).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.bounded(User::find_by_id(&self.pool, id)).await
    }

    async fn insert_todo(&self, todo: &Todo) -> Result<(), StoreError> {
        self.bounded(todo.insert(&self.pool)).await
    }

    async fn list_todos_by_user(&self, user_id: Uuid) -> Result<Vec<Todo>, StoreError> {
        self.bounded(Todo::list_by_user(&self.pool, user_id)).await
    }

    async fn find_todo_by_id_and_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Todo>, StoreError> {
        self.bounded(Todo::find_by_id_and_owner(&self.pool, id, user_id))
            .await
    }

    async fn update_todo_by_id_and_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        self.bounded(Todo::set_done_by_id_and_owner(
            &self.pool, id, user_id, done, updated_at,
        ))
        .await
    }

    async fn delete_todo_by_id_and_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.bounded(Todo::delete_by_id_and_owner(&self.pool, id, user_id))
            .await
    }
}
