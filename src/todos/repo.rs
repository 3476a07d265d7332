use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::todos::repo_types::Todo;

// Every statement that touches an existing row filters on both `id` and `user_id`.

impl Todo {
    pub async fn insert(&self, db: &PgPool) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO todos (id, user_id, title, done, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.title)
        .bind(self.done)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Latest first; served by the `(user_id, created_at DESC)` index.
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Todo>> {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, done, created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id_and_owner(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> sqlx::Result<Option<Todo>> {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, done, created_at, updated_at
            FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Returns whether a row owned by `user_id` was updated.
    pub async fn set_done_by_id_and_owner(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> sqlx::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE todos
               SET done = $3, updated_at = $4
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(done)
        .bind(updated_at)
        .execute(db)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn delete_by_id_and_owner(db: &PgPool, id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM todos WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
