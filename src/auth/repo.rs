use crate::auth::repo_types::User;
use sqlx::PgPool;

impl User {
    /// Find a user by (already lowercased) email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: uuid::Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Insert the user. A taken email surfaces as a unique violation on `users_email_key`.
    pub async fn insert(&self, db: &PgPool) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(self.id)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(self.created_at)
        .execute(db)
        .await?;
        Ok(())
    }
}
