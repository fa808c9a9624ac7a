use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_layer::{DatabaseError, DatabasePool};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{IdentityError, Result};
use crate::models::{Role, User};
use crate::repository::UserRepository;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, specialization, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    specialization: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = IdentityError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            IdentityError::Database(DatabaseError::QueryFailed(format!(
                "unknown role '{}' for user {}",
                row.role, row.id
            )))
        })?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            specialization: row.specialization,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `users` table
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabasePool,
}

impl PgUserRepository {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &User) -> Result<User> {
        let result = sqlx::query(
            r"INSERT INTO users (id, name, email, password_hash, role, specialization, created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.specialization)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.db.pool())
        .await;

        match result.map_err(DatabaseError::from) {
            Ok(_) => Ok(user.clone()),
            Err(e) if e.is_unique_violation() => Err(IdentityError::EmailAlreadyInUse),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(self.db.pool())
                .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"UPDATE users
              SET name = $2, specialization = $3, password_hash = $4, updated_at = $5
              WHERE id = $1
              RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.specialization)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .fetch_optional(self.db.pool())
        .await?;
        row.map(User::try_from)
            .transpose()?
            .ok_or(IdentityError::UserNotFound)
    }
}
