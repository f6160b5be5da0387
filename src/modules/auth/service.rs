use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::users::model::{Role, User};
use crate::utils::errors::AppError;
use crate::utils::password::{hash_password, verify_password};

use super::model::RegisterRequestDto;

pub struct AuthService;

impl AuthService {
    /// Registers a new user. Username and email are globally unique;
    /// a collision on either is a 409. The unique indexes back up the
    /// pre-check should two registrations race.
    #[instrument(skip(db, dto))]
    pub async fn register_user(db: &PgPool, dto: RegisterRequestDto) -> Result<User, AppError> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE username = $1 OR email = $2",
        )
        .bind(&dto.username)
        .bind(&dto.email)
        .fetch_optional(db)
        .await
        .context("Failed to check for existing user")
        .map_err(AppError::database)?;

        if existing.is_some() {
            return Err(AppError::conflict("Username or email already exists"));
        }

        let hashed_password = hash_password(&dto.password)?;

        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role, first_name, last_name, profile_picture_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, username, email, role, first_name, last_name, profile_picture_url, created_at, updated_at",
        )
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(dto.role)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.profile_picture_url)
        .fetch_one(db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::conflict("Username or email already exists"))
            }
            Err(e) => Err(AppError::database(e)),
        }
    }

    /// Looks the user up by username or email and verifies the password.
    /// Returns `None` on any mismatch; the controller maps that to 401
    /// without revealing which part failed.
    #[instrument(skip(db, password))]
    pub async fn authenticate(
        db: &PgPool,
        identifier: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: Uuid,
            username: String,
            email: String,
            role: Role,
            first_name: Option<String>,
            last_name: Option<String>,
            profile_picture_url: Option<String>,
            created_at: chrono::DateTime<chrono::Utc>,
            updated_at: chrono::DateTime<chrono::Utc>,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, username, email, role, first_name, last_name, profile_picture_url,
                    created_at, updated_at, password_hash
             FROM users
             WHERE username = $1 OR email = $1",
        )
        .bind(identifier)
        .fetch_optional(db)
        .await
        .context("Failed to look up user for authentication")
        .map_err(AppError::database)?;

        let Some(row) = row else {
            return Ok(None);
        };

        if !verify_password(password, &row.password_hash)? {
            return Ok(None);
        }

        Ok(Some(User {
            id: row.id,
            username: row.username,
            email: row.email,
            role: row.role,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_picture_url: row.profile_picture_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}
