use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::users::model::{UpdateProfileDto, User};
use crate::utils::errors::AppError;

const USER_COLUMNS: &str =
    "id, username, email, role, first_name, last_name, profile_picture_url, created_at, updated_at";

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by ID")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(user)
    }

    /// Applies the allow-listed profile fields. Performs no write at all
    /// when nothing actually changes value; an email change is checked
    /// against every other account first.
    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        let mut user = Self::get_user(db, user_id).await?;
        let mut changed = false;

        if let Some(first_name) = dto.first_name {
            if user.first_name.as_deref() != Some(first_name.as_str()) {
                user.first_name = Some(first_name);
                changed = true;
            }
        }

        if let Some(last_name) = dto.last_name {
            if user.last_name.as_deref() != Some(last_name.as_str()) {
                user.last_name = Some(last_name);
                changed = true;
            }
        }

        if let Some(profile_picture_url) = dto.profile_picture_url {
            if user.profile_picture_url.as_deref() != Some(profile_picture_url.as_str()) {
                user.profile_picture_url = Some(profile_picture_url);
                changed = true;
            }
        }

        if let Some(email) = dto.email {
            if email != user.email {
                let taken = sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM users WHERE email = $1 AND id != $2",
                )
                .bind(&email)
                .bind(user_id)
                .fetch_optional(db)
                .await
                .context("Failed to check email availability")
                .map_err(AppError::database)?;

                if taken.is_some() {
                    return Err(AppError::conflict(format!(
                        "Email '{}' is already taken",
                        email
                    )));
                }

                user.email = email;
                changed = true;
            }
        }

        if !changed {
            return Ok(user);
        }

        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = $1, last_name = $2, email = $3, profile_picture_url = $4,
                 updated_at = NOW()
             WHERE id = $5
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.profile_picture_url)
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("Failed to update user profile")
        .map_err(AppError::database)?;

        Ok(updated)
    }
}
