//! Authentication and user administration service
//!
//! Username/password login with bcrypt verification, JWT issuance, step-up
//! grants for sensitive views, and the user CRUD behind the IAM screens.
//! Presence is derived from `last_seen` against a liveness window; it is
//! never stored.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use shared::{presence_status, validation, Role, User};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{Claims, StepUpClaims};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    step_up_passphrase: String,
    step_up_expiry: i64,
    presence_window: i64,
    bootstrap_username: String,
    bootstrap_password: String,
}

/// Response after successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// A short-lived grant for sensitive views
#[derive(Debug, Serialize)]
pub struct StepUpGrant {
    pub step_up_token: String,
    pub expires_in: i64,
}

/// Input for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Input for updating a user; omitted fields are unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    username: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    last_seen: Option<DateTime<Utc>>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.auth.jwt_secret.clone(),
            access_token_expiry: config.auth.access_token_expiry,
            step_up_passphrase: config.auth.step_up_passphrase.clone(),
            step_up_expiry: config.auth.step_up_expiry,
            presence_window: config.auth.presence_window,
            bootstrap_username: config.auth.bootstrap_username.clone(),
            bootstrap_password: config.auth.bootstrap_password.clone(),
        }
    }

    /// Authenticate with username and password
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .fetch_user(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let role = Self::parse_role(&user.role)?;

        self.touch_last_seen(username).await?;

        let access_token = self.generate_token(username, role)?;

        tracing::info!(username, "login succeeded");
        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            username: user.username,
            name: user.name,
            role,
        })
    }

    /// Record activity so the user shows Online within the liveness window
    pub async fn touch_last_seen(&self, username: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_seen = NOW() WHERE username = $1")
            .bind(username)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Verify the shared step-up passphrase and issue a short-lived grant
    /// bound to the requesting user
    pub fn step_up(&self, username: &str, passphrase: &str) -> AppResult<StepUpGrant> {
        if passphrase != self.step_up_passphrase {
            return Err(AppError::Unauthorized(
                "Incorrect step-up passphrase".to_string(),
            ));
        }

        let now = Utc::now();
        let claims = StepUpClaims {
            sub: username.to_string(),
            scope: "step_up".to_string(),
            exp: (now + Duration::seconds(self.step_up_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        let step_up_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        tracing::info!(username, "step-up grant issued");
        Ok(StepUpGrant {
            step_up_token,
            expires_in: self.step_up_expiry,
        })
    }

    /// Create a new user account
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        validation::validate_username(&input.username)
            .map_err(|e| AppError::validation("username", e))?;
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Name must not be empty"));
        }
        validation::validate_email(&input.email).map_err(|e| AppError::validation("email", e))?;
        validation::validate_password(&input.password)
            .map_err(|e| AppError::validation("password", e))?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(&input.username)
        .fetch_one(&self.db)
        .await?;
        if exists {
            return Err(AppError::DuplicateEntry("username".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO users (username, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&input.username)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.role.as_str())
        .execute(&self.db)
        .await?;

        tracing::info!(username = %input.username, role = input.role.as_str(), "user created");
        Ok(User {
            username: input.username,
            name: input.name,
            email: input.email,
            role: input.role,
            status: shared::UserStatus::Offline,
            last_seen: None,
        })
    }

    /// Update a user; rename is checked against existing usernames
    pub async fn update_user(&self, username: &str, input: UpdateUserInput) -> AppResult<User> {
        let existing = self
            .fetch_user(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let new_username = input.username.unwrap_or_else(|| existing.username.clone());
        let new_name = input.name.unwrap_or_else(|| existing.name.clone());
        let new_email = input.email.unwrap_or_else(|| existing.email.clone());
        let new_role = match input.role {
            Some(role) => role,
            None => Self::parse_role(&existing.role)?,
        };

        validation::validate_username(&new_username)
            .map_err(|e| AppError::validation("username", e))?;
        validation::validate_email(&new_email).map_err(|e| AppError::validation("email", e))?;

        if new_username != username {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
            )
            .bind(&new_username)
            .fetch_one(&self.db)
            .await?;
            if taken {
                return Err(AppError::DuplicateEntry("username".to_string()));
            }
        }

        let password_hash = match input.password.as_deref() {
            Some(password) if !password.is_empty() => {
                validation::validate_password(password)
                    .map_err(|e| AppError::validation("password", e))?;
                hash(password, DEFAULT_COST)
                    .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            }
            _ => existing.password_hash,
        };

        sqlx::query(
            r#"
            UPDATE users
            SET username = $1, name = $2, email = $3, role = $4, password_hash = $5
            WHERE username = $6
            "#,
        )
        .bind(&new_username)
        .bind(&new_name)
        .bind(&new_email)
        .bind(new_role.as_str())
        .bind(&password_hash)
        .bind(username)
        .execute(&self.db)
        .await?;

        tracing::info!(username, new_username = %new_username, "user updated");
        Ok(User {
            username: new_username,
            name: new_name,
            email: new_email,
            role: new_role,
            status: presence_status(existing.last_seen, Utc::now(), self.window()),
            last_seen: existing.last_seen,
        })
    }

    /// Delete a user; the bootstrap admin account is protected
    pub async fn delete_user(&self, username: &str) -> AppResult<()> {
        if username == self.bootstrap_username {
            return Err(AppError::validation(
                "username",
                "The bootstrap admin account cannot be deleted",
            ));
        }

        let deleted = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.db)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(username, "user deleted");
        Ok(())
    }

    /// List users with derived Online/Offline status
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT username, name, email, password_hash, role, last_seen
            FROM users
            ORDER BY username ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let now = Utc::now();
        rows.into_iter()
            .map(|row| {
                let role = Self::parse_role(&row.role)?;
                Ok(User {
                    username: row.username,
                    name: row.name,
                    email: row.email,
                    role,
                    status: presence_status(row.last_seen, now, self.window()),
                    last_seen: row.last_seen,
                })
            })
            .collect()
    }

    /// Change the calling user's own password
    pub async fn change_password(&self, username: &str, new_password: &str) -> AppResult<()> {
        validation::validate_password(new_password)
            .map_err(|e| AppError::validation("password", e))?;

        let password_hash = hash(new_password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let updated = sqlx::query("UPDATE users SET password_hash = $1 WHERE username = $2")
            .bind(&password_hash)
            .bind(username)
            .execute(&self.db)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(username, "password changed");
        Ok(())
    }

    /// Seed the bootstrap admin account when the user table is empty
    pub async fn seed_admin(&self) -> AppResult<()> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        if count > 0 {
            return Ok(());
        }

        let password_hash = hash(&self.bootstrap_password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO users (username, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&self.bootstrap_username)
        .bind("Default Admin")
        .bind("admin@example.com")
        .bind(&password_hash)
        .bind(Role::Admin.as_str())
        .execute(&self.db)
        .await?;

        tracing::info!(username = %self.bootstrap_username, "bootstrap admin seeded");
        Ok(())
    }

    async fn fetch_user(&self, username: &str) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT username, name, email, password_hash, role, last_seen
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    fn generate_token(&self, username: &str, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            role: role.as_str().to_string(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    fn parse_role(role: &str) -> AppResult<Role> {
        Role::from_str(role).ok_or_else(|| AppError::Internal(format!("Unknown role: {}", role)))
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.presence_window)
    }
}
