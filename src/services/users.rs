//! Registration and login

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, NewUser, RegisterUser, Role, User, UserInfo},
    repository::UserStore,
    services::tokens::TokenService,
};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Register a new user.
    ///
    /// The two existence lookups are a fast path only: the store's unique
    /// indexes decide when two registrations race.
    pub async fn register(&self, request: RegisterUser) -> AppResult<UserInfo> {
        if self.store.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::Conflict("username or email already exists".to_string()));
        }

        if self.store.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("username or email already exists".to_string()));
        }

        let role: Role = request
            .role
            .parse()
            .map_err(|_| AppError::Validation("invalid role".to_string()))?;

        let password_hash = hash_password(&request.password)?;

        let user = self
            .store
            .create(&NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "registered user");

        Ok(user.into())
    }

    /// Authenticate by username and return a signed token
    pub async fn login(&self, request: LoginRequest) -> AppResult<String> {
        let user = self
            .store
            .find_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !verify_password(&user, &request.password)? {
            tracing::debug!(user_id = user.id, "login rejected: wrong password");
            return Err(AppError::Unauthorized("invalid password".to_string()));
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(token)
    }

    /// Token lifetime in seconds, reported alongside issued tokens
    pub fn token_lifetime_secs(&self) -> i64 {
        self.tokens.lifetime_secs()
    }
}

/// Hash a password using Argon2 with a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify user password
fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
