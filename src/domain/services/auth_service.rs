use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RefreshTokenRecord, SessionUser, TOKEN_AUDIENCE}, user::User},
    ports::{AuthRepository, UserRepository}
};
use crate::error::{AppError, StartupError};
use crate::config::Config;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Sha256, Digest};
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
}

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    users: Arc<dyn UserRepository>,
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, users: Arc<dyn UserRepository>, config: &Config) -> Result<Self, StartupError> {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())?;
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())?;

        Ok(Self { repo, users, issuer: config.auth_issuer.clone(), encoding_key, decoding_key })
    }

    pub async fn signup(&self, email: &str, password: &str, display_name: &str) -> Result<(User, TokenPair), AppError> {
        let email = email.trim().to_lowercase();
        let display_name = display_name.trim();

        if !crate::domain::services::guest_import::is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!("Password must be at least {} characters", MIN_PASSWORD_LEN)));
        }
        if display_name.is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("An account with this email already exists".into()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::InternalWithMsg(format!("password hashing failed: {}", e)))?
            .to_string();

        let user = self.users.create(&User::new(email, display_name.to_string(), password_hash)).await?;
        info!(user_id = %user.id, "User signed up");

        let tokens = self.issue_token_pair(&user, Uuid::new_v4(), 1).await?;
        Ok((user, tokens))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        let user = self.users.find_by_email(&email.trim().to_lowercase()).await?
            .ok_or(AppError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal)?;

        Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        let tokens = self.issue_token_pair(&user, Uuid::new_v4(), 1).await?;
        Ok((user, tokens))
    }

    /// Rotates the refresh token within its family. Expired tokens retire the whole family.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<(User, TokenPair), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);

        let record = self.repo.find_refresh_token(&token_hash).await?
            .ok_or(AppError::Unauthorized)?;

        if record.expires_at < Utc::now() {
            warn!(user_id = %record.user_id, "Expired refresh token presented");
            self.repo.delete_refresh_family(record.family_id).await?;
            return Err(AppError::Unauthorized);
        }

        let user = self.users.find_by_id(&record.user_id).await?
            .ok_or(AppError::Unauthorized)?;

        self.repo.delete_refresh_token(&token_hash).await?;
        let tokens = self.issue_token_pair(&user, record.family_id, record.generation_id + 1).await?;
        Ok((user, tokens))
    }

    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        self.repo.delete_refresh_token(&token_hash).await
    }

    /// Validates an access token and returns its claims.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    async fn issue_token_pair(&self, user: &User, family_id: Uuid, generation_id: i32) -> Result<TokenPair, AppError> {
        let csrf_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let now = Utc::now();
        let exp = (now + Duration::minutes(15)).timestamp() as usize;

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user.id.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            csrf: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();

        let refresh_record = RefreshTokenRecord {
            token_hash: self.hash_token(&refresh_token),
            user_id: user.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(7),
            created_at: now,
        };

        self.repo.create_refresh_token(&refresh_record).await?;
        Ok(TokenPair { access_token, refresh_token, csrf_token })
    }

    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self { id: claims.sub, email: claims.email, display_name: claims.name }
    }
}
