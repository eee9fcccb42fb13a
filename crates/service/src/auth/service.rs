use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use models::{customer_profile, professional, user::{self, Role}};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, NewAccount, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub password_algorithm: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_secs: u64) -> Self {
        Self { jwt_secret: jwt_secret.into(), token_ttl_secs, password_algorithm: "argon2".into() }
    }
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self::new(c.jwt_secret.clone(), c.token_ttl_secs)
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a customer or professional with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use models::user::Role;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret", 3600));
    /// let input = RegisterInput {
    ///     email: "user@example.com".into(), name: "Test".into(), password: "Secret123".into(),
    ///     role: Role::Customer, phone: None, address: None, pincode: None,
    ///     service_type: None, experience: None,
    /// };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.role == Role::Admin {
            return Err(AuthError::Validation("admin accounts cannot self-register".into()));
        }
        self.create_account(input).await
    }

    /// Create the configured admin account unless it already exists. When
    /// it exists but the configured password no longer matches, the stored
    /// hash is replaced so the deployment's credentials stay authoritative.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn bootstrap_admin(&self, email: &str, name: &str, password: &str) -> Result<AuthUser, AuthError> {
        if let Some(existing) = self.repo.find_user_by_email(email.trim()).await? {
            if existing.role != Role::Admin {
                return Err(AuthError::Conflict);
            }
            let current = self.repo.get_credentials(existing.id).await?;
            if current.is_some_and(|c| password_matches(&c.password_hash, password)) {
                debug!(user_id = %existing.id, "admin already present");
                return Ok(existing);
            }
            check_password(password)?;
            let hash = hash_password(password)?;
            self.repo.set_password(existing.id, hash, &self.cfg.password_algorithm).await?;
            info!(user_id = %existing.id, "admin_password_rotated");
            return Ok(existing);
        }
        let input = RegisterInput {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            phone: None,
            address: None,
            pincode: None,
            service_type: None,
            experience: None,
        };
        self.create_account(input).await
    }

    async fn create_account(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        user::validate_email(&input.email)?;
        user::validate_name(&input.name)?;
        check_password(&input.password)?;
        match input.role {
            Role::Professional => {
                let t = input.service_type.as_deref().unwrap_or_default();
                professional::validate_service_type(t)?;
            }
            Role::Customer => {
                if let Some(p) = input.pincode.as_deref() {
                    customer_profile::validate_pincode(p)?;
                }
            }
            Role::Admin => {}
        }
        if let Some(existing) = self.repo.find_user_by_email(input.email.trim()).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self
            .repo
            .create_account(NewAccount { input, password_hash: hash, password_algorithm: self.cfg.password_algorithm.clone() })
            .await?;
        info!(user_id = %user.id, role = %user.role, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use models::user::Role;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::new("secret", 3600));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput {
    ///     email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into(),
    ///     role: Role::Customer, phone: None, address: None, pincode: None,
    ///     service_type: None, experience: None,
    /// }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(input.email.trim())
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }
        if !user.active {
            return Err(AuthError::Inactive);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, role = %user.role, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(user_id).await?.ok_or(AuthError::NotFound)
    }

    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        issue_token(&self.cfg, user)
    }
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// Unparseable stored hashes count as a mismatch.
fn password_matches(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

pub fn issue_token(cfg: &AuthConfig, user: &AuthUser) -> Result<String, AuthError> {
    let exp = (chrono::Utc::now() + chrono::Duration::seconds(cfg.token_ttl_secs as i64)).timestamp() as usize;
    let claims = Claims { sub: user.email.clone(), uid: user.id, role: user.role, exp };
    encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Verify signature and expiry of an HS256 token.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::Unauthorized
        })
}
