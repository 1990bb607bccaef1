//! Authentication service.
//!
//! Email and password accounts. Passwords are hashed with Argon2id; new
//! accounts start on the FREE tier and receive a welcome email.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{info, instrument};

use snaplist_core::Email;

use crate::db::{RepositoryError, Stores};
use crate::models::{NewUser, User};
use crate::services::email::EmailService;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest accepted display name, in characters.
const MAX_NAME_LENGTH: usize = 100;

/// Authentication service.
pub struct AuthService<'a> {
    stores: &'a Stores,
    email: &'a EmailService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(stores: &'a Stores, email: &'a EmailService) -> Self {
        Self { stores, email }
    }

    /// Register a new user with email and password.
    ///
    /// The welcome email is best effort and never fails registration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password, name))]
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let name = validate_name(name)?;
        let password_hash = hash_password(password)?;

        let user = self
            .stores
            .users
            .create_user(&NewUser {
                email,
                name,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "Registered user");
        self.email
            .send_welcome_email(user.email.as_str(), &user.name)
            .await;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .stores
            .users
            .get_user_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName {
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_owned())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::TestContext;
    use snaplist_core::TierName;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let ctx = TestContext::new();
        let auth = AuthService::new(ctx.stores(), ctx.email());

        let user = auth
            .register(" Ana@Example.com ", "s3cure-password", "Ana")
            .await
            .expect("register");
        assert_eq!(user.email.as_str(), "ana@example.com");
        assert_eq!(user.membership_tier, TierName::Free);

        let logged_in = auth
            .login("ana@example.com", "s3cure-password")
            .await
            .expect("login");
        assert_eq!(logged_in.id, user.id);

        let sent = ctx.mail.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Welcome to SnapList!");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let ctx = TestContext::new();
        let auth = AuthService::new(ctx.stores(), ctx.email());

        auth.register("ana@example.com", "s3cure-password", "Ana")
            .await
            .expect("first");
        assert!(matches!(
            auth.register("ANA@example.com", "another-password", "Ana")
                .await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_user() {
        let ctx = TestContext::new();
        let auth = AuthService::new(ctx.stores(), ctx.email());
        auth.register("ana@example.com", "s3cure-password", "Ana")
            .await
            .expect("register");

        assert!(matches!(
            auth.login("ana@example.com", "not-the-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "s3cure-password").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_registration_survives_mail_failure() {
        let ctx = TestContext::with_failing_mail();
        let auth = AuthService::new(ctx.stores(), ctx.email());

        auth.register("ana@example.com", "s3cure-password", "Ana")
            .await
            .expect("register despite mail failure");
    }
}
