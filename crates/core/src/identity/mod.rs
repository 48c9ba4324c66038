//! Identity boundary.
//!
//! The core never holds an ambient "current user". Callers resolve a [`Session`] from the
//! request's bearer token through an [`IdentityProvider`] and pass it explicitly into the
//! lifecycle controller and the report store.

mod gotrue;
mod memory;

pub use gotrue::GoTrueIdentityProvider;
pub use memory::MemoryIdentityProvider;

use crate::config::{AppConfig, BackendKind};
use crate::constants::{ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_URL};
use crate::error::{ConfigError, ConfigResult, IdentityError, IdentityResult};
use crate::lifecycle::Notification;
use crate::report::UserId;
use async_trait::async_trait;
use std::sync::Arc;

/// A signed-in user together with the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
    pub access_token: String,
}

/// Caller context for one request, possibly anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<AuthenticatedUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: AuthenticatedUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Sign-in or sign-up form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Email and password must both be non-blank.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MissingField` naming the first blank field.
    pub fn validate_sign_in(&self) -> IdentityResult<()> {
        if self.email.trim().is_empty() {
            return Err(IdentityError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(IdentityError::MissingField("password"));
        }
        Ok(())
    }

    /// Sign-up additionally requires a full name.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MissingField` naming the first blank field.
    pub fn validate_sign_up(&self) -> IdentityResult<()> {
        if self
            .full_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
        {
            return Err(IdentityError::MissingField("full_name"));
        }
        self.validate_sign_in()
    }

    pub(crate) fn normalised_email(&self) -> String {
        self.email.trim().to_ascii_lowercase()
    }
}

impl IdentityError {
    /// User-facing notification for a failed sign-in or sign-up.
    pub fn notification(&self) -> Notification {
        match self {
            IdentityError::MissingField(_) => Notification::destructive(
                "Missing information",
                "Please fill in all required fields.",
            ),
            IdentityError::InvalidCredentials => {
                Notification::destructive("Login failed", "Invalid email or password.")
            }
            IdentityError::AlreadyRegistered(_) => Notification::destructive(
                "Registration failed",
                "An account with this email already exists.",
            ),
            _ => Notification::destructive(
                "Error",
                "Unable to reach the sign-in service. Please try again.",
            ),
        }
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user_id: UserId,
    /// The account must be confirmed (e.g. by email) before it can sign in.
    pub confirmation_required: bool,
}

impl SignUpOutcome {
    pub fn notification(&self) -> Notification {
        if self.confirmation_required {
            Notification::success(
                "Account created",
                "Your account has been successfully created. Check your email for confirmation.",
            )
        } else {
            Notification::success(
                "Account created",
                "Your account has been successfully created.",
            )
        }
    }
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an access token to its user. Unknown or expired tokens yield `Ok(None)`.
    async fn resolve(&self, access_token: &str) -> IdentityResult<Option<AuthenticatedUser>>;

    async fn sign_in(&self, credentials: &Credentials) -> IdentityResult<AuthenticatedUser>;

    async fn sign_up(&self, credentials: &Credentials) -> IdentityResult<SignUpOutcome>;

    /// Revokes the user's access token.
    async fn sign_out(&self, user: &AuthenticatedUser) -> IdentityResult<()>;
}

/// Resolves an optional bearer token into a [`Session`].
///
/// # Errors
///
/// Propagates provider failures; an unknown token is an anonymous session, not an error.
pub async fn session_for(
    provider: &dyn IdentityProvider,
    access_token: Option<&str>,
) -> IdentityResult<Session> {
    match access_token {
        None => Ok(Session::anonymous()),
        Some(token) => Ok(provider
            .resolve(token)
            .await?
            .map(Session::authenticated)
            .unwrap_or_default()),
    }
}

/// Builds the identity provider for the configured backend.
///
/// # Errors
///
/// Returns `ConfigError::Missing` when the hosted backend lacks its connection details.
pub fn build_identity(
    cfg: &AppConfig,
    client: reqwest::Client,
) -> ConfigResult<Arc<dyn IdentityProvider>> {
    match cfg.backend() {
        BackendKind::Memory => Ok(Arc::new(MemoryIdentityProvider::new())),
        BackendKind::Hosted => {
            let hosted = cfg.hosted().ok_or(ConfigError::Missing(ENV_SUPABASE_URL))?;
            if hosted.anon_key.is_empty() {
                return Err(ConfigError::Missing(ENV_SUPABASE_ANON_KEY));
            }
            Ok(Arc::new(GoTrueIdentityProvider::new(
                client,
                &hosted.url,
                hosted.anon_key.clone(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_requires_every_field() {
        let creds = Credentials::new("ada@example.com", "secret");
        assert!(matches!(
            creds.validate_sign_up(),
            Err(IdentityError::MissingField("full_name"))
        ));
        assert!(creds.validate_sign_in().is_ok());

        let creds = Credentials::new("  ", "secret").with_full_name("Ada");
        assert!(matches!(
            creds.validate_sign_up(),
            Err(IdentityError::MissingField("email"))
        ));

        let creds = Credentials::new("ada@example.com", "").with_full_name("Ada");
        assert!(matches!(
            creds.validate_sign_up(),
            Err(IdentityError::MissingField("password"))
        ));
    }

    #[test]
    fn failures_map_to_notifications() {
        assert_eq!(
            IdentityError::MissingField("email").notification().title,
            "Missing information"
        );
        assert_eq!(
            IdentityError::AlreadyRegistered("a@b.c".into())
                .notification()
                .title,
            "Registration failed"
        );
        let outcome = SignUpOutcome {
            user_id: UserId::new(uuid::Uuid::nil()),
            confirmation_required: true,
        };
        assert!(outcome.notification().description.contains("Check your email"));
    }

    #[tokio::test]
    async fn session_for_unknown_token_is_anonymous() {
        let provider = MemoryIdentityProvider::new();
        let session = session_for(&provider, Some("nope")).await.unwrap();
        assert!(!session.is_authenticated());
        let session = session_for(&provider, None).await.unwrap();
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn session_for_known_token_is_authenticated() {
        let provider = MemoryIdentityProvider::new();
        let creds = Credentials::new("ada@example.com", "pw").with_full_name("Ada");
        provider.sign_up(&creds).await.unwrap();
        let user = provider.sign_in(&creds).await.unwrap();

        let session = session_for(&provider, Some(&user.access_token))
            .await
            .unwrap();
        assert_eq!(session.user().map(|u| u.id), Some(user.id));
    }
}
