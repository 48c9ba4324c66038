use super::{AuthenticatedUser, Credentials, IdentityProvider, SignUpOutcome};
use crate::error::{IdentityError, IdentityResult};
use crate::report::UserId;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: String,
    password: String,
}

/// In-process identity provider for development and tests.
///
/// Accounts are keyed by lowercase email and confirmed immediately; tokens are random UUIDs
/// valid until sign-out.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    tokens: RwLock<HashMap<String, UserId>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn resolve(&self, access_token: &str) -> IdentityResult<Option<AuthenticatedUser>> {
        let Some(user_id) = self.tokens.read().await.get(access_token).copied() else {
            return Ok(None);
        };
        let email = self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.id == user_id)
            .map(|account| account.email.clone());
        Ok(Some(AuthenticatedUser {
            id: user_id,
            email,
            access_token: access_token.to_string(),
        }))
    }

    async fn sign_in(&self, credentials: &Credentials) -> IdentityResult<AuthenticatedUser> {
        credentials.validate_sign_in()?;
        let email = credentials.normalised_email();

        let account = self
            .accounts
            .read()
            .await
            .get(&email)
            .filter(|account| account.password == credentials.password)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;

        let token = Uuid::new_v4().to_string();
        self.tokens.write().await.insert(token.clone(), account.id);
        tracing::info!(user_id = %account.id, "signed in");

        Ok(AuthenticatedUser {
            id: account.id,
            email: Some(account.email),
            access_token: token,
        })
    }

    async fn sign_up(&self, credentials: &Credentials) -> IdentityResult<SignUpOutcome> {
        credentials.validate_sign_up()?;
        let email = credentials.normalised_email();

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(IdentityError::AlreadyRegistered(email));
        }
        let id = UserId::new(Uuid::new_v4());
        accounts.insert(
            email.clone(),
            Account {
                id,
                email,
                password: credentials.password.clone(),
            },
        );
        tracing::info!(user_id = %id, "account created");

        Ok(SignUpOutcome {
            user_id: id,
            confirmation_required: false,
        })
    }

    async fn sign_out(&self, user: &AuthenticatedUser) -> IdentityResult<()> {
        self.tokens.write().await.remove(&user.access_token);
        Ok(())
    }
}
