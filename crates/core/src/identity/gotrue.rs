//! Hosted auth service client.

use super::{AuthenticatedUser, Credentials, IdentityProvider, SignUpOutcome};
use crate::constants::AUTH_API_PATH;
use crate::error::{IdentityError, IdentityResult};
use crate::hosted::{error_message, with_project_key};
use crate::report::UserId;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    user: UserBody,
}

/// Sign-up answers with a session when the account is confirmed immediately, otherwise with
/// the bare user object.
#[derive(Debug, Deserialize)]
struct SignUpBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<UserBody>,
    #[serde(default)]
    id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
}

/// Identity provider backed by the hosted auth API.
#[derive(Clone, Debug)]
pub struct GoTrueIdentityProvider {
    client: reqwest::Client,
    auth_url: String,
    anon_key: String,
}

impl GoTrueIdentityProvider {
    /// `base_url` is the hosted project URL; the auth API path is appended.
    pub fn new(client: reqwest::Client, base_url: &str, anon_key: impl Into<String>) -> Self {
        Self {
            client,
            auth_url: format!("{}{AUTH_API_PATH}", base_url.trim_end_matches('/')),
            anon_key: anon_key.into(),
        }
    }

    async fn provider_error(response: reqwest::Response) -> IdentityError {
        let status = response.status().as_u16();
        let message = error_message(response).await;
        tracing::warn!("auth service returned {status}: {message}");
        IdentityError::Provider { status, message }
    }
}

fn unreachable(e: reqwest::Error) -> IdentityError {
    tracing::warn!("auth service unreachable: {e}");
    IdentityError::Unreachable(e.to_string())
}

fn decode(e: reqwest::Error) -> IdentityError {
    IdentityError::Decode(e.to_string())
}

#[async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    async fn resolve(&self, access_token: &str) -> IdentityResult<Option<AuthenticatedUser>> {
        let response = with_project_key(
            self.client.get(format!("{}/user", self.auth_url)),
            &self.anon_key,
            access_token,
        )
        .send()
        .await
        .map_err(unreachable)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            status if !status.is_success() => return Err(Self::provider_error(response).await),
            _ => {}
        }

        let user: UserBody = response.json().await.map_err(decode)?;
        Ok(Some(AuthenticatedUser {
            id: UserId::new(user.id),
            email: user.email,
            access_token: access_token.to_string(),
        }))
    }

    async fn sign_in(&self, credentials: &Credentials) -> IdentityResult<AuthenticatedUser> {
        credentials.validate_sign_in()?;
        let email = credentials.normalised_email();

        let response = with_project_key(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "password")]),
            &self.anon_key,
            &self.anon_key,
        )
        .json(&PasswordGrant {
            email: &email,
            password: &credentials.password,
        })
        .send()
        .await
        .map_err(unreachable)?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(IdentityError::InvalidCredentials)
            }
            status if !status.is_success() => return Err(Self::provider_error(response).await),
            _ => {}
        }

        let body: TokenBody = response.json().await.map_err(decode)?;
        Ok(AuthenticatedUser {
            id: UserId::new(body.user.id),
            email: body.user.email,
            access_token: body.access_token,
        })
    }

    async fn sign_up(&self, credentials: &Credentials) -> IdentityResult<SignUpOutcome> {
        credentials.validate_sign_up()?;
        let email = credentials.normalised_email();

        let response = with_project_key(
            self.client.post(format!("{}/signup", self.auth_url)),
            &self.anon_key,
            &self.anon_key,
        )
        .json(&SignUpRequest {
            email: &email,
            password: &credentials.password,
            data: SignUpMetadata {
                full_name: credentials.full_name.as_deref().map(str::trim),
            },
        })
        .send()
        .await
        .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            if matches!(status.as_u16(), 400 | 422)
                && message.to_ascii_lowercase().contains("already registered")
            {
                return Err(IdentityError::AlreadyRegistered(email));
            }
            tracing::warn!("auth service returned {status}: {message}");
            return Err(IdentityError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: SignUpBody = response.json().await.map_err(decode)?;
        let user_id = body
            .user
            .map(|u| u.id)
            .or(body.id)
            .ok_or_else(|| IdentityError::Decode("sign-up response carries no user id".into()))?;

        Ok(SignUpOutcome {
            user_id: UserId::new(user_id),
            confirmation_required: body.access_token.is_none(),
        })
    }

    async fn sign_out(&self, user: &AuthenticatedUser) -> IdentityResult<()> {
        let response = with_project_key(
            self.client.post(format!("{}/logout", self.auth_url)),
            &self.anon_key,
            &user.access_token,
        )
        .send()
        .await
        .map_err(unreachable)?;

        // An already-expired token is as good as signed out.
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(Self::provider_error(response).await)
        }
    }
}
