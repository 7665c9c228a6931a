pub mod dto;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::config::IdentityConfig;
use crate::error::AppError;

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
}

/// Supplies the bearer token attached to backend requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current id token, refreshed if it is about to expire.
    /// Fails with [`AppError::Unauthenticated`] when nobody is signed in.
    async fn bearer_token(&self) -> Result<String, AppError>;

    fn current_uid(&self) -> Option<String>;
}

#[async_trait]
pub trait IdentityProvider: TokenSource {
    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<IdentityUser, AppError>;
    async fn sign_up_with_email(&self, email: &str, password: &str) -> Result<IdentityUser, AppError>;
    async fn sign_out(&self) -> Result<(), AppError>;

    /// Sign-in state stream. Emits whenever the signed-in user changes; token
    /// refreshes for the same user are not reported.
    fn subscribe(&self) -> watch::Receiver<Option<IdentityUser>>;
}

#[derive(Debug, Clone)]
struct Credentials {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    fn new(id_token: String, refresh_token: String, expires_in: &str) -> Self {
        let secs = expires_in.parse::<i64>().unwrap_or(3600);
        Self {
            id_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(secs),
        }
    }

    fn is_fresh(&self) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > Utc::now()
    }
}

/// Email/password identity provider spoken to over its REST API.
pub struct RestIdentityProvider {
    client: Client,
    config: IdentityConfig,
    user: watch::Sender<Option<IdentityUser>>,
    credentials: Mutex<Option<Credentials>>,
}

impl RestIdentityProvider {
    pub fn new(config: IdentityConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        let (user, _) = watch::channel(None);
        Ok(Self {
            client,
            config,
            user,
            credentials: Mutex::new(None),
        })
    }

    async fn post<B, T>(&self, url: &str, body: &B, fallback: &str) -> Result<T, AppError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<dto::ErrorResponse>(&body_text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| fallback.to_string());
            warn!("identity provider error {}: {}", status, message);
            return Err(AppError::Identity(message));
        }

        serde_json::from_str::<T>(&body_text)
            .map_err(|e| AppError::Decode(format!("identity response: {}", e)))
    }

    async fn password_flow(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
        fallback: &str,
    ) -> Result<IdentityUser, AppError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.config.identity_url, endpoint, self.config.api_key
        );
        let request = dto::PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: dto::PasswordResponse = self.post(&url, &request, fallback).await?;

        let user = IdentityUser {
            uid: response.local_id,
            email: response.email.or_else(|| Some(email.to_string())),
        };
        *self.credentials.lock().await = Some(Credentials::new(
            response.id_token,
            response.refresh_token,
            &response.expires_in,
        ));
        self.publish(Some(user.clone()));
        info!("signed in as {}", user.uid);
        Ok(user)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, AppError> {
        let url = format!("{}/token?key={}", self.config.token_url, self.config.api_key);
        let request = dto::RefreshRequest {
            grant_type: "refresh_token",
            refresh_token,
        };
        let response: dto::RefreshResponse =
            self.post(&url, &request, "Failed to refresh session").await?;
        debug!("refreshed id token for {}", response.user_id);
        Ok(Credentials::new(
            response.id_token,
            response.refresh_token,
            &response.expires_in,
        ))
    }

    fn publish(&self, user: Option<IdentityUser>) {
        self.user.send_if_modified(|current| {
            let changed = current.as_ref().map(|u| &u.uid) != user.as_ref().map(|u| &u.uid);
            if changed {
                *current = user;
            }
            changed
        });
    }
}

#[async_trait]
impl TokenSource for RestIdentityProvider {
    async fn bearer_token(&self) -> Result<String, AppError> {
        let refresh_token = {
            let guard = self.credentials.lock().await;
            let creds = guard.as_ref().ok_or(AppError::Unauthenticated)?;
            if creds.is_fresh() {
                return Ok(creds.id_token.clone());
            }
            creds.refresh_token.clone()
        };

        let refreshed = self.refresh(&refresh_token).await?;
        let mut guard = self.credentials.lock().await;
        // Signed out while the refresh was in flight.
        if guard.is_none() {
            return Err(AppError::Unauthenticated);
        }
        let token = refreshed.id_token.clone();
        *guard = Some(refreshed);
        Ok(token)
    }

    fn current_uid(&self) -> Option<String> {
        self.user.borrow().as_ref().map(|u| u.uid.clone())
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<IdentityUser, AppError> {
        self.password_flow("signInWithPassword", email, password, "Failed to sign in")
            .await
    }

    async fn sign_up_with_email(&self, email: &str, password: &str) -> Result<IdentityUser, AppError> {
        self.password_flow("signUp", email, password, "Failed to sign up")
            .await
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        *self.credentials.lock().await = None;
        self.publish(None);
        info!("signed out");
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<IdentityUser>> {
        self.user.subscribe()
    }
}
