use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use reqwest::header;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{self, ConfigOperations, REQUEST_TIMEOUT, Secret};
use crate::error::AuthError;

/// The bearer token for one process invocation. Never written to disk.
#[derive(Clone)]
pub struct AuthContext {
    token: String,
}

impl AuthContext {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token())
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext").field("token", &"***").finish()
    }
}

#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Trades the stored credential for a bearer token. One attempt, no retry.
    async fn exchange(&self, secret: &Secret) -> Result<AuthContext, AuthError>;
}

/// Exchanges credentials against the provider's `/api/v2/auth` endpoint.
#[derive(Debug)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TokenExchanger for AuthClient {
    async fn exchange(&self, secret: &Secret) -> Result<AuthContext, AuthError> {
        let url = format!("{}/api/v2/auth", self.base_url);
        debug!(%url, "exchanging credentials for access token");

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Basic {}", secret.as_str()))
            .json(&json!({ "refresh_token": "string" }))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Rejected(format!(
                "Status: {status}, Response: {response_text}"
            )));
        }

        parse_access_token(&response_text).map(AuthContext::new)
    }
}

fn parse_access_token(body: &str) -> Result<String, AuthError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AuthError::Rejected(format!("malformed token response: {e}")))?;
    value
        .get("access_token")
        .and_then(|token| token.as_str())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AuthError::Rejected("token response has no access_token".to_string()))
}

/// Source of login and password when no credential is stored yet.
pub trait CredentialPrompt {
    fn ask(&self) -> io::Result<(String, String)>;
}

/// Reads the login from stdin and the password without echo.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn ask(&self) -> io::Result<(String, String)> {
        print!("Enter login: ");
        io::stdout().flush()?;
        let mut login = String::new();
        io::stdin().lock().read_line(&mut login)?;
        let password = rpassword::prompt_password("Enter password: ")?;
        Ok((login.trim().to_string(), password.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Resolves the stored credential (prompting once if there is none) and
/// exchanges it for a session token.
pub async fn bootstrap<C, E, P>(
    config_ops: &C,
    exchanger: &E,
    prompt: &P,
) -> Result<AuthContext, AuthError>
where
    C: ConfigOperations + ?Sized,
    E: TokenExchanger + ?Sized,
    P: CredentialPrompt + ?Sized,
{
    let stored = config::load_secret(config_ops)
        .await
        .map_err(|e| AuthError::Store(format!("{e:#}")))?;

    let secret = match stored {
        Some(secret) => secret,
        None => {
            info!("no stored credentials, prompting for login");
            let secret = prompt_secret(prompt)?;
            config::save_secret(config_ops, &secret)
                .await
                .map_err(|e| AuthError::Store(format!("{e:#}")))?;
            secret
        }
    };

    exchanger.exchange(&secret).await
}

pub fn prompt_secret<P: CredentialPrompt + ?Sized>(prompt: &P) -> Result<Secret, AuthError> {
    let (login, password) = prompt.ask().map_err(AuthError::Prompt)?;
    if login.is_empty() {
        return Err(AuthError::Rejected("login must not be empty".to_string()));
    }
    Ok(Secret::encode(&login, &password))
}
