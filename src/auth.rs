use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use url::Url;

use crate::catalog::CatalogClient;
use crate::error::MgError;

pub const TOKEN_ENV: &str = "MGRKEY";

/// Prefix the API expects in front of base64 `user:passwd` on login.
const LOGIN_PREFIX: &str = "kbgo4711";

#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub token: Option<String>,
    pub user: Option<String>,
    pub passwd: Option<String>,
    /// Token from the config file, used when nothing else is available.
    pub stored: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

impl Credentials {
    pub fn login_header(user: &str, passwd: &str) -> AuthToken {
        let encoded = STANDARD.encode(format!("{user}:{passwd}"));
        AuthToken(format!("{LOGIN_PREFIX}{encoded}"))
    }

    /// Resolve to a usable token. When only user/password were supplied, a
    /// client built by `connect` with the login header asks `api` for one.
    /// `None` means anonymous access.
    pub fn acquire<C, F>(&self, api: &Url, connect: F) -> Result<Option<AuthToken>, MgError>
    where
        C: CatalogClient,
        F: FnOnce(&AuthToken) -> Result<C, MgError>,
    {
        if let Some(token) = non_empty(self.token.as_deref()) {
            return Ok(Some(AuthToken::new(token)));
        }

        match (non_empty(self.user.as_deref()), non_empty(self.passwd.as_deref())) {
            (Some(user), Some(passwd)) => {
                tracing::info!(user, "logging in");
                let client = connect(&Self::login_header(user, passwd))?;
                let value = client
                    .fetch_json(api)
                    .map_err(|err| MgError::Auth(err.to_string()))?;
                let response: LoginResponse = serde_json::from_value(value)
                    .map_err(|err| MgError::Auth(err.to_string()))?;
                let token = response
                    .token
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| MgError::Auth("login response has no token".to_string()))?;
                Ok(Some(AuthToken(token)))
            }
            (Some(_), None) | (None, Some(_)) => Err(MgError::IncompleteLogin),
            (None, None) => {
                let env = std::env::var(TOKEN_ENV).ok();
                Ok(non_empty(env.as_deref())
                    .or_else(|| non_empty(self.stored.as_deref()))
                    .map(AuthToken::new))
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
