use std::env;

use crate::error::AppError;

const DEFAULT_BACKEND_URL: &str = "http://localhost:3001/api";
const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_PROTECTED_PREFIXES: &str = "/home,/admin,/student";
const DEFAULT_LOGIN_PATH: &str = "/auth/login";

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub api_key: String,
    pub identity_url: String,
    pub token_url: String,
}

#[derive(Clone, Debug)]
pub struct GuardConfig {
    pub protected_prefixes: Vec<String>,
    pub login_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: split_list(DEFAULT_PROTECTED_PREFIXES),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendConfig,
    pub identity: IdentityConfig,
    pub guard: GuardConfig,
}

impl PortalConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let host = env::var("PORTAL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("PORTAL_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("PORTAL_PORT is not a port: {}", raw)))?,
            Err(_) => 3000,
        };

        let base_url = env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

        let api_key = env::var("IDENTITY_API_KEY")
            .map_err(|_| AppError::Config("IDENTITY_API_KEY is not set".to_string()))?;
        let identity_url =
            env::var("IDENTITY_URL").unwrap_or_else(|_| DEFAULT_IDENTITY_URL.to_string());
        let token_url =
            env::var("IDENTITY_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string());

        let protected_prefixes = split_list(
            &env::var("PROTECTED_PREFIXES").unwrap_or_else(|_| DEFAULT_PROTECTED_PREFIXES.to_string()),
        );
        let login_path = env::var("LOGIN_PATH").unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_string());

        Ok(Self {
            host,
            port,
            backend: BackendConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            identity: IdentityConfig {
                api_key,
                identity_url: identity_url.trim_end_matches('/').to_string(),
                token_url: token_url.trim_end_matches('/').to_string(),
            },
            guard: GuardConfig {
                protected_prefixes,
                login_path,
            },
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
