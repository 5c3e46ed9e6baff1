//! User service configuration.

use std::env;

use common::{AppError, AppResult, DatabaseConfig, HttpClientConfig};
use domain::SecretString;
use validator::Validate;

/// User service configuration.
#[derive(Debug, Clone, Default)]
pub struct UserServiceConfig {
    /// Local user store
    pub database: DatabaseConfig,
    /// External identity provider
    pub directory: IdentityDirectoryConfig,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            database: DatabaseConfig {
                url: env::var("USER_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.url),
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(defaults.max_connections),
                min_connections: env_parse("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or(defaults.min_connections),
            },
            directory: IdentityDirectoryConfig::from_env(),
        }
    }
}

/// Keycloak connection settings.
///
/// `realm`/`client_id` identify the application realm and client whose
/// client roles are granted; the `master_*` fields are the admin account the
/// service authenticates as. The application client's own secret is not
/// needed: every admin call uses the master password grant.
#[derive(Debug, Clone, Validate)]
pub struct IdentityDirectoryConfig {
    #[validate(url)]
    pub auth_server_url: String,
    #[validate(length(min = 1))]
    pub realm: String,
    #[validate(length(min = 1))]
    pub client_id: String,
    #[validate(length(min = 1))]
    pub master_realm: String,
    #[validate(length(min = 1))]
    pub master_user: String,
    pub master_user_password: SecretString,
    #[validate(length(min = 1))]
    pub master_client: String,
    pub http: HttpClientConfig,
}

impl IdentityDirectoryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            auth_server_url: env::var("KEYCLOAK_AUTH_SERVER_URL")
                .unwrap_or(defaults.auth_server_url),
            realm: env::var("KEYCLOAK_REALM").unwrap_or(defaults.realm),
            client_id: env::var("KEYCLOAK_CLIENT_ID").unwrap_or(defaults.client_id),
            master_realm: env::var("KEYCLOAK_MASTER_REALM").unwrap_or(defaults.master_realm),
            master_user: env::var("KEYCLOAK_MASTER_USER").unwrap_or(defaults.master_user),
            master_user_password: SecretString::new(
                env::var("KEYCLOAK_MASTER_PASSWORD").unwrap_or_default(),
            ),
            master_client: env::var("KEYCLOAK_MASTER_CLIENT").unwrap_or(defaults.master_client),
            http: HttpClientConfig {
                connect_timeout_ms: env_parse("KEYCLOAK_CONNECT_TIMEOUT_MS")
                    .unwrap_or(defaults.http.connect_timeout_ms),
                request_timeout_ms: env_parse("KEYCLOAK_REQUEST_TIMEOUT_MS")
                    .unwrap_or(defaults.http.request_timeout_ms),
            },
        }
    }

    /// Reject malformed settings before any call is made.
    pub fn validated(self) -> AppResult<Self> {
        self.validate()
            .map_err(|e| AppError::configuration(format!("identity directory: {}", e)))?;
        Ok(self)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.auth_server_url.trim_end_matches('/')
    }
}

impl Default for IdentityDirectoryConfig {
    fn default() -> Self {
        Self {
            auth_server_url: "http://localhost:8080".to_string(),
            realm: "ticketing-dev".to_string(),
            client_id: "ticketing-app".to_string(),
            master_realm: "master".to_string(),
            master_user: "admin".to_string(),
            master_user_password: SecretString::new(""),
            master_client: "admin-cli".to_string(),
            http: HttpClientConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
