//! Keycloak admin REST adapter for the identity directory.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::LOCATION, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use common::{AppError, AppResult};

use super::{DirectoryAccount, IdentityDirectory};
use crate::config::IdentityDirectoryConfig;

/// Identity directory backed by a Keycloak realm.
///
/// Every call authenticates as the master-realm admin first; no token is
/// cached between calls.
#[derive(Debug, Clone)]
pub struct KeycloakDirectory {
    config: IdentityDirectoryConfig,
    http: Client,
}

impl KeycloakDirectory {
    /// Create a new client from validated configuration.
    pub fn new(config: IdentityDirectoryConfig) -> AppResult<Self> {
        let config = config.validated()?;
        let http = Client::builder()
            .connect_timeout(Duration::from_millis(config.http.connect_timeout_ms))
            .timeout(Duration::from_millis(config.http.request_timeout_ms))
            .build()?;

        Ok(Self { config, http })
    }

    fn realm_url(&self) -> String {
        format!("{}/admin/realms/{}", self.config.base_url(), self.config.realm)
    }

    /// Obtain an admin access token via the password grant.
    async fn admin_token(&self) -> AppResult<String> {
        let url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.config.base_url(),
            self.config.master_realm
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.config.master_client.as_str()),
                ("username", self.config.master_user.as_str()),
                ("password", self.config.master_user_password.expose()),
            ])
            .send()
            .await?;

        let token: TokenResponse = ensure_success(response, "admin token request")
            .await?
            .json()
            .await?;

        Ok(token.access_token)
    }

    /// Internal id of the application client.
    async fn client_uuid(&self, token: &str) -> AppResult<String> {
        let response = self
            .http
            .get(format!("{}/clients", self.realm_url()))
            .bearer_auth(token)
            .query(&[("clientId", self.config.client_id.as_str())])
            .send()
            .await?;

        let clients: Vec<ClientRepresentation> = ensure_success(response, "client lookup")
            .await?
            .json()
            .await?;

        clients
            .into_iter()
            .next()
            .map(|client| client.id)
            .ok_or_else(|| {
                AppError::external_directory(format!(
                    "client '{}' not found in realm '{}'",
                    self.config.client_id, self.config.realm
                ))
            })
    }

    async fn grant_client_role(&self, token: &str, account_id: &str, role: &str) -> AppResult<()> {
        let client_uuid = self.client_uuid(token).await?;

        let response = self
            .http
            .get(format!(
                "{}/clients/{}/roles/{}",
                self.realm_url(),
                client_uuid,
                role
            ))
            .bearer_auth(token)
            .send()
            .await?;

        let role: RoleRepresentation = ensure_success(response, "client role lookup")
            .await?
            .json()
            .await?;

        let response = self
            .http
            .post(format!(
                "{}/users/{}/role-mappings/clients/{}",
                self.realm_url(),
                account_id,
                client_uuid
            ))
            .bearer_auth(token)
            .json(&[&role])
            .send()
            .await?;

        ensure_success(response, "client role mapping").await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for KeycloakDirectory {
    async fn create_account(&self, account: &DirectoryAccount) -> AppResult<()> {
        let token = self.admin_token().await?;

        let body = NewUserRepresentation {
            username: &account.user_name,
            first_name: &account.first_name,
            last_name: &account.last_name,
            email: &account.user_name,
            enabled: true,
            email_verified: true,
            credentials: [PasswordCredential {
                kind: "password",
                value: account.password.expose(),
                temporary: false,
            }],
        };

        let response = self
            .http
            .post(format!("{}/users", self.realm_url()))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(response, "account creation").await?;

        // Keycloak answers 201 with the new account's URL
        let account_id = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|location| location.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::external_directory("account creation response has no Location header")
            })?;
        debug!(user_name = %account.user_name, %account_id, "Directory account created");

        self.grant_client_role(&token, &account_id, account.role.description())
            .await?;

        info!(user_name = %account.user_name, role = %account.role, "Directory account provisioned");
        Ok(())
    }

    async fn delete_account(&self, user_name: &str) -> AppResult<()> {
        let token = self.admin_token().await?;

        let response = self
            .http
            .get(format!("{}/users", self.realm_url()))
            .bearer_auth(&token)
            .query(&[("username", user_name), ("exact", "true")])
            .send()
            .await?;

        let matches: Vec<UserRepresentation> = ensure_success(response, "account lookup")
            .await?
            .json()
            .await?;

        let account = matches.into_iter().next().ok_or_else(|| {
            AppError::external_directory(format!("account '{}' not found", user_name))
        })?;

        let response = self
            .http
            .delete(format!("{}/users/{}", self.realm_url(), account.id))
            .bearer_auth(&token)
            .send()
            .await?;

        ensure_success(response, "account deletion").await?;

        info!(user_name = %user_name, account_id = %account.id, "Directory account deleted");
        Ok(())
    }
}

/// Turn any non-2xx answer into an `ExternalDirectory` error.
async fn ensure_success(response: Response, action: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    Err(AppError::external_directory(format!(
        "{} failed with status {}: {}",
        action, status, text
    )))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ClientRepresentation {
    id: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct RoleRepresentation {
    id: String,
    name: String,
    #[serde(rename = "clientRole", default)]
    client_role: bool,
    #[serde(rename = "containerId", default, skip_serializing_if = "Option::is_none")]
    container_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRepresentation {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUserRepresentation<'a> {
    username: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    enabled: bool,
    email_verified: bool,
    credentials: [PasswordCredential<'a>; 1],
}

#[derive(Serialize)]
struct PasswordCredential<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
    temporary: bool,
}
