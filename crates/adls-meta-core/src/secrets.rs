use std::fmt;

use async_trait::async_trait;
use azure_core::credentials::Secret;
use azure_identity::ClientSecretCredential;
use azure_security_keyvault_secrets::SecretClient;

use crate::error::{Result, ViewerError};

const PROVIDER: &str = "Azure Key Vault";

/// Everything needed to read one secret from a vault with a service principal
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRequest {
    pub vault_url: String,
    pub secret_name: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for SecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRequest")
            .field("vault_url", &self.vault_url)
            .field("secret_name", &self.secret_name)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"******")
            .finish()
    }
}

/// Source of the storage account key
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetch the value of `request.secret_name` from `request.vault_url`
    async fn fetch_secret(&self, request: &SecretRequest) -> Result<String>;
}

/// Reads secrets from Azure Key Vault using a client secret credential
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyVaultSecretSource;

impl KeyVaultSecretSource {
    /// Create an Azure Key Vault secret client for the request's vault
    fn create_client(request: &SecretRequest) -> Result<SecretClient> {
        let credential = ClientSecretCredential::new(
            &request.tenant_id,
            request.client_id.clone(),
            Secret::new(request.client_secret.clone()),
            None,
        )
        .map_err(|e| ViewerError::VaultAuthFailed {
            provider: PROVIDER.to_string(),
            details: e.to_string(),
            hint: "Check the tenant ID, client ID and client secret".to_string(),
        })?;

        SecretClient::new(&request.vault_url, credential, None).map_err(|e| {
            ViewerError::VaultApiError {
                provider: PROVIDER.to_string(),
                details: e.to_string(),
                hint: "Check your Azure Key Vault URL".to_string(),
            }
        })
    }
}

#[async_trait]
impl SecretSource for KeyVaultSecretSource {
    async fn fetch_secret(&self, request: &SecretRequest) -> Result<String> {
        tracing::debug!(
            "Getting secret '{}' from Azure Key Vault '{}'",
            request.secret_name,
            request.vault_url
        );

        let client = Self::create_client(request)?;

        let response = client
            .get_secret(&request.secret_name, None)
            .await
            .map_err(|e| classify_vault_error(&request.secret_name, e.to_string()))?;

        let secret = response
            .into_model()
            .map_err(|e| ViewerError::VaultInvalidResponse {
                provider: PROVIDER.to_string(),
                details: format!("Failed to parse secret response: {}", e),
                hint: "This is an unexpected error".to_string(),
            })?;

        secret.value.ok_or_else(|| ViewerError::VaultInvalidResponse {
            provider: PROVIDER.to_string(),
            details: format!("Secret '{}' has no value", request.secret_name),
            hint: "The secret exists but has no value set".to_string(),
        })
    }
}

/// Map a Key Vault error message onto the matching error variant
fn classify_vault_error(secret_name: &str, err_str: String) -> ViewerError {
    if err_str.contains("SecretNotFound")
        || err_str.contains("ResourceNotFound")
        || err_str.contains("Secret not found")
        || err_str.contains("was not found in this key vault")
    {
        ViewerError::VaultSecretNotFound {
            provider: PROVIDER.to_string(),
            secret: secret_name.to_string(),
            hint: "Check that the secret exists in the vault".to_string(),
        }
    } else if err_str.contains("Forbidden")
        || err_str.contains("Unauthorized")
        || err_str.contains("AADSTS")
    {
        ViewerError::VaultAuthFailed {
            provider: PROVIDER.to_string(),
            details: err_str,
            hint: "Check the service principal credentials and the vault access policies"
                .to_string(),
        }
    } else {
        ViewerError::VaultApiError {
            provider: PROVIDER.to_string(),
            details: err_str,
            hint: "Check your Azure Key Vault URL and network connectivity".to_string(),
        }
    }
}
