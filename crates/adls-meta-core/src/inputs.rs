//! Form inputs and their validation
//!
//! The eight values a run needs, kept as plain strings while the user edits
//! them and turned into a [`ListRequest`] once every one of them is present.

use std::fmt;

use strum::{EnumIter, IntoEnumIterator};

use crate::error::{Result, ViewerError};
use crate::secrets::SecretRequest;

/// One input field of the form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Field {
    VaultUrl,
    SecretName,
    TenantId,
    ClientId,
    ClientSecret,
    StorageAccount,
    FileSystem,
    DirectoryPath,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::VaultUrl => "Key Vault URL",
            Field::SecretName => "Secret Name for Storage Account Key",
            Field::TenantId => "Tenant ID",
            Field::ClientId => "Client ID",
            Field::ClientSecret => "Client Secret",
            Field::StorageAccount => "Storage Account Name",
            Field::FileSystem => "File System Name",
            Field::DirectoryPath => "Directory Path",
        }
    }

    /// Whether the value is hidden while typing
    pub fn is_masked(self) -> bool {
        self == Field::ClientSecret
    }

    pub fn index(self) -> usize {
        Field::iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(self) -> Field {
        let count = Field::iter().count();
        Field::iter()
            .nth((self.index() + 1) % count)
            .unwrap_or(Field::VaultUrl)
    }

    pub fn prev(self) -> Field {
        let count = Field::iter().count();
        Field::iter()
            .nth((self.index() + count - 1) % count)
            .unwrap_or(Field::VaultUrl)
    }
}

/// Raw form values as typed by the user
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub vault_url: String,
    pub secret_name: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub storage_account: String,
    pub file_system: String,
    pub directory_path: String,
}

impl fmt::Debug for FormInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormInputs")
            .field("vault_url", &self.vault_url)
            .field("secret_name", &self.secret_name)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"******")
            .field("storage_account", &self.storage_account)
            .field("file_system", &self.file_system)
            .field("directory_path", &self.directory_path)
            .finish()
    }
}

/// A fully populated request, ready for the pipeline
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub secret: SecretRequest,
    pub storage_account: String,
    pub file_system: String,
    pub directory_path: String,
}

impl FormInputs {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::VaultUrl => &self.vault_url,
            Field::SecretName => &self.secret_name,
            Field::TenantId => &self.tenant_id,
            Field::ClientId => &self.client_id,
            Field::ClientSecret => &self.client_secret,
            Field::StorageAccount => &self.storage_account,
            Field::FileSystem => &self.file_system,
            Field::DirectoryPath => &self.directory_path,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::VaultUrl => &mut self.vault_url,
            Field::SecretName => &mut self.secret_name,
            Field::TenantId => &mut self.tenant_id,
            Field::ClientId => &mut self.client_id,
            Field::ClientSecret => &mut self.client_secret,
            Field::StorageAccount => &mut self.storage_account,
            Field::FileSystem => &mut self.file_system,
            Field::DirectoryPath => &mut self.directory_path,
        }
    }

    /// Overwrite `field` when `value` is present
    pub fn set_if_some(&mut self, field: Field, value: Option<&str>) {
        if let Some(value) = value {
            *self.get_mut(field) = value.to_string();
        }
    }

    /// Fields that are empty or whitespace only
    pub fn missing(&self) -> Vec<Field> {
        Field::iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    /// Check that every field is filled in and build the request
    ///
    /// All missing fields are reported in a single error.
    pub fn validate(&self) -> Result<ListRequest> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(ViewerError::MissingInputs {
                missing: missing.iter().map(|f| f.label().to_string()).collect(),
            });
        }

        let value = |field: Field| self.get(field).trim().to_string();

        Ok(ListRequest {
            secret: SecretRequest {
                vault_url: value(Field::VaultUrl),
                secret_name: value(Field::SecretName),
                tenant_id: value(Field::TenantId),
                client_id: value(Field::ClientId),
                client_secret: value(Field::ClientSecret),
            },
            storage_account: value(Field::StorageAccount),
            file_system: value(Field::FileSystem),
            directory_path: value(Field::DirectoryPath),
        })
    }
}
