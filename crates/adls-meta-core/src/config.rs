use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ViewerError};
use crate::inputs::{Field, FormInputs};

pub const CONFIG_FILE_NAME: &str = "adls-meta.toml";

/// Prefilled form values from `adls-meta.toml`
///
/// ```toml
/// [defaults]
/// vault_url = "https://my-vault.vault.azure.net"
/// secret_name = "storage-key"
///
/// [profiles.prod]
/// storage_account = "prodlake"
/// file_system = "raw"
/// ```
///
/// The client secret is never read from the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: FieldDefaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, FieldDefaults>,

    /// File this config was loaded from (not serialized)
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefaults {
    pub vault_url: Option<String>,
    pub secret_name: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub storage_account: Option<String>,
    pub file_system: Option<String>,
    pub directory_path: Option<String>,
}

impl FieldDefaults {
    fn apply(&self, inputs: &mut FormInputs) {
        inputs.set_if_some(Field::VaultUrl, self.vault_url.as_deref());
        inputs.set_if_some(Field::SecretName, self.secret_name.as_deref());
        inputs.set_if_some(Field::TenantId, self.tenant_id.as_deref());
        inputs.set_if_some(Field::ClientId, self.client_id.as_deref());
        inputs.set_if_some(Field::StorageAccount, self.storage_account.as_deref());
        inputs.set_if_some(Field::FileSystem, self.file_system.as_deref());
        inputs.set_if_some(Field::DirectoryPath, self.directory_path.as_deref());
    }
}

impl Config {
    /// Load config from an explicit path, or search for the default file
    ///
    /// With the default name the current directory and its parents are
    /// searched and a missing file yields an empty config. An explicit path
    /// must exist.
    pub fn load_smart<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if path_ref == Path::new(CONFIG_FILE_NAME) {
            let current_dir = std::env::current_dir()?;
            return match Self::find_upwards(&current_dir) {
                Some(found) => Self::load(found),
                None => {
                    tracing::debug!(
                        "No {} found in {} or any parent directory",
                        CONFIG_FILE_NAME,
                        current_dir.display()
                    );
                    Ok(Self::default())
                }
            };
        }

        let expanded = PathBuf::from(shellexpand::tilde(&path_ref.to_string_lossy()).as_ref());
        if !expanded.exists() {
            return Err(ViewerError::ConfigFileNotFound { path: expanded });
        }
        Self::load(expanded)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ViewerError::ConfigReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Config = toml_edit::de::from_str(&content)?;
        config.source_path = Some(path.to_path_buf());

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Closest `adls-meta.toml` in `start` or one of its ancestors
    pub fn find_upwards(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Fill `inputs` from `[defaults]`, then from the selected profile
    pub fn apply(&self, profile: Option<&str>, inputs: &mut FormInputs) -> Result<()> {
        self.defaults.apply(inputs);

        if let Some(profile) = profile {
            let values = self
                .profiles
                .get(profile)
                .ok_or_else(|| {
                    let names = self.profile_names();
                    ViewerError::UnknownProfile {
                        profile: profile.to_string(),
                        available: if names.is_empty() {
                            "(no profiles defined)".to_string()
                        } else {
                            names.join(", ")
                        },
                    }
                })?;
            values.apply(inputs);
        }

        Ok(())
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}
