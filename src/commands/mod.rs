use std::path::PathBuf;

use adls_meta_core::config::{CONFIG_FILE_NAME, Config};
use adls_meta_core::{Field, FormInputs, Result};
use clap::{Args, Parser, Subcommand};

pub mod list;
pub mod tui;

#[derive(Parser)]
#[command(name = "adls-meta")]
#[command(
    about = "List files and their metadata in Azure Data Lake Storage Gen2",
    long_about = None
)]
#[command(version)]
#[command(help_expected = true)]
pub struct Cli {
    /// Path to the configuration file (default: adls-meta.toml, searches parent directories)
    #[arg(short, long, default_value = CONFIG_FILE_NAME, global = true)]
    pub config: PathBuf,

    /// Profile from the configuration file to prefill the form with
    #[arg(short = 'P', long, env = "ADLS_META_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub form: FormArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Form values given on the command line or through the environment
#[derive(Debug, Clone, Default, Args)]
pub struct FormArgs {
    /// Key Vault URL, e.g. https://my-vault.vault.azure.net
    #[arg(long, env = "ADLS_META_VAULT_URL", global = true)]
    pub vault_url: Option<String>,

    /// Name of the Key Vault secret holding the storage account key
    #[arg(long, env = "ADLS_META_SECRET_NAME", global = true)]
    pub secret_name: Option<String>,

    /// Azure AD tenant ID of the service principal
    #[arg(long, env = "AZURE_TENANT_ID", global = true)]
    pub tenant_id: Option<String>,

    /// Client (application) ID of the service principal
    #[arg(long, env = "AZURE_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Client secret of the service principal (prefer the env var)
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// Storage account name
    #[arg(long, env = "ADLS_META_STORAGE_ACCOUNT", global = true)]
    pub storage_account: Option<String>,

    /// File system (container) name
    #[arg(long, env = "ADLS_META_FILE_SYSTEM", global = true)]
    pub file_system: Option<String>,

    /// Directory path inside the file system
    #[arg(long, env = "ADLS_META_DIRECTORY", global = true)]
    pub directory: Option<String>,
}

impl FormArgs {
    fn apply(&self, inputs: &mut FormInputs) {
        inputs.set_if_some(Field::VaultUrl, self.vault_url.as_deref());
        inputs.set_if_some(Field::SecretName, self.secret_name.as_deref());
        inputs.set_if_some(Field::TenantId, self.tenant_id.as_deref());
        inputs.set_if_some(Field::ClientId, self.client_id.as_deref());
        inputs.set_if_some(Field::ClientSecret, self.client_secret.as_deref());
        inputs.set_if_some(Field::StorageAccount, self.storage_account.as_deref());
        inputs.set_if_some(Field::FileSystem, self.file_system.as_deref());
        inputs.set_if_some(Field::DirectoryPath, self.directory.as_deref());
    }
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Interactive form and results table (default)
    Tui(tui::TuiCommand),

    /// List files once and print the table to stdout
    List(list::ListCommand),
}

impl Cli {
    /// Initial form values: config defaults, then profile, then flags/env
    pub fn form_inputs(&self) -> Result<FormInputs> {
        let config = Config::load_smart(&self.config)?;
        if let Some(ref path) = config.source_path {
            tracing::debug!("Prefilling form from {}", path.display());
        }
        let mut inputs = FormInputs::default();
        config.apply(self.profile.as_deref(), &mut inputs)?;
        self.form.apply(&mut inputs);
        Ok(inputs)
    }

    /// The subcommand to run, the TUI when none was given
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Tui(tui::TuiCommand))
    }

    pub fn is_tui(&self) -> bool {
        matches!(self.resolved_command(), Commands::Tui(_))
    }
}

impl Commands {
    pub async fn run(&self, cli: &Cli) -> Result<()> {
        match self {
            Commands::List(cmd) => cmd.run(cli.form_inputs()?).await,
            Commands::Tui(cmd) => cmd.run(cli, cli.form_inputs()?).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_tui() {
        let cli = Cli::try_parse_from(["adls-meta"]).unwrap();
        assert!(cli.is_tui());

        let cli = Cli::try_parse_from(["adls-meta", "list"]).unwrap();
        assert!(!cli.is_tui());
    }

    #[test]
    fn test_flags_override_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(
            &path,
            "[defaults]\nstorage_account = \"fromfile\"\nfile_system = \"fs1\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "adls-meta",
            "--config",
            path.to_str().unwrap(),
            "list",
            "--storage-account",
            "fromflag",
        ])
        .unwrap();

        let inputs = cli.form_inputs().unwrap();
        assert_eq!(inputs.storage_account, "fromflag");
        assert_eq!(inputs.file_system, "fs1");
    }
}
