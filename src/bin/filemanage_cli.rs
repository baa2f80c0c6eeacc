//! FileManage CLI: browse and prune an S3 bucket
//!
//! Usage:
//!   filemanage-cli login --password-stdin      Store the secret access key
//!   filemanage-cli logout                      Forget it
//!   filemanage-cli ls [--sort name|date] [--desc]
//!   filemanage-cli rm <key>                    Delete an object and relist
//!   filemanage-cli config show | set <field> <value>
//!
//! The secret lives in an encrypted vault unlocked with the passphrase from
//! `--passphrase-file` or `$FILEMANAGE_VAULT_PASSPHRASE`.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use filemanage_lib::collaborators::{Navigator, Notifier, ToastLevel, LOGIN_ROUTE, PASSWORD_CREDENTIAL};
use filemanage_lib::config::{self, FileManageConfig};
use filemanage_lib::credential_store::FileCredentialStore;
use filemanage_lib::i18n::Locale;
use filemanage_lib::session::{self, SessionError, SessionSinks};
use filemanage_lib::utils::{format_date, format_size};
use filemanage_lib::{DeleteOutcome, FileManageController, LoadOutcome, SortKey, SortOrder};

#[derive(Parser)]
#[command(
    name = "filemanage-cli",
    about = "FileManage CLI: list, sort and delete files in an S3 bucket",
    version
)]
struct Cli {
    /// Config file (default: <config dir>/filemanage/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// File whose first line is the vault passphrase
    #[arg(long, global = true)]
    passphrase_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the secret access key used for the bucket
    /// (from stdin, --password or $FILEMANAGE_PASSWORD)
    Login {
        /// Read the secret from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
        /// Secret on the command line (visible to other local users)
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove the stored secret
    Logout,
    /// List every object in the bucket
    Ls {
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
        /// Descending order
        #[arg(long)]
        desc: bool,
    },
    /// Delete an object, then list the bucket again
    Rm {
        key: String,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Set {
        /// endpoint | region | bucket | access-key-id | prefix | path-style | page-size | max-pages | locale
        field: String,
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Date,
}

/// Prints toasts to stderr
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str, level: ToastLevel) {
        tracing::debug!("toast ({:?}): {}", level, message);
        match level {
            ToastLevel::Error => eprintln!("error: {}", message),
            _ => eprintln!("{}", message),
        }
    }
}

/// Remembers the last route the controller asked for
#[derive(Default)]
struct RouteRecorder {
    last: Mutex<Option<String>>,
}

impl RouteRecorder {
    fn sent_to_login(&self) -> bool {
        let last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        last.as_deref() == Some(LOGIN_ROUTE)
    }
}

impl Navigator for RouteRecorder {
    fn navigate_to(&self, route: &str) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(route.to_string());
    }
}

const PASSPHRASE_ENV: &str = "FILEMANAGE_VAULT_PASSPHRASE";
const PASSWORD_ENV: &str = "FILEMANAGE_PASSWORD";

fn first_line(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn vault_passphrase(file: Option<&Path>, env: Option<String>) -> Result<String> {
    match (file, env) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read passphrase file {}", path.display()))?;
            first_line(content.as_bytes())
        }
        (None, Some(value)) => Ok(value),
        (None, None) => bail!(
            "Set {} or pass --passphrase-file to unlock the credential vault",
            PASSPHRASE_ENV
        ),
    }
}

/// Stdin wins over --password, which wins over the environment
fn login_secret(
    password: Option<String>,
    from_stdin: bool,
    stdin: impl BufRead,
    env: Option<String>,
) -> Result<String> {
    let secret = if from_stdin {
        first_line(stdin)?
    } else if let Some(password) = password {
        warn!("--password is visible in the process list; prefer --password-stdin or {}", PASSWORD_ENV);
        password
    } else if let Some(value) = env {
        value
    } else {
        bail!("Provide the secret access key with --password-stdin or {}", PASSWORD_ENV);
    };

    if secret.is_empty() {
        bail!("Secret access key must not be empty");
    }
    Ok(secret)
}

fn unlock_vault(passphrase_file: Option<&Path>) -> Result<Arc<FileCredentialStore>> {
    let passphrase = vault_passphrase(passphrase_file, std::env::var(PASSPHRASE_ENV).ok())?;
    let store = FileCredentialStore::open_default(&passphrase).context("Failed to unlock credential vault")?;
    Ok(Arc::new(store))
}

fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_config_field(config: &mut FileManageConfig, field: &str, value: &str) -> Result<()> {
    let optional = |v: &str| if v.is_empty() { None } else { Some(v.to_string()) };
    match field {
        "endpoint" => config.endpoint = optional(value),
        "region" => config.region = value.to_string(),
        "bucket" => config.bucket = value.to_string(),
        "access-key-id" => config.access_key_id = value.to_string(),
        "prefix" => config.prefix = optional(value),
        "path-style" => {
            config.path_style = if value.is_empty() {
                None
            } else {
                Some(value.parse::<bool>().context("path-style must be true or false")?)
            }
        }
        "page-size" => config.page_size = value.parse::<u32>().context("page-size must be a number")?,
        "max-pages" => {
            config.max_pages = if value.is_empty() {
                None
            } else {
                Some(value.parse::<u32>().context("max-pages must be a number")?)
            }
        }
        "locale" => {
            config.locale = match value {
                "en" => Locale::En,
                "zh" => Locale::Zh,
                other => bail!("Unsupported locale: {}", other),
            }
        }
        other => bail!("Unknown config field: {}", other),
    }
    Ok(())
}

fn print_listing(controller: &FileManageController) {
    let files = controller.sorted_files();
    for file in &files {
        println!(
            "{:<19}  {:>10}  {}",
            format_date(file.last_modified),
            format_size(file.size),
            file.display_name()
        );
    }
    println!("{} object(s)", files.len());
}

fn open_controller(
    config: &FileManageConfig,
    credentials: Arc<FileCredentialStore>,
    routes: Arc<RouteRecorder>,
) -> Result<Option<FileManageController>> {
    let sinks = SessionSinks {
        notifier: Arc::new(TerminalNotifier),
        navigator: routes,
    };
    match session::open_s3_session(config, credentials, sinks) {
        Ok(controller) => Ok(Some(controller)),
        Err(SessionError::NotLoggedIn) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn login_hint() -> ExitCode {
    eprintln!("Run `filemanage-cli login --password-stdin` to sign in.");
    ExitCode::from(2)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let mut config = config::load_config(&config_path);
    let passphrase_file = cli.passphrase_file.as_deref();
    let routes = Arc::new(RouteRecorder::default());

    match cli.command {
        Commands::Login { password_stdin, password } => {
            let secret = login_secret(
                password,
                password_stdin,
                std::io::stdin().lock(),
                std::env::var(PASSWORD_ENV).ok(),
            )?;
            let credentials = unlock_vault(passphrase_file)?;
            credentials.store(PASSWORD_CREDENTIAL, &secret)?;
            println!("Credentials saved to {}", credentials.path().display());
        }
        Commands::Logout => {
            unlock_vault(passphrase_file)?.remove(PASSWORD_CREDENTIAL)?;
            println!("Logged out");
        }
        Commands::Ls { sort, desc } => {
            let credentials = unlock_vault(passphrase_file)?;
            let Some(controller) = open_controller(&config, credentials, routes.clone())? else {
                return Ok(login_hint());
            };

            let key = match sort {
                SortArg::Name => SortKey::Name,
                SortArg::Date => SortKey::LastModified,
            };
            let mut spec = controller.sort_spec();
            if spec.key != key {
                spec = controller.set_sort(key);
            }
            if desc != (spec.order == SortOrder::Desc) {
                controller.set_sort(key);
            }

            match controller.reset_and_load().await {
                LoadOutcome::Completed { .. } | LoadOutcome::Superseded => print_listing(&controller),
                LoadOutcome::PageLimitReached { pages, .. } => {
                    print_listing(&controller);
                    eprintln!("Listing stopped after {} page(s) (max-pages)", pages);
                }
                LoadOutcome::Failed(_) if routes.sent_to_login() => return Ok(login_hint()),
                LoadOutcome::Failed(_) => {
                    // Whatever arrived before the failure is still worth showing
                    if !controller.files().is_empty() {
                        print_listing(&controller);
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Rm { key } => {
            let credentials = unlock_vault(passphrase_file)?;
            let Some(controller) = open_controller(&config, credentials, routes.clone())? else {
                return Ok(login_hint());
            };

            match controller.delete_entry(&key).await {
                DeleteOutcome::Deleted(LoadOutcome::Failed(_)) => {
                    println!("Deleted {}", key);
                    if routes.sent_to_login() {
                        return Ok(login_hint());
                    }
                    return Ok(ExitCode::FAILURE);
                }
                DeleteOutcome::Deleted(_) => {
                    println!("Deleted {} ({} object(s) remain)", key, controller.files().len());
                }
                DeleteOutcome::Failed(_) if routes.sent_to_login() => return Ok(login_hint()),
                DeleteOutcome::Failed(_) => return Ok(ExitCode::FAILURE),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Set { field, value } => {
                apply_config_field(&mut config, &field, &value)?;
                config::save_config(&config_path, &config)?;
                println!("{} updated", field);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_config_fields() {
        let mut config = FileManageConfig::default();
        apply_config_field(&mut config, "bucket", "uploads").unwrap();
        apply_config_field(&mut config, "max-pages", "4").unwrap();
        apply_config_field(&mut config, "locale", "zh").unwrap();
        apply_config_field(&mut config, "path-style", "true").unwrap();
        assert_eq!(config.bucket, "uploads");
        assert_eq!(config.max_pages, Some(4));
        assert_eq!(config.locale, Locale::Zh);
        assert_eq!(config.path_style, Some(true));

        apply_config_field(&mut config, "max-pages", "").unwrap();
        assert_eq!(config.max_pages, None);
    }

    #[test]
    fn test_apply_config_rejects_bad_input() {
        let mut config = FileManageConfig::default();
        assert!(apply_config_field(&mut config, "colour", "blue").is_err());
        assert!(apply_config_field(&mut config, "page-size", "lots").is_err());
        assert!(apply_config_field(&mut config, "locale", "fr").is_err());
    }

    #[test]
    fn test_route_recorder() {
        let routes = RouteRecorder::default();
        assert!(!routes.sent_to_login());
        routes.navigate_to("/login");
        assert!(routes.sent_to_login());
    }

    #[test]
    fn test_login_secret_sources() {
        let empty: &[u8] = b"";

        let from_stdin = login_secret(Some("flag".into()), true, &b"piped\n"[..], Some("env".into()));
        assert_eq!(from_stdin.unwrap(), "piped");

        let from_flag = login_secret(Some("flag".into()), false, empty, Some("env".into()));
        assert_eq!(from_flag.unwrap(), "flag");

        let from_env = login_secret(None, false, empty, Some("env".into()));
        assert_eq!(from_env.unwrap(), "env");

        assert!(login_secret(None, false, empty, None).is_err());
        assert!(login_secret(None, true, &b"\r\n"[..], None).is_err());
    }

    #[test]
    fn test_vault_passphrase_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passphrase");
        std::fs::write(&path, "from file\nignored\n").unwrap();

        assert_eq!(
            vault_passphrase(Some(path.as_path()), Some("from env".into())).unwrap(),
            "from file"
        );
        assert_eq!(vault_passphrase(None, Some("from env".into())).unwrap(), "from env");
        assert!(vault_passphrase(None, None).is_err());
        assert!(vault_passphrase(Some(dir.path().join("absent").as_path()), None).is_err());
    }

    #[test]
    fn test_login_takes_secret_off_the_command_line() {
        let cli = Cli::try_parse_from(["filemanage-cli", "login", "--password-stdin"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { password_stdin: true, password: None }
        ));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["filemanage-cli", "ls", "--sort", "date", "--desc"]).unwrap();
        assert!(matches!(cli.command, Commands::Ls { sort: SortArg::Date, desc: true }));
    }
}
