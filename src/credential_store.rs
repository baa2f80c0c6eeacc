// FileManage Credential Store
// Encrypted vault of named secrets (Argon2id-derived key, AES-256-GCM per entry)

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::CredentialStore;
use crate::crypto::{self, CryptoError, KEY_LEN, NONCE_LEN, SALT_LEN};

const VAULT_FILENAME: &str = "vault.json";
const VAULT_VERSION: u32 = 1;
const VERIFY_TOKEN: &[u8] = b"filemanage_vault_ok";

// ============ Error Types ============

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential not found: {0}")]
    NotFound(String),
    #[error("No config directory available")]
    NoConfigDir,
    #[error("Vault passphrase must not be empty")]
    EmptyPassphrase,
    #[error("Invalid vault passphrase")]
    InvalidPassphrase,
    #[error("Unsupported vault version {0}")]
    UnsupportedVersion(u32),
    #[error("Encryption error: {0}")]
    Encryption(#[from] CryptoError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ============ Vault File Format ============

#[derive(Serialize, Deserialize)]
struct VaultFile {
    version: u32,
    salt: Vec<u8>,
    /// Sealed VERIFY_TOKEN, checked on unlock
    verify_nonce: Vec<u8>,
    verify_data: Vec<u8>,
    entries: HashMap<String, VaultEntry>,
}

#[derive(Serialize, Deserialize, Clone)]
struct VaultEntry {
    nonce: Vec<u8>,
    data: Vec<u8>,
}

// ============ Credential Store ============

/// Unlocked vault. Entry names are stored in the clear; secrets never are.
pub struct FileCredentialStore {
    path: PathBuf,
    master_key: SecretBox<[u8; KEY_LEN]>,
}

impl FileCredentialStore {
    /// Unlock the vault at `path`, creating an empty one on first use
    pub fn open(path: impl Into<PathBuf>, passphrase: &str) -> Result<Self, CredentialError> {
        let path = path.into();
        if passphrase.is_empty() {
            return Err(CredentialError::EmptyPassphrase);
        }

        if path.exists() {
            let vault = read_vault(&path)?;
            if vault.version != VAULT_VERSION {
                return Err(CredentialError::UnsupportedVersion(vault.version));
            }
            let master_key = crypto::derive_key(passphrase, &vault.salt)?;
            crypto::open(&master_key, &vault.verify_nonce, &vault.verify_data)
                .map_err(|_| CredentialError::InvalidPassphrase)?;
            info!("Credential vault unlocked: {:?}", path);
            return Ok(Self::unlocked(path, master_key));
        }

        let salt = crypto::random_bytes(SALT_LEN);
        let master_key = crypto::derive_key(passphrase, &salt)?;
        let verify_nonce = crypto::random_bytes(NONCE_LEN);
        let verify_data = crypto::seal(&master_key, &verify_nonce, VERIFY_TOKEN)?;

        write_vault(
            &path,
            &VaultFile {
                version: VAULT_VERSION,
                salt,
                verify_nonce,
                verify_data,
                entries: HashMap::new(),
            },
        )?;
        info!("Credential vault initialized: {:?}", path);
        Ok(Self::unlocked(path, master_key))
    }

    /// Unlock the vault in the application config directory
    pub fn open_default(passphrase: &str) -> Result<Self, CredentialError> {
        let dir = crate::config::app_config_dir().map_err(|_| CredentialError::NoConfigDir)?;
        Self::open(dir.join(VAULT_FILENAME), passphrase)
    }

    fn unlocked(path: PathBuf, master_key: [u8; KEY_LEN]) -> Self {
        Self {
            path,
            master_key: SecretBox::new(Box::new(master_key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a credential
    pub fn store(&self, name: &str, secret: &str) -> Result<(), CredentialError> {
        let mut vault = read_vault(&self.path)?;
        let nonce = crypto::random_bytes(NONCE_LEN);
        let data = crypto::seal(self.master_key.expose_secret(), &nonce, secret.as_bytes())?;
        vault.entries.insert(name.to_string(), VaultEntry { nonce, data });
        write_vault(&self.path, &vault)?;
        info!("Credential stored: {}", name);
        Ok(())
    }

    /// Retrieve a credential
    pub fn get(&self, name: &str) -> Result<String, CredentialError> {
        let vault = read_vault(&self.path)?;
        let entry = vault
            .entries
            .get(name)
            .ok_or_else(|| CredentialError::NotFound(name.to_string()))?;
        let plaintext = crypto::open(self.master_key.expose_secret(), &entry.nonce, &entry.data)?;
        String::from_utf8(plaintext).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    /// Delete a credential. Removing an absent name is not an error.
    pub fn remove(&self, name: &str) -> Result<(), CredentialError> {
        let mut vault = read_vault(&self.path)?;
        if vault.entries.remove(name).is_some() {
            write_vault(&self.path, &vault)?;
            info!("Credential removed: {}", name);
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn remove_credential(&self, name: &str) {
        // The logout sequence keeps going even if the vault cannot be rewritten
        if let Err(e) = self.remove(name) {
            warn!("Failed to remove credential {}: {}", name, e);
        }
    }
}

// ============ Vault I/O ============

fn read_vault(path: &Path) -> Result<VaultFile, CredentialError> {
    let data = std::fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| CredentialError::Serialization(e.to_string()))
}

fn write_vault(path: &Path, vault: &VaultFile) -> Result<(), CredentialError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_private_dir(parent)?;
        }
    }
    let data = serde_json::to_vec_pretty(vault)
        .map_err(|e| CredentialError::Serialization(e.to_string()))?;

    let mut file = private_file_options().open(path)?;
    // `mode` only applies on creation; tighten files left by older versions before writing
    ensure_secure_permissions(path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    Ok(())
}

/// Write/create/truncate, born 0600 on Unix
fn private_file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

fn create_private_dir(dir: &Path) -> Result<(), std::io::Error> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Ensure secure file/directory permissions (0o600 files, 0o700 dirs on Unix)
fn ensure_secure_permissions(path: &Path) -> Result<(), std::io::Error> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = if path.is_dir() { 0o700 } else { 0o600 };
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
