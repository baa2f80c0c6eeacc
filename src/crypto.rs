// FileManage Vault Cryptography
// Argon2id passphrase derivation + AES-256-GCM sealing for credential entries

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

// 64 MiB in release; unit tests derive many keys, so they run with 1 MiB
#[cfg(not(test))]
const ARGON2_MEM_COST_KIB: u32 = 65536;
#[cfg(test)]
const ARGON2_MEM_COST_KIB: u32 = 1024;
const ARGON2_TIME_COST: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("Encryption failed")]
    Seal,
    #[error("Decryption failed (wrong key or corrupted data)")]
    Open,
    #[error("Nonce must be 12 bytes, got {0}")]
    NonceLength(usize),
}

/// Derive the vault key from a passphrase and the vault's salt
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], CryptoError> {
    let params = Params::new(
        ARGON2_MEM_COST_KIB,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(KEY_LEN),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let mut key = [0u8; KEY_LEN];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

/// Encrypt `plaintext`; the output is ciphertext followed by the 16-byte tag
pub fn seal(key: &[u8; KEY_LEN], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_nonce(nonce)?;
    Aes256Gcm::new(GenericArray::from_slice(key))
        .encrypt(GenericArray::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Seal)
}

/// Decrypt and authenticate output of `seal`
pub fn open(key: &[u8; KEY_LEN], nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_nonce(nonce)?;
    Aes256Gcm::new(GenericArray::from_slice(key))
        .decrypt(GenericArray::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Open)
}

/// Bytes from the OS CSPRNG
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

// GenericArray::from_slice panics on a length mismatch; vault files are untrusted input
fn check_nonce(nonce: &[u8]) -> Result<(), CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::NonceLength(nonce.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let key = derive_key("correct horse", &[7u8; SALT_LEN]).unwrap();
        let nonce = random_bytes(NONCE_LEN);
        let sealed = seal(&key, &nonce, b"AKIA secret").unwrap();

        assert_eq!(sealed.len(), b"AKIA secret".len() + 16);
        assert_eq!(open(&key, &nonce, &sealed).unwrap(), b"AKIA secret");
    }

    #[test]
    fn test_derive_key_depends_on_passphrase_and_salt() {
        let salt = [1u8; SALT_LEN];
        let a = derive_key("passphrase", &salt).unwrap();
        assert_eq!(a, derive_key("passphrase", &salt).unwrap());
        assert_ne!(a, derive_key("Passphrase", &salt).unwrap());
        assert_ne!(a, derive_key("passphrase", &[2u8; SALT_LEN]).unwrap());
    }

    #[test]
    fn test_wrong_key_or_tampering_fails() {
        let key = derive_key("one", &[0u8; SALT_LEN]).unwrap();
        let other = derive_key("two", &[0u8; SALT_LEN]).unwrap();
        let nonce = random_bytes(NONCE_LEN);
        let mut sealed = seal(&key, &nonce, b"data").unwrap();

        assert!(matches!(open(&other, &nonce, &sealed), Err(CryptoError::Open)));
        sealed[0] ^= 0xff;
        assert!(matches!(open(&key, &nonce, &sealed), Err(CryptoError::Open)));
    }

    #[test]
    fn test_bad_nonce_length_is_an_error() {
        let key = [0u8; KEY_LEN];
        assert!(matches!(seal(&key, &[0u8; 5], b"x"), Err(CryptoError::NonceLength(5))));
        assert!(matches!(open(&key, &[], b"x"), Err(CryptoError::NonceLength(0))));
    }

    #[test]
    fn test_random_bytes() {
        let a = random_bytes(NONCE_LEN);
        assert_eq!(a.len(), NONCE_LEN);
        assert_ne!(a, random_bytes(NONCE_LEN));
    }
}
