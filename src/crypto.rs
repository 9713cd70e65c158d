//! At-rest encryption for sensitive employee identifiers (NPWP, bank account).

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_SALT: &[u8] = b"hrms-pii-v1";
const HKDF_INFO: &[u8] = b"employee-identifiers";
const NONCE_LEN: usize = 12;

fn derive_key(key: &str) -> Result<[u8; 32], String> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| format!("Key derivation failed: {e}"))?;
    Ok(okm)
}

/// Encrypt with AES-256-GCM. Output is the 12-byte nonce followed by the ciphertext.
pub fn encrypt(plaintext: &str, key: &str) -> Result<Vec<u8>, String> {
    let key_bytes = derive_key(key)?;
    let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| format!("Invalid key: {e}"))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| format!("Encryption failed: {e}"))?;

    let mut result = nonce.to_vec();
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

pub fn decrypt(data: &[u8], key: &str) -> Result<String, String> {
    if data.len() < NONCE_LEN {
        return Err("Ciphertext too short".to_string());
    }

    let key_bytes = derive_key(key)?;
    let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| format!("Invalid key: {e}"))?;

    let (nonce, body) = data.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|e| format!("Decryption failed: {e}"))?;

    String::from_utf8(plaintext).map_err(|e| format!("Invalid UTF-8: {e}"))
}

/// Encrypt an optional field; blank strings are stored as NULL.
pub fn encrypt_opt(value: Option<&str>, key: &str) -> Result<Option<Vec<u8>>, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => encrypt(v, key).map(Some),
        None => Ok(None),
    }
}

/// Decrypt an optional column. Undecryptable values are logged and hidden
/// rather than failing the whole read.
pub fn decrypt_opt(data: Option<&[u8]>, key: &str) -> Option<String> {
    let data = data?;
    match decrypt(data, key) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Failed to decrypt stored identifier: {e}");
            None
        }
    }
}

/// Show only the last four characters, e.g. `******7890`.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test-encryption-key-32-chars-ok!";

    #[test]
    fn decrypts_what_it_encrypts() {
        let sealed = encrypt("09.254.294.3-407.000", KEY).unwrap();
        assert_ne!(&sealed[NONCE_LEN..], b"09.254.294.3-407.000");
        assert_eq!(decrypt(&sealed, KEY).unwrap(), "09.254.294.3-407.000");
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = encrypt("1234567890", KEY).unwrap();
        assert!(decrypt(&sealed, "another-key").is_err());
        assert_eq!(decrypt_opt(Some(&sealed), "another-key"), None);
    }

    #[test]
    fn blank_optional_values_are_not_stored() {
        assert_eq!(encrypt_opt(Some("   "), KEY).unwrap(), None);
        assert_eq!(encrypt_opt(None, KEY).unwrap(), None);
        assert!(encrypt_opt(Some("123"), KEY).unwrap().is_some());
    }

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask("1234567890"), "******7890");
        assert_eq!(mask("12"), "12");
    }
}
