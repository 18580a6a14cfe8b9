//! HMAC request signing, webhook signature checks and at-rest token encryption.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit};
use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::OnceCell;
use rand::RngCore;
use ring::hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const NONCE_LEN: usize = 12;

static ENCRYPTOR: OnceCell<Option<TokenEncryptor>> = OnceCell::new();

/// Lowercase hex of HMAC-SHA256(key, message)
pub fn sign_hex(key: &[u8], message: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let tag = hmac::sign(&key, message);
    hex::encode(tag.as_ref())
}

/// Constant-time comparison of a received hex signature against the expected one.
pub fn verify_hex(key: &[u8], message: &[u8], signature: &str) -> bool {
    let received = signature.trim().to_ascii_lowercase();
    if received.is_empty() {
        return false;
    }
    let expected = sign_hex(key, message);
    received.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Lowercase hex of SHA-256(data)
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// OAuth state parameter: `{platform}_{32 hex chars}`
pub fn generate_state(platform: &str) -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}_{}", platform, hex::encode(bytes))
}

/// AES-256-GCM шифрование токенов доступа в БД
///
/// Формат: base64(nonce || ciphertext)
#[derive(Clone)]
pub struct TokenEncryptor {
    key: [u8; 32],
}

impl std::fmt::Debug for TokenEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenEncryptor(****)")
    }
}

impl TokenEncryptor {
    /// Builds the encryptor from a 64 hex char key.
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let bytes = hex::decode(key_hex.trim()).map_err(|e| anyhow!("Invalid encryption key: {}", e))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow!("Encryption key must be 32 bytes (64 hex chars)"))?;
        Ok(Self { key })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(result))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| anyhow!("Encrypted token is not valid base64: {}", e))?;
        if data.len() < NONCE_LEN {
            return Err(anyhow!("Encrypted data too short"));
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let nonce = GenericArray::from_slice(&data[..NONCE_LEN]);
        let plaintext = cipher
            .decrypt(nonce, &data[NONCE_LEN..])
            .map_err(|e| anyhow!("Decryption failed: {}", e))?;

        String::from_utf8(plaintext).map_err(|e| anyhow!("Decrypted token is not UTF-8: {}", e))
    }
}

/// Initializes the process-wide encryptor. An empty key disables encryption.
pub fn init_encryptor(key_hex: &str) -> Result<()> {
    let encryptor = if key_hex.trim().is_empty() {
        tracing::warn!("security.encryption_key is empty, marketplace tokens are stored in plain text");
        None
    } else {
        Some(TokenEncryptor::from_hex(key_hex)?)
    };
    if ENCRYPTOR.set(encryptor).is_err() {
        tracing::warn!("Token encryptor already initialized");
    }
    Ok(())
}

pub fn encryptor() -> Option<&'static TokenEncryptor> {
    ENCRYPTOR.get().and_then(|e| e.as_ref())
}

/// Encrypts a token when an encryptor is configured, otherwise returns it as is.
pub fn seal_token(token: &str) -> Result<String> {
    match encryptor() {
        Some(enc) if !token.is_empty() => enc.encrypt(token),
        _ => Ok(token.to_string()),
    }
}

pub fn open_token(stored: &str) -> Result<String> {
    match encryptor() {
        Some(enc) if !stored.is_empty() => enc.decrypt(stored),
        _ => Ok(stored.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn test_sign_hex_matches_rfc4231_case_2() {
        let sig = sign_hex(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_hex() {
        let body = br#"{"code":3,"shop_id":1}"#;
        let sig = sign_hex(b"partner-key", body);
        assert!(verify_hex(b"partner-key", body, &sig));
        assert!(verify_hex(b"partner-key", body, &format!(" {} ", sig.to_uppercase())));
        assert!(!verify_hex(b"other-key", body, &sig));
        assert!(!verify_hex(b"partner-key", body, ""));
        assert!(!verify_hex(b"partner-key", body, &sig[..10]));
    }

    #[test]
    fn test_generate_state_format() {
        let state = generate_state("shopee");
        let (prefix, random) = state.split_once('_').unwrap();
        assert_eq!(prefix, "shopee");
        assert_eq!(random.len(), 32);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, generate_state("shopee"));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let enc = TokenEncryptor::from_hex(KEY_HEX).unwrap();
        let sealed = enc.encrypt("access-token-123").unwrap();
        assert_ne!(sealed, "access-token-123");
        assert_eq!(enc.decrypt(&sealed).unwrap(), "access-token-123");
        // random nonce per call
        assert_ne!(sealed, enc.encrypt("access-token-123").unwrap());
    }

    #[test]
    fn test_decrypt_rejects_tampering_and_wrong_key() {
        let enc = TokenEncryptor::from_hex(KEY_HEX).unwrap();
        let sealed = enc.encrypt("token").unwrap();
        let other = TokenEncryptor::from_hex(&"ff".repeat(32)).unwrap();
        assert!(other.decrypt(&sealed).is_err());
        assert!(enc.decrypt("AAAA").is_err());
        assert!(enc.decrypt("not base64 !").is_err());
    }

    #[test]
    fn test_key_validation() {
        assert!(TokenEncryptor::from_hex("abcd").is_err());
        assert!(TokenEncryptor::from_hex("zz").is_err());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
