use crate::errors::JesusgramError;
use rand::{rngs::OsRng, RngCore};
use scrypt::Params;
use subtle::ConstantTimeEq;

pub const SALT_BYTES: usize = 16;
pub const KEY_BYTES: usize = 64;
pub const SEPARATOR: char = ':';

/// scrypt cost used for stored credentials (N = 2^14, r = 8, p = 1)
pub const DEFAULT_LOG_N: u8 = 14;
pub const DEFAULT_R: u32 = 8;
pub const DEFAULT_P: u32 = 1;

/**
 * Salted scrypt hashing of user passwords
 * @dev encoded form is `saltHex:derivedKeyHex` where the hex salt string itself is fed to scrypt
 */
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        // the defaults are known-valid scrypt parameters
        CredentialHasher::new(DEFAULT_LOG_N, DEFAULT_R, DEFAULT_P)
            .unwrap_or_else(|_| unreachable!("default scrypt parameters are valid"))
    }
}

impl CredentialHasher {
    /**
     * Build a hasher with a custom scrypt cost
     *
     * @param log_n - log2 of the CPU/memory cost
     * @param r - block size
     * @param p - parallelization
     * @returns - the hasher, or FAIL if the parameters are rejected by scrypt
     */
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self, JesusgramError> {
        match Params::new(log_n, r, p, KEY_BYTES) {
            Ok(params) => Ok(CredentialHasher { params }),
            Err(e) => Err(JesusgramError::fail(format!(
                "Invalid scrypt parameters: {}",
                e
            ))),
        }
    }

    /**
     * Hash a password with a fresh random salt
     *
     * @param password - the plaintext password
     * @returns - `saltHex:derivedKeyHex`
     */
    pub fn hash(&self, password: &str) -> Result<String, JesusgramError> {
        let mut salt = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut salt);
        let salt = hex::encode(salt);
        let key = self.derive(password, &salt, KEY_BYTES)?;
        Ok(format!("{}{}{}", salt, SEPARATOR, hex::encode(key)))
    }

    /**
     * Check a password against an encoded hash
     * @notice - never errors; a malformed encoding simply does not verify
     *
     * @param password - the plaintext password to check
     * @param encoded - the stored `saltHex:derivedKeyHex`
     * @returns - true if the password derives the stored key
     */
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let (salt, key_hex) = match encoded.split_once(SEPARATOR) {
            Some(parts) => parts,
            None => return false,
        };
        let stored = match hex::decode(key_hex) {
            Ok(key) if !key.is_empty() => key,
            _ => return false,
        };
        match self.derive(password, salt, stored.len()) {
            Ok(derived) => derived.as_slice().ct_eq(stored.as_slice()).into(),
            Err(_) => false,
        }
    }

    fn derive(&self, password: &str, salt: &str, len: usize) -> Result<Vec<u8>, JesusgramError> {
        let mut output = vec![0u8; len];
        match scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &self.params, &mut output) {
            Ok(_) => Ok(output),
            Err(e) => Err(JesusgramError::fail(format!("scrypt failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // cheap cost so the suite stays fast; the encoding is cost independent
    fn hasher() -> CredentialHasher {
        CredentialHasher::new(4, 8, 1).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let encoded = hasher.hash("Passw0rd").unwrap();
        assert!(hasher.verify("Passw0rd", &encoded));
        assert!(!hasher.verify("Passw0rd!", &encoded));
        assert!(!hasher.verify("", &encoded));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let first = hasher.hash("Passw0rd").unwrap();
        let second = hasher.hash("Passw0rd").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("Passw0rd", &first));
        assert!(hasher.verify("Passw0rd", &second));
    }

    #[test]
    fn test_hash_encoding_shape() {
        let encoded = hasher().hash("Passw0rd").unwrap();
        let (salt, key) = encoded.split_once(SEPARATOR).unwrap();
        assert_eq!(salt.len(), SALT_BYTES * 2);
        assert_eq!(key.len(), KEY_BYTES * 2);
        assert!(hex::decode(salt).is_ok());
        assert!(hex::decode(key).is_ok());
    }

    #[test]
    fn test_verify_malformed_encoding() {
        let hasher = hasher();
        assert!(!hasher.verify("Passw0rd", ""));
        assert!(!hasher.verify("Passw0rd", "no-separator"));
        assert!(!hasher.verify("Passw0rd", "abcd:not-hex"));
        assert!(!hasher.verify("Passw0rd", "abcd:"));
        // legacy unsalted sha256 digests are not accepted
        assert!(!hasher.verify(
            "Passw0rd",
            "ab38eadaeb746599f2c1ee90f8267f31f467347462764a24d71ac1843ee77fe3"
        ));
    }

    #[test]
    fn test_verify_uses_hasher_cost() {
        let cheap = hasher();
        let other = CredentialHasher::new(5, 8, 1).unwrap();
        let encoded = cheap.hash("Passw0rd").unwrap();
        assert!(!other.verify("Passw0rd", &encoded));
    }

    #[test]
    fn test_invalid_params() {
        // a bad cost is a server misconfiguration, not a caller mistake
        let err = CredentialHasher::new(0, 0, 0).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::Fail);
    }
}
