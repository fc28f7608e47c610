//! Password hashing and verification (scrypt)
//!
//! Encoded hashes are self-describing:
//!
//! ```text
//! scrypt:<saltHex>:<keyHex>                 default cost (N=2^14, r=8, p=1)
//! scrypt:<logN>-<r>-<p>:<saltHex>:<keyHex>  any other cost
//! ```

use rand::RngCore;
use scrypt::Params;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

use crate::auth::{config::PasswordConfig, errors::AuthError};

const ALGORITHM_TAG: &str = "scrypt";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 64;
/// Stored keys outside this range are treated as corrupt.
const MAX_STORED_KEY_LEN: usize = 256;
/// `Params::new` validates an output length even though the buffer decides it.
const PARAMS_LEN: usize = 32;
/// Upper cost bounds accepted from configuration or from a stored hash.
const MAX_LOG_N: u8 = 20;
const MAX_R: u32 = 32;
const MAX_P: u32 = 16;
/// scrypt needs `128 * r * 2^log_n` bytes; cap that at 1 GiB.
const MAX_MEMORY_BYTES: u64 = 1 << 30;

/// One-way salted password hasher
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    config: PasswordConfig,
}

impl PasswordHasher {
    /// 创建新的Password服务
    pub fn new(config: PasswordConfig) -> Result<Self, AuthError> {
        params(&config).ok_or_else(|| {
            AuthError::Internal(format!("invalid scrypt parameters: {:?}", config))
        })?;
        Ok(Self { config })
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut salt);

        let key = derive(password.as_bytes(), &salt, &self.config, KEY_LEN)
            .ok_or_else(|| AuthError::Internal("scrypt derivation failed".to_string()))?;

        let encoded = if self.config == PasswordConfig::default() {
            format!("{}:{}:{}", ALGORITHM_TAG, hex::encode(salt), hex::encode(&*key))
        } else {
            format!(
                "{}:{}-{}-{}:{}:{}",
                ALGORITHM_TAG,
                self.config.log_n,
                self.config.r,
                self.config.p,
                hex::encode(salt),
                hex::encode(&*key)
            )
        };
        Ok(encoded)
    }

    /// Check a password against an encoded hash. Malformed or foreign hashes verify as `false`.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let Some(stored) = StoredHash::parse(encoded) else {
            debug!("unrecognized password hash encoding");
            return false;
        };

        match derive(password.as_bytes(), &stored.salt, &stored.config, stored.key.len()) {
            Some(candidate) => candidate.ct_eq(&stored.key).into(),
            None => false,
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn spawn_hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = *self;
        let password = Zeroizing::new(password);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn spawn_verify(&self, password: String, encoded: String) -> Result<bool, AuthError> {
        let hasher = *self;
        let password = Zeroizing::new(password);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &encoded))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task failed: {}", e)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { config: PasswordConfig::default() }
    }
}

struct StoredHash {
    config: PasswordConfig,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl StoredHash {
    fn parse(encoded: &str) -> Option<Self> {
        let parts: Vec<&str> = encoded.split(':').collect();
        let (config, salt_hex, key_hex) = match parts.as_slice() {
            [ALGORITHM_TAG, salt, key] => (PasswordConfig::default(), *salt, *key),
            [ALGORITHM_TAG, cost, salt, key] => (parse_cost(cost)?, *salt, *key),
            _ => return None,
        };

        let salt = hex::decode(salt_hex).ok()?;
        let key = hex::decode(key_hex).ok()?;
        if salt.is_empty() || key.is_empty() || key.len() > MAX_STORED_KEY_LEN {
            return None;
        }
        Some(Self { config, salt, key })
    }
}

fn parse_cost(cost: &str) -> Option<PasswordConfig> {
    let mut it = cost.split('-');
    let config = PasswordConfig {
        log_n: it.next()?.parse().ok()?,
        r: it.next()?.parse().ok()?,
        p: it.next()?.parse().ok()?,
    };
    if it.next().is_some() {
        return None;
    }
    Some(config)
}

fn params(config: &PasswordConfig) -> Option<Params> {
    let bounded = (1..=MAX_LOG_N).contains(&config.log_n)
        && (1..=MAX_R).contains(&config.r)
        && (1..=MAX_P).contains(&config.p)
        && memory_bytes(config) <= MAX_MEMORY_BYTES;
    if !bounded {
        return None;
    }
    Params::new(config.log_n, config.r, config.p, PARAMS_LEN).ok()
}

fn memory_bytes(config: &PasswordConfig) -> u64 {
    (128 * u64::from(config.r)) << config.log_n
}

fn derive(
    password: &[u8],
    salt: &[u8],
    config: &PasswordConfig,
    key_len: usize,
) -> Option<Zeroizing<Vec<u8>>> {
    let params = params(config)?;
    let mut key = Zeroizing::new(vec![0u8; key_len]);
    scrypt::scrypt(password, salt, &params, &mut key).ok()?;
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::new(PasswordConfig { log_n: 4, r: 8, p: 1 }).unwrap()
    }

    #[test]
    fn test_password_hashing() {
        let hasher = cheap();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hash.starts_with("scrypt:4-8-1:"));
        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("secret2", &hash));
    }

    #[test]
    fn test_default_cost_uses_three_part_encoding() {
        let hash = PasswordHasher::default().hash("pw").unwrap();
        let parts: Vec<&str> = hash.split(':').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "scrypt");
        assert_eq!(parts[1].len(), SALT_LEN * 2);
        assert_eq!(parts[2].len(), KEY_LEN * 2);
    }

    #[test]
    fn test_salts_differ() {
        let hasher = cheap();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_verify_uses_encoded_cost_not_own() {
        let hash = cheap().hash("pw").unwrap();
        let other = PasswordHasher::new(PasswordConfig { log_n: 5, r: 4, p: 1 }).unwrap();
        assert!(other.verify("pw", &hash));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        let hasher = cheap();
        for bad in [
            "",
            "not-a-valid-encoded-hash",
            "bcrypt:00:00",
            "scrypt:zz:00",
            "scrypt::",
            "scrypt:4-8:aa:bb",
            "scrypt:4-8-1-2:aa:bb",
            "scrypt:99-8-1:aabb:ccdd",
            "scrypt:40-8-1:aabb:ccdd",
            "$2b$12$abcdefghijklmnopqrstuu",
        ] {
            assert!(!hasher.verify("anything", bad), "{bad:?} verified");
        }
    }

    #[test]
    fn test_rejects_invalid_cost() {
        assert!(PasswordHasher::new(PasswordConfig { log_n: 0, r: 8, p: 1 }).is_err());
    }

    #[test]
    fn test_memory_cost_is_capped() {
        // 128 * 8 * 2^20 = 1 GiB, 128 * 32 * 2^20 = 4 GiB
        assert_eq!(memory_bytes(&PasswordConfig { log_n: 20, r: 8, p: 1 }), MAX_MEMORY_BYTES);
        assert!(params(&PasswordConfig { log_n: 20, r: 8, p: 1 }).is_some());
        assert!(PasswordHasher::new(PasswordConfig { log_n: 20, r: 32, p: 1 }).is_err());
        assert!(PasswordHasher::new(PasswordConfig { log_n: 19, r: 17, p: 1 }).is_err());

        assert!(!cheap().verify("anything", "scrypt:20-32-16:aa:bb"));
    }

    #[tokio::test]
    async fn test_spawned_hash_and_verify() {
        let hasher = cheap();
        let hash = hasher.spawn_hash("secret1".to_string()).await.unwrap();
        assert!(hasher.spawn_verify("secret1".to_string(), hash.clone()).await.unwrap());
        assert!(!hasher.spawn_verify("nope".to_string(), hash).await.unwrap());
    }
}
