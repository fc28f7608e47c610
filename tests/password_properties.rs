//! Password hashing properties

use dashboard_auth::auth::config::PasswordConfig;
use dashboard_auth::auth::core::PasswordHasher;
use proptest::prelude::*;

fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(PasswordConfig { log_n: 4, r: 8, p: 1 }).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_hash_then_verify(password in ".{0,64}") {
        let hasher = cheap_hasher();
        let encoded = hasher.hash(&password).unwrap();
        prop_assert!(hasher.verify(&password, &encoded));
    }

    #[test]
    fn test_other_password_fails(p in ".{1,32}", q in ".{1,32}") {
        prop_assume!(p != q);
        let hasher = cheap_hasher();
        let encoded = hasher.hash(&p).unwrap();
        prop_assert!(!hasher.verify(&q, &encoded));
    }

    #[test]
    fn test_garbage_never_verifies(garbage in "\\PC{0,80}") {
        prop_assume!(!garbage.starts_with("scrypt:"));
        prop_assert!(!cheap_hasher().verify("secret1", &garbage));
    }
}

#[test]
fn test_not_a_valid_encoded_hash() {
    assert!(!PasswordHasher::default().verify("anything", "not-a-valid-encoded-hash"));
}
