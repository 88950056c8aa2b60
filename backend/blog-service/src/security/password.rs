/// Password hashing and verification using Argon2id
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use zxcvbn::zxcvbn;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lowest zxcvbn score (0-4) accepted; below it the password is guessable
/// from common-password lists and simple patterns
pub const MIN_PASSWORD_SCORE: u8 = 2;

/// Hash a password using Argon2id with a random salt
///
/// Returns a PHC-formatted string safe for database storage. Strength rules
/// are checked by the forms before this is called.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash in constant time
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::PasswordHash(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::PasswordHash(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Every rule the password breaks, as user-facing messages
///
/// Rules: minimum length, a zxcvbn score of at least `MIN_PASSWORD_SCORE`,
/// not entirely numeric, not too similar to the username.
pub fn password_problems(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }

    // zxcvbn refuses blank input; the length rule already covers it
    if let Ok(entropy) = zxcvbn(password, &[]) {
        if entropy.score() < MIN_PASSWORD_SCORE {
            problems.push("This password is too common.".to_string());
        }
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    let lowered = password.to_lowercase();
    let username = username.trim().to_lowercase();
    if username.chars().count() >= 3
        && !lowered.is_empty()
        && (lowered.contains(&username) || username.contains(&lowered))
    {
        problems.push("The password is too similar to the username.".to_string());
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_valid_password() {
        let password = "StrongP@ssw0rd!";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(verify_password(password, &hash).expect("should verify successfully"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("StrongP@ssw0rd!").expect("should hash password successfully");
        assert!(!verify_password("WrongPassword123!", &hash).expect("verification should succeed"));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = hash_password("StrongP@ssw0rd!").expect("should hash successfully");
        let hash2 = hash_password("StrongP@ssw0rd!").expect("should hash successfully");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AppError::PasswordHash(_))
        ));
    }

    #[test]
    fn test_good_password_has_no_problems() {
        assert!(password_problems("correct-horse-battery", "alice").is_empty());
    }

    #[test]
    fn test_short_password() {
        let problems = password_problems("Ab1!", "alice");
        assert!(problems.iter().any(|p| p.contains("too short")));
    }

    #[test]
    fn test_numeric_and_common_password() {
        let problems = password_problems("12345678", "alice");
        assert!(problems.iter().any(|p| p.contains("entirely numeric")));
        assert!(problems.iter().any(|p| p.contains("too common")));
    }

    #[test]
    fn test_password_similar_to_username() {
        let problems = password_problems("alice-quartz-harbor-58", "Alice");
        assert_eq!(
            problems,
            vec!["The password is too similar to the username.".to_string()]
        );
    }

    #[test]
    fn test_guessable_passwords_are_too_common() {
        for password in [
            "qwerty12345",
            "password!",
            "iloveyou2",
            "123qweasd",
            "abcdefgh",
            "aaaaaaaa",
        ] {
            let problems = password_problems(password, "alice");
            assert!(
                problems.iter().any(|p| p == "This password is too common."),
                "{password} should be rejected, got {problems:?}"
            );
        }
    }
}
