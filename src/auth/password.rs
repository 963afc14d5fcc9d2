use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use uuid::Uuid;

/// Marker prefix for accounts that can never log in with a password
/// (social-only accounts).
const UNUSABLE_PREFIX: char = '!';

pub fn hash_password(password: &str) -> String {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

/// A stored value that is not a valid argon2 hash and never verifies.
pub fn unusable_password() -> String {
    format!("{}{}", UNUSABLE_PREFIX, Uuid::new_v4().to_simple())
}

pub fn has_usable_password(stored: &str) -> bool {
    !stored.starts_with(UNUSABLE_PREFIX)
}

pub fn verify_password(password: &str, stored: &str) -> Result<(), argon2::password_hash::Error> {
    let parsed = PasswordHash::new(stored)?;
    Argon2::default().verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("s3cret-Pass");
        assert!(verify_password("s3cret-Pass", &hashed).is_ok());
        assert!(verify_password("wrong", &hashed).is_err());
    }

    #[test]
    fn unusable_password_never_verifies() {
        let stored = unusable_password();
        assert!(!has_usable_password(&stored));
        assert!(verify_password("anything", &stored).is_err());
        assert!(verify_password(&stored, &stored).is_err());
    }
}
