/// Security primitives for blog-service
///
/// - **password**: Argon2id hashing/verification and password rules
/// - **token**: opaque session tokens and their storage hash
pub mod password;
pub mod token;

pub use password::{hash_password, password_problems, verify_password};
pub use token::{generate_session_token, hash_token};
