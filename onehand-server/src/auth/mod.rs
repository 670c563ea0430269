//! Auth gateway primitives: password hashing and bearer tokens
//!
//! Sessions are stateless HS256 tokens; signing out is a client-side
//! discard.

pub mod password;
pub mod token;

pub use password::{hash_password, password_stamp, verify_decoy, verify_password};
pub use token::{Claims, IssuedToken, TokenIssuer, TokenPurpose};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid or expired session")]
    InvalidToken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Token(String),
}
