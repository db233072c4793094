//! User accounts and bearer-token sessions

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod revocation;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use revocation::RevocationStore;
pub use service::{TokenPair, UserAuthService};
pub use token::{Claims, TokenService, TokenType};
