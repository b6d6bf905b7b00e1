pub mod auth_models;
pub mod token_manager;

pub use auth_models::{
    AssertionClaims, AuthError, Credentials, CredentialsError, SignedAssertion, TokenGrant,
};
pub use token_manager::{AssertionSigner, TokenExchange, TokenManager, TokenSource};
