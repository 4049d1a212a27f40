pub mod factory;
pub mod token_store;
pub mod verifier;

pub use factory::build_token_verifier;
pub use token_store::{CacheTokenStore, TokenStore, TokenStoreError};
pub use verifier::{Claims, TokenError, TokenVerifier};
