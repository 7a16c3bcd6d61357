//! Token authentication in front of user-scoped operations

use std::sync::Arc;

use borga_store::{Store, TokenStore, UserId};
use log::debug;

use crate::error::Error;

pub const MISSING_TOKEN: &str = "missing token";
pub const TOKEN_MISMATCH: &str = "token/user mismatch";

/// Checks that a bearer token belongs to the user an operation claims to act for.
///
/// Tokens do not expire and are not rate limited; one stays valid until its
/// owner is deleted.
pub struct Gate<T: ?Sized = dyn Store> {
    tokens: Arc<T>,
}

impl<T: ?Sized> Clone for Gate<T> {
    fn clone(&self) -> Self {
        Self {
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<T: TokenStore + ?Sized> Gate<T> {
    pub fn new(tokens: Arc<T>) -> Self {
        Self { tokens }
    }

    /// Resolve `token` and require it to name `user_id`.
    pub async fn check(&self, token: Option<&str>, user_id: &str) -> Result<UserId, Error> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(Error::unauthenticated(MISSING_TOKEN)),
        };

        let claimed = UserId::new(user_id);
        match self.tokens.token_to_user_id(token).await? {
            Some(owner) if owner == claimed => Ok(claimed),
            _ => {
                debug!("token rejected for user {}", claimed);
                Err(Error::unauthenticated(TOKEN_MISMATCH))
            }
        }
    }
}
