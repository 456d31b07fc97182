//! Sign-up, login and session resolution.

use std::sync::Arc;

use domains::{
    DomainError, FormErrors, NewUser, PasswordHasher, Result, SessionTokens, User, UserRepository,
};
use tracing::{debug, info};

use crate::forms::{LoginInput, SignupInput, BAD_CREDENTIALS, USERNAME_TAKEN};

/// A logged-in user and the token that proves it.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn SessionTokens>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn SessionTokens>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub async fn signup(&self, input: SignupInput) -> Result<Session> {
        let (username, password) = input.validate()?;
        let password_hash = self.hasher.hash_password(&password)?;

        let user = self
            .users
            .create_user(NewUser {
                username,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                DomainError::Conflict(_) => DomainError::invalid("username", USERNAME_TAKEN),
                other => other,
            })?;

        info!(user_id = user.id, username = %user.username, "user signed up");
        let token = self.tokens.issue(&user)?;
        Ok(Session { user, token })
    }

    pub async fn login(&self, input: LoginInput) -> Result<Session> {
        input.validate()?;

        let credentials = self.users.find_credentials(input.username.trim()).await?;
        let user = match credentials {
            Some((user, hash)) if self.hasher.verify_password(&input.password, &hash) => user,
            _ => {
                debug!(username = %input.username, "login rejected");
                let mut errors = FormErrors::new();
                errors.add_non_field(BAD_CREDENTIALS);
                return Err(DomainError::Validation(errors));
            }
        };

        info!(user_id = user.id, username = %user.username, "user logged in");
        let token = self.tokens.issue(&user)?;
        Ok(Session { user, token })
    }

    /// The user behind a session token. Invalid tokens and tokens for
    /// users that no longer exist resolve to `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<User>> {
        match self.tokens.verify(token) {
            Ok(identity) => self.users.find_user(identity.user_id).await,
            Err(DomainError::Unauthorized) => Ok(None),
            Err(other) => Err(other),
        }
    }
}
