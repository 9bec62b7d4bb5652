//! Accounts and binding a login identity to one.

use crate::error::ApiError;
use crate::models::Account;
use crate::oauth::Identity;
use crate::session::ACCOUNT_KEY;
use crate::store::Repository;
use actix_session::Session;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountResolver {
    repo: Arc<dyn Repository>,
}

impl AccountResolver {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Account id for an email, or `None` when no account exists yet.
    pub async fn resolve(&self, email: &str) -> Result<Option<i64>, ApiError> {
        Ok(self
            .repo
            .find_account_by_email(email)
            .await?
            .map(|account| account.id))
    }

    /// Create an account. If one already exists for the email it is returned
    /// unchanged, so racing first logins converge on one id.
    pub async fn create(
        &self,
        email: &str,
        username: &str,
        name: &str,
    ) -> Result<Account, ApiError> {
        let account = self.repo.upsert_account(email, username, name).await?;
        log::debug!("Account {} bound to {}", account.id, email);
        Ok(account)
    }
}

/// Local part of an email address, used as the default username.
pub fn username_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[derive(Clone)]
pub struct SessionBinder {
    accounts: AccountResolver,
}

impl SessionBinder {
    pub fn new(accounts: AccountResolver) -> Self {
        Self { accounts }
    }

    /// The account id bound to this session, binding one first if needed.
    ///
    /// A bound id is trusted without touching the database. Otherwise the
    /// session must already carry an identity.
    pub async fn bind(
        &self,
        session: &Session,
        identity: Option<&Identity>,
    ) -> Result<i64, ApiError> {
        if let Some(account_id) = session.get::<i64>(ACCOUNT_KEY)? {
            return Ok(account_id);
        }

        let identity = identity.ok_or(ApiError::MissingIdentity)?;

        let account_id = match self.accounts.resolve(&identity.email).await? {
            Some(id) => id,
            None => {
                self.accounts
                    .create(
                        &identity.email,
                        username_from_email(&identity.email),
                        &identity.name,
                    )
                    .await?
                    .id
            }
        };

        session.insert(ACCOUNT_KEY, account_id)?;
        Ok(account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;

    #[test]
    fn test_username_from_email() {
        assert_eq!(username_from_email("jane.doe@example.com"), "jane.doe");
        assert_eq!(username_from_email("no-at-sign"), "no-at-sign");
        assert_eq!(username_from_email("@example.com"), "");
    }

    #[actix_rt::test]
    async fn test_resolve_then_create() {
        let accounts = AccountResolver::new(Arc::new(MemoryRepository::new()));

        assert_eq!(accounts.resolve("a@example.com").await.unwrap(), None);

        let created = accounts.create("a@example.com", "a", "Alice").await.unwrap();
        assert_eq!(created.username, "a");
        assert_eq!(
            accounts.resolve("a@example.com").await.unwrap(),
            Some(created.id)
        );

        let again = accounts.create("a@example.com", "x", "X").await.unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(again.name, "Alice");
    }
}
