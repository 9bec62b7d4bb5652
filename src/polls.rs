//! Poll creation, lookup, listing and deletion.

use crate::error::{ApiError, MSG_INVALID_PAYLOAD};
use crate::ident::{IdGenerator, ID_LENGTH};
use crate::models::{Poll, PollBase, PollOption};
use crate::store::Repository;
use std::sync::Arc;
use validator::Validate;

#[derive(Clone)]
pub struct PollStore {
    repo: Arc<dyn Repository>,
    ids: Arc<IdGenerator>,
    max_polls: u64,
}

impl PollStore {
    pub fn new(repo: Arc<dyn Repository>, ids: Arc<IdGenerator>, max_polls: u64) -> Self {
        Self {
            repo,
            ids,
            max_polls,
        }
    }

    /// Create a poll owned by `account_id`.
    ///
    /// The per-account quota is checked before the insert without a
    /// transaction, so concurrent creates can overshoot it slightly.
    pub async fn create(&self, account_id: i64, base: PollBase) -> Result<Poll, ApiError> {
        if let Err(e) = base.validate() {
            log::debug!("Rejected poll from account {}: {}", account_id, e);
            return Err(ApiError::Validation(MSG_INVALID_PAYLOAD.to_string()));
        }

        let owned = self.repo.count_polls(account_id).await?;
        if owned >= self.max_polls {
            log::info!(
                "Account {} reached the poll limit of {}",
                account_id,
                self.max_polls
            );
            return Err(ApiError::LimitExceeded);
        }

        let poll = Poll {
            id: self.ids.generate(ID_LENGTH),
            account_id,
            title: base.title,
            description: base.description,
            location: base.location,
            options: base
                .options
                .into_iter()
                .map(|o| PollOption {
                    id: self.ids.generate(ID_LENGTH),
                    start: o.start,
                    end: o.end,
                })
                .collect(),
        };

        self.repo.insert_poll(&poll).await?;
        Ok(poll)
    }

    pub async fn get(&self, poll_id: &str) -> Result<Option<Poll>, ApiError> {
        Ok(self.repo.find_poll(poll_id).await?)
    }

    pub async fn list(&self, account_id: i64) -> Result<Vec<Poll>, ApiError> {
        Ok(self.repo.list_polls(account_id).await?)
    }

    /// Delete a poll the account owns. `None` when nothing matched.
    pub async fn delete(&self, account_id: i64, poll_id: &str) -> Result<Option<Poll>, ApiError> {
        Ok(self.repo.delete_poll(account_id, poll_id).await?)
    }
}
