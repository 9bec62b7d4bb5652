//! In-process repository backed by DashMap.

use super::{Repository, StoreError};
use crate::models::{Account, OptionAvailability, Poll, PollAccountAvailability};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    /// email -> account
    accounts: DashMap<String, Account>,
    next_account_id: AtomicI64,
    /// poll id -> (insertion sequence, poll)
    polls: DashMap<String, (u64, Poll)>,
    next_poll_seq: AtomicU64,
    /// (poll id, account id) -> availability set
    votes: DashMap<(String, i64), PollAccountAvailability>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(email).map(|a| a.value().clone()))
    }

    async fn upsert_account(
        &self,
        email: &str,
        username: &str,
        name: &str,
    ) -> Result<Account, StoreError> {
        // The entry guard holds the shard lock, so racing callers see one row.
        let entry = self
            .accounts
            .entry(email.to_owned())
            .or_insert_with(|| Account {
                id: self.next_account_id.fetch_add(1, Ordering::SeqCst) + 1,
                email: email.to_owned(),
                username: username.to_owned(),
                name: name.to_owned(),
            });
        Ok(entry.value().clone())
    }

    async fn count_polls(&self, account_id: i64) -> Result<u64, StoreError> {
        Ok(self
            .polls
            .iter()
            .filter(|p| p.value().1.account_id == account_id)
            .count() as u64)
    }

    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        let seq = self.next_poll_seq.fetch_add(1, Ordering::SeqCst);
        self.polls.insert(poll.id.clone(), (seq, poll.clone()));
        Ok(())
    }

    async fn find_poll(&self, poll_id: &str) -> Result<Option<Poll>, StoreError> {
        Ok(self.polls.get(poll_id).map(|p| p.value().1.clone()))
    }

    async fn list_polls(&self, account_id: i64) -> Result<Vec<Poll>, StoreError> {
        let mut owned: Vec<(u64, Poll)> = self
            .polls
            .iter()
            .filter(|p| p.value().1.account_id == account_id)
            .map(|p| p.value().clone())
            .collect();
        owned.sort_by_key(|(seq, _)| *seq);
        Ok(owned.into_iter().map(|(_, poll)| poll).collect())
    }

    async fn delete_poll(
        &self,
        account_id: i64,
        poll_id: &str,
    ) -> Result<Option<Poll>, StoreError> {
        let removed = self
            .polls
            .remove_if(poll_id, |_, (_, poll)| poll.account_id == account_id)
            .map(|(_, (_, poll))| poll);

        if removed.is_some() {
            self.votes.retain(|(voted_poll, _), _| voted_poll != poll_id);
        }
        Ok(removed)
    }

    async fn upsert_vote(
        &self,
        poll_id: &str,
        account_id: i64,
        availabilities: &[OptionAvailability],
    ) -> Result<PollAccountAvailability, StoreError> {
        let vote = PollAccountAvailability {
            poll_id: poll_id.to_owned(),
            account_id,
            availabilities: availabilities.to_vec(),
        };
        self.votes
            .insert((poll_id.to_owned(), account_id), vote.clone());
        Ok(vote)
    }

    async fn find_vote(
        &self,
        poll_id: &str,
        account_id: i64,
    ) -> Result<Option<PollAccountAvailability>, StoreError> {
        Ok(self
            .votes
            .get(&(poll_id.to_owned(), account_id))
            .map(|v| v.value().clone()))
    }

    async fn list_votes(&self, poll_id: &str) -> Result<Vec<PollAccountAvailability>, StoreError> {
        let mut votes: Vec<PollAccountAvailability> = self
            .votes
            .iter()
            .filter(|v| v.key().0 == poll_id)
            .map(|v| v.value().clone())
            .collect();
        votes.sort_by_key(|v| v.account_id);
        Ok(votes)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
