//! Availability submissions of an account on a poll.

use crate::error::{ApiError, MSG_INVALID_POLL_OPTION, MSG_POLL_NOT_FOUND};
use crate::models::{Answer, AvailabilitySubmission, OptionAvailability, PollAccountAvailability};
use crate::store::Repository;
use std::sync::Arc;

#[derive(Clone)]
pub struct VoteStore {
    repo: Arc<dyn Repository>,
}

impl VoteStore {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Record the account's availability on a poll, replacing any earlier
    /// submission. Every entry is checked before anything is written.
    pub async fn submit(
        &self,
        account_id: i64,
        poll_id: &str,
        submission: Vec<AvailabilitySubmission>,
    ) -> Result<PollAccountAvailability, ApiError> {
        let availabilities = submission
            .into_iter()
            .map(|entry| {
                let answer = entry
                    .answer
                    .parse::<Answer>()
                    .map_err(|_| ApiError::invalid_answer())?;
                Ok(OptionAvailability {
                    option_id: entry.option_id,
                    answer,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let poll = self
            .repo
            .find_poll(poll_id)
            .await?
            .ok_or(ApiError::NotFound(MSG_POLL_NOT_FOUND))?;

        if let Some(unknown) = availabilities
            .iter()
            .find(|a| !poll.has_option(&a.option_id))
        {
            log::debug!(
                "Rejected vote on {} for unknown option {:?}",
                poll_id,
                unknown.option_id
            );
            return Err(ApiError::Validation(MSG_INVALID_POLL_OPTION.to_string()));
        }

        Ok(self
            .repo
            .upsert_vote(poll_id, account_id, &availabilities)
            .await?)
    }

    pub async fn get(
        &self,
        account_id: i64,
        poll_id: &str,
    ) -> Result<Option<PollAccountAvailability>, ApiError> {
        Ok(self.repo.find_vote(poll_id, account_id).await?)
    }

    pub async fn list_for_poll(
        &self,
        poll_id: &str,
    ) -> Result<Vec<PollAccountAvailability>, ApiError> {
        Ok(self.repo.list_votes(poll_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Poll, PollOption};
    use crate::store::MemoryRepository;
    use chrono::{Duration, Utc};

    async fn setup() -> (VoteStore, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        let start = Utc::now();
        repo.insert_poll(&Poll {
            id: "poll00000001".to_string(),
            account_id: 1,
            title: "Offsite".to_string(),
            description: String::new(),
            location: String::new(),
            options: vec![PollOption {
                id: "option000001".to_string(),
                start,
                end: start + Duration::hours(2),
            }],
        })
        .await
        .unwrap();
        (VoteStore::new(repo.clone()), repo)
    }

    fn entry(option_id: &str, answer: &str) -> AvailabilitySubmission {
        AvailabilitySubmission {
            option_id: option_id.to_string(),
            answer: answer.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_vote_then_list() {
        let (votes, _) = setup().await;

        votes
            .submit(2, "poll00000001", vec![entry("option000001", "maybe")])
            .await
            .unwrap();

        let all = votes.list_for_poll("poll00000001").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].account_id, 2);
        assert_eq!(all[0].availabilities[0].answer, Answer::Maybe);
    }

    #[actix_rt::test]
    async fn test_unknown_answer_writes_nothing() {
        let (votes, _) = setup().await;

        let err = votes
            .submit(
                2,
                "poll00000001",
                vec![
                    entry("option000001", "available"),
                    entry("option000001", "unknown"),
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.public_message(),
            "invalid availability. needs to be one of: available, maybe, unavailable"
        );
        assert!(votes.list_for_poll("poll00000001").await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_resubmission_replaces() {
        let (votes, _) = setup().await;

        votes
            .submit(2, "poll00000001", vec![entry("option000001", "maybe")])
            .await
            .unwrap();
        votes
            .submit(2, "poll00000001", vec![entry("option000001", "unavailable")])
            .await
            .unwrap();

        let vote = votes.get(2, "poll00000001").await.unwrap().unwrap();
        assert_eq!(vote.availabilities.len(), 1);
        assert_eq!(vote.availabilities[0].answer, Answer::Unavailable);
        assert_eq!(votes.list_for_poll("poll00000001").await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn test_missing_poll_and_foreign_option() {
        let (votes, _) = setup().await;

        let err = votes
            .submit(2, "nope", vec![entry("option000001", "maybe")])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = votes
            .submit(2, "poll00000001", vec![entry("other", "maybe")])
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), MSG_INVALID_POLL_OPTION);
        assert_eq!(votes.get(2, "poll00000001").await.unwrap(), None);
    }
}
