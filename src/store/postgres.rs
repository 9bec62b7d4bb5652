//! Postgres repository on sea-orm.
//!
//! Plain reads go through the entity query builder. Writes that need
//! `ON CONFLICT` or `RETURNING` are raw statements mapped back onto the
//! entity models.

use super::{Repository, StoreError};
use crate::models::{Account, OptionAvailability, Poll, PollAccountAvailability};
use crate::orm::{accounts, poll_account_availability, polls};
use async_trait::async_trait;
use sea_orm::{
    entity::*,
    query::*,
    ActiveValue::{NotSet, Set},
    ConnectionTrait, DatabaseConnection, DbBackend, PaginatorTrait, Statement,
};

const UPSERT_ACCOUNT: &str = r#"
    INSERT INTO accounts (email, username, name)
    VALUES ($1, $2, $3)
    ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
    RETURNING id, email, username, name
"#;

const DELETE_POLL: &str = r#"
    DELETE FROM polls
    WHERE id = $1 AND account_id = $2
    RETURNING id, account_id, title, description, location, options, created_at
"#;

const UPSERT_VOTE: &str = r#"
    INSERT INTO poll_account_availability (poll_id, account_id, availabilities)
    VALUES ($1, $2, $3)
    ON CONFLICT (poll_id, account_id) DO UPDATE SET availabilities = EXCLUDED.availabilities
    RETURNING poll_id, account_id, availabilities
"#;

#[derive(Clone, Debug)]
pub struct PgRepository {
    db: DatabaseConnection,
}

impl PgRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(Account::from))
    }

    async fn upsert_account(
        &self,
        email: &str,
        username: &str,
        name: &str,
    ) -> Result<Account, StoreError> {
        let row = accounts::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                UPSERT_ACCOUNT,
                vec![email.into(), username.into(), name.into()],
            ))
            .one(&self.db)
            .await?
            .ok_or(StoreError::MissingRow("account upsert"))?;
        Ok(row.into())
    }

    async fn count_polls(&self, account_id: i64) -> Result<u64, StoreError> {
        let count = polls::Entity::find()
            .filter(polls::Column::AccountId.eq(account_id))
            .count(&self.db)
            .await?;
        Ok(count as u64)
    }

    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        let model = polls::ActiveModel {
            id: Set(poll.id.clone()),
            account_id: Set(poll.account_id),
            title: Set(poll.title.clone()),
            description: Set(poll.description.clone()),
            location: Set(poll.location.clone()),
            options: Set(serde_json::to_value(&poll.options)?),
            created_at: NotSet,
        };
        polls::Entity::insert(model).exec(&self.db).await?;
        Ok(())
    }

    async fn find_poll(&self, poll_id: &str) -> Result<Option<Poll>, StoreError> {
        match polls::Entity::find_by_id(poll_id.to_owned())
            .one(&self.db)
            .await?
        {
            Some(model) => Ok(Some(Poll::try_from(model)?)),
            None => Ok(None),
        }
    }

    async fn list_polls(&self, account_id: i64) -> Result<Vec<Poll>, StoreError> {
        polls::Entity::find()
            .filter(polls::Column::AccountId.eq(account_id))
            .order_by_asc(polls::Column::CreatedAt)
            .order_by_asc(polls::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| Poll::try_from(m).map_err(StoreError::from))
            .collect()
    }

    async fn delete_poll(
        &self,
        account_id: i64,
        poll_id: &str,
    ) -> Result<Option<Poll>, StoreError> {
        // Votes go with the poll through the foreign key cascade.
        let deleted = polls::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                DELETE_POLL,
                vec![poll_id.into(), account_id.into()],
            ))
            .one(&self.db)
            .await?;

        match deleted {
            Some(model) => Ok(Some(Poll::try_from(model)?)),
            None => Ok(None),
        }
    }

    async fn upsert_vote(
        &self,
        poll_id: &str,
        account_id: i64,
        availabilities: &[OptionAvailability],
    ) -> Result<PollAccountAvailability, StoreError> {
        let encoded = serde_json::to_value(availabilities)?;
        let row = poll_account_availability::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                UPSERT_VOTE,
                vec![poll_id.into(), account_id.into(), encoded.into()],
            ))
            .one(&self.db)
            .await?
            .ok_or(StoreError::MissingRow("vote upsert"))?;
        Ok(PollAccountAvailability::try_from(row)?)
    }

    async fn find_vote(
        &self,
        poll_id: &str,
        account_id: i64,
    ) -> Result<Option<PollAccountAvailability>, StoreError> {
        match poll_account_availability::Entity::find_by_id((poll_id.to_owned(), account_id))
            .one(&self.db)
            .await?
        {
            Some(model) => Ok(Some(PollAccountAvailability::try_from(model)?)),
            None => Ok(None),
        }
    }

    async fn list_votes(&self, poll_id: &str) -> Result<Vec<PollAccountAvailability>, StoreError> {
        poll_account_availability::Entity::find()
            .filter(poll_account_availability::Column::PollId.eq(poll_id))
            .order_by_asc(poll_account_availability::Column::AccountId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| PollAccountAvailability::try_from(m).map_err(StoreError::from))
            .collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .execute(Statement::from_string(
                DbBackend::Postgres,
                "SELECT 1".to_owned(),
            ))
            .await?;
        Ok(())
    }
}
