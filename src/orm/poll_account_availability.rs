//! SeaORM Entity for poll_account_availability table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "poll_account_availability")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub poll_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: i64,
    /// Array of `{option_id, answer}` objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub availabilities: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::polls::Entity",
        from = "Column::PollId",
        to = "super::polls::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Poll,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::polls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poll.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for crate::models::PollAccountAvailability {
    type Error = serde_json::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            poll_id: m.poll_id,
            account_id: m.account_id,
            availabilities: serde_json::from_value(m.availabilities)?,
        })
    }
}
