use crate::models::{Ticket, TicketStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub status: TicketStatus,
    #[sea_orm(unique)]
    pub payment_reference: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount_paid: Decimal,
    pub email: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,
    pub checked_in_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Restrict"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Ticket {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            event_id: model.event_id,
            quantity: model.quantity,
            status: model.status,
            payment_reference: model.payment_reference,
            amount_paid: model.amount_paid,
            email: model.email,
            metadata: model.metadata,
            checked_in_at: model.checked_in_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}
