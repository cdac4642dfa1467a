use crate::models::Event;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub registration_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub ticket_price: Option<Decimal>,
    pub capacity: Option<i32>,
    pub tickets_sold: i32,
    pub rsvp_count: i32,
    pub date: DateTimeWithTimeZone,
    pub end_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Event {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            organizer_id: model.organizer_id,
            title: model.title,
            registration_fee: model.registration_fee,
            ticket_price: model.ticket_price,
            capacity: model.capacity,
            tickets_sold: model.tickets_sold,
            rsvp_count: model.rsvp_count,
            date: model.date.into(),
            end_date: model.end_date.map(Into::into),
        }
    }
}
