use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20260301_000002_create_events::Events;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TicketStatus::Enum)
                    .values([
                        TicketStatus::Pending,
                        TicketStatus::Confirmed,
                        TicketStatus::CheckedIn,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(pk_uuid(Tickets::Id).default(Expr::cust("gen_random_uuid()")))
                    // No FK: profiles live in another service's schema.
                    .col(uuid(Tickets::UserId))
                    .col(uuid(Tickets::EventId))
                    .col(integer(Tickets::Quantity).default(1))
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .enumeration(
                                TicketStatus::Enum,
                                [
                                    TicketStatus::Pending,
                                    TicketStatus::Confirmed,
                                    TicketStatus::CheckedIn,
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(string_null(Tickets::PaymentReference))
                    .col(decimal_len(Tickets::AmountPaid, 12, 2).default(0))
                    .col(string(Tickets::Email))
                    .col(json_binary(Tickets::Metadata).default("{}"))
                    .col(timestamp_with_time_zone_null(Tickets::CheckedInAt))
                    .col(
                        timestamp_with_time_zone(Tickets::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Tickets::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_event_id")
                            .from(Tickets::Table, Tickets::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One ticket per attendee per event; concurrent inserts lose here.
        manager
            .create_index(
                Index::create()
                    .name("uq_tickets_user_event")
                    .table(Tickets::Table)
                    .col(Tickets::UserId)
                    .col(Tickets::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // A gateway reference settles at most one ticket.
        manager
            .create_index(
                Index::create()
                    .name("uq_tickets_payment_reference")
                    .table(Tickets::Table)
                    .col(Tickets::PaymentReference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_event_id")
                    .table(Tickets::Table)
                    .col(Tickets::EventId)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            ALTER TABLE tickets
                ADD CONSTRAINT ck_tickets_quantity_positive CHECK (quantity >= 1)
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TRIGGER tickets_touch_updated_at
                BEFORE UPDATE ON tickets
                FOR EACH ROW
                EXECUTE FUNCTION util.touch_updated_at()
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS tickets_touch_updated_at ON tickets")
            .await?;

        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TicketStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    UserId,
    EventId,
    Quantity,
    Status,
    PaymentReference,
    AmountPaid,
    Email,
    Metadata,
    CheckedInAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TicketStatus {
    #[sea_orm(iden = "ticket_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "confirmed")]
    Confirmed,
    #[sea_orm(iden = "checked-in")]
    CheckedIn,
}
