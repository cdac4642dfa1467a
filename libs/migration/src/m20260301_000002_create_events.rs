use sea_orm_migration::{prelude::*, schema::*};

/// Only the columns RSVP settlement reads or increments; the rest of the event
/// record belongs to the catalogue service.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(pk_uuid(Events::Id).default(Expr::cust("gen_random_uuid()")))
                    .col(uuid(Events::OrganizerId))
                    .col(string(Events::Title))
                    .col(decimal_len(Events::RegistrationFee, 12, 2).default(0))
                    .col(decimal_len_null(Events::TicketPrice, 12, 2))
                    .col(integer_null(Events::Capacity))
                    .col(integer(Events::TicketsSold).default(0))
                    .col(integer(Events::RsvpCount).default(0))
                    .col(timestamp_with_time_zone(Events::Date))
                    .col(timestamp_with_time_zone_null(Events::EndDate))
                    .col(
                        timestamp_with_time_zone(Events::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Events::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_organizer_id")
                    .table(Events::Table)
                    .col(Events::OrganizerId)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        // Counters only ever grow; a negative value means a bug upstream.
        db.execute_unprepared(
            r#"
            ALTER TABLE events
                ADD CONSTRAINT ck_events_counters_non_negative
                CHECK (tickets_sold >= 0 AND rsvp_count >= 0)
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TRIGGER events_touch_updated_at
                BEFORE UPDATE ON events
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
            .execute_unprepared("DROP TRIGGER IF EXISTS events_touch_updated_at ON events")
            .await?;

        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Events {
    Table,
    Id,
    OrganizerId,
    Title,
    RegistrationFee,
    TicketPrice,
    Capacity,
    TicketsSold,
    RsvpCount,
    Date,
    EndDate,
    CreatedAt,
    UpdatedAt,
}
