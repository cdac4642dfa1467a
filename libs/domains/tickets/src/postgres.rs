use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::BaseRepository;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, SqlErr, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{event, ticket, user},
    error::{TicketError, TicketResult},
    models::{Event, GuestProfile, NewTicket, Ticket, TicketStatus},
    repository::{CapacityPolicy, CreateOutcome, TicketRepository},
};

/// Increments both counters; `$2` is the ticket quantity.
const INCREMENT_WITHIN_CAPACITY: &str = r#"
    UPDATE events
       SET tickets_sold = tickets_sold + $2,
           rsvp_count = rsvp_count + $2
     WHERE id = $1
       AND (capacity IS NULL OR capacity <= 0 OR tickets_sold + $2 <= capacity)
"#;

const INCREMENT_UNCONDITIONALLY: &str = r#"
    UPDATE events
       SET tickets_sold = tickets_sold + $2,
           rsvp_count = rsvp_count + $2
     WHERE id = $1
"#;

const MARK_CHECKED_IN: &str = r#"
    UPDATE tickets
       SET status = 'checked-in',
           checked_in_at = $2
     WHERE id = $1
       AND status = 'confirmed'
"#;

fn db_error(e: DbErr) -> TicketError {
    TicketError::Internal(format!("Database error: {}", e))
}

pub struct PgTicketRepository {
    base: BaseRepository<ticket::Entity>,
}

impl PgTicketRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn increment(sql: &str, event_id: Uuid, quantity: i32) -> Statement {
        Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [event_id.into(), quantity.into()],
        )
    }

    /// The row that beat us to a unique index.
    async fn winning_row(&self, input: &NewTicket) -> TicketResult<Ticket> {
        if let Some(ticket) = self.find_by_reference(&input.reference).await? {
            return Ok(ticket);
        }
        self.find_by_attendee(input.user_id, input.event_id)
            .await?
            .ok_or_else(|| {
                TicketError::Internal("unique violation without a conflicting ticket".to_string())
            })
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_event(&self, event_id: Uuid) -> TicketResult<Option<Event>> {
        let model = event::Entity::find_by_id(event_id)
            .one(self.base.db())
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn find_ticket(&self, ticket_id: Uuid) -> TicketResult<Option<Ticket>> {
        let model = self.base.find_by_id(ticket_id).await.map_err(db_error)?;
        Ok(model.map(Into::into))
    }

    async fn find_by_reference(&self, reference: &str) -> TicketResult<Option<Ticket>> {
        let model = ticket::Entity::find()
            .filter(ticket::Column::PaymentReference.eq(reference))
            .one(self.base.db())
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn find_by_attendee(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> TicketResult<Option<Ticket>> {
        let model = ticket::Entity::find()
            .filter(ticket::Column::UserId.eq(user_id))
            .filter(ticket::Column::EventId.eq(event_id))
            .one(self.base.db())
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn find_profile(&self, user_id: Uuid) -> TicketResult<Option<GuestProfile>> {
        let model = user::Entity::find_by_id(user_id)
            .one(self.base.db())
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn create_confirmed(
        &self,
        input: NewTicket,
        policy: CapacityPolicy,
    ) -> TicketResult<CreateOutcome> {
        let txn = self.base.db().begin().await.map_err(db_error)?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let active_model = ticket::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(input.user_id),
            event_id: Set(input.event_id),
            quantity: Set(input.quantity),
            status: Set(TicketStatus::Confirmed),
            payment_reference: Set(Some(input.reference.clone())),
            amount_paid: Set(input.amount_paid),
            email: Set(input.email.clone()),
            metadata: Set(input.metadata.clone()),
            checked_in_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = match active_model.insert(&txn).await {
            Ok(model) => model,
            Err(err) => {
                txn.rollback().await.map_err(db_error)?;
                return match err.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => {
                        tracing::debug!(
                            event_id = %input.event_id,
                            user_id = %input.user_id,
                            reference = %input.reference,
                            "Lost ticket insert race; returning the existing ticket"
                        );
                        self.winning_row(&input).await.map(CreateOutcome::Duplicate)
                    }
                    Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                        Err(TicketError::EventNotFound(input.event_id))
                    }
                    _ => Err(db_error(err)),
                };
            }
        };

        let claimed = txn
            .execute_raw(Self::increment(
                INCREMENT_WITHIN_CAPACITY,
                input.event_id,
                input.quantity,
            ))
            .await
            .map_err(db_error)?
            .rows_affected();

        let overbooked = claimed == 0;
        if overbooked {
            match policy {
                CapacityPolicy::Enforce => {
                    txn.rollback().await.map_err(db_error)?;
                    return Err(TicketError::CapacityExceeded {
                        event_id: input.event_id,
                    });
                }
                CapacityPolicy::Overshoot => {
                    txn.execute_raw(Self::increment(
                        INCREMENT_UNCONDITIONALLY,
                        input.event_id,
                        input.quantity,
                    ))
                    .await
                    .map_err(db_error)?;
                }
            }
        }

        txn.commit().await.map_err(db_error)?;

        tracing::info!(
            ticket_id = %inserted.id,
            event_id = %inserted.event_id,
            user_id = %inserted.user_id,
            reference = %input.reference,
            "Created confirmed ticket"
        );

        Ok(CreateOutcome::Created {
            ticket: inserted.into(),
            overbooked,
        })
    }

    async fn mark_checked_in(&self, ticket_id: Uuid, at: DateTime<Utc>) -> TicketResult<Ticket> {
        let at: DateTimeWithTimeZone = at.into();
        self.base
            .db()
            .execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                MARK_CHECKED_IN,
                [ticket_id.into(), at.into()],
            ))
            .await
            .map_err(db_error)?;

        // Re-read whatever won: our update, an earlier check-in, or a pending row.
        let ticket = self
            .find_ticket(ticket_id)
            .await?
            .ok_or(TicketError::TicketNotFound)?;

        match ticket.status {
            TicketStatus::CheckedIn => Ok(ticket),
            TicketStatus::Pending => Err(TicketError::InvalidState(
                "ticket has not been confirmed".to_string(),
            )),
            TicketStatus::Confirmed => Err(TicketError::Internal(format!(
                "ticket {} stayed confirmed after check-in",
                ticket_id
            ))),
        }
    }
}
