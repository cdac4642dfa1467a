//! Shared test utilities for domain testing
//!
//! - `TestDatabase`: PostgreSQL container with the workspace migrations applied (feature: "postgres")
//! - `TestDataBuilder`: deterministic ids and names per test
//! - `TestEvent`: event rows to seed before exercising ticket flows
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder, TestEvent};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let event = TestEvent::free(builder.event_id("main"), builder.user_id());
//!     db.create_test_event(&event).await;
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Builder for test data with deterministic randomization
///
/// Containers are shared across nothing, but deterministic ids keep failures
/// reproducible and log lines greppable.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed derived from the test name; the recommended constructor.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_free_rsvp");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        Self::new(hash_of(&name))
    }

    /// The primary user of the test.
    pub fn user_id(&self) -> Uuid {
        self.uuid_with(self.seed)
    }

    /// Additional users (organizers, other attendees).
    pub fn user_id_for(&self, label: &str) -> Uuid {
        self.uuid_with(hash_of(&("user", label)))
    }

    pub fn event_id(&self, label: &str) -> Uuid {
        self.uuid_with(hash_of(&("event", label)))
    }

    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.email("guest"), "guest-7@campus.test");
    /// ```
    pub fn email(&self, label: &str) -> String {
        format!("{}-{}@campus.test", label, self.seed)
    }

    /// `test-<prefix>-<seed>-<suffix>`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Payment reference unique to this test.
    pub fn reference(&self, suffix: &str) -> String {
        format!("ref-{}-{}", self.seed, suffix)
    }

    fn uuid_with(&self, salt: u64) -> Uuid {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..].copy_from_slice(&salt.to_le_bytes());
        Uuid::from_bytes(bytes)
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// An `events` row. Defaults to a free, uncapped event that started an hour
/// ago and ends in three hours.
#[derive(Debug, Clone)]
pub struct TestEvent {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub registration_fee: Decimal,
    pub ticket_price: Option<Decimal>,
    pub capacity: Option<i32>,
    pub tickets_sold: i32,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TestEvent {
    pub fn free(id: Uuid, organizer_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            organizer_id,
            title: "Test Event".to_string(),
            registration_fee: Decimal::ZERO,
            ticket_price: None,
            capacity: None,
            tickets_sold: 0,
            date: now - Duration::hours(1),
            end_date: Some(now + Duration::hours(3)),
        }
    }

    /// `fee` in major units, e.g. `Decimal::new(150000, 2)` for 1500.00.
    pub fn paid(id: Uuid, organizer_id: Uuid, fee: Decimal) -> Self {
        Self {
            registration_fee: fee,
            ..Self::free(id, organizer_id)
        }
    }

    pub fn with_capacity(mut self, capacity: i32, tickets_sold: i32) -> Self {
        self.capacity = Some(capacity);
        self.tickets_sold = tickets_sold;
        self
    }

    pub fn starting_in(mut self, offset: Duration) -> Self {
        let now = Utc::now();
        self.date = now + offset;
        self.end_date = Some(now + offset + Duration::hours(3));
        self
    }

    pub fn ended(mut self) -> Self {
        let now = Utc::now();
        self.date = now - Duration::hours(5);
        self.end_date = Some(now - Duration::hours(1));
        self
    }
}
