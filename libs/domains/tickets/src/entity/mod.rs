//! Sea-ORM entities for the tables this domain reads and writes.
//!
//! `users` and most of `events` belong to other services; only the columns
//! used here are mapped.

pub mod event;
pub mod ticket;
pub mod user;
