//! # Functionality to store and retrieve messages and message groups
//!
//! Stores are the single owner of everything persisted. Callers hand
//! messages in and receive copies back; every change goes through an
//! explicit operation.
//!
//! ## Messages
//!
//! A [MessageStore] keeps individual messages by id. Messages are immutable
//! once stored: saving a message which was already saved (and is stored
//! unchanged) is a no-op, so re-delivered messages are not written twice.
//!
//! ## Message groups
//!
//! A [MessageGroupStore] keeps messages correlated by a group key, e.g. the
//! parts of an order awaiting aggregation. Members start out _unmarked_
//! and are _marked_ once processed. The group's timestamp (the creation
//! time of its oldest member) lets callers decide when a group has waited
//! long enough; see
//! [expire_message_groups](MessageGroupStore::expire_message_groups).
//!
//! ## Regions
//!
//! Every store is bound to a region at construction. Stores in different
//! regions can share the same tables without ever seeing each other's rows.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mocks")]
pub mod mock;

mod message_group_store;
mod message_store;

pub use message_group_store::{GroupStream, MessageGroupStore};
pub use message_store::MessageStore;
