//! # msgstore
//!
//! msgstore is a durable message store for staged and aggregated message
//! processing. Think of the "waiting room" of an aggregator or a
//! resequencer: messages which belong together are parked in a group until
//! the group is complete, processed, and then released.
//!
//! It offers:
//!
//! - exactly-once insertion of messages which were already saved, so
//! re-delivery is detected rather than duplicated.
//! - groups of messages ordered by arrival, split in to _unmarked_
//! (pending) and _marked_ (processed) members.
//! - regions, so that independent stores can share the same tables.
//!
//! Everything lives in a relational backend and is accessed through
//! single, parameterized SQL statements. There is no in-memory caching and
//! no locking in process: a store can be cloned and used from as many tasks
//! as needed.
//!
//! ## Getting Started
//!
//! ``` no_run
//! use msgstore::{sqlite::SqliteMessageStore, Message, MessageGroupStore, MessageStore};
//! use sqlx::SqlitePool;
//!
//! # async fn inner() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = SqlitePool::connect("sqlite::memory:").await?;
//! let store = SqliteMessageStore::new(pool);
//! store.initialize_schema().await?;
//!
//! // individual messages
//! let saved = store.add_message(Message::new(b"hello".to_vec())).await?;
//! assert_eq!(store.get_message(saved.id()).await?, Some(saved.clone()));
//!
//! // groups are keyed by anything implementing `StoreKey`
//! let group = store.add_message_to_group("order-1234", &saved).await?;
//! assert_eq!(group.unmarked().len(), 1);
//!
//! // once processed, mark the members so they aren't handled twice
//! let group = store.mark_message_group(&group).await?;
//! assert_eq!(group.marked().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate feature flags
//!
//! - `sqlite`: A store backed by sqlite through sqlx. Enabled by default.
//! - `mocks`: An in-memory store with the same contract, for testing.

pub mod codec;
pub(crate) mod constants;

pub mod key;
mod message;
mod persistence;
pub mod proto;
mod util;

pub use constants::{CREATED_DATE_KEY, DEFAULT_REGION, DEFAULT_TABLE_PREFIX, SAVED_KEY};
pub use key::StoreKey;
pub use message::{Message, MessageGroup};
pub use persistence::*;
