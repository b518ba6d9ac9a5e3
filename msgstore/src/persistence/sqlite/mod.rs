//! A [MessageStore](crate::MessageStore) and
//! [MessageGroupStore](crate::MessageGroupStore) on top of sqlite.
//!
//! Two tables hold everything: `{prefix}MESSAGE` for individual messages and
//! `{prefix}MESSAGE_GROUP` for group members, both partitioned by region.
//! Every write is a single statement; concurrent writers coordinate through
//! sqlite's own atomicity, never through in-process locks.
//!
//! ``` no_run
//! # use msgstore::{sqlite::SqliteMessageStore, Message, MessageGroupStore};
//! # use sqlx::SqlitePool;
//! # async fn inner() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = SqlitePool::connect("sqlite::memory:").await?;
//! let store = SqliteMessageStore::builder()
//!     .pool(pool)
//!     .region("orders")
//!     .build()?;
//! store.initialize_schema().await?;
//!
//! let group = store
//!     .add_message_to_group("basket-42", &Message::new(b"apples".to_vec()))
//!     .await?;
//! assert_eq!(group.unmarked().len(), 1);
//! # Ok(())
//! # }
//! ```

mod error;
mod group_store;
mod queries;
mod store;

pub use error::SqlError;
pub use store::{SqliteMessageStore, SqliteMessageStoreBuilder};
