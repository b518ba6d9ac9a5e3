mod error;
mod store;

pub use error::MockStoreError;
pub use store::MockMessageStore;
