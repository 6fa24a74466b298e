pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::ChatStore;
pub use types::{Chat, ChatType, Comment, Membership, Message};
