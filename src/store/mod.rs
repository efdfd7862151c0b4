pub mod accounts;
pub mod catalog;
pub mod sessions;

pub use accounts::{AccountStore, UserRecord};
pub use catalog::{ContentCatalog, InMemoryCatalog};
pub use sessions::{SessionStore, StartDisposition};
