//! CSV dataset ingestion: validation, integrity checksum and filesystem storage.

pub mod schema;
pub mod validator;
pub mod checksum;
pub mod store;

pub use schema::*;
pub use validator::*;
pub use checksum::*;
pub use store::*;
