pub mod errors;
pub mod form;
pub mod helpers;
pub mod memory_store;
pub mod sqlite_store;
pub mod store;
