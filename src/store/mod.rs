pub mod result_store;
pub mod schema;
