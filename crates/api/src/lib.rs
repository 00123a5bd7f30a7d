pub mod db;
pub mod engine;
pub mod graphql;
pub mod store;
