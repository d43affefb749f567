pub mod auth;
pub mod database;
pub mod handlers;
pub mod market;
pub mod query;
