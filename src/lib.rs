pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod products;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod supervisor;
pub mod validation;
