pub mod collectors;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod runner;

pub use error::AppError;
