pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::Config;
pub use db::{init_db, Repository, StoreError, StoreResult};
pub use db::repo::{Condition, Page, Pagination, SortOrder, Value};
pub use error::AppError;
