pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod links;
pub mod middleware;
pub mod places;
pub mod routes;
pub mod storage;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};
use storage::ObjectStorage;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub storage: ObjectStorage,
}
