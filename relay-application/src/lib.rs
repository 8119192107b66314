pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;

pub use config::AppConfig;
pub use context::{AppContext, FunctionRegistration};
pub use error::{AppError, AppResult};
