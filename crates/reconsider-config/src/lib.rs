pub mod config;
pub mod error;
pub mod file_format;
pub mod log_level;

pub use config::{ReconsiderConfig, default_table_name};
pub use error::ConfigError;
pub use file_format::FileFormat;
pub use log_level::LogLevel;
