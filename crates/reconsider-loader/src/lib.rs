pub mod code;
pub mod config;
pub mod directory;

pub use code::CodeSource;
pub use config::{CONFIG_FILE, load_config, load_config_from_path, load_config_or_default};
pub use directory::{DirectorySource, parse_script};
