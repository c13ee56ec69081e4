pub mod init;
pub mod migrate;
pub mod new;
pub mod schema;
pub mod status;

pub use init::cmd_init;
pub use migrate::{cmd_down, cmd_up};
pub use new::cmd_new;
pub use schema::cmd_schema;
pub use status::cmd_status;
