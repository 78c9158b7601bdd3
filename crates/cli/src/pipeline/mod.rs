//! Pipeline helpers shared by the commands.

mod runner;
mod session;

pub use runner::run_blocking;
pub use session::{load_config, open_media, SyncSession};
