// ─── Client ───
// Bundle manifests, player identity and running client sessions.

mod config;
mod player;
mod session;

pub use config::{ClientConfiguration, DEFAULT_AUTHOR, DEFAULT_NAME, DEFAULT_VERSION};
pub use player::PlayerConfiguration;
pub use session::Client;
