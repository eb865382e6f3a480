pub mod config;
pub mod events;
pub mod peer;
pub mod server;

pub use config::ServerConfig;
pub use events::{ServerEvent, VacateReason};
pub use peer::{Peer, PeerEvent, PeerId};
pub use server::GameServer;
