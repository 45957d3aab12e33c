//! Client for the Minecraft [Query](https://wiki.vg/Query) protocol.
//!
//! The server needs `enable-query=true` in its `server.properties`.
//!
//! ```no_run
//! use msq::{Conf, MsqErr};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), MsqErr> {
//!     let mut client = Conf::create_with_port("www.example.com", 25565)
//!         .with_timeout(Duration::from_secs(2))
//!         .create_client()?;
//!
//!     println!("{}", client.query()?);
//!     println!("{}", client.query_full()?);
//!     Ok(())
//! }
//! ```

mod client;
mod conf;
mod error;
mod packet;
mod query;
mod session;
mod transport;

pub use client::QueryClient;
pub use conf::{Conf, SocketConf};
pub use error::MsqErr;
pub use packet::{decode_response, encode_request, Packet, PacketType};
pub use query::{
    clean_motd, human_readable_name, parse_basic_status, parse_full_status, parse_plugins,
    NumericField, QueryBasic, QueryFull,
};
pub use session::{ChallengeState, Session};
pub use transport::{Transport, UdpTransport, MAX_DATAGRAM_SIZE};
