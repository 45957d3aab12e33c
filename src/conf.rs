use crate::{
    client::QueryClient,
    query::{QueryBasic, QueryFull},
    MsqErr,
};
use std::{
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs},
    time::Duration,
};

const DEFAULT_QUERY_PORT: u16 = 25565;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Main struct used for configuring a query client.
///
/// The query port defaults to 25565, the same as the game port, which matches
/// `query.port` in a stock `server.properties`.
#[derive(Debug, Clone)]
pub struct Conf {
    /// Server IP address or a domain name.
    pub host: String,
    /// Server query port.
    pub port: u16,
    /// Session id sent with every request.
    pub session_id: i32,
    /// Retry budget shared by handshakes and full status queries.
    pub max_retries: u32,
    /// See [SocketConf].
    pub socket_conf: SocketConf,
}

/// Additional socket configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConf {
    /// Set the read timeout for socket.
    pub read_time_out: Option<Duration>,
    /// Set the write timeout for socket.
    pub write_timeout: Option<Duration>,
    /// Specify the local address for the UDP socket.
    /// The default value is [Ipv4Addr::UNSPECIFIED].
    pub rep_udp_ipv4: Ipv4Addr,
    /// Specify the local port for the UDP socket.
    /// The default value is 0, letting the OS pick one.
    pub rep_udp_port: u16,
}

impl Default for SocketConf {
    fn default() -> Self {
        Self {
            read_time_out: Some(DEFAULT_TIMEOUT),
            write_timeout: Some(DEFAULT_TIMEOUT),
            rep_udp_ipv4: Ipv4Addr::UNSPECIFIED,
            rep_udp_port: 0,
        }
    }
}

impl ToSocketAddrs for Conf {
    type Iter = std::vec::IntoIter<SocketAddr>;

    fn to_socket_addrs(&self) -> std::io::Result<Self::Iter> {
        (&*self.host, self.port).to_socket_addrs()
    }
}

impl std::fmt::Display for Conf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Conf {
    /// Create a query configuration using the default port.
    ///
    /// # Examples
    ///
    /// ```
    /// # use msq::{Conf, SocketConf};
    /// #
    /// let conf = Conf::create("www.example.com");
    /// #
    /// # assert_eq!(conf.host, "www.example.com");
    /// # assert_eq!(conf.port, 25565);
    /// # assert_eq!(conf.session_id, 0);
    /// # assert_eq!(conf.max_retries, 2);
    /// # assert_eq!(conf.socket_conf, SocketConf::default());
    /// ```
    pub fn create(host: &str) -> Self {
        Self::create_with_port(host, DEFAULT_QUERY_PORT)
    }

    /// Create a query configuration using the specified port.
    ///
    /// # Example
    ///
    /// ```
    /// # use msq::Conf;
    /// #
    /// let conf = Conf::create_with_port("www.example.com", 25566);
    /// #
    /// # assert_eq!(conf.port, 25566);
    /// ```
    pub fn create_with_port(host: &str, port: u16) -> Self {
        Self {
            host: host.trim().into(),
            port,
            session_id: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            socket_conf: SocketConf::default(),
        }
    }

    /// Create a query configuration by using a string.
    ///
    /// The string is split on its last colon into host and port. If the port
    /// cannot be converted to [u16], a [MsqErr::DataErr] is returned.
    ///
    /// # Example
    ///
    /// ```
    /// # use msq::{Conf, MsqErr};
    /// #
    /// # fn main() -> Result<(), MsqErr> {
    ///     let conf = Conf::create_from_str("www.example.com:25565")?;
    /// #
    /// #   assert_eq!(conf.host, "www.example.com");
    /// #   assert_eq!(conf.port, 25565);
    /// #
    /// #   assert!(Conf::create_from_str("25565").is_err());
    /// #   assert!(Conf::create_from_str("www.example.com:-1").is_err());
    /// #   Ok(())
    /// # }
    /// ```
    pub fn create_from_str(addr: &str) -> Result<Self, MsqErr> {
        let (host, port) = match addr.trim().rsplit_once(':') {
            Some((host, port)) if !host.trim().is_empty() => (host.trim(), port.trim()),
            _ => {
                return Err(MsqErr::DataErr(format!(
                    "Invalid socket address syntax: {}",
                    addr
                )));
            }
        };

        match port.parse::<u16>() {
            Ok(port) => Ok(Self::create_with_port(host, port)),
            Err(_) => Err(MsqErr::DataErr(format!("Invalid port: {}", port))),
        }
    }

    /// Use the same timeout for every send and receive.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.socket_conf.read_time_out = Some(timeout);
        self.socket_conf.write_timeout = Some(timeout);
        self
    }

    pub fn with_session_id(mut self, session_id: i32) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Open a UDP socket and build a [QueryClient] that keeps its challenge
    /// token between calls.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msq::{Conf, MsqErr};
    ///
    /// fn main() -> Result<(), MsqErr> {
    ///     let mut client = Conf::create("www.example.com").create_client()?;
    ///     let basic = client.query()?;
    ///     let full = client.query_full()?;
    ///
    ///     println!("{}\n{}", basic, full);
    ///     Ok(())
    /// }
    /// ```
    pub fn create_client(&self) -> Result<QueryClient, MsqErr> {
        QueryClient::connect(self.clone())
    }

    /// Get **basic** info using a fresh client.
    ///
    /// The server needs `enable-query=true` in its `server.properties`.
    /// Return type is [QueryBasic].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msq::{Conf, MsqErr};
    ///
    /// fn main() -> Result<(), MsqErr> {
    ///     let server = Conf::create_with_port("www.example.com", 25565);
    ///     let info = server.query()?;
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn query(&self) -> Result<QueryBasic, MsqErr> {
        self.create_client()?.query()
    }

    /// Get **full** info using a fresh client. Return type is [QueryFull].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msq::{Conf, MsqErr};
    ///
    /// fn main() -> Result<(), MsqErr> {
    ///     let server = Conf::create_with_port("www.example.com", 25565);
    ///     let info = server.query_full()?;
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn query_full(&self) -> Result<QueryFull, MsqErr> {
        self.create_client()?.query_full()
    }
}
