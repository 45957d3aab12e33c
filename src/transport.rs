use crate::{Conf, MsqErr, SocketConf};
use log::debug;
use std::net::{Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

/// Largest datagram the query protocol is expected to produce.
pub const MAX_DATAGRAM_SIZE: usize = 1460;

/// A datagram channel to one query server.
///
/// Implementations must report timeouts and I/O failures as
/// [MsqErr::NetworkErr] so the client can retry them.
pub trait Transport {
    fn send(&mut self, bufs: &[u8]) -> Result<(), MsqErr>;

    fn receive(&mut self) -> Result<Vec<u8>, MsqErr>;
}

/// UDP transport connected to the configured host and port.
///
/// The socket is owned exclusively and closed when the transport is dropped.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn connect(conf: &Conf) -> Result<Self, MsqErr> {
        let remote = match conf.to_socket_addrs()?.next() {
            Some(addr) => addr,
            None => {
                return Err(MsqErr::DataErr(format!(
                    "{} did not resolve to any address",
                    conf
                )));
            }
        };
        let socket = create_udp_socket(&conf.socket_conf, &remote)?;

        socket.connect(remote)?;
        debug!("query socket {} connected to {}", socket.local_addr()?, remote);

        Ok(Self { socket })
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, bufs: &[u8]) -> Result<(), MsqErr> {
        self.socket.send(bufs)?;

        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>, MsqErr> {
        let mut bufs = [0u8; MAX_DATAGRAM_SIZE];
        // Anything beyond the buffer is truncated by the OS.
        let len = self.socket.recv(&mut bufs)?;

        Ok(bufs[..len].to_vec())
    }
}

/// Bind a socket of the same address family as `remote`.
///
/// The configured IPv4 bind address is only meaningful for IPv4 targets;
/// IPv6 targets always bind to `[::]`.
/// A zero timeout is rejected; use `None` to block forever.
pub fn create_udp_socket(
    socket_conf: &SocketConf,
    remote: &SocketAddr,
) -> Result<UdpSocket, MsqErr> {
    for timeout in [socket_conf.read_time_out, socket_conf.write_timeout] {
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(MsqErr::DataErr("Socket timeout must be greater than zero".into()));
        }
    }

    let port = socket_conf.rep_udp_port;
    let socket = match remote {
        SocketAddr::V4(_) => UdpSocket::bind((socket_conf.rep_udp_ipv4, port))?,
        SocketAddr::V6(_) => UdpSocket::bind((Ipv6Addr::UNSPECIFIED, port))?,
    };

    socket.set_read_timeout(socket_conf.read_time_out)?;
    socket.set_write_timeout(socket_conf.write_timeout)?;

    Ok(socket)
}
