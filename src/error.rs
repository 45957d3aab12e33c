use thiserror::Error;

/// Msq uniform error definition.
#[derive(Debug, Error)]
pub enum MsqErr {
    /// Sending or receiving a datagram failed, including timeouts.
    #[error("network error: {0}")]
    NetworkErr(#[from] std::io::Error),
    /// A datagram arrived that is not well-formed enough to use: too short
    /// for a header, an unexpected packet type or an unreadable challenge token.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),
    /// The payload does not have the structure of a status response.
    #[error("unable to parse response: {0}")]
    ParseErr(String),
    /// Invalid caller supplied data, such as an address that cannot be parsed.
    #[error("{0}")]
    DataErr(String),
}

impl MsqErr {
    /// Whether the failure may go away by re-negotiating and sending again.
    ///
    /// Only transport failures and undecodable datagrams qualify; a payload
    /// with the wrong structure will have the same structure next time.
    pub fn is_transient(&self) -> bool {
        matches!(self, MsqErr::NetworkErr(_) | MsqErr::MalformedPacket(_))
    }

    /// Error to report once no retries are left.
    ///
    /// Every transient failure becomes a [MsqErr::NetworkErr], so a
    /// [MsqErr::MalformedPacket] never means "gave up".
    pub(crate) fn into_exhausted(self) -> MsqErr {
        match self {
            MsqErr::MalformedPacket(msg) => MsqErr::NetworkErr(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("retries exhausted, last response was malformed: {}", msg),
            )),
            err => err,
        }
    }
}
