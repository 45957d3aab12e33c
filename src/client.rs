use crate::{
    packet::{decode_response, encode_request, Packet, PacketType, SESSION_ID_MASK},
    query::{parse_basic_status, parse_full_status, QueryBasic, QueryFull},
    session::{parse_challenge_token, Session},
    transport::{Transport, UdpTransport},
    Conf, MsqErr,
};
use log::{debug, warn};

/// Who pays for a failed handshake attempt.
///
/// Both variants draw on the same budget: `max_retries` minus the failures
/// already recorded in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryBudget {
    /// Every failure is recorded in the session.
    Counted,
    /// The caller already recorded the failure that led here; handshake
    /// failures are only tallied locally.
    Bypass,
}

/// Query protocol client for a single server.
///
/// The challenge token is negotiated on first use and reused until a query
/// fails. Calls block until a reply arrives or the socket timeout elapses.
#[derive(Debug)]
pub struct QueryClient<T: Transport = UdpTransport> {
    conf: Conf,
    session: Session,
    transport: T,
}

impl QueryClient<UdpTransport> {
    pub fn connect(conf: Conf) -> Result<Self, MsqErr> {
        let transport = UdpTransport::connect(&conf)?;

        Ok(Self::with_transport(conf, transport))
    }
}

impl<T: Transport> QueryClient<T> {
    pub fn with_transport(conf: Conf, transport: T) -> Self {
        Self {
            conf,
            session: Session::default(),
            transport,
        }
    }

    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get basic [status](https://wiki.vg/Query#Basic_stat).
    ///
    /// A failed round trip re-negotiates the challenge token and is retried
    /// once.
    pub fn query(&mut self) -> Result<QueryBasic, MsqErr> {
        let token = self.challenge_token()?;

        let payload = match self.stat_round_trip(token, &[]) {
            Ok(payload) => payload,
            Err(err) if err.is_transient() => {
                warn!("{}: basic status failed ({}), renegotiating", self.conf, err);
                self.session.invalidate();
                let token = self.handshake(RetryBudget::Counted)?;

                self.stat_round_trip(token, &[]).map_err(MsqErr::into_exhausted)?
            }
            Err(err) => return Err(err),
        };

        parse_basic_status(&payload, self.session.ping())
    }

    /// Get full [status](https://wiki.vg/Query#Full_stat).
    ///
    /// Failed round trips are recorded in the session and retried with a new
    /// challenge token until `max_retries` is reached.
    pub fn query_full(&mut self) -> Result<QueryFull, MsqErr> {
        // Full requests are told apart from basic ones by a 4 byte payload.
        let marker = self.conf.session_id.to_be_bytes();
        let mut token = self.challenge_token()?;

        loop {
            match self.stat_round_trip(token, &marker) {
                Ok(payload) => return parse_full_status(&payload, self.session.ping()),
                Err(err) if err.is_transient() => {
                    self.session.record_retry();

                    if self.session.retries() >= self.conf.max_retries {
                        return Err(err.into_exhausted());
                    }

                    warn!(
                        "{}: full status failed ({}), retry {}/{}",
                        self.conf,
                        err,
                        self.session.retries(),
                        self.conf.max_retries
                    );
                    self.session.invalidate();
                    token = self.handshake(RetryBudget::Bypass)?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn challenge_token(&mut self) -> Result<i32, MsqErr> {
        match self.session.challenge_token() {
            Some(token) => Ok(token),
            None => self.handshake(RetryBudget::Counted),
        }
    }

    /// Negotiate a new challenge token.
    ///
    /// Attempts stop once `session.retries() + bypassed >= max_retries`;
    /// every failed attempt raises one of the two terms.
    fn handshake(&mut self, budget: RetryBudget) -> Result<i32, MsqErr> {
        let mut bypassed = 0u32;

        loop {
            match self.try_handshake() {
                Ok(token) => return Ok(token),
                Err(err) if err.is_transient() => {
                    self.session.invalidate();

                    match budget {
                        RetryBudget::Counted => self.session.record_retry(),
                        RetryBudget::Bypass => bypassed += 1,
                    }

                    if self.session.retries() + bypassed >= self.conf.max_retries {
                        return Err(err.into_exhausted());
                    }

                    warn!("{}: handshake failed ({}), retrying", self.conf, err);
                }
                Err(err) => {
                    self.session.invalidate();
                    return Err(err);
                }
            }
        }
    }

    fn try_handshake(&mut self) -> Result<i32, MsqErr> {
        self.session.begin_handshake();
        self.send(PacketType::Handshake, 0, &[])?;

        let packet = self.receive(PacketType::Handshake)?;
        let token = parse_challenge_token(&packet.payload)?;
        self.session.establish(token);

        Ok(token)
    }

    fn stat_round_trip(&mut self, token: i32, payload: &[u8]) -> Result<Vec<u8>, MsqErr> {
        self.send(PacketType::Stat, token, payload)?;

        Ok(self.receive(PacketType::Stat)?.payload)
    }

    fn send(&mut self, packet_type: PacketType, token: i32, payload: &[u8]) -> Result<(), MsqErr> {
        let bufs = encode_request(packet_type, self.conf.session_id, token, payload);
        debug!(
            "{}: sending {:?} packet ({} bytes)",
            self.conf,
            packet_type,
            bufs.len()
        );

        self.transport.send(&bufs)
    }

    fn receive(&mut self, expected: PacketType) -> Result<Packet, MsqErr> {
        let bufs = self.transport.receive()?;
        let packet = decode_response(&bufs)?.expect_type(expected)?;
        debug!(
            "{}: received {:?} packet ({} bytes)",
            self.conf,
            expected,
            bufs.len()
        );

        if packet.session_id & SESSION_ID_MASK != self.conf.session_id & SESSION_ID_MASK {
            warn!(
                "{}: response session id {} does not match {}",
                self.conf, packet.session_id, self.conf.session_id
            );
        }

        Ok(packet)
    }
}
