use crate::MsqErr;
use log::debug;
use std::time::Instant;

/// Challenge negotiation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    NoChallenge,
    AwaitingChallengeReply { started: Instant },
    ChallengeEstablished { token: i32 },
}

/// Mutable state a client carries across calls.
#[derive(Debug, Clone)]
pub struct Session {
    state: ChallengeState,
    retries: u32,
    ping: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: ChallengeState::NoChallenge,
            retries: 0,
            ping: 0,
        }
    }
}

impl Session {
    pub fn state(&self) -> ChallengeState {
        self.state
    }

    /// Token to send with stat requests, `None` until a handshake succeeded.
    pub fn challenge_token(&self) -> Option<i32> {
        match self.state {
            ChallengeState::ChallengeEstablished { token } => Some(token),
            _ => None,
        }
    }

    /// Failed attempts charged so far. Never reset by the client.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Round trip of the last successful handshake, in milliseconds.
    pub fn ping(&self) -> u64 {
        self.ping
    }

    pub(crate) fn begin_handshake(&mut self) {
        self.state = ChallengeState::AwaitingChallengeReply {
            started: Instant::now(),
        };
    }

    /// Store the token from a handshake reply and measure the round trip.
    pub(crate) fn establish(&mut self, token: i32) {
        if let ChallengeState::AwaitingChallengeReply { started } = self.state {
            self.ping = (started.elapsed().as_secs_f64() * 1000.0).round() as u64;
        }

        debug!("challenge token {} established, ping {}ms", token, self.ping);
        self.state = ChallengeState::ChallengeEstablished { token };
    }

    pub(crate) fn invalidate(&mut self) {
        self.state = ChallengeState::NoChallenge;
    }

    pub(crate) fn record_retry(&mut self) {
        self.retries += 1;
    }
}

/// Read the challenge token from a handshake reply payload.
///
/// The payload is a null-terminated decimal string. Servers may print values
/// above `i32::MAX`; only the low 32 bits are sent back, so they are kept as is.
pub fn parse_challenge_token(payload: &[u8]) -> Result<i32, MsqErr> {
    let digits = match payload.split_last() {
        Some((0x00, rest)) => rest,
        _ => payload,
    };

    let token_str = std::str::from_utf8(digits).map_err(|err| {
        MsqErr::MalformedPacket(format!("Challenge token is not ASCII, reason: {}", err))
    })?;

    match token_str.trim().parse::<i64>() {
        Ok(token) => Ok(token as u32 as i32),
        Err(err) => Err(MsqErr::MalformedPacket(format!(
            "Can not parse {:?} into challenge token, reason: {}",
            token_str, err
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transitions() {
        let mut session = Session::default();
        assert_eq!(session.state(), ChallengeState::NoChallenge);
        assert_eq!(session.challenge_token(), None);

        session.begin_handshake();
        assert!(matches!(
            session.state(),
            ChallengeState::AwaitingChallengeReply { .. }
        ));
        assert_eq!(session.challenge_token(), None);

        session.establish(9513307);
        assert_eq!(session.challenge_token(), Some(9513307));

        session.invalidate();
        assert_eq!(session.state(), ChallengeState::NoChallenge);
    }

    #[test]
    fn retries_accumulate() {
        let mut session = Session::default();

        session.record_retry();
        session.record_retry();
        session.invalidate();

        assert_eq!(session.retries(), 2);
    }

    #[test]
    fn parse_token() {
        assert_eq!(parse_challenge_token(b"9513307\x00").unwrap(), 9513307);
        assert_eq!(parse_challenge_token(b"-2147483648\x00").unwrap(), i32::MIN);
        assert_eq!(parse_challenge_token(b"4294967295\x00").unwrap(), -1);
        assert_eq!(parse_challenge_token(b"42").unwrap(), 42);
    }

    #[test]
    fn parse_token_rejects_garbage() {
        assert!(matches!(
            parse_challenge_token(b"abc\x00"),
            Err(MsqErr::MalformedPacket(_))
        ));
        assert!(matches!(
            parse_challenge_token(b"\x00"),
            Err(MsqErr::MalformedPacket(_))
        ));
        assert!(matches!(
            parse_challenge_token(&[0xFF, 0x00]),
            Err(MsqErr::MalformedPacket(_))
        ));
    }
}
