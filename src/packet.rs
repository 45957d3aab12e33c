use crate::MsqErr;

/// Every request starts with these two bytes.
pub const MAGIC_PREFIX: [u8; 2] = [0xFE, 0xFD];
/// Type (1 byte) + session id (4 bytes).
pub const RESPONSE_HEADER_LEN: usize = 5;
/// Servers only keep the low 4 bits of every session id byte.
pub const SESSION_ID_MASK: i32 = 0x0F0F0F0F;

/// Request and response packet types, see [Query](https://wiki.vg/Query#Packet_Format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Basic or full stat request, told apart by the request payload.
    Stat = 0x00,
    /// Challenge token handshake.
    Handshake = 0x09,
}

/// A decoded server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub packet_type: u8,
    pub session_id: i32,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Reject responses of a different type than the request.
    pub fn expect_type(self, expected: PacketType) -> Result<Self, MsqErr> {
        if self.packet_type != expected as u8 {
            return Err(MsqErr::MalformedPacket(format!(
                "Expected packet type {:#04x}, but got: {:#04x}",
                expected as u8, self.packet_type
            )));
        }

        Ok(self)
    }
}

/// Build a request packet.
///
/// Layout: `FE FD | type | session id (BE) | challenge token (BE) | payload`.
/// The handshake request carries a zero token.
pub fn encode_request(
    packet_type: PacketType,
    session_id: i32,
    challenge_token: i32,
    payload: &[u8],
) -> Vec<u8> {
    [
        MAGIC_PREFIX.as_slice(),
        &[packet_type as u8],
        session_id.to_be_bytes().as_slice(),
        challenge_token.to_be_bytes().as_slice(),
        payload,
    ]
    .concat()
}

/// Split a response into type, session id and payload.
pub fn decode_response(bufs: &[u8]) -> Result<Packet, MsqErr> {
    if bufs.len() < RESPONSE_HEADER_LEN {
        return Err(MsqErr::MalformedPacket(format!(
            "Response packet len invalid, expected at least {} bytes, but got: {}",
            RESPONSE_HEADER_LEN,
            bufs.len()
        )));
    }

    let mut session_id = [0u8; 4];
    session_id.copy_from_slice(&bufs[1..RESPONSE_HEADER_LEN]);

    Ok(Packet {
        packet_type: bufs[0],
        session_id: i32::from_be_bytes(session_id),
        payload: bufs[RESPONSE_HEADER_LEN..].to_vec(),
    })
}
