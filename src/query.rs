use crate::MsqErr;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Padding before the full stat key/value section: `splitnum\0` and two bytes.
const FULL_STAT_PADDING: usize = 11;
/// Separates the key/value section from the player section.
const PLAYER_SECTION_DELIMITER: &[u8] = b"\x00\x00\x01player_\x00\x00";

const HUMAN_READABLE_NAMES: [(&str, &str); 13] = [
    ("game_id", "Game Name"),
    ("gametype", "Game Type"),
    ("motd", "Message of the Day"),
    ("hostname", "Server Address"),
    ("hostport", "Server Port"),
    ("map", "Main World Name"),
    ("maxplayers", "Maximum Players"),
    ("numplayers", "Players Online"),
    ("players", "List of Players"),
    ("plugins", "List of Plugins"),
    ("raw_plugins", "Raw Plugin Info"),
    ("software", "Server Software"),
    ("version", "Game Version"),
];

/// Label for a well known status key.
pub fn human_readable_name(key: &str) -> Option<&'static str> {
    HUMAN_READABLE_NAMES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

/// Basic [status](https://wiki.vg/Query#Basic_stat).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryBasic {
    pub motd: String,
    pub game_type: String,
    pub map: String,
    pub numplayers: i64,
    pub maxplayers: i64,
    pub hostport: u16,
    pub hostname: String,
    pub ping: u64,
}

impl std::fmt::Display for QueryBasic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?
        )
    }
}

/// A full stat number field that was present in the response.
///
/// Empty values are kept as the raw empty string instead of becoming 0.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum NumericField {
    Number(i64),
    Raw(String),
}

/// Full [status](https://wiki.vg/Query#Full_stat).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryFull {
    /// Every key/value pair as received, with the leading `hostname` key
    /// renamed to `motd`.
    pub data: BTreeMap<String, String>,
    pub players: Vec<String>,
    pub raw_motd: String,
    /// [QueryFull::raw_motd] without `&` formatting codes.
    pub motd: String,
    pub raw_plugins: String,
    pub software: String,
    pub plugins: Vec<String>,
    pub numplayers: Option<NumericField>,
    pub maxplayers: Option<NumericField>,
    pub hostport: Option<NumericField>,
    pub ping: u64,
}

impl QueryFull {
    /// Raw value of any key, e.g. `version`, `game_id` or `hostip`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

impl std::fmt::Display for QueryFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?
        )
    }
}

/// Parse a basic stat payload.
///
/// Layout: motd, game type, map, numplayers, maxplayers as null-terminated
/// strings, then the host port (little-endian u16) and the null-terminated
/// host name.
pub fn parse_basic_status(payload: &[u8], ping: u64) -> Result<QueryBasic, MsqErr> {
    let parts = payload.splitn(6, |&b| b == 0x00).collect::<Vec<_>>();

    if parts.len() != 6 {
        return Err(MsqErr::ParseErr(format!(
            "Basic status expected 6 fields, but got: {}",
            parts.len()
        )));
    }

    let remainder = parts[5];
    if remainder.len() < 2 {
        return Err(MsqErr::ParseErr(format!(
            "Basic status host port needs 2 bytes, but got: {}",
            remainder.len()
        )));
    }

    let hostname = match &remainder[2..] {
        [rest @ .., 0x00] => rest,
        rest => rest,
    };

    Ok(QueryBasic {
        motd: decode_str(parts[0]),
        game_type: decode_str(parts[1]),
        map: decode_str(parts[2]),
        numplayers: loose_int(&decode_str(parts[3])),
        maxplayers: loose_int(&decode_str(parts[4])),
        hostport: u16::from_le_bytes([remainder[0], remainder[1]]),
        hostname: decode_str(hostname),
        ping,
    })
}

/// Parse a full stat payload.
pub fn parse_full_status(payload: &[u8], ping: u64) -> Result<QueryFull, MsqErr> {
    if payload.len() < FULL_STAT_PADDING {
        return Err(MsqErr::ParseErr(format!(
            "Full status payload too short, len: {}",
            payload.len()
        )));
    }

    // Drop meaningless byte padding
    let bufs = &payload[FULL_STAT_PADDING..];
    let delimiters = find_all(bufs, PLAYER_SECTION_DELIMITER);

    let (kv_section, player_section) = match delimiters.as_slice() {
        [idx] => (&bufs[..*idx], &bufs[idx + PLAYER_SECTION_DELIMITER.len()..]),
        found => {
            return Err(MsqErr::ParseErr(format!(
                "Full status expected one player section delimiter, but found: {}",
                found.len()
            )));
        }
    };

    let data = parse_kv_section(kv_section);
    let players = parse_player_section(player_section);

    let numplayers = coerce_numeric(&data, "numplayers");
    let maxplayers = coerce_numeric(&data, "maxplayers");
    let hostport = coerce_numeric(&data, "hostport");

    let raw_motd = data.get("motd").cloned().unwrap_or_else(|| {
        debug!("full status has no motd key");
        String::new()
    });
    let raw_plugins = data.get("plugins").cloned().unwrap_or_default();
    let (software, plugins) = parse_plugins(&raw_plugins);

    Ok(QueryFull {
        motd: clean_motd(&raw_motd),
        raw_motd,
        players,
        raw_plugins,
        software,
        plugins,
        numplayers,
        maxplayers,
        hostport,
        data,
        ping,
    })
}

fn parse_kv_section(section: &[u8]) -> BTreeMap<String, String> {
    // The first key is `hostname` but holds what basic stat calls motd.
    let section = match section.strip_prefix(b"hostname") {
        Some(rest) => [b"motd".as_slice(), rest].concat(),
        None => section.to_vec(),
    };

    let tokens = section.split(|&b| b == 0x00).collect::<Vec<_>>();
    // Pairs are (key, value); a dangling key is dropped.
    tokens
        .chunks_exact(2)
        .map(|pair| (decode_str(pair[0]), decode_str(pair[1])))
        .collect()
}

fn parse_player_section(section: &[u8]) -> Vec<String> {
    let section = &section[..section.len().saturating_sub(2)];

    if section.is_empty() {
        return vec![];
    }

    section.split(|&b| b == 0x00).map(decode_str).collect()
}

fn coerce_numeric(data: &BTreeMap<String, String>, key: &str) -> Option<NumericField> {
    data.get(key).map(|value| match value.is_empty() {
        true => NumericField::Raw(value.clone()),
        false => NumericField::Number(loose_int(value)),
    })
}

/// Remove `&x` formatting codes.
pub fn clean_motd(motd: &str) -> String {
    let mut result = String::with_capacity(motd.len());
    let mut chars = motd.chars().peekable();

    while let Some(c) = chars.next() {
        // The code character is consumed together with the `&`.
        if c == '&' && chars.next_if(|&next| next != '\n').is_some() {
            continue;
        }

        result.push(c);
    }

    result
}

/// Split `SOFTWARE[: PLUGIN(; PLUGIN...)]` into software and plugin names.
pub fn parse_plugins(raw: &str) -> (String, Vec<String>) {
    match raw.split_once(':') {
        Some((software, plugins)) => (
            software.trim().into(),
            plugins.split(';').map(|x| x.trim().into()).collect(),
        ),
        None => (raw.trim().into(), vec![]),
    }
}

/// Integer prefix of `value`: optional whitespace, sign and digits.
/// Anything unparsable becomes 0, overflow saturates.
pub fn loose_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let mut result = 0i64;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = (digit - b'0') as i64;
        result = result.saturating_mul(10);
        result = match negative {
            true => result.saturating_sub(digit),
            false => result.saturating_add(digit),
        };
    }

    result
}

/// Decode server text, falling back to Latin-1 for bytes that are not UTF-8.
///
/// Servers often send a bare `0xA7` section sign from a badly encoded
/// `server.properties`.
fn decode_str(bufs: &[u8]) -> String {
    match std::str::from_utf8(bufs) {
        Ok(str) => str.into(),
        Err(_) => bufs.iter().map(|&b| b as char).collect(),
    }
}

fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut found = Vec::new();
    let mut idx = 0;

    while idx + needle.len() <= haystack.len() {
        if &haystack[idx..idx + needle.len()] == needle {
            found.push(idx);
            idx += needle.len();
        } else {
            idx += 1;
        }
    }

    found
}
