use crate::error::RconError;

/// Every out-of-band Quake II packet starts with four `0xFF` bytes.
pub const SEND_PREFIX: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Header the server puts in front of console output, `0xFFFFFFFF` followed
/// by `print\n`.
pub const REPLY_HEADER: [u8; 10] = [0xFF, 0xFF, 0xFF, 0xFF, b'p', b'r', b'i', b'n', b't', b'\n'];

const RCON_KEYWORD: &str = "rcon ";

/// A single rcon command. The password travels with every command, there is
/// no separate auth exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    password: String,
    command: String,
}

impl CommandPacket {
    /// Fails with [RconError::EmptyCommand] if `command` is empty. The
    /// password is not checked, the server decides whether it is acceptable.
    pub fn new(password: &str, command: &str) -> Result<Self, RconError> {
        if command.is_empty() {
            return Err(RconError::EmptyCommand);
        }

        Ok(CommandPacket {
            password: password.to_owned(),
            command: command.to_owned(),
        })
    }

    /// Decode a packet as a server sees it: prefix, `rcon`, the password up
    /// to the first space and the rest as the command.
    pub fn unpack(incoming: &[u8]) -> Result<Self, RconError> {
        let body = incoming
            .strip_prefix(&SEND_PREFIX[..])
            .ok_or(RconError::MalformedPacketHeader)?;
        let body = std::str::from_utf8(body)?;
        let body = body
            .strip_prefix(RCON_KEYWORD)
            .ok_or(RconError::MalformedPacketHeader)?;

        let (password, command) = body.split_once(' ').unwrap_or((body, ""));
        Self::new(password, command)
    }

    pub fn password(&self) -> &str {
        self.password.as_ref()
    }

    pub fn command(&self) -> &str {
        self.command.as_ref()
    }

    pub fn pack(&self) -> Vec<u8> {
        // Prefix, then "rcon <password> <command>". No length, no terminator:
        // the datagram boundary is the frame.
        let mut payload = Vec::<u8>::with_capacity(
            SEND_PREFIX.len() + RCON_KEYWORD.len() + self.password.len() + 1 + self.command.len(),
        );
        payload.extend_from_slice(&SEND_PREFIX);
        payload.extend_from_slice(RCON_KEYWORD.as_bytes());
        payload.extend_from_slice(self.password.as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(self.command.as_bytes());
        payload
    }
}

/// Shorthand for `CommandPacket::new(password, command)?.pack()`.
pub fn encode_command(password: &str, command: &str) -> Result<Vec<u8>, RconError> {
    Ok(CommandPacket::new(password, command)?.pack())
}

/// Remove every occurrence of [REPLY_HEADER] from a received fragment, not
/// only a leading one. Occurrences are matched left to right without overlap.
pub fn strip_reply_header(fragment: &[u8]) -> Vec<u8> {
    let mut stripped = Vec::with_capacity(fragment.len());
    let mut rest = fragment;

    while let Some((&byte, tail)) = rest.split_first() {
        if rest.starts_with(&REPLY_HEADER) {
            rest = &rest[REPLY_HEADER.len()..];
        } else {
            stripped.push(byte);
            rest = tail;
        }
    }

    stripped
}

/// Frame console output the way a server does: [REPLY_HEADER] then the text.
pub fn pack_reply(body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(REPLY_HEADER.len() + body.len());
    payload.extend_from_slice(&REPLY_HEADER);
    payload.extend_from_slice(body);
    payload
}
