//! Bit-level packing of status codes.

/// The four components of a packed status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CodeParts {
    /// Message type (4 bits).
    pub kind: u8,
    /// Message group (4 bits).
    pub group: u8,
    /// Originating service (8 bits).
    pub service: u8,
    /// Message sequence number (16 bits).
    pub message_id: u16,
}

/// Packs the components into a status code.
///
/// `kind` and `group` must fit in 4 bits; higher bits are masked off.
#[must_use]
pub const fn encode(kind: u8, group: u8, service: u8, message_id: u16) -> u32 {
    let id = message_id.to_be_bytes();
    u32::from_be_bytes([((kind & 0x0F) << 4) | (group & 0x0F), id[0], id[1], service])
}

/// Unpacks a status code into its components. Exact inverse of [`encode`].
#[must_use]
pub const fn decode(code: u32) -> CodeParts {
    let b = code.to_be_bytes();
    CodeParts {
        kind: b[0] >> 4,
        group: b[0] & 0x0F,
        service: b[3],
        message_id: u16::from_be_bytes([b[1], b[2]]),
    }
}

/// Resolves a textual status code.
///
/// Upstream services are not consistent in how they render codes, so the
/// parsers below are tried in order and the first success wins:
///
/// 1. base-10 integer (`"320536835"`)
/// 2. prefixed literal (`"0x131B0103"`, `"0o..."`, `"0b..."`)
/// 3. bare hexadecimal (`"131B0103"`)
///
/// Anything else resolves to `0`. This function never fails.
#[must_use]
pub fn parse_code_str(value: &str) -> u32 {
    const PARSERS: [fn(&str) -> Option<u32>; 3] = [parse_decimal, parse_prefixed, parse_bare_hex];

    let value = value.trim();
    PARSERS
        .iter()
        .find_map(|parse| parse(value))
        .unwrap_or(0)
}

fn parse_decimal(value: &str) -> Option<u32> {
    value.parse().ok()
}

fn parse_prefixed(value: &str) -> Option<u32> {
    let (digits, radix) = value
        .get(..2)
        .and_then(|prefix| match prefix {
            "0x" | "0X" => Some(16),
            "0o" | "0O" => Some(8),
            "0b" | "0B" => Some(2),
            _ => None,
        })
        .map(|radix| (&value[2..], radix))?;

    if digits.starts_with(['+', '-']) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

fn parse_bare_hex(value: &str) -> Option<u32> {
    if value.starts_with(['+', '-']) {
        return None;
    }
    u32::from_str_radix(value, 16).ok()
}
