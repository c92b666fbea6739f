//! Just enough NTLM message handling to gate routes behind a handshake.
//!
//! The server never verifies the client's response hashes. It checks the
//! message sequence (Negotiate, Challenge, Authenticate) and the user name
//! carried in the Authenticate message.

use base64::{engine::general_purpose::STANDARD, Engine};

pub const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_TARGET_INFO: u32 = 0x0080_0000;

/// Offset where the Challenge payload (target info) starts.
const CHALLENGE_PAYLOAD_OFFSET: u32 = 48;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NtlmMessage {
    Negotiate,
    Authenticate { user: String },
}

/// Decode the base64 token of an `Authorization: NTLM <token>` header.
pub fn decode(token: &str) -> Option<NtlmMessage> {
    let bytes = STANDARD.decode(token.trim()).ok()?;
    if bytes.len() < 12 || &bytes[..8] != SIGNATURE {
        return None;
    }
    match read_u32(&bytes, 8)? {
        1 => Some(NtlmMessage::Negotiate),
        3 => decode_authenticate(&bytes),
        _ => None,
    }
}

fn decode_authenticate(bytes: &[u8]) -> Option<NtlmMessage> {
    let len = read_u16(bytes, 36)? as usize;
    let offset = read_u32(bytes, 40)? as usize;
    let flags = read_u32(bytes, 60).unwrap_or(0);
    let raw = bytes.get(offset..offset.checked_add(len)?)?;

    let user = if flags & NEGOTIATE_UNICODE != 0 {
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(raw).into_owned()
    };
    Some(NtlmMessage::Authenticate { user })
}

/// Base64 Challenge (type 2) message carrying `nonce` and an empty target
/// info block, which steers clients to NTLMv2 responses.
pub fn challenge(nonce: [u8; 8]) -> String {
    let target_info = [0u8; 4]; // MsvAvEOL
    let flags = NEGOTIATE_UNICODE | REQUEST_TARGET | NEGOTIATE_NTLM | NEGOTIATE_TARGET_INFO;

    let mut message = Vec::with_capacity(CHALLENGE_PAYLOAD_OFFSET as usize + target_info.len());
    message.extend_from_slice(SIGNATURE);
    message.extend_from_slice(&2u32.to_le_bytes());
    // target name: empty
    message.extend_from_slice(&0u16.to_le_bytes());
    message.extend_from_slice(&0u16.to_le_bytes());
    message.extend_from_slice(&CHALLENGE_PAYLOAD_OFFSET.to_le_bytes());
    message.extend_from_slice(&flags.to_le_bytes());
    message.extend_from_slice(&nonce);
    message.extend_from_slice(&[0u8; 8]);
    message.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    message.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    message.extend_from_slice(&CHALLENGE_PAYLOAD_OFFSET.to_le_bytes());
    message.extend_from_slice(&target_info);
    STANDARD.encode(message)
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}
