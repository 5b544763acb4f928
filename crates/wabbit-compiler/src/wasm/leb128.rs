//! LEB128 variable-length integers.
//!
//! Every count, index and integer immediate in a module is written in this
//! form: seven payload bits per byte, least significant group first, high
//! bit set on every byte except the last.

use wabbit_core::DecodeError;

const CONTINUATION: u8 = 0x80;
const PAYLOAD: u8 = 0x7f;
const SIGN: u8 = 0x40;

/// Append the unsigned encoding of `value` to `out`.
pub fn write_unsigned(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value as u8) & PAYLOAD;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | CONTINUATION);
    }
}

/// Append the signed (two's complement) encoding of `value` to `out`.
pub fn write_signed(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value as u8) & PAYLOAD;
        // Arithmetic shift keeps the sign.
        value >>= 7;
        let done = (value == 0 && byte & SIGN == 0) || (value == -1 && byte & SIGN != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | CONTINUATION);
    }
}

pub fn encode_unsigned(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    write_unsigned(&mut out, value);
    out
}

pub fn encode_signed(value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    write_signed(&mut out, value);
    out
}

/// Decode an unsigned value from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_unsigned(bytes: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        let payload = u64::from(byte & PAYLOAD);
        if shift >= 64 || (shift == 63 && payload > 1) {
            return Err(DecodeError::Overflow { bits: 64 });
        }
        result |= payload << shift;
        if byte & CONTINUATION == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(DecodeError::Truncated)
}

/// Decode a signed value from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_signed(bytes: &[u8]) -> Result<(i64, usize), DecodeError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        if shift >= 64 {
            return Err(DecodeError::Overflow { bits: 64 });
        }
        let payload = i64::from(byte & PAYLOAD);
        if shift == 63 {
            // Only the sign bit fits; the rest must repeat it.
            let sign_only = payload == 0 || payload == PAYLOAD as i64;
            if !sign_only {
                return Err(DecodeError::Overflow { bits: 64 });
            }
        }
        result |= payload << shift;
        shift += 7;
        if byte & CONTINUATION == 0 {
            if shift < 64 && byte & SIGN != 0 {
                result |= -1i64 << shift;
            }
            return Ok((result, i + 1));
        }
    }
    Err(DecodeError::Truncated)
}
