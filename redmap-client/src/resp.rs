//! # RESP2 Encoding and Decoding
//!
//! Purpose: Encode client commands and decode store responses without
//! external protocol dependencies, sharing one incremental decoder between
//! the blocking and non-blocking connections.
//!
//! ## Design Principles
//! 1. **Incremental Decoding**: `decode` reports how many bytes it consumed
//!    and returns `None` when the frame is incomplete, so both a buffered
//!    blocking reader and an async byte buffer can drive it.
//! 2. **Binary-Safe**: Bulk strings are raw bytes end to end.
//! 3. **Fail Fast**: Invalid framing is a protocol error immediately.

use std::collections::BTreeMap;

use redmap_common::{StoreError, StoreResult};

/// RESP response value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// +OK or +PONG style responses.
    Simple(Vec<u8>),
    /// -ERR ... responses.
    Error(Vec<u8>),
    /// :123 responses.
    Integer(i64),
    /// $... bulk strings, with None for null.
    Bulk(Option<Vec<u8>>),
    /// *... arrays (HGETALL, HKEYS, KEYS).
    Array(Vec<RespValue>),
}

/// Encodes a RESP2 array command into the provided buffer.
pub fn encode_command(args: &[&[u8]], out: &mut Vec<u8>) {
    out.push(b'*');
    push_usize(out, args.len());
    out.extend_from_slice(b"\r\n");
    for arg in args {
        out.push(b'$');
        push_usize(out, arg.len());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
}

/// Decodes one RESP value from the front of `input`.
///
/// Returns `Ok(None)` when more bytes are needed, otherwise the value and the
/// number of bytes it occupied.
pub fn decode(input: &[u8]) -> StoreResult<Option<(RespValue, usize)>> {
    let (line, consumed) = match find_line(input) {
        Some(found) => found,
        None => return Ok(None),
    };
    if line.is_empty() {
        return Err(StoreError::Protocol);
    }

    match line[0] {
        b'+' => Ok(Some((RespValue::Simple(line[1..].to_vec()), consumed))),
        b'-' => Ok(Some((RespValue::Error(line[1..].to_vec()), consumed))),
        b':' => Ok(Some((RespValue::Integer(parse_i64(&line[1..])?), consumed))),
        b'$' => decode_bulk(input, parse_i64(&line[1..])?, consumed),
        b'*' => decode_array(input, parse_i64(&line[1..])?, consumed),
        _ => Err(StoreError::Protocol),
    }
}

fn decode_bulk(input: &[u8], len: i64, consumed: usize) -> StoreResult<Option<(RespValue, usize)>> {
    if len < 0 {
        return Ok(Some((RespValue::Bulk(None), consumed)));
    }
    let len = len as usize;
    let needed = consumed + len + 2;
    if input.len() < needed {
        return Ok(None);
    }
    if &input[consumed + len..needed] != b"\r\n" {
        return Err(StoreError::Protocol);
    }
    let data = input[consumed..consumed + len].to_vec();
    Ok(Some((RespValue::Bulk(Some(data)), needed)))
}

fn decode_array(input: &[u8], len: i64, consumed: usize) -> StoreResult<Option<(RespValue, usize)>> {
    if len <= 0 {
        return Ok(Some((RespValue::Array(Vec::new()), consumed)));
    }

    let mut items = Vec::with_capacity(len as usize);
    let mut offset = consumed;
    for _ in 0..len {
        match decode(&input[offset..])? {
            Some((value, used)) => {
                items.push(value);
                offset += used;
            }
            None => return Ok(None),
        }
    }
    Ok(Some((RespValue::Array(items), offset)))
}

fn find_line(input: &[u8]) -> Option<(&[u8], usize)> {
    let pos = input.windows(2).position(|window| window == b"\r\n")?;
    Some((&input[..pos], pos + 2))
}

fn parse_i64(data: &[u8]) -> StoreResult<i64> {
    if data.is_empty() {
        return Err(StoreError::Protocol);
    }
    let mut negative = false;
    let mut idx = 0;
    if data[0] == b'-' {
        negative = true;
        idx = 1;
        if data.len() == 1 {
            return Err(StoreError::Protocol);
        }
    }

    let mut value: i64 = 0;
    while idx < data.len() {
        let b = data[idx];
        if !b.is_ascii_digit() {
            return Err(StoreError::Protocol);
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
        idx += 1;
    }

    if negative {
        Ok(-value)
    } else {
        Ok(value)
    }
}

fn push_usize(out: &mut Vec<u8>, mut value: usize) {
    // Digits go into a small stack buffer to keep encoding allocation-free.
    let mut buf = [0u8; 20];
    let mut len = 0;
    if value == 0 {
        buf[0] = b'0';
        len = 1;
    } else {
        while value > 0 {
            buf[len] = b'0' + (value % 10) as u8;
            value /= 10;
            len += 1;
        }
    }
    for idx in (0..len).rev() {
        out.push(buf[idx]);
    }
}

// Reply-mapping helpers shared by the blocking and non-blocking clients.
// A `-ERR` reply always maps to `Command`, anything type-mismatched to
// `UnexpectedResponse`.

pub(crate) fn expect_simple(value: RespValue) -> StoreResult<String> {
    match value {
        RespValue::Simple(text) => decode_utf8(text),
        RespValue::Error(message) => Err(command_error(message)),
        _ => Err(StoreError::UnexpectedResponse),
    }
}

pub(crate) fn expect_integer(value: RespValue) -> StoreResult<i64> {
    match value {
        RespValue::Integer(number) => Ok(number),
        RespValue::Error(message) => Err(command_error(message)),
        _ => Err(StoreError::UnexpectedResponse),
    }
}

pub(crate) fn expect_bulk(value: RespValue) -> StoreResult<Option<Vec<u8>>> {
    match value {
        RespValue::Bulk(data) => Ok(data),
        RespValue::Error(message) => Err(command_error(message)),
        _ => Err(StoreError::UnexpectedResponse),
    }
}

pub(crate) fn expect_string_array(value: RespValue) -> StoreResult<Vec<String>> {
    match value {
        RespValue::Array(items) => items
            .into_iter()
            .map(|item| match item {
                RespValue::Bulk(Some(data)) => decode_utf8(data),
                _ => Err(StoreError::UnexpectedResponse),
            })
            .collect(),
        RespValue::Error(message) => Err(command_error(message)),
        _ => Err(StoreError::UnexpectedResponse),
    }
}

/// Maps an HGETALL-style alternating name/value array into a field map.
pub(crate) fn expect_pairs(value: RespValue) -> StoreResult<BTreeMap<String, Vec<u8>>> {
    let items = match value {
        RespValue::Array(items) => items,
        RespValue::Error(message) => return Err(command_error(message)),
        _ => return Err(StoreError::UnexpectedResponse),
    };
    if items.len() % 2 != 0 {
        return Err(StoreError::UnexpectedResponse);
    }

    let mut pairs = BTreeMap::new();
    let mut iter = items.into_iter();
    while let (Some(name), Some(data)) = (iter.next(), iter.next()) {
        let name = match name {
            RespValue::Bulk(Some(bytes)) => decode_utf8(bytes)?,
            _ => return Err(StoreError::UnexpectedResponse),
        };
        let data = match data {
            RespValue::Bulk(Some(bytes)) => bytes,
            _ => return Err(StoreError::UnexpectedResponse),
        };
        pairs.insert(name, data);
    }
    Ok(pairs)
}

fn command_error(message: Vec<u8>) -> StoreError {
    StoreError::Command {
        message: String::from_utf8_lossy(&message).into_owned(),
    }
}

fn decode_utf8(bytes: Vec<u8>) -> StoreResult<String> {
    String::from_utf8(bytes).map_err(|_| StoreError::Protocol)
}
