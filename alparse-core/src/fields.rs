//! Field extraction helpers for streaming parsers.
//!
//! Network payload arrives in segments that rarely line up with logical
//! fields. These helpers cut fields out of `input[*offset..]` and park
//! incomplete trailing bytes in the direction's carry-over buffer until a
//! later call completes them:
//!
//! - [`parse_field_by_size`] - exactly N bytes
//! - [`parse_field_by_delimiter`] - everything up to a byte sequence
//! - [`parse_field_by_eof`] - everything that remains once the stream ends
//!
//! A field that was assembled only from the current input is emitted as a
//! borrowed element; one that needed carry-over bytes is emitted owned.
//! Splitting the same bytes across any number of calls yields the same
//! fields as a single call over the whole buffer.
//!
//! ## Example
//!
//! ```rust
//! use alparse_core::fields::{parse_field_by_size, FieldStatus};
//! use alparse_core::protocol::ParseOutput;
//! use alparse_core::state::ParserState;
//!
//! let mut state = ParserState::new(1024);
//!
//! let first = b"ab";
//! let mut out = ParseOutput::new();
//! let mut offset = 0;
//! let status = parse_field_by_size(&mut out, &mut state, 1, 3, first, &mut offset).unwrap();
//! assert_eq!(status, FieldStatus::Incomplete);
//!
//! let second = b"cd";
//! let mut out = ParseOutput::new();
//! let mut offset = 0;
//! let status = parse_field_by_size(&mut out, &mut state, 1, 3, second, &mut offset).unwrap();
//! assert_eq!(status, FieldStatus::Complete);
//! assert_eq!(out.get(0).unwrap().data(), b"abc");
//! assert_eq!(offset, 1);
//! ```

use crate::error::FieldError;
use crate::protocol::ParseOutput;
use crate::state::ParserState;

/// Outcome of a helper call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    /// A field was appended to the output.
    Complete,
    /// Not enough bytes yet; everything remaining went to carry-over.
    Incomplete,
}

impl FieldStatus {
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, FieldStatus::Complete)
    }
}

#[inline]
fn remaining<'a>(input: &'a [u8], offset: usize) -> &'a [u8] {
    input.get(offset..).unwrap_or(&[])
}

/// Position of the first occurrence of `needle` in `haystack`.
#[inline]
pub(crate) fn find_delimiter(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    match needle {
        [] => None,
        [b] => haystack.iter().position(|c| c == b),
        _ => haystack.windows(needle.len()).position(|w| w == needle),
    }
}

/// Extract a field of exactly `size` bytes.
///
/// When fewer bytes are available the rest of the input is moved to
/// carry-over, `offset` is advanced to the end and
/// [`FieldStatus::Incomplete`] is returned.
pub fn parse_field_by_size<'a>(
    output: &mut ParseOutput<'a>,
    pstate: &mut ParserState,
    field_idx: u16,
    size: usize,
    input: &'a [u8],
    offset: &mut usize,
) -> Result<FieldStatus, FieldError> {
    let rest = remaining(input, *offset);
    let stored = pstate.carry_over_len();

    if stored + rest.len() < size {
        pstate.append_carry_over(rest)?;
        *offset += rest.len();
        return Ok(FieldStatus::Incomplete);
    }

    if stored == 0 {
        output.push_borrowed(field_idx, &rest[..size]);
        *offset += size;
        return Ok(FieldStatus::Complete);
    }

    let mut field = pstate.take_carry_over();
    if stored >= size {
        // Carry-over already holds more than this field, keep the tail.
        let tail = field.split_off(size);
        pstate.append_carry_over(&tail)?;
        output.push_owned(field_idx, field);
        return Ok(FieldStatus::Complete);
    }

    let needed = size - stored;
    field.extend_from_slice(&rest[..needed]);
    output.push_owned(field_idx, field);
    *offset += needed;
    Ok(FieldStatus::Complete)
}

/// Extract everything up to (not including) `delim`.
///
/// On a match `offset` moves past the delimiter. The delimiter may straddle
/// the carry-over and the new input. Unterminated data goes to carry-over.
pub fn parse_field_by_delimiter<'a>(
    output: &mut ParseOutput<'a>,
    pstate: &mut ParserState,
    field_idx: u16,
    delim: &[u8],
    input: &'a [u8],
    offset: &mut usize,
) -> Result<FieldStatus, FieldError> {
    if delim.is_empty() {
        return Err(FieldError::EmptyDelimiter);
    }
    let rest = remaining(input, *offset);
    let stored = pstate.carry_over_len();

    if stored == 0 {
        if let Some(pos) = find_delimiter(rest, delim) {
            output.push_borrowed(field_idx, &rest[..pos]);
            *offset += pos + delim.len();
            return Ok(FieldStatus::Complete);
        }
        pstate.append_carry_over(rest)?;
        *offset += rest.len();
        return Ok(FieldStatus::Incomplete);
    }

    // Carry-over never contains a whole delimiter, but its last
    // `delim.len() - 1` bytes may start one.
    let tail = stored.min(delim.len() - 1);
    if tail > 0 && !rest.is_empty() {
        let head = &rest[..rest.len().min(delim.len() - 1)];
        let mut window = Vec::with_capacity(tail + head.len());
        window.extend_from_slice(&pstate.carry_over()[stored - tail..]);
        window.extend_from_slice(head);
        if let Some(pos) = find_delimiter(&window, delim).filter(|&pos| pos < tail) {
            let mut field = pstate.take_carry_over();
            field.truncate(stored - tail + pos);
            output.push_owned(field_idx, field);
            *offset += pos + delim.len() - tail;
            return Ok(FieldStatus::Complete);
        }
    }

    if let Some(pos) = find_delimiter(rest, delim) {
        let mut field = pstate.take_carry_over();
        field.extend_from_slice(&rest[..pos]);
        output.push_owned(field_idx, field);
        *offset += pos + delim.len();
        return Ok(FieldStatus::Complete);
    }

    pstate.append_carry_over(rest)?;
    *offset += rest.len();
    Ok(FieldStatus::Incomplete)
}

/// Extract everything that remains once the direction has reached EOF.
///
/// Before EOF the input is moved to carry-over and
/// [`FieldStatus::Incomplete`] is returned. At EOF carry-over plus the
/// remaining input become one field, which may be empty.
pub fn parse_field_by_eof<'a>(
    output: &mut ParseOutput<'a>,
    pstate: &mut ParserState,
    field_idx: u16,
    input: &'a [u8],
    offset: &mut usize,
) -> Result<FieldStatus, FieldError> {
    let rest = remaining(input, *offset);

    if !pstate.is_eof() {
        pstate.append_carry_over(rest)?;
        *offset += rest.len();
        return Ok(FieldStatus::Incomplete);
    }

    if pstate.carry_over_len() == 0 {
        output.push_borrowed(field_idx, rest);
    } else {
        let mut field = pstate.take_carry_over();
        field.extend_from_slice(rest);
        output.push_owned(field_idx, field);
    }
    *offset += rest.len();
    Ok(FieldStatus::Complete)
}
