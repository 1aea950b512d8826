//! Fuzz target for the streaming field helpers.
//!
//! The first byte picks the helper and its parameter, the second a chunk
//! size. The rest is fed once whole and once in chunks; both runs must
//! extract the same fields and leave the same carry-over.

#![no_main]

use alparse_core::fields::{parse_field_by_delimiter, parse_field_by_eof, parse_field_by_size};
use alparse_core::protocol::ParseOutput;
use alparse_core::state::ParserState;
use libfuzzer_sys::fuzz_target;

const DELIMITERS: [&[u8]; 4] = [b"\n", b"\r\n", b"\r\n\r\n", b"aa"];

fn run(mode: u8, chunks: &[&[u8]]) -> (Vec<Vec<u8>>, Vec<u8>) {
    let mut state = ParserState::new(1 << 20);
    let mut fields = Vec::new();
    let last = chunks.len().saturating_sub(1);

    for (i, chunk) in chunks.iter().enumerate() {
        let mut out = ParseOutput::new();
        let mut offset = 0;
        match mode % 3 {
            0 => {
                let delim = DELIMITERS[(mode as usize / 3) % DELIMITERS.len()];
                while let Ok(status) =
                    parse_field_by_delimiter(&mut out, &mut state, 1, delim, chunk, &mut offset)
                {
                    if !status.is_complete() {
                        break;
                    }
                }
            }
            1 => {
                let size = 1 + (mode as usize / 3) % 32;
                while let Ok(status) =
                    parse_field_by_size(&mut out, &mut state, 2, size, chunk, &mut offset)
                {
                    if !status.is_complete() {
                        break;
                    }
                }
            }
            _ => {
                state.flags.eof = i == last;
                let _ = parse_field_by_eof(&mut out, &mut state, 3, chunk, &mut offset);
            }
        }
        assert_eq!(offset, chunk.len());
        fields.extend(out.iter().map(|e| e.data().to_vec()));
    }
    (fields, state.carry_over().to_vec())
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let mode = data[0];
    let chunk_size = 1 + data[1] as usize % 16;
    let payload = &data[2..];

    let whole = run(mode, &[payload]);
    let chunks: Vec<&[u8]> = if payload.is_empty() {
        vec![payload]
    } else {
        payload.chunks(chunk_size).collect()
    };
    let split = run(mode, &chunks);

    assert_eq!(whole, split);
});
