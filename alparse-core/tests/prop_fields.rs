//! Splitting input at arbitrary points must not change the extracted fields.

use alparse_core::fields::{parse_field_by_delimiter, parse_field_by_eof, parse_field_by_size, FieldStatus};
use alparse_core::protocol::ParseOutput;
use alparse_core::state::ParserState;
use proptest::prelude::*;

/// Cut `data` at the given (unsorted, possibly repeated) positions.
fn split_at_points(data: &[u8], points: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = points.iter().map(|p| p % (data.len() + 1)).collect();
    cuts.push(0);
    cuts.push(data.len());
    cuts.sort_unstable();
    cuts.windows(2).map(|w| data[w[0]..w[1]].to_vec()).collect()
}

fn delimited_fields(chunks: &[Vec<u8>], delim: &[u8]) -> (Vec<Vec<u8>>, Vec<u8>) {
    let mut state = ParserState::new(1 << 16);
    let mut fields = Vec::new();
    for chunk in chunks {
        let mut out = ParseOutput::new();
        let mut offset = 0;
        while parse_field_by_delimiter(&mut out, &mut state, 1, delim, chunk, &mut offset)
            .unwrap()
            .is_complete()
        {}
        assert_eq!(offset, chunk.len());
        fields.extend(out.iter().map(|e| e.data().to_vec()));
    }
    (fields, state.carry_over().to_vec())
}

/// Reference split: complete fields plus the unterminated remainder.
fn reference_split(data: &[u8], delim: &[u8]) -> (Vec<Vec<u8>>, Vec<u8>) {
    let mut fields = Vec::new();
    let mut start = 0;
    while let Some(pos) = data[start..]
        .windows(delim.len())
        .position(|w| w == delim)
    {
        fields.push(data[start..start + pos].to_vec());
        start += pos + delim.len();
    }
    (fields, data[start..].to_vec())
}

fn sized_fields(chunks: &[Vec<u8>], sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut state = ParserState::new(1 << 16);
    let mut fields = Vec::new();
    for chunk in chunks {
        let mut out = ParseOutput::new();
        let mut offset = 0;
        loop {
            let size = sizes[(fields.len() + out.len()) % sizes.len()];
            match parse_field_by_size(&mut out, &mut state, 2, size, chunk, &mut offset).unwrap() {
                FieldStatus::Complete => continue,
                FieldStatus::Incomplete => break,
            }
        }
        fields.extend(out.iter().map(|e| e.data().to_vec()));
    }
    fields
}

fn reference_sized(data: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut fields = Vec::new();
    let mut start = 0;
    loop {
        let size = sizes[fields.len() % sizes.len()];
        if start + size > data.len() {
            return fields;
        }
        fields.push(data[start..start + size].to_vec());
        start += size;
    }
}

fn delimiter() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(b"\n".to_vec()),
        Just(b"\r\n".to_vec()),
        Just(b"abc".to_vec()),
        Just(b"aa".to_vec()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_delimiter_split_invariant(
        data in prop::collection::vec(prop::sample::select(b"abc\r\nx".to_vec()), 0..200),
        points in prop::collection::vec(any::<usize>(), 0..12),
        delim in delimiter(),
    ) {
        let chunks = split_at_points(&data, &points);
        let (fields, rest) = delimited_fields(&chunks, &delim);
        let (whole_fields, whole_rest) = delimited_fields(&[data.clone()], &delim);

        prop_assert_eq!(&fields, &whole_fields);
        prop_assert_eq!(&rest, &whole_rest);

        // Self-overlapping delimiters ("aa") are matched left to right,
        // exactly like the reference scan.
        let (expected, expected_rest) = reference_split(&data, &delim);
        prop_assert_eq!(fields, expected);
        prop_assert_eq!(rest, expected_rest);
    }

    #[test]
    fn prop_size_split_invariant(
        data in prop::collection::vec(any::<u8>(), 0..300),
        points in prop::collection::vec(any::<usize>(), 0..12),
        sizes in prop::collection::vec(1usize..16, 1..5),
    ) {
        let chunks = split_at_points(&data, &points);
        let fields = sized_fields(&chunks, &sizes);
        prop_assert_eq!(fields, reference_sized(&data, &sizes));
    }

    #[test]
    fn prop_eof_split_invariant(
        data in prop::collection::vec(any::<u8>(), 0..300),
        points in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let chunks = split_at_points(&data, &points);
        let mut state = ParserState::new(1 << 16);
        let last = chunks.len() - 1;
        let mut fields = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            if i == last {
                state.flags.eof = true;
            }
            let mut out = ParseOutput::new();
            let mut offset = 0;
            let status = parse_field_by_eof(&mut out, &mut state, 3, chunk, &mut offset).unwrap();
            prop_assert_eq!(status.is_complete(), i == last);
            prop_assert_eq!(offset, chunk.len());
            fields.extend(out.iter().map(|e| e.data().to_vec()));
        }

        prop_assert_eq!(fields, vec![data]);
    }

    #[test]
    fn prop_carry_over_limit_never_exceeded(
        data in prop::collection::vec(prop::sample::select(b"ab\n".to_vec()), 0..200),
        points in prop::collection::vec(any::<usize>(), 0..12),
        limit in 1usize..32,
    ) {
        let mut state = ParserState::new(limit);
        for chunk in split_at_points(&data, &points) {
            let mut out = ParseOutput::new();
            let mut offset = 0;
            loop {
                match parse_field_by_delimiter(&mut out, &mut state, 1, b"\n", &chunk, &mut offset) {
                    Ok(FieldStatus::Complete) => continue,
                    Ok(FieldStatus::Incomplete) | Err(_) => break,
                }
            }
            prop_assert!(state.carry_over_len() <= limit);
        }
    }
}
