//! Fuzz target for probing and dispatch.
//!
//! Registers a line protocol and a length-prefixed protocol on the same
//! port and feeds arbitrary bytes in both directions. Tests:
//! - Probe chains over arbitrary prefixes
//! - Replay of buffered prefixes once a protocol is detected
//! - Carry-over handling across chunk boundaries
//! - Cursor invariants after every call

#![no_main]

use std::sync::{Arc, OnceLock};

use alparse_core::prelude::*;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Count(u16);

struct Lines;

impl ProtocolParser for Lines {
    fn parse<'a>(
        &self,
        state: &mut ProtocolState,
        pstate: &mut ParserState,
        input: &'a [u8],
        output: &mut ParseOutput<'a>,
    ) -> ParserResult {
        let Some(count) = state.downcast_mut::<Count>() else {
            return Ok(ParseStatus::Fatal);
        };
        let mut offset = 0;
        loop {
            match parse_field_by_delimiter(output, pstate, 0, b"\r\n", input, &mut offset)? {
                FieldStatus::Complete => count.0 = count.0.saturating_add(1),
                FieldStatus::Incomplete => return Ok(ParseStatus::Ok),
            }
        }
    }
}

struct Framed;

impl ProtocolParser for Framed {
    fn parse<'a>(
        &self,
        _state: &mut ProtocolState,
        pstate: &mut ParserState,
        input: &'a [u8],
        output: &mut ParseOutput<'a>,
    ) -> ParserResult {
        let mut offset = 0;
        loop {
            // One length byte, then the body
            let size = if pstate.parse_field == 0 {
                1
            } else {
                pstate.parse_field as usize
            };
            match parse_field_by_size(output, pstate, 1, size, input, &mut offset)? {
                FieldStatus::Complete => {}
                FieldStatus::Incomplete => return Ok(ParseStatus::Incomplete),
            }
            if pstate.parse_field == 0 {
                let len = output.get(output.len() - 1).map_or(0, |e| e.data()[0]);
                if len == 0 {
                    return Ok(ParseStatus::Fatal);
                }
                pstate.parse_field = u16::from(len);
            } else {
                pstate.parse_field = 0;
            }
        }
    }
}

struct Transactions;

impl TransactionHooks for Transactions {
    fn update_transaction_id(&self, state: &mut ProtocolState, avail_id: &mut u16) {
        if let Some(count) = state.downcast_ref::<Count>() {
            *avail_id = count.0;
        }
    }
}

fn dispatcher() -> &'static Dispatcher {
    static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();
    DISPATCHER.get_or_init(|| {
        let mut builder = RegistryBuilder::new();
        let lines = builder
            .register_protocol("lines", Direction::ToServer, Lines)
            .unwrap();
        builder.register_protocol("lines", Direction::ToClient, Lines).unwrap();
        builder.register_state_funcs(lines, DefaultState::<Count>::new()).unwrap();
        builder.register_transaction_id_funcs(lines, Transactions).unwrap();
        builder.register_logger(lines).unwrap();

        let framed = builder
            .register_protocol("framed", Direction::ToServer, Framed)
            .unwrap();
        builder.register_protocol("framed", Direction::ToClient, Framed).unwrap();
        builder.register_state_funcs(framed, DefaultState::<()>::new()).unwrap();

        builder
            .register_probing_parser(
                ProbeRegistration::new("lines", 4000)
                    .priority(ProbePriority::High)
                    .depth(4, 32),
                |input: &[u8]| {
                    if input.iter().all(|b| b.is_ascii()) {
                        ProbeVerdict::Match
                    } else {
                        ProbeVerdict::NotThisProtocol
                    }
                },
            )
            .unwrap();
        builder
            .register_probing_parser(ProbeRegistration::new("framed", 4000).depth(1, 8), |input: &[u8]| {
                if input[0] != 0 {
                    ProbeVerdict::Match
                } else {
                    ProbeVerdict::NeedMoreData
                }
            })
            .unwrap();

        let config = DispatchConfig {
            max_carry_over: 4096,
            ..DispatchConfig::default()
        };
        Dispatcher::new(Arc::new(builder.build().unwrap()), config)
    })
}

fuzz_target!(|data: &[u8]| {
    let dispatcher = dispatcher();
    let mut flow = AppLayerFlow::new(4000);

    // Each chunk: one control byte (direction, eof, inspect/log), then up
    // to 15 payload bytes.
    let mut rest = data;
    while let Some((&control, tail)) = rest.split_first() {
        let len = (control as usize & 0x0f).min(tail.len());
        let (chunk, next) = tail.split_at(len);
        rest = next;

        let direction = if control & 0x10 == 0 {
            Direction::ToServer
        } else {
            Direction::ToClient
        };
        let flags = StreamFlags {
            direction,
            eof: control & 0x20 != 0,
        };
        let _ = dispatcher.parse(&mut flow, None, flags, chunk);

        if control & 0x40 != 0 {
            flow.update_inspect_id(direction);
        }
        if control & 0x80 != 0 {
            flow.update_logged_id();
        }
        if let Some(store) = flow.parser_state() {
            assert!(store.cursors().is_consistent());
        }
    }

    if let Some(cursors) = dispatcher.cleanup(&mut flow) {
        assert!(cursors.is_consistent());
    }
});
