//! # alparse-core
//!
//! Application-layer parsing framework for a network inspection engine.
//!
//! This crate sits between stream reassembly and the protocol parsers. It
//! decides which protocol a flow speaks, feeds each direction's bytes to
//! that protocol's parsers and keeps the transaction watermarks shared by
//! the inspection and logging engines. It contains no protocol parsers of
//! its own.
//!
//! ## Features
//!
//! - **Parser Registry**: Protocols, per-direction entry parsers, local
//!   parsers with dependencies, frozen once built and shared between workers
//! - **Protocol Probing**: Per-port, priority-ordered detector chains with
//!   depth windows
//! - **Streaming Field Helpers**: Fields by size, delimiter or end of stream
//!   across arbitrary segment boundaries
//! - **Nested Dispatch**: Result elements routed into sub-parsers
//! - **Transaction Cursors**: Inspection, logging and pruning watermarks
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use alparse_core::prelude::*;
//!
//! struct Greeting;
//!
//! impl ProtocolParser for Greeting {
//!     fn parse<'a>(
//!         &self,
//!         _state: &mut ProtocolState,
//!         pstate: &mut ParserState,
//!         input: &'a [u8],
//!         output: &mut ParseOutput<'a>,
//!     ) -> ParserResult {
//!         let mut offset = 0;
//!         parse_field_by_size(output, pstate, 0, 5, input, &mut offset)?;
//!         Ok(ParseStatus::Ok)
//!     }
//! }
//!
//! let mut builder = RegistryBuilder::new();
//! let hello = builder.register_protocol("hello", Direction::ToServer, Greeting).unwrap();
//! builder.register_state_funcs(hello, DefaultState::<()>::new()).unwrap();
//! builder
//!     .register_probing_parser(ProbeRegistration::new("hello", 4242), |input: &[u8]| {
//!         if input.starts_with(b"HI") {
//!             ProbeVerdict::Match
//!         } else {
//!             ProbeVerdict::NotThisProtocol
//!         }
//!     })
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::with_defaults(Arc::new(builder.build().unwrap()));
//! let mut flow = AppLayerFlow::new(4242);
//! let status = dispatcher
//!     .parse(&mut flow, None, StreamFlags::to_server(), b"HI TH")
//!     .unwrap();
//! assert_eq!(status, DispatchStatus::Parsed);
//! assert_eq!(flow.protocol(), Some(hello));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        alparse-core                                 |
//! +---------------------------------------------------------------------+
//! |  protocol/   - Parser traits, registry, result elements             |
//! |  probe/      - Probe chains and per-flow probing progress           |
//! |  state/      - Parser state, state store, transaction cursors       |
//! |  fields      - Streaming field extraction helpers                   |
//! |  stream/     - Flow state, dispatcher, configuration                |
//! |  error/      - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```

pub mod error;
pub mod fields;
pub mod prelude;
pub mod probe;
pub mod protocol;
pub mod state;
pub mod stream;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, FieldError, ParseError, RegistrationError, Result};
pub use fields::{parse_field_by_delimiter, parse_field_by_eof, parse_field_by_size, FieldStatus};
pub use probe::{
    ProbeDirection, ProbeOrdering, ProbeOutcome, ProbePriority, ProbeRegistration, ProbeVerdict,
    Prober,
};
pub use protocol::{
    DefaultState, FieldData, OwnedResultElement, ParseOutput, ParseStatus, ParserEntry, ParserId,
    ParserResult, ProtocolDescriptor, ProtocolId, ProtocolParser, ProtocolState, Registry,
    RegistryBuilder, ResultElement, StateLifecycle, TransactionHooks, RESULT_ELEMENT_ALLOC,
};
pub use state::{ParserState, ParserStateFlags, ParserStateStore, TransactionCursors, TransactionIdFlags};
pub use stream::{
    AppLayerFlow, DispatchConfig, DispatchStatus, Dispatcher, Direction, StreamFlags,
    DEFAULT_MAX_CARRY_OVER,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
