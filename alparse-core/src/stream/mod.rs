//! Flow-level dispatch of reassembled stream data.
//!
//! ## Components
//!
//! - [`AppLayerFlow`] - Application-layer state of one flow (protocol, probing, parser state)
//! - [`Dispatcher`] - Resolves the protocol and drives the registered parsers
//! - [`DispatchConfig`] - Carry-over cap, nesting bound and probe ordering
//! - [`StreamFlags`] - Direction and end-of-stream marker for each chunk
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use alparse_core::prelude::*;
//!
//! struct Lines;
//!
//! impl ProtocolParser for Lines {
//!     fn parse<'a>(
//!         &self,
//!         _state: &mut ProtocolState,
//!         pstate: &mut ParserState,
//!         input: &'a [u8],
//!         output: &mut ParseOutput<'a>,
//!     ) -> ParserResult {
//!         let mut offset = 0;
//!         while parse_field_by_delimiter(output, pstate, 0, b"\n", input, &mut offset)?.is_complete() {}
//!         Ok(ParseStatus::Ok)
//!     }
//! }
//!
//! let mut builder = RegistryBuilder::new();
//! let lines = builder.register_protocol("lines", Direction::ToServer, Lines).unwrap();
//! builder.register_state_funcs(lines, DefaultState::<()>::new()).unwrap();
//! let dispatcher = Dispatcher::with_defaults(Arc::new(builder.build().unwrap()));
//!
//! let mut flow = AppLayerFlow::with_protocol(7000, lines);
//! let status = dispatcher
//!     .parse(&mut flow, None, StreamFlags::to_server(), b"hello\nwor")
//!     .unwrap();
//! assert_eq!(status, DispatchStatus::Parsed);
//! assert_eq!(flow.parser_state().unwrap().state(Direction::ToServer).carry_over(), b"wor");
//! ```

mod context;
mod dispatch;
mod flow;

pub use context::{Direction, StreamFlags};
pub use dispatch::{
    DispatchConfig, DispatchStatus, Dispatcher, DEFAULT_MAX_CARRY_OVER, DEFAULT_MAX_NESTING_DEPTH,
};
pub use flow::AppLayerFlow;
