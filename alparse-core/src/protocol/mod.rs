//! Protocol and parser registration.
//!
//! A protocol owns one entry parser per direction plus any number of local
//! parsers addressed by a small per-protocol id. Local parsers are reached
//! either by nested dispatch (a result element whose `name_idx` maps to a
//! local parser) or by the active parser handing over with
//! [`ParserState::switch_to`](crate::state::ParserState::switch_to).
//!
//! ## Registering a protocol
//!
//! ```rust
//! use alparse_core::prelude::*;
//!
//! struct Echo;
//!
//! impl ProtocolParser for Echo {
//!     fn parse<'a>(
//!         &self,
//!         _state: &mut ProtocolState,
//!         _pstate: &mut ParserState,
//!         input: &'a [u8],
//!         output: &mut ParseOutput<'a>,
//!     ) -> ParserResult {
//!         output.push_borrowed(0, input);
//!         Ok(ParseStatus::Ok)
//!     }
//! }
//!
//! let mut builder = RegistryBuilder::new();
//! let echo = builder.register_protocol("echo", Direction::ToServer, Echo).unwrap();
//! builder.register_state_funcs(echo, DefaultState::<()>::new()).unwrap();
//! let registry = builder.build().unwrap();
//! assert_eq!(registry.protocol_by_name("echo"), Some(echo));
//! ```

mod parser;
mod registry;
mod result;

pub use parser::{
    DefaultState, ParseStatus, ParserResult, ProtocolParser, ProtocolState, StateLifecycle,
    TransactionHooks, DEFAULT_MAX_OUTPUTS,
};
pub use registry::{
    ParserEntry, ParserId, ProtocolDescriptor, ProtocolId, Registry, RegistryBuilder,
};
pub use result::{FieldData, OwnedResultElement, ParseOutput, ResultElement, RESULT_ELEMENT_ALLOC};
