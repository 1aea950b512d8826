//! Per-flow parser state and transaction bookkeeping.
//!
//! ## Components
//!
//! - [`ParserState`] - Active parser, carry-over bytes and flags for one direction
//! - [`ParserStateStore`] - Both directions plus the transaction cursors of a flow
//! - [`TransactionCursors`] - Base, available, inspected and logged watermarks

mod parser_state;
mod store;
mod transaction;

pub(crate) use parser_state::ParserSwitch;
pub use parser_state::{ParserState, ParserStateFlags};
pub use store::ParserStateStore;
pub use transaction::{TransactionCursors, TransactionIdFlags};
