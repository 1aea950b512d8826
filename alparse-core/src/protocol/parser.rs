use std::any::Any;
use std::marker::PhantomData;

use crate::error::ParseError;
use crate::state::ParserState;

use super::ParseOutput;

/// Per-flow state of one protocol, allocated by its [`StateLifecycle`].
///
/// Parsers downcast it to their concrete type with `downcast_mut`.
pub type ProtocolState = dyn Any + Send;

/// Default number of result elements a parser is expected to produce per call.
pub const DEFAULT_MAX_OUTPUTS: usize = 8;

/// Outcome of one parser invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// Input consumed; results (if any) are in the output list.
    Ok,
    /// Need more bytes; partial data sits in carry-over.
    Incomplete,
    /// The stream makes no sense to this parser; stop parsing the direction.
    Fatal,
}

/// Return type of [`ProtocolParser::parse`].
///
/// Helper failures convert into [`ParseError::Field`], so parsers can use `?`
/// on the field helpers.
pub type ParserResult = std::result::Result<ParseStatus, ParseError>;

/// Trait for application-layer parsers driven by the dispatcher.
pub trait ProtocolParser: Send + Sync {
    /// Parse `input` for one direction of a flow.
    ///
    /// `state` is the flow's protocol state, `pstate` the direction's
    /// parser state with its carry-over buffer. Fields go into `output`;
    /// elements may borrow `input` for the duration of the call. An error
    /// stops the direction like [`ParseStatus::Fatal`] and reaches the caller
    /// of the dispatcher unchanged.
    fn parse<'a>(
        &self,
        state: &mut ProtocolState,
        pstate: &mut ParserState,
        input: &'a [u8],
        output: &mut ParseOutput<'a>,
    ) -> ParserResult;

    /// Maximum number of elements produced per call (pre-sizes the output).
    fn max_outputs(&self) -> usize {
        DEFAULT_MAX_OUTPUTS
    }

    /// Capability flags recorded in the parser table.
    fn flags(&self) -> u8 {
        0
    }
}

/// Allocation and release of a protocol's per-flow state.
pub trait StateLifecycle: Send + Sync {
    fn alloc(&self) -> Box<ProtocolState>;

    fn free(&self, state: Box<ProtocolState>) {
        drop(state);
    }
}

/// Transaction id callbacks of a protocol.
pub trait TransactionHooks: Send + Sync {
    /// Report the newest transaction id of `state` by raising `avail_id`.
    fn update_transaction_id(&self, state: &mut ProtocolState, avail_id: &mut u16);

    /// Release transactions below `id`, the new oldest kept transaction.
    fn free_transactions(&self, _state: &mut ProtocolState, _id: u16) {}
}

/// [`StateLifecycle`] for any `Default` state type.
pub struct DefaultState<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DefaultState<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for DefaultState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StateLifecycle for DefaultState<T>
where
    T: Default + Send + 'static,
{
    fn alloc(&self) -> Box<ProtocolState> {
        Box::new(T::default())
    }
}
