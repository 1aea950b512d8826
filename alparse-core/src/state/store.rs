use crate::stream::Direction;

use super::{ParserState, TransactionCursors};

/// Per-flow parser state: one [`ParserState`] per direction plus the
/// transaction cursors.
#[derive(Debug, Clone)]
pub struct ParserStateStore {
    to_server: ParserState,
    to_client: ParserState,
    cursors: TransactionCursors,
}

impl ParserStateStore {
    pub fn new(max_carry_over: usize) -> Self {
        Self {
            to_server: ParserState::new(max_carry_over),
            to_client: ParserState::new(max_carry_over),
            cursors: TransactionCursors::new(),
        }
    }

    pub fn state(&self, direction: Direction) -> &ParserState {
        match direction {
            Direction::ToServer => &self.to_server,
            Direction::ToClient => &self.to_client,
        }
    }

    pub fn state_mut(&mut self, direction: Direction) -> &mut ParserState {
        match direction {
            Direction::ToServer => &mut self.to_server,
            Direction::ToClient => &mut self.to_client,
        }
    }

    pub fn cursors(&self) -> &TransactionCursors {
        &self.cursors
    }

    pub fn cursors_mut(&mut self) -> &mut TransactionCursors {
        &mut self.cursors
    }

    /// Split borrow of one direction's state and the cursors.
    pub(crate) fn split_mut(
        &mut self,
        direction: Direction,
    ) -> (&mut ParserState, &mut TransactionCursors) {
        let state = match direction {
            Direction::ToServer => &mut self.to_server,
            Direction::ToClient => &mut self.to_client,
        };
        (state, &mut self.cursors)
    }

    /// True once both directions have seen end of flow.
    pub fn both_eof(&self) -> bool {
        self.to_server.is_eof() && self.to_client.is_eof()
    }

    /// True if either direction asked to stop payload inspection.
    pub fn no_inspection(&self) -> bool {
        self.to_server.flags.no_inspection || self.to_client.flags.no_inspection
    }

    /// True if either direction asked to stop reassembly.
    pub fn no_reassembly(&self) -> bool {
        self.to_server.flags.no_reassembly || self.to_client.flags.no_reassembly
    }
}
