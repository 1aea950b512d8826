use crate::error::FieldError;
use crate::protocol::ParserId;

/// Control flags for one direction of a flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStateFlags {
    /// The direction has been bound to its entry parser.
    pub in_use: bool,
    /// End of flow seen for this direction.
    pub eof: bool,
    /// Parser is done, further input is ignored.
    pub done: bool,
    /// No further payload inspection for this flow.
    pub no_inspection: bool,
    /// No further reassembly for this session.
    pub no_reassembly: bool,
}

/// Parser switch requested by a parser during a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParserSwitch {
    Local(u16),
    Entry,
}

/// Per-direction parser state.
///
/// Holds the active parser, bytes carried over between calls because they
/// do not form a complete field yet, and the direction's control flags.
#[derive(Debug, Clone)]
pub struct ParserState {
    cur_parser: Option<ParserId>,
    store: Vec<u8>,
    max_carry_over: usize,
    /// Sub-field cursor, free for the active parser to resume where it was.
    pub parse_field: u16,
    pub flags: ParserStateFlags,
    switch: Option<ParserSwitch>,
}

impl ParserState {
    pub fn new(max_carry_over: usize) -> Self {
        Self {
            cur_parser: None,
            store: Vec::new(),
            max_carry_over,
            parse_field: 0,
            flags: ParserStateFlags::default(),
            switch: None,
        }
    }

    /// Currently active parser, if the direction has been bound.
    pub fn current_parser(&self) -> Option<ParserId> {
        self.cur_parser
    }

    pub(crate) fn set_current_parser(&mut self, parser: ParserId) {
        self.cur_parser = Some(parser);
    }

    /// Bytes held over from earlier calls.
    pub fn carry_over(&self) -> &[u8] {
        &self.store
    }

    pub fn carry_over_len(&self) -> usize {
        self.store.len()
    }

    pub fn max_carry_over(&self) -> usize {
        self.max_carry_over
    }

    /// Append bytes to the carry-over buffer, enforcing the configured cap.
    pub fn append_carry_over(&mut self, data: &[u8]) -> Result<(), FieldError> {
        let needed = self.store.len() + data.len();
        if needed > self.max_carry_over {
            return Err(FieldError::CarryOverLimit {
                limit: self.max_carry_over,
                needed,
            });
        }
        self.store.extend_from_slice(data);
        Ok(())
    }

    /// Take the carry-over bytes, leaving the buffer empty.
    pub fn take_carry_over(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.store)
    }

    pub fn clear_carry_over(&mut self) {
        self.store.clear();
    }

    /// Ask the dispatcher to make the parser with `local_id` active after
    /// this call.
    pub fn switch_to(&mut self, local_id: u16) {
        self.switch = Some(ParserSwitch::Local(local_id));
    }

    /// Ask the dispatcher to return to the direction's entry parser.
    pub fn switch_to_entry(&mut self) {
        self.switch = Some(ParserSwitch::Entry);
    }

    pub(crate) fn take_switch(&mut self) -> Option<ParserSwitch> {
        self.switch.take()
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.flags.eof
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.flags.done
    }

    /// Stop payload inspection for the flow. With `no_reassembly` the
    /// caller may also stop reassembling the session.
    pub fn disable_inspection(&mut self, no_reassembly: bool) {
        self.flags.no_inspection = true;
        if no_reassembly {
            self.flags.no_reassembly = true;
        }
    }

    /// Stop parsing this direction after a fatal error.
    pub(crate) fn mark_failed(&mut self) {
        self.flags.done = true;
        self.flags.no_inspection = true;
        self.store = Vec::new();
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new(crate::stream::DEFAULT_MAX_CARRY_OVER)
    }
}
