//! Per-flow transaction progress cursors.
//!
//! Four monotonic `u16` watermarks:
//!
//! - `base_id` - oldest transaction still retained by the protocol state
//! - `avail_id` - newest transaction created by the parser
//! - `inspect_id` - highest transaction fully inspected (inspection engine)
//! - `logged_id` - highest transaction logged (logging engine)
//!
//! `base_id <= inspect_id <= avail_id` and `base_id <= logged_id <= avail_id`
//! hold after every operation and no cursor ever moves backwards.

use crate::stream::Direction;

/// Flags related to the transaction ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionIdFlags {
    /// Flow is done, the last transaction is complete as well.
    pub eof: bool,
    /// Transaction after `inspect_id` has been inspected to server.
    pub inspected_to_server: bool,
    /// Transaction after `inspect_id` has been inspected to client.
    pub inspected_to_client: bool,
}

/// Transaction watermarks for one flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionCursors {
    base_id: u16,
    avail_id: u16,
    inspect_id: u16,
    logged_id: u16,
    flags: TransactionIdFlags,
}

impl TransactionCursors {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn base_id(&self) -> u16 {
        self.base_id
    }

    #[inline]
    pub fn avail_id(&self) -> u16 {
        self.avail_id
    }

    #[inline]
    pub fn inspect_id(&self) -> u16 {
        self.inspect_id
    }

    #[inline]
    pub fn logged_id(&self) -> u16 {
        self.logged_id
    }

    pub fn flags(&self) -> TransactionIdFlags {
        self.flags
    }

    pub fn is_eof(&self) -> bool {
        self.flags.eof
    }

    /// Highest id the logger may log: everything once the flow is done,
    /// otherwise only what has been inspected.
    pub fn loggable_id(&self) -> u16 {
        if self.flags.eof {
            self.avail_id
        } else {
            self.inspect_id
        }
    }

    pub(crate) fn set_eof(&mut self) {
        self.flags.eof = true;
    }

    /// Move `avail_id` forward to the id reported by the protocol state.
    /// Lower ids are ignored. Returns true if the cursor moved.
    pub(crate) fn advance_avail(&mut self, reported: u16) -> bool {
        if reported > self.avail_id {
            self.avail_id = reported;
            true
        } else {
            false
        }
    }

    /// Mark the next transaction inspected in `direction`.
    ///
    /// `inspect_id` advances once both directions have been marked.
    /// Returns true if it advanced.
    pub fn update_inspect_id(&mut self, direction: Direction) -> bool {
        if self.inspect_id >= self.avail_id {
            return false;
        }
        match direction {
            Direction::ToServer => self.flags.inspected_to_server = true,
            Direction::ToClient => self.flags.inspected_to_client = true,
        }
        if self.flags.inspected_to_server && self.flags.inspected_to_client {
            self.flags.inspected_to_server = false;
            self.flags.inspected_to_client = false;
            self.inspect_id += 1;
            true
        } else {
            false
        }
    }

    /// Advance `logged_id` by one if a loggable transaction is pending.
    pub fn update_logged_id(&mut self) -> Option<u16> {
        if self.logged_id < self.loggable_id() {
            self.logged_id += 1;
            Some(self.logged_id)
        } else {
            None
        }
    }

    /// Id up to which retained transactions could be released now.
    ///
    /// With a logger attached both consumers must be done with a
    /// transaction; without one only the inspection engine counts.
    pub fn prune_limit(&self, has_logger: bool) -> u16 {
        if has_logger {
            self.inspect_id.min(self.logged_id)
        } else {
            self.inspect_id
        }
    }

    /// Advance `base_id` to [`prune_limit`](Self::prune_limit).
    ///
    /// Without a logger `logged_id` is raised along with the base so it never
    /// trails behind it. Returns the new base if it moved.
    pub(crate) fn prune(&mut self, has_logger: bool) -> Option<u16> {
        let limit = self.prune_limit(has_logger);
        if limit <= self.base_id {
            return None;
        }
        self.base_id = limit;
        if self.logged_id < self.base_id {
            self.logged_id = self.base_id;
        }
        Some(self.base_id)
    }

    /// Check the ordering invariants.
    pub fn is_consistent(&self) -> bool {
        self.base_id <= self.inspect_id
            && self.inspect_id <= self.avail_id
            && self.base_id <= self.logged_id
            && self.logged_id <= self.avail_id
    }
}
