use smallvec::SmallVec;

use crate::protocol::ProtocolId;

/// Result of probing one direction so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// No verdict yet, more data may decide.
    Pending,
    /// A probe claimed the stream.
    Resolved(ProtocolId),
    /// Probing gave up; the direction stays unknown.
    Failed,
}

/// Probing state for one direction of one flow.
///
/// Buffers the stream prefix (never more than the chain's depth budget)
/// and remembers which probes have been ruled out.
#[derive(Debug, Clone)]
pub struct ProbeProgress {
    buffer: Vec<u8>,
    excluded: SmallVec<[bool; 8]>,
    outcome: ProbeOutcome,
}

impl ProbeProgress {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            excluded: SmallVec::new(),
            outcome: ProbeOutcome::Pending,
        }
    }

    pub fn outcome(&self) -> ProbeOutcome {
        self.outcome
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == ProbeOutcome::Failed
    }

    /// Append input to the prefix, up to `max_depth` buffered bytes.
    /// Returns how many bytes of `input` were taken.
    pub fn feed(&mut self, input: &[u8], max_depth: usize) -> usize {
        let room = max_depth.saturating_sub(self.buffer.len());
        let taken = input.len().min(room);
        self.buffer.extend_from_slice(&input[..taken]);
        taken
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Take the buffered prefix for replay into the parser.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    pub(crate) fn ensure_slots(&mut self, len: usize) {
        if self.excluded.len() < len {
            self.excluded.resize(len, false);
        }
    }

    pub fn is_excluded(&self, idx: usize) -> bool {
        self.excluded.get(idx).copied().unwrap_or(false)
    }

    pub(crate) fn exclude(&mut self, idx: usize) {
        if let Some(slot) = self.excluded.get_mut(idx) {
            *slot = true;
        }
    }

    pub(crate) fn all_excluded(&self) -> bool {
        self.excluded.iter().all(|&e| e)
    }

    pub(crate) fn resolve(&mut self, protocol: ProtocolId) {
        self.outcome = ProbeOutcome::Resolved(protocol);
    }

    /// Give up on the direction and release the prefix.
    pub(crate) fn fail(&mut self) {
        self.outcome = ProbeOutcome::Failed;
        self.buffer = Vec::new();
    }
}

impl Default for ProbeProgress {
    fn default() -> Self {
        Self::new()
    }
}
