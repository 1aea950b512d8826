//! Protocol probing.
//!
//! When a port is not bound to exactly one protocol, the first bytes of each
//! direction are run through a per-port chain of lightweight detectors
//! ([`Prober`]) until one of them claims the stream or the chain's depth
//! budget runs out.
//!
//! ## Components
//!
//! - [`Prober`] - Detector trait, implemented for plain functions and closures
//! - [`ProbeChain`] - Priority-ordered detectors for one port and direction
//! - [`ProbingParsers`] - Port-indexed table of chains, frozen with the registry
//! - [`ProbeProgress`] - Per-flow, per-direction prefix buffer and exclusions
//!
//! ## Example
//!
//! ```rust
//! use alparse_core::probe::{ProbeVerdict, Prober};
//!
//! fn looks_like_http(input: &[u8]) -> ProbeVerdict {
//!     if input.len() < 4 {
//!         ProbeVerdict::NeedMoreData
//!     } else if input.starts_with(b"GET ") || input.starts_with(b"POST") {
//!         ProbeVerdict::Match
//!     } else {
//!         ProbeVerdict::NotThisProtocol
//!     }
//! }
//!
//! assert_eq!(looks_like_http.probe(b"GET /"), ProbeVerdict::Match);
//! ```

mod chain;
mod progress;

pub use chain::{PortProbes, ProbeChain, ProbeElement, ProbingParsers};
pub use progress::{ProbeOutcome, ProbeProgress};

/// Verdict of one detector on the bytes seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// The stream belongs to the probe's protocol.
    Match,
    /// The stream is definitely not this protocol; do not ask again.
    NotThisProtocol,
    /// Undecided, try again with more data.
    NeedMoreData,
}

/// Probe priority. Lower value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProbePriority {
    High = 1,
    Medium = 2,
    Low = 3,
}

/// Directions a probe is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeDirection {
    ToServer,
    ToClient,
    Both,
}

/// How priority interacts with depth requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeOrdering {
    /// A higher-priority probe that is still undecided, or still waiting
    /// for its minimum depth, blocks every lower-priority probe.
    #[default]
    Strict,
    /// Only probes whose minimum depth is already satisfied take part;
    /// among those the first verdict in priority order wins.
    DepthSatisfied,
}

/// Lightweight protocol detector.
pub trait Prober: Send + Sync {
    /// Inspect a prefix of one direction of the stream.
    fn probe(&self, input: &[u8]) -> ProbeVerdict;
}

impl<F> Prober for F
where
    F: Fn(&[u8]) -> ProbeVerdict + Send + Sync,
{
    fn probe(&self, input: &[u8]) -> ProbeVerdict {
        self(input)
    }
}

/// Registration parameters for one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRegistration {
    /// Name of the protocol the probe detects.
    pub protocol: String,
    pub port: u16,
    pub direction: ProbeDirection,
    pub priority: ProbePriority,
    /// Put the probe in front of other probes of equal priority.
    pub top: bool,
    /// Bytes required before the probe is invoked.
    pub min_depth: usize,
    /// Bytes after which the probe is no longer invoked.
    pub max_depth: usize,
}

impl ProbeRegistration {
    pub fn new(protocol: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            port,
            direction: ProbeDirection::Both,
            priority: ProbePriority::Medium,
            top: false,
            min_depth: 1,
            max_depth: 256,
        }
    }

    pub fn direction(mut self, direction: ProbeDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn priority(mut self, priority: ProbePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn top(mut self, top: bool) -> Self {
        self.top = top;
        self
    }

    pub fn depth(mut self, min_depth: usize, max_depth: usize) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }
}
