use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::protocol::ProtocolId;
use crate::stream::Direction;

use super::{ProbeOrdering, ProbeOutcome, ProbePriority, ProbeProgress, ProbeVerdict, Prober};

/// One registered probe in a chain.
#[derive(Clone)]
pub struct ProbeElement {
    pub protocol: ProtocolId,
    pub protocol_name: CompactString,
    pub port: u16,
    pub priority: ProbePriority,
    pub top: bool,
    pub min_depth: usize,
    pub max_depth: usize,
    pub(crate) prober: Arc<dyn Prober>,
}

impl fmt::Debug for ProbeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeElement")
            .field("protocol", &self.protocol_name)
            .field("port", &self.port)
            .field("priority", &self.priority)
            .field("top", &self.top)
            .field("min_depth", &self.min_depth)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Priority-ordered probes for one port and direction.
#[derive(Debug, Clone, Default)]
pub struct ProbeChain {
    elements: SmallVec<[ProbeElement; 4]>,
    /// Largest `max_depth` of any probe in the chain.
    max_depth: usize,
}

impl ProbeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping priority order. A `top` probe goes in front of the
    /// probes of equal priority, otherwise registration order is kept.
    pub fn insert(&mut self, element: ProbeElement) {
        let priority = element.priority;
        let pos = if element.top {
            self.elements.iter().position(|e| e.priority >= priority)
        } else {
            self.elements.iter().position(|e| e.priority > priority)
        };
        self.max_depth = self.max_depth.max(element.max_depth);
        match pos {
            Some(pos) => self.elements.insert(pos, element),
            None => self.elements.push(element),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProbeElement> {
        self.elements.iter()
    }

    /// Run the chain over the prefix buffered in `progress`.
    ///
    /// A probe is only invoked once the prefix reaches its `min_depth` and
    /// never sees more than its `max_depth` bytes. The direction fails for
    /// good once every probe is excluded or the prefix reaches the chain's
    /// `max_depth` without a match.
    pub fn run(&self, progress: &mut ProbeProgress, ordering: ProbeOrdering) -> ProbeOutcome {
        match progress.outcome() {
            ProbeOutcome::Pending => {}
            settled => return settled,
        }
        progress.ensure_slots(self.elements.len());

        let len = progress.buffered_len();
        for (idx, element) in self.elements.iter().enumerate() {
            if progress.is_excluded(idx) {
                continue;
            }
            if len < element.min_depth {
                match ordering {
                    ProbeOrdering::Strict => break,
                    ProbeOrdering::DepthSatisfied => continue,
                }
            }

            let window = &progress.buffer()[..len.min(element.max_depth)];
            let verdict = element.prober.probe(window);
            trace!(
                protocol = element.protocol_name.as_str(),
                port = element.port,
                len = window.len(),
                ?verdict,
                "probe invoked"
            );

            match verdict {
                ProbeVerdict::Match => {
                    progress.resolve(element.protocol);
                    return ProbeOutcome::Resolved(element.protocol);
                }
                ProbeVerdict::NotThisProtocol => progress.exclude(idx),
                ProbeVerdict::NeedMoreData => {
                    if len >= element.max_depth {
                        progress.exclude(idx);
                    } else if ordering == ProbeOrdering::Strict {
                        break;
                    }
                }
            }
        }

        if progress.all_excluded() || len >= self.max_depth {
            debug!(len, max_depth = self.max_depth, "probing exhausted");
            progress.fail();
            return ProbeOutcome::Failed;
        }
        ProbeOutcome::Pending
    }
}

/// Probe chains registered for one port.
#[derive(Debug, Clone, Default)]
pub struct PortProbes {
    pub port: u16,
    pub to_server: ProbeChain,
    pub to_client: ProbeChain,
}

impl PortProbes {
    pub fn chain(&self, direction: Direction) -> &ProbeChain {
        match direction {
            Direction::ToServer => &self.to_server,
            Direction::ToClient => &self.to_client,
        }
    }

    pub(crate) fn chain_mut(&mut self, direction: Direction) -> &mut ProbeChain {
        match direction {
            Direction::ToServer => &mut self.to_server,
            Direction::ToClient => &mut self.to_client,
        }
    }

    /// Largest depth over all probes for the direction.
    pub fn max_depth(&self, direction: Direction) -> usize {
        self.chain(direction).max_depth()
    }
}

/// All probe chains, indexed by port.
#[derive(Debug, Clone, Default)]
pub struct ProbingParsers {
    ports: HashMap<u16, PortProbes>,
}

impl ProbingParsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, direction: Direction, element: ProbeElement) {
        let port = element.port;
        self.ports
            .entry(port)
            .or_insert_with(|| PortProbes {
                port,
                ..PortProbes::default()
            })
            .chain_mut(direction)
            .insert(element);
    }

    pub fn port(&self, port: u16) -> Option<&PortProbes> {
        self.ports.get(&port)
    }

    /// Non-empty chain for the port and direction.
    pub fn chain(&self, port: u16, direction: Direction) -> Option<&ProbeChain> {
        self.ports
            .get(&port)
            .map(|p| p.chain(direction))
            .filter(|c| !c.is_empty())
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Total number of chain elements over all ports and directions.
    pub fn probe_count(&self) -> usize {
        self.ports
            .values()
            .map(|p| p.to_server.len() + p.to_client.len())
            .sum()
    }
}
