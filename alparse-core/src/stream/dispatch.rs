use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Error, ParseError, Result};
use crate::probe::{ProbeOrdering, ProbeOutcome};
use crate::protocol::{
    ParseOutput, ParseStatus, ParserId, ProtocolDescriptor, ProtocolId, ProtocolState, Registry,
};
use crate::state::{ParserState, ParserStateStore, ParserSwitch, TransactionCursors};

use super::{AppLayerFlow, Direction, StreamFlags};

/// Default per-direction carry-over cap.
pub const DEFAULT_MAX_CARRY_OVER: usize = 16 * 1024 * 1024;

/// Default bound on nested field dispatch.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 8;

/// Configuration for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum carry-over per flow direction (bytes).
    pub max_carry_over: usize,
    /// Maximum depth of nested parser invocations.
    pub max_nesting_depth: usize,
    /// How probe priority interacts with minimum depths.
    pub probe_ordering: ProbeOrdering,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_carry_over: DEFAULT_MAX_CARRY_OVER, // 16 MB per direction
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            probe_ordering: ProbeOrdering::Strict,
        }
    }
}

/// Outcome of one [`Dispatcher::parse`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Data was handed to the protocol's parser.
    Parsed,
    /// Protocol not known yet; the bytes are buffered for probing.
    Probing,
    /// Protocol detection failed for this direction; the bytes were dropped.
    Unknown,
    /// The protocol has no parser for this direction.
    NoParser,
    /// The direction's parser is done; the bytes were ignored.
    Done,
}

/// Protocol selected for a call plus bytes to feed ahead of the input.
enum Resolution {
    Ready {
        protocol: ProtocolId,
        replay: Vec<u8>,
        /// Input bytes already contained in `replay`.
        skip: usize,
    },
    Stop(DispatchStatus),
}

/// Drives reassembled stream data through the registered parsers.
///
/// Stateless apart from the shared registry and configuration; all
/// per-flow state lives in the [`AppLayerFlow`] passed to each call.
pub struct Dispatcher {
    registry: Arc<Registry>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    /// Create with default config.
    pub fn with_defaults(registry: Arc<Registry>) -> Self {
        Self::new(registry, DispatchConfig::default())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Parse one chunk of data for one direction of a flow.
    ///
    /// `protocol` selects the protocol of a flow that has none cached yet;
    /// once cached, the flow keeps its protocol and a different `protocol`
    /// is ignored. With neither the direction is probed first. A parser
    /// failure disables the direction and is returned as an error; the flow
    /// itself stays usable.
    pub fn parse(
        &self,
        flow: &mut AppLayerFlow,
        protocol: Option<ProtocolId>,
        flags: StreamFlags,
        input: &[u8],
    ) -> Result<DispatchStatus> {
        let direction = flags.direction;

        // 1. Resolve protocol
        let (proto_id, mut replay, skip) = match self.resolve(flow, protocol, direction, input) {
            Resolution::Ready {
                protocol,
                replay,
                skip,
            } => (protocol, replay, skip),
            Resolution::Stop(status) => return Ok(status),
        };
        let Some(descriptor) = self.registry.protocol(proto_id) else {
            return Ok(DispatchStatus::NoParser);
        };

        let rest = &input[skip..];
        let data: &[u8] = if replay.is_empty() {
            rest
        } else {
            replay.extend_from_slice(rest);
            &replay
        };

        // 2. Parser state store and direction state
        let max_carry_over = self.config.max_carry_over;
        let store = flow
            .store
            .get_or_insert_with(|| ParserStateStore::new(max_carry_over));
        {
            let pstate = store.state_mut(direction);
            if !pstate.flags.in_use {
                let Some(entry) = descriptor.entry_parser(direction) else {
                    return Ok(DispatchStatus::NoParser);
                };
                pstate.set_current_parser(entry);
                pstate.flags.in_use = true;
            }

            // 3. Done directions ignore input
            if pstate.is_done() {
                return Ok(DispatchStatus::Done);
            }

            // 4. End of stream
            if flags.eof {
                pstate.flags.eof = true;
            }
        }
        if store.both_eof() {
            store.cursors_mut().set_eof();
        }

        // 5. Protocol state
        let slot_id = descriptor.storage_id();
        if flow.storage.len() <= slot_id {
            let size = self.registry.storage_size().max(slot_id + 1);
            flow.storage.resize_with(size, || None);
        }
        let slot = &mut flow.storage[slot_id];
        if slot.is_none() {
            let Some(lifecycle) = descriptor.lifecycle() else {
                return Ok(DispatchStatus::NoParser);
            };
            *slot = Some(lifecycle.alloc());
        }
        let Some(state) = slot.as_deref_mut() else {
            return Ok(DispatchStatus::NoParser);
        };

        // 6-8. Invoke, nested dispatch, parser chaining
        let (pstate, cursors) = store.split_mut(direction);
        let Some(parser_id) = pstate.current_parser() else {
            return Ok(DispatchStatus::NoParser);
        };
        let outcome = match self.run_parser(descriptor, parser_id, state, pstate, data, direction, 0) {
            Ok(switch) => self.apply_switch(descriptor, parser_id, pstate, direction, switch),
            Err(err) => Err(err),
        };

        // 9. Fatal: stop this direction only
        if let Err(err) = outcome {
            warn!(
                protocol = descriptor.name(),
                parser = self.parser_name(parser_id),
                direction = direction.as_str(),
                error = %err,
                "app-layer parser failed, disabling direction"
            );
            pstate.mark_failed();
            return Err(err);
        }

        // 10. Transaction ids
        if let Some(hooks) = descriptor.transactions() {
            let mut avail = cursors.avail_id();
            hooks.update_transaction_id(state, &mut avail);
            cursors.advance_avail(avail);
        }
        if let Some(base) = cursors.prune(descriptor.has_logger()) {
            trace!(protocol = descriptor.name(), base, "transactions released");
            if let Some(hooks) = descriptor.transactions() {
                hooks.free_transactions(state, base);
            }
        }

        Ok(DispatchStatus::Parsed)
    }

    /// Tear down the application-layer state of a flow.
    ///
    /// Marks the transactions done, releases what can be released, frees
    /// all protocol state and returns the final cursors. Returns `None` if
    /// the flow has no parser state (never parsed or already cleaned up).
    pub fn cleanup(&self, flow: &mut AppLayerFlow) -> Option<TransactionCursors> {
        let mut store = flow.store.take()?;
        let cursors = store.cursors_mut();
        cursors.set_eof();

        if let Some(descriptor) = flow.alproto.and_then(|id| self.registry.protocol(id)) {
            if let Some(base) = cursors.prune(descriptor.has_logger()) {
                let state = flow
                    .storage
                    .get_mut(descriptor.storage_id())
                    .and_then(|slot| slot.as_deref_mut());
                if let (Some(hooks), Some(state)) = (descriptor.transactions(), state) {
                    hooks.free_transactions(state, base);
                }
            }
        }

        for (idx, slot) in flow.storage.iter_mut().enumerate() {
            let Some(state) = slot.take() else {
                continue;
            };
            match self
                .registry
                .protocol(ProtocolId::from_index(idx))
                .and_then(|p| p.lifecycle())
            {
                Some(lifecycle) => lifecycle.free(state),
                None => drop(state),
            }
        }

        let cursors = *store.cursors();
        debug!(
            base_id = cursors.base_id(),
            avail_id = cursors.avail_id(),
            "app-layer flow cleaned up"
        );
        Some(cursors)
    }

    fn resolve(
        &self,
        flow: &mut AppLayerFlow,
        explicit: Option<ProtocolId>,
        direction: Direction,
        input: &[u8],
    ) -> Resolution {
        if let Some(requested) = explicit {
            let id = match flow.alproto {
                Some(current) if current != requested => {
                    debug!(
                        port = flow.port,
                        protocol = current.as_u16(),
                        requested = requested.as_u16(),
                        "flow protocol already set, ignoring requested protocol"
                    );
                    current
                }
                _ => requested,
            };
            flow.alproto = Some(id);
            return Resolution::Ready {
                protocol: id,
                replay: flow.probe_progress_mut(direction).take_buffer(),
                skip: 0,
            };
        }

        if let Some(id) = flow.alproto {
            if flow.probe_progress(direction).is_failed() {
                return Resolution::Stop(DispatchStatus::Unknown);
            }
            // Prefix this direction buffered while the other one resolved
            return Resolution::Ready {
                protocol: id,
                replay: flow.probe_progress_mut(direction).take_buffer(),
                skip: 0,
            };
        }

        match self.probe(flow, direction, input) {
            (ProbeOutcome::Pending, _) => Resolution::Stop(DispatchStatus::Probing),
            (ProbeOutcome::Failed, _) => Resolution::Stop(DispatchStatus::Unknown),
            (ProbeOutcome::Resolved(id), taken) => {
                flow.alproto = Some(id);
                Resolution::Ready {
                    protocol: id,
                    replay: flow.probe_progress_mut(direction).take_buffer(),
                    skip: taken,
                }
            }
        }
    }

    /// Feed input to the direction's probe chain. Returns the outcome and
    /// how many input bytes were buffered.
    fn probe(
        &self,
        flow: &mut AppLayerFlow,
        direction: Direction,
        input: &[u8],
    ) -> (ProbeOutcome, usize) {
        let port = flow.port;
        let chain = self.registry.probes().chain(port, direction);
        let progress = flow.probe_progress_mut(direction);
        if progress.outcome() != ProbeOutcome::Pending {
            return (progress.outcome(), 0);
        }

        let Some(chain) = chain else {
            debug!(port, direction = direction.as_str(), "no probing parsers for port");
            progress.fail();
            return (ProbeOutcome::Failed, 0);
        };

        let taken = progress.feed(input, chain.max_depth());
        let outcome = chain.run(progress, self.config.probe_ordering);
        match outcome {
            ProbeOutcome::Resolved(id) => debug!(
                port,
                direction = direction.as_str(),
                protocol = ?self.registry.protocol(id).map(|p| p.name()),
                "protocol detected by probing"
            ),
            ProbeOutcome::Failed => debug!(
                port,
                direction = direction.as_str(),
                "protocol detection failed"
            ),
            ProbeOutcome::Pending => {}
        }
        (outcome, taken)
    }

    /// Run one parser and, recursively, the local parsers its result
    /// elements map to. Returns the parser switch requested by the
    /// top-level call.
    #[allow(clippy::too_many_arguments)]
    fn run_parser(
        &self,
        descriptor: &ProtocolDescriptor,
        parser_id: ParserId,
        state: &mut ProtocolState,
        pstate: &mut ParserState,
        input: &[u8],
        direction: Direction,
        depth: usize,
    ) -> Result<Option<ParserSwitch>> {
        let Some(entry) = self.registry.parser(parser_id) else {
            return Err(self.fatal(descriptor, parser_id, direction));
        };

        let mut output = ParseOutput::with_capacity(entry.max_outputs());
        let result = entry.parser().parse(state, pstate, input, &mut output);
        trace!(
            protocol = descriptor.name(),
            parser = entry.name(),
            len = input.len(),
            outputs = output.len(),
            ?result,
            depth,
            "parser invoked"
        );
        let switch = pstate.take_switch();
        match result {
            Ok(ParseStatus::Fatal) => return Err(self.fatal(descriptor, parser_id, direction)),
            Err(err) => return Err(err.into()),
            Ok(_) => {}
        }

        let mut first_err: Option<Error> = None;
        for element in &output {
            let Some(child) = descriptor.local_parser(element.name_idx) else {
                continue;
            };
            if child == parser_id {
                continue;
            }
            if depth >= self.config.max_nesting_depth {
                warn!(
                    protocol = descriptor.name(),
                    parser = entry.name(),
                    depth,
                    "nested parsing too deep"
                );
                if first_err.is_none() {
                    first_err = Some(
                        ParseError::NestingTooDeep {
                            protocol: descriptor.name().to_string(),
                            depth: depth + 1,
                        }
                        .into(),
                    );
                }
                continue;
            }

            // Nested parsers see complete fields; their carry-over is not kept
            let mut scratch = ParserState::new(pstate.max_carry_over());
            scratch.flags = pstate.flags;
            scratch.set_current_parser(child);
            let result = self.run_parser(
                descriptor,
                child,
                state,
                &mut scratch,
                element.data(),
                direction,
                depth + 1,
            );
            pstate.flags.no_inspection |= scratch.flags.no_inspection;
            pstate.flags.no_reassembly |= scratch.flags.no_reassembly;
            if let Err(err) = result {
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(switch),
        }
    }

    fn apply_switch(
        &self,
        descriptor: &ProtocolDescriptor,
        from: ParserId,
        pstate: &mut ParserState,
        direction: Direction,
        switch: Option<ParserSwitch>,
    ) -> Result<()> {
        let to = match switch {
            None => return Ok(()),
            Some(ParserSwitch::Entry) => match descriptor.entry_parser(direction) {
                Some(id) => id,
                None => return Ok(()),
            },
            Some(ParserSwitch::Local(local_id)) => {
                let Some(to) = descriptor.local_parser(local_id) else {
                    return Err(ParseError::UnknownLocalParser {
                        protocol: descriptor.name().to_string(),
                        local_id,
                    }
                    .into());
                };
                if !self.registry.can_switch(from, to) {
                    return Err(ParseError::InvalidParserSwitch {
                        protocol: descriptor.name().to_string(),
                        from: self.parser_name(from).to_string(),
                        to: self.parser_name(to).to_string(),
                    }
                    .into());
                }
                to
            }
        };

        if to != from {
            debug!(
                protocol = descriptor.name(),
                from = self.parser_name(from),
                to = self.parser_name(to),
                "parser switch"
            );
            pstate.set_current_parser(to);
            pstate.parse_field = 0;
        }
        Ok(())
    }

    fn fatal(&self, descriptor: &ProtocolDescriptor, parser_id: ParserId, direction: Direction) -> Error {
        ParseError::ParserFatal {
            protocol: descriptor.name().to_string(),
            parser: self.parser_name(parser_id).to_string(),
            direction,
        }
        .into()
    }

    fn parser_name(&self, id: ParserId) -> &str {
        self.registry.parser(id).map_or("<unknown>", |p| p.name())
    }
}
