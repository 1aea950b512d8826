//! Parser registry.
//!
//! Built in two phases. [`RegistryBuilder`] collects protocol, parser, probe
//! and callback declarations in any order; [`RegistryBuilder::build`]
//! validates them, resolves dependency names into [`ParserId`] handles and
//! returns an immutable [`Registry`] that is shared by reference with every
//! dispatcher. Name lookups only happen here, never while parsing.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use tracing::info;

use crate::error::{RegistrationError, Result};
use crate::probe::{ProbeDirection, ProbeElement, ProbeRegistration, Prober, ProbingParsers};
use crate::stream::Direction;

use super::{ProtocolParser, StateLifecycle, TransactionHooks};

/// Registered protocol, indexes the protocol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolId(u16);

impl ProtocolId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

/// Global parser id, indexes the parser table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserId(u16);

impl ParserId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

/// Largest number of protocols or parsers a table can hold.
const MAX_TABLE_ENTRIES: usize = u16::MAX as usize;

/// One registered parser.
pub struct ParserEntry {
    name: CompactString,
    id: ParserId,
    protocol: ProtocolId,
    local_id: Option<u16>,
    dependency_name: Option<CompactString>,
    dependency: Option<ParserId>,
    flags: u8,
    max_outputs: usize,
    parser: Box<dyn ProtocolParser>,
}

impl ParserEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ParserId {
        self.id
    }

    pub fn protocol(&self) -> ProtocolId {
        self.protocol
    }

    /// Local id within the protocol; `None` for direction entry parsers.
    pub fn local_id(&self) -> Option<u16> {
        self.local_id
    }

    pub fn dependency_name(&self) -> Option<&str> {
        self.dependency_name.as_deref()
    }

    /// Resolved dependency (set once the registry is built).
    pub fn dependency(&self) -> Option<ParserId> {
        self.dependency
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn max_outputs(&self) -> usize {
        self.max_outputs
    }

    pub fn parser(&self) -> &dyn ProtocolParser {
        self.parser.as_ref()
    }
}

impl fmt::Debug for ParserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserEntry")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("protocol", &self.protocol)
            .field("local_id", &self.local_id)
            .field("dependency", &self.dependency_name)
            .field("max_outputs", &self.max_outputs)
            .finish()
    }
}

/// One registered protocol.
pub struct ProtocolDescriptor {
    name: CompactString,
    id: ProtocolId,
    to_server: Option<ParserId>,
    to_client: Option<ParserId>,
    storage_id: usize,
    /// Local parser id -> global parser id.
    local_map: Vec<Option<ParserId>>,
    lifecycle: Option<Box<dyn StateLifecycle>>,
    transactions: Option<Box<dyn TransactionHooks>>,
    logger: bool,
}

impl ProtocolDescriptor {
    fn new(name: &str, id: ProtocolId) -> Self {
        Self {
            name: CompactString::new(name),
            id,
            to_server: None,
            to_client: None,
            storage_id: id.index(),
            local_map: Vec::new(),
            lifecycle: None,
            transactions: None,
            logger: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ProtocolId {
        self.id
    }

    /// Parser that receives a direction's bytes first.
    pub fn entry_parser(&self, direction: Direction) -> Option<ParserId> {
        match direction {
            Direction::ToServer => self.to_server,
            Direction::ToClient => self.to_client,
        }
    }

    /// Slot of this protocol's state in a flow.
    pub fn storage_id(&self) -> usize {
        self.storage_id
    }

    /// Global id of the parser registered under `local_id`.
    #[inline]
    pub fn local_parser(&self, local_id: u16) -> Option<ParserId> {
        self.local_map.get(local_id as usize).copied().flatten()
    }

    pub fn local_map_len(&self) -> usize {
        self.local_map.len()
    }

    pub fn has_logger(&self) -> bool {
        self.logger
    }

    pub(crate) fn lifecycle(&self) -> Option<&dyn StateLifecycle> {
        self.lifecycle.as_deref()
    }

    pub(crate) fn transactions(&self) -> Option<&dyn TransactionHooks> {
        self.transactions.as_deref()
    }

    pub fn has_transaction_funcs(&self) -> bool {
        self.transactions.is_some()
    }
}

impl fmt::Debug for ProtocolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolDescriptor")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("to_server", &self.to_server)
            .field("to_client", &self.to_client)
            .field("storage_id", &self.storage_id)
            .field("local_map", &self.local_map)
            .field("logger", &self.logger)
            .finish()
    }
}

/// Probe declared before `build()`; the protocol name is resolved then.
struct PendingProbe {
    registration: ProbeRegistration,
    prober: Arc<dyn Prober>,
}

/// Collects registrations at startup.
#[derive(Default)]
pub struct RegistryBuilder {
    protocols: Vec<ProtocolDescriptor>,
    parsers: Vec<ParserEntry>,
    probes: Vec<PendingProbe>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the entry parser of `name` for one direction.
    ///
    /// The first call for a name creates the protocol; the entry parser is
    /// recorded under the name `"<name>.to_server"` or `"<name>.to_client"`.
    pub fn register_protocol<P>(
        &mut self,
        name: &str,
        direction: Direction,
        parser: P,
    ) -> Result<ProtocolId>
    where
        P: ProtocolParser + 'static,
    {
        let id = match self.protocol_by_name(name) {
            Some(id) => id,
            None => {
                let id = ProtocolId::from_index(checked_len(self.protocols.len(), "protocol")?);
                self.protocols.push(ProtocolDescriptor::new(name, id));
                id
            }
        };

        if self.protocols[id.index()].entry_parser(direction).is_some() {
            return Err(RegistrationError::DuplicateProtocol {
                name: name.to_string(),
                direction,
            }
            .into());
        }

        let entry_name = format!("{}.{}", name, direction.as_str());
        let parser_id = self.push_parser(&entry_name, id, None, Box::new(parser), None)?;
        let proto = &mut self.protocols[id.index()];
        match direction {
            Direction::ToServer => proto.to_server = Some(parser_id),
            Direction::ToClient => proto.to_client = Some(parser_id),
        }
        Ok(id)
    }

    /// Register a parser under an existing protocol.
    ///
    /// `dependency` names another parser of the same protocol that has to be
    /// active before this one may be switched to. It is resolved by
    /// [`build`](Self::build).
    pub fn register_parser<P>(
        &mut self,
        name: &str,
        protocol: ProtocolId,
        local_id: u16,
        parser: P,
        dependency: Option<&str>,
    ) -> Result<ParserId>
    where
        P: ProtocolParser + 'static,
    {
        let proto = self.protocol_mut(protocol)?;
        if proto.local_parser(local_id).is_some() {
            return Err(RegistrationError::DuplicateLocalId {
                protocol: proto.name().to_string(),
                local_id,
            }
            .into());
        }

        let parser_id = self.push_parser(name, protocol, Some(local_id), Box::new(parser), dependency)?;

        let map = &mut self.protocols[protocol.index()].local_map;
        let slot = local_id as usize;
        if map.len() <= slot {
            map.resize(slot + 1, None);
        }
        map[slot] = Some(parser_id);
        Ok(parser_id)
    }

    /// Attach the state allocation and release callbacks.
    pub fn register_state_funcs<L>(&mut self, protocol: ProtocolId, lifecycle: L) -> Result<()>
    where
        L: StateLifecycle + 'static,
    {
        self.protocol_mut(protocol)?.lifecycle = Some(Box::new(lifecycle));
        Ok(())
    }

    /// Attach the transaction id update and release callbacks.
    pub fn register_transaction_id_funcs<H>(&mut self, protocol: ProtocolId, hooks: H) -> Result<()>
    where
        H: TransactionHooks + 'static,
    {
        self.protocol_mut(protocol)?.transactions = Some(Box::new(hooks));
        Ok(())
    }

    /// Mark the protocol as logged; pruning then waits for the logger too.
    pub fn register_logger(&mut self, protocol: ProtocolId) -> Result<()> {
        self.protocol_mut(protocol)?.logger = true;
        Ok(())
    }

    /// Register a probe for a port.
    ///
    /// The protocol may be registered later; it must exist by `build()`.
    pub fn register_probing_parser<P>(&mut self, registration: ProbeRegistration, prober: P) -> Result<()>
    where
        P: Prober + 'static,
    {
        if registration.max_depth == 0 || registration.min_depth > registration.max_depth {
            return Err(RegistrationError::InvalidProbeDepth {
                protocol: registration.protocol.clone(),
                port: registration.port,
                min_depth: registration.min_depth,
                max_depth: registration.max_depth,
            }
            .into());
        }
        self.probes.push(PendingProbe {
            registration,
            prober: Arc::new(prober),
        });
        Ok(())
    }

    /// Find a protocol by name (registration time only).
    pub fn protocol_by_name(&self, name: &str) -> Option<ProtocolId> {
        self.protocols.iter().find(|p| p.name == name).map(|p| p.id)
    }

    /// Find a parser by name (registration time only).
    pub fn parser_by_name(&self, name: &str) -> Option<ParserId> {
        self.parsers.iter().find(|p| p.name == name).map(|p| p.id)
    }

    /// Validate all declarations and freeze the registry.
    pub fn build(mut self) -> Result<Registry> {
        for proto in &self.protocols {
            if proto.lifecycle.is_none() {
                return Err(RegistrationError::MissingStateFuncs {
                    name: proto.name().to_string(),
                }
                .into());
            }
        }

        self.resolve_dependencies()?;
        self.check_dependency_cycles()?;

        let mut probes = ProbingParsers::new();
        for pending in std::mem::take(&mut self.probes) {
            let reg = pending.registration;
            let protocol = self.protocol_by_name(&reg.protocol).ok_or_else(|| {
                RegistrationError::UnknownProtocol {
                    name: reg.protocol.clone(),
                }
            })?;
            let element = ProbeElement {
                protocol,
                protocol_name: CompactString::new(&reg.protocol),
                port: reg.port,
                priority: reg.priority,
                top: reg.top,
                min_depth: reg.min_depth,
                max_depth: reg.max_depth,
                prober: pending.prober,
            };
            match reg.direction {
                ProbeDirection::ToServer => probes.insert(Direction::ToServer, element),
                ProbeDirection::ToClient => probes.insert(Direction::ToClient, element),
                ProbeDirection::Both => {
                    probes.insert(Direction::ToServer, element.clone());
                    probes.insert(Direction::ToClient, element);
                }
            }
        }

        info!(
            protocols = self.protocols.len(),
            parsers = self.parsers.len(),
            probes = probes.probe_count(),
            "app-layer registry built"
        );

        Ok(Registry {
            protocols: self.protocols,
            parsers: self.parsers,
            probes,
        })
    }

    fn protocol_mut(&mut self, protocol: ProtocolId) -> Result<&mut ProtocolDescriptor> {
        self.protocols.get_mut(protocol.index()).ok_or_else(|| {
            RegistrationError::UnknownProtocol {
                name: format!("#{}", protocol.as_u16()),
            }
            .into()
        })
    }

    fn push_parser(
        &mut self,
        name: &str,
        protocol: ProtocolId,
        local_id: Option<u16>,
        parser: Box<dyn ProtocolParser>,
        dependency: Option<&str>,
    ) -> Result<ParserId> {
        if self.parser_by_name(name).is_some() {
            return Err(RegistrationError::DuplicateParser {
                name: name.to_string(),
            }
            .into());
        }
        let id = ParserId::from_index(checked_len(self.parsers.len(), "parser")?);
        self.parsers.push(ParserEntry {
            name: CompactString::new(name),
            id,
            protocol,
            local_id,
            dependency_name: dependency.map(CompactString::new),
            dependency: None,
            flags: parser.flags(),
            max_outputs: parser.max_outputs(),
            parser,
        });
        Ok(id)
    }

    fn resolve_dependencies(&mut self) -> Result<()> {
        for idx in 0..self.parsers.len() {
            let Some(dep_name) = self.parsers[idx].dependency_name.clone() else {
                continue;
            };
            let entry = &self.parsers[idx];
            let dep = self.parser_by_name(&dep_name).ok_or_else(|| {
                RegistrationError::UnresolvedDependency {
                    parser: entry.name().to_string(),
                    dependency: dep_name.to_string(),
                }
            })?;
            if self.parsers[dep.index()].protocol != entry.protocol {
                return Err(RegistrationError::CrossProtocolDependency {
                    parser: entry.name().to_string(),
                    dependency: dep_name.to_string(),
                }
                .into());
            }
            self.parsers[idx].dependency = Some(dep);
        }
        Ok(())
    }

    fn check_dependency_cycles(&self) -> Result<()> {
        for entry in &self.parsers {
            let mut cursor = entry.dependency;
            let mut steps = 0;
            while let Some(dep) = cursor {
                if dep == entry.id || steps > self.parsers.len() {
                    return Err(RegistrationError::DependencyCycle {
                        parser: entry.name().to_string(),
                    }
                    .into());
                }
                cursor = self.parsers[dep.index()].dependency;
                steps += 1;
            }
        }
        Ok(())
    }
}

fn checked_len(len: usize, kind: &'static str) -> Result<usize> {
    if len >= MAX_TABLE_ENTRIES {
        return Err(RegistrationError::TableFull { kind }.into());
    }
    Ok(len)
}

/// Frozen parser registry, shared read-only between workers.
pub struct Registry {
    protocols: Vec<ProtocolDescriptor>,
    parsers: Vec<ParserEntry>,
    probes: ProbingParsers,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    #[inline]
    pub fn protocol(&self, id: ProtocolId) -> Option<&ProtocolDescriptor> {
        self.protocols.get(id.index())
    }

    #[inline]
    pub fn parser(&self, id: ParserId) -> Option<&ParserEntry> {
        self.parsers.get(id.index())
    }

    /// Find a protocol by name. Linear scan, not meant for the hot path.
    pub fn protocol_by_name(&self, name: &str) -> Option<ProtocolId> {
        self.protocols.iter().find(|p| p.name == name).map(|p| p.id)
    }

    /// Find a parser by name. Linear scan, not meant for the hot path.
    pub fn parser_by_name(&self, name: &str) -> Option<ParserId> {
        self.parsers.iter().find(|p| p.name == name).map(|p| p.id)
    }

    pub fn protocols(&self) -> impl Iterator<Item = &ProtocolDescriptor> {
        self.protocols.iter()
    }

    pub fn protocol_count(&self) -> usize {
        self.protocols.len()
    }

    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    /// Number of per-protocol state slots a flow needs.
    pub fn storage_size(&self) -> usize {
        self.protocols.len()
    }

    pub fn probes(&self) -> &ProbingParsers {
        &self.probes
    }

    /// Whether the active parser may hand over to `to`.
    ///
    /// A parser without dependency can always be selected. Otherwise its
    /// dependency must be `from` or one of `from`'s own dependencies.
    pub fn can_switch(&self, from: ParserId, to: ParserId) -> bool {
        let Some(required) = self.parser(to).and_then(|p| p.dependency) else {
            return true;
        };
        let mut cursor = Some(from);
        let mut steps = 0;
        while let Some(id) = cursor {
            if id == required {
                return true;
            }
            if steps > self.parsers.len() {
                break;
            }
            cursor = self.parser(id).and_then(|p| p.dependency);
            steps += 1;
        }
        false
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("protocols", &self.protocols)
            .field("parsers", &self.parsers)
            .field("probes", &self.probes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::probe::{ProbePriority, ProbeVerdict};
    use crate::protocol::{DefaultState, ParseOutput, ParseStatus, ParserResult, ProtocolState};
    use crate::state::ParserState;

    struct Noop;

    impl ProtocolParser for Noop {
        fn parse<'a>(
            &self,
            _state: &mut ProtocolState,
            _pstate: &mut ParserState,
            _input: &'a [u8],
            _output: &mut ParseOutput<'a>,
        ) -> ParserResult {
            Ok(ParseStatus::Ok)
        }

        fn max_outputs(&self) -> usize {
            3
        }
    }

    fn registration_error(result: Result<impl Sized>) -> RegistrationError {
        match result {
            Err(Error::Registration(e)) => e,
            Err(other) => panic!("Expected registration error, got {other:?}"),
            Ok(_) => panic!("Expected registration error"),
        }
    }

    fn builder_with_http() -> (RegistryBuilder, ProtocolId) {
        let mut builder = RegistryBuilder::new();
        let http = builder.register_protocol("http", Direction::ToServer, Noop).unwrap();
        builder.register_protocol("http", Direction::ToClient, Noop).unwrap();
        builder.register_state_funcs(http, DefaultState::<()>::new()).unwrap();
        (builder, http)
    }

    #[test]
    fn test_register_protocol_both_directions() {
        let (builder, http) = builder_with_http();
        let registry = builder.build().unwrap();

        let proto = registry.protocol(http).unwrap();
        assert_eq!(proto.name(), "http");
        let to_server = proto.entry_parser(Direction::ToServer).unwrap();
        let to_client = proto.entry_parser(Direction::ToClient).unwrap();
        assert_ne!(to_server, to_client);
        assert_eq!(registry.parser(to_server).unwrap().name(), "http.to_server");
        assert_eq!(registry.parser(to_server).unwrap().max_outputs(), 3);
        assert_eq!(registry.protocol_by_name("http"), Some(http));
        assert_eq!(registry.storage_size(), 1);
    }

    #[test]
    fn test_duplicate_protocol_direction_rejected() {
        let (mut builder, _) = builder_with_http();
        let err = registration_error(builder.register_protocol("http", Direction::ToServer, Noop));
        assert!(matches!(err, RegistrationError::DuplicateProtocol { .. }));
    }

    #[test]
    fn test_register_parser_unknown_protocol() {
        let (mut builder, _) = builder_with_http();
        let bogus = ProtocolId::from_index(9);
        let err = registration_error(builder.register_parser("x", bogus, 1, Noop, None));
        assert!(matches!(err, RegistrationError::UnknownProtocol { .. }));
    }

    #[test]
    fn test_duplicate_local_id_rejected() {
        let (mut builder, http) = builder_with_http();
        builder.register_parser("http.uri", http, 1, Noop, None).unwrap();
        let err = registration_error(builder.register_parser("http.uri2", http, 1, Noop, None));
        assert_eq!(
            err,
            RegistrationError::DuplicateLocalId {
                protocol: "http".to_string(),
                local_id: 1
            }
        );
    }

    #[test]
    fn test_duplicate_parser_name_rejected() {
        let (mut builder, http) = builder_with_http();
        builder.register_parser("http.uri", http, 1, Noop, None).unwrap();
        let err = registration_error(builder.register_parser("http.uri", http, 2, Noop, None));
        assert!(matches!(err, RegistrationError::DuplicateParser { .. }));
    }

    #[test]
    fn test_local_map_lookup() {
        let (mut builder, http) = builder_with_http();
        let uri = builder.register_parser("http.uri", http, 3, Noop, None).unwrap();
        let registry = builder.build().unwrap();
        let proto = registry.protocol(http).unwrap();
        assert_eq!(proto.local_parser(3), Some(uri));
        assert_eq!(proto.local_parser(2), None);
        assert_eq!(proto.local_parser(100), None);
        assert_eq!(registry.parser(uri).unwrap().local_id(), Some(3));
    }

    #[test]
    fn test_missing_state_funcs_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder.register_protocol("tls", Direction::ToServer, Noop).unwrap();
        let err = registration_error(builder.build());
        assert_eq!(
            err,
            RegistrationError::MissingStateFuncs {
                name: "tls".to_string()
            }
        );
    }

    #[test]
    fn test_dependency_resolved_at_build() {
        let (mut builder, http) = builder_with_http();
        // Dependency declared before the parser it names exists
        let body = builder
            .register_parser("http.body", http, 2, Noop, Some("http.headers"))
            .unwrap();
        let headers = builder.register_parser("http.headers", http, 1, Noop, None).unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.parser(body).unwrap().dependency(), Some(headers));
        assert_eq!(registry.parser(body).unwrap().dependency_name(), Some("http.headers"));
    }

    #[test]
    fn test_unresolved_dependency_fails_build() {
        let (mut builder, http) = builder_with_http();
        builder
            .register_parser("http.body", http, 2, Noop, Some("http.nothing"))
            .unwrap();
        let err = registration_error(builder.build());
        assert!(matches!(err, RegistrationError::UnresolvedDependency { .. }));
    }

    #[test]
    fn test_cross_protocol_dependency_fails_build() {
        let (mut builder, http) = builder_with_http();
        let ftp = builder.register_protocol("ftp", Direction::ToServer, Noop).unwrap();
        builder.register_state_funcs(ftp, DefaultState::<()>::new()).unwrap();
        builder.register_parser("ftp.cmd", ftp, 1, Noop, None).unwrap();
        builder
            .register_parser("http.body", http, 1, Noop, Some("ftp.cmd"))
            .unwrap();
        let err = registration_error(builder.build());
        assert!(matches!(err, RegistrationError::CrossProtocolDependency { .. }));
    }

    #[test]
    fn test_dependency_cycle_fails_build() {
        let (mut builder, http) = builder_with_http();
        builder.register_parser("a", http, 1, Noop, Some("b")).unwrap();
        builder.register_parser("b", http, 2, Noop, Some("a")).unwrap();
        let err = registration_error(builder.build());
        assert!(matches!(err, RegistrationError::DependencyCycle { .. }));
    }

    #[test]
    fn test_can_switch_follows_dependencies() {
        let (mut builder, http) = builder_with_http();
        let line = builder.register_parser("line", http, 1, Noop, None).unwrap();
        let headers = builder.register_parser("headers", http, 2, Noop, Some("line")).unwrap();
        let body = builder.register_parser("body", http, 3, Noop, Some("headers")).unwrap();
        let registry = builder.build().unwrap();

        assert!(registry.can_switch(line, headers));
        assert!(registry.can_switch(headers, body));
        assert!(!registry.can_switch(line, body));
        // Back to an earlier stage is fine, its dependency already ran
        assert!(registry.can_switch(body, headers));
        assert!(registry.can_switch(body, line));
    }

    #[test]
    fn test_probe_invalid_depth_rejected() {
        let (mut builder, _) = builder_with_http();
        let reg = ProbeRegistration::new("http", 80).depth(10, 5);
        let err = registration_error(
            builder.register_probing_parser(reg, |_: &[u8]| ProbeVerdict::Match),
        );
        assert!(matches!(err, RegistrationError::InvalidProbeDepth { .. }));
    }

    #[test]
    fn test_probe_unknown_protocol_fails_build() {
        let (mut builder, _) = builder_with_http();
        let reg = ProbeRegistration::new("smtp", 25);
        builder
            .register_probing_parser(reg, |_: &[u8]| ProbeVerdict::Match)
            .unwrap();
        let err = registration_error(builder.build());
        assert!(matches!(err, RegistrationError::UnknownProtocol { .. }));
    }

    #[test]
    fn test_probes_indexed_by_port_and_direction() {
        let (mut builder, http) = builder_with_http();
        let reg = ProbeRegistration::new("http", 8080)
            .direction(ProbeDirection::ToServer)
            .priority(ProbePriority::High)
            .depth(4, 64);
        builder
            .register_probing_parser(reg, |_: &[u8]| ProbeVerdict::Match)
            .unwrap();
        builder
            .register_probing_parser(ProbeRegistration::new("http", 8081), |_: &[u8]| {
                ProbeVerdict::Match
            })
            .unwrap();
        let registry = builder.build().unwrap();

        let chain = registry.probes().chain(8080, Direction::ToServer).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.max_depth(), 64);
        assert_eq!(chain.iter().next().unwrap().protocol, http);
        assert!(registry.probes().chain(8080, Direction::ToClient).is_none());
        assert!(registry.probes().chain(8081, Direction::ToClient).is_some());
        assert_eq!(registry.probes().probe_count(), 3);
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
