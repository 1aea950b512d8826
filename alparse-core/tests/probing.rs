//! Protocol detection through probe chains.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alparse_core::prelude::*;
use alparse_core::ProbeOrdering;

/// Entry parser that accepts anything.
struct Sink;

impl ProtocolParser for Sink {
    fn parse<'a>(
        &self,
        _state: &mut ProtocolState,
        _pstate: &mut ParserState,
        _input: &'a [u8],
        _output: &mut ParseOutput<'a>,
    ) -> ParserResult {
        Ok(ParseStatus::Ok)
    }
}

fn register(builder: &mut RegistryBuilder, name: &str) -> ProtocolId {
    let id = builder.register_protocol(name, Direction::ToServer, Sink).unwrap();
    builder.register_protocol(name, Direction::ToClient, Sink).unwrap();
    builder.register_state_funcs(id, DefaultState::<()>::new()).unwrap();
    id
}

/// Probe returning a fixed verdict and counting its invocations.
fn counting(verdict: ProbeVerdict, calls: &Arc<AtomicUsize>) -> impl Prober + 'static {
    let calls = Arc::clone(calls);
    move |_: &[u8]| {
        calls.fetch_add(1, Ordering::SeqCst);
        verdict
    }
}

struct Port80 {
    dispatcher: Dispatcher,
    low: ProtocolId,
    high_calls: Arc<AtomicUsize>,
    low_calls: Arc<AtomicUsize>,
}

/// Port 80: a high priority probe needing 10 bytes that always declines and
/// a low priority probe needing 2 bytes that always matches.
fn port80(ordering: ProbeOrdering) -> Port80 {
    let high_calls = Arc::new(AtomicUsize::new(0));
    let low_calls = Arc::new(AtomicUsize::new(0));

    let mut builder = RegistryBuilder::new();
    register(&mut builder, "high");
    let low = register(&mut builder, "low");
    builder
        .register_probing_parser(
            ProbeRegistration::new("high", 80)
                .priority(ProbePriority::High)
                .depth(10, 64),
            counting(ProbeVerdict::NotThisProtocol, &high_calls),
        )
        .unwrap();
    builder
        .register_probing_parser(
            ProbeRegistration::new("low", 80)
                .priority(ProbePriority::Low)
                .depth(2, 64),
            counting(ProbeVerdict::Match, &low_calls),
        )
        .unwrap();

    let config = DispatchConfig {
        probe_ordering: ordering,
        ..DispatchConfig::default()
    };
    Port80 {
        dispatcher: Dispatcher::new(Arc::new(builder.build().unwrap()), config),
        low,
        high_calls,
        low_calls,
    }
}

#[test]
fn test_high_priority_blocks_until_its_depth() {
    let setup = port80(ProbeOrdering::Strict);
    let mut flow = AppLayerFlow::new(80);

    let status = setup
        .dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"GE")
        .unwrap();
    assert_eq!(status, DispatchStatus::Probing);
    assert_eq!(flow.protocol(), None);
    assert_eq!(setup.high_calls.load(Ordering::SeqCst), 0);
    assert_eq!(setup.low_calls.load(Ordering::SeqCst), 0);

    let status = setup
        .dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"T / HTTP")
        .unwrap();
    assert_eq!(status, DispatchStatus::Parsed);
    assert_eq!(flow.protocol(), Some(setup.low));
    assert_eq!(setup.high_calls.load(Ordering::SeqCst), 1);
    assert_eq!(setup.low_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_depth_satisfied_ordering_resolves_early() {
    let setup = port80(ProbeOrdering::DepthSatisfied);
    let mut flow = AppLayerFlow::new(80);

    let status = setup
        .dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"GE")
        .unwrap();
    assert_eq!(status, DispatchStatus::Parsed);
    assert_eq!(flow.protocol(), Some(setup.low));
    assert_eq!(setup.high_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_top_probe_wins_within_priority() {
    let mut builder = RegistryBuilder::new();
    register(&mut builder, "first");
    let second = register(&mut builder, "second");
    builder
        .register_probing_parser(ProbeRegistration::new("first", 443), |_: &[u8]| {
            ProbeVerdict::Match
        })
        .unwrap();
    builder
        .register_probing_parser(ProbeRegistration::new("second", 443).top(true), |_: &[u8]| {
            ProbeVerdict::Match
        })
        .unwrap();
    let dispatcher = Dispatcher::with_defaults(Arc::new(builder.build().unwrap()));

    let chain = dispatcher
        .registry()
        .probes()
        .chain(443, Direction::ToServer)
        .unwrap();
    let order: Vec<&str> = chain.iter().map(|e| e.protocol_name.as_str()).collect();
    assert_eq!(order, vec!["second", "first"]);

    let mut flow = AppLayerFlow::new(443);
    dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"\x16\x03\x01")
        .unwrap();
    assert_eq!(flow.protocol(), Some(second));
}

#[test]
fn test_exhausted_depth_gives_up_for_good() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut builder = RegistryBuilder::new();
    register(&mut builder, "undecided");
    builder
        .register_probing_parser(
            ProbeRegistration::new("undecided", 7000).depth(1, 8),
            counting(ProbeVerdict::NeedMoreData, &calls),
        )
        .unwrap();
    let dispatcher = Dispatcher::with_defaults(Arc::new(builder.build().unwrap()));
    let mut flow = AppLayerFlow::new(7000);

    let status = dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"abc")
        .unwrap();
    assert_eq!(status, DispatchStatus::Probing);
    assert_eq!(flow.probe_progress(Direction::ToServer).buffered_len(), 3);

    let status = dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"defghijkl")
        .unwrap();
    assert_eq!(status, DispatchStatus::Unknown);
    assert!(flow.probe_progress(Direction::ToServer).is_failed());
    assert_eq!(flow.probe_progress(Direction::ToServer).buffered_len(), 0);

    let before = calls.load(Ordering::SeqCst);
    let status = dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"mnop")
        .unwrap();
    assert_eq!(status, DispatchStatus::Unknown);
    assert_eq!(calls.load(Ordering::SeqCst), before);
}

#[test]
fn test_direction_specific_probe() {
    let mut builder = RegistryBuilder::new();
    let banner = register(&mut builder, "banner");
    builder
        .register_probing_parser(
            ProbeRegistration::new("banner", 2121).direction(ProbeDirection::ToClient),
            |input: &[u8]| {
                if input.starts_with(b"220 ") {
                    ProbeVerdict::Match
                } else {
                    ProbeVerdict::NotThisProtocol
                }
            },
        )
        .unwrap();
    let dispatcher = Dispatcher::with_defaults(Arc::new(builder.build().unwrap()));
    let mut flow = AppLayerFlow::new(2121);

    // No chain for the client's direction
    let status = dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"USER x")
        .unwrap();
    assert_eq!(status, DispatchStatus::Unknown);

    let status = dispatcher
        .parse(&mut flow, None, StreamFlags::to_client(), b"220 ready")
        .unwrap();
    assert_eq!(status, DispatchStatus::Parsed);
    assert_eq!(flow.protocol(), Some(banner));

    // The failed direction stays failed
    let status = dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"PASS y")
        .unwrap();
    assert_eq!(status, DispatchStatus::Unknown);
}

#[test]
fn test_all_probes_declining_fails_direction() {
    let mut builder = RegistryBuilder::new();
    register(&mut builder, "a");
    register(&mut builder, "b");
    for name in ["a", "b"] {
        builder
            .register_probing_parser(ProbeRegistration::new(name, 9), |_: &[u8]| {
                ProbeVerdict::NotThisProtocol
            })
            .unwrap();
    }
    let dispatcher = Dispatcher::with_defaults(Arc::new(builder.build().unwrap()));
    let mut flow = AppLayerFlow::new(9);

    let status = dispatcher
        .parse(&mut flow, None, StreamFlags::to_server(), b"x")
        .unwrap();
    assert_eq!(status, DispatchStatus::Unknown);
    assert!(flow.parser_state().is_none());
}
