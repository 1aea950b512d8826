use std::any::Any;
use std::fmt;

use crate::probe::ProbeProgress;
use crate::protocol::{ProtocolId, ProtocolState};
use crate::state::ParserStateStore;

use super::Direction;

/// Application-layer view of one flow.
///
/// Owned by the caller's flow table and handed to the
/// [`Dispatcher`](super::Dispatcher) by `&mut` for every chunk of
/// reassembled data. Holds the detected protocol, probing progress, the
/// parser state store and the per-protocol state slots.
pub struct AppLayerFlow {
    /// Server port, used to select probe chains.
    pub(crate) port: u16,
    pub(crate) alproto: Option<ProtocolId>,
    pub(crate) probe_to_server: ProbeProgress,
    pub(crate) probe_to_client: ProbeProgress,
    pub(crate) store: Option<ParserStateStore>,
    /// Protocol state per storage id, allocated on first parse.
    pub(crate) storage: Vec<Option<Box<ProtocolState>>>,
}

impl AppLayerFlow {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            alproto: None,
            probe_to_server: ProbeProgress::new(),
            probe_to_client: ProbeProgress::new(),
            store: None,
            storage: Vec::new(),
        }
    }

    /// Flow with the protocol already known (e.g. from a port mapping).
    pub fn with_protocol(port: u16, protocol: ProtocolId) -> Self {
        let mut flow = Self::new(port);
        flow.alproto = Some(protocol);
        flow
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Detected (or assigned) application protocol.
    pub fn protocol(&self) -> Option<ProtocolId> {
        self.alproto
    }

    pub fn probe_progress(&self, direction: Direction) -> &ProbeProgress {
        match direction {
            Direction::ToServer => &self.probe_to_server,
            Direction::ToClient => &self.probe_to_client,
        }
    }

    pub(crate) fn probe_progress_mut(&mut self, direction: Direction) -> &mut ProbeProgress {
        match direction {
            Direction::ToServer => &mut self.probe_to_server,
            Direction::ToClient => &mut self.probe_to_client,
        }
    }

    /// Parser state store, created on the first parse.
    pub fn parser_state(&self) -> Option<&ParserStateStore> {
        self.store.as_ref()
    }

    /// Protocol state in slot `storage_id`, if allocated and of type `T`.
    pub fn protocol_state<T: Any>(&self, storage_id: usize) -> Option<&T> {
        self.storage
            .get(storage_id)
            .and_then(|slot| slot.as_deref())
            .and_then(|state| state.downcast_ref::<T>())
    }

    pub fn protocol_state_mut<T: Any>(&mut self, storage_id: usize) -> Option<&mut T> {
        self.storage
            .get_mut(storage_id)
            .and_then(|slot| slot.as_deref_mut())
            .and_then(|state| state.downcast_mut::<T>())
    }

    /// True once the direction's parser is done and ignores further input.
    pub fn is_done(&self, direction: Direction) -> bool {
        self.store
            .as_ref()
            .is_some_and(|store| store.state(direction).is_done())
    }

    /// True if a parser asked to stop payload inspection for this flow.
    pub fn no_payload_inspection(&self) -> bool {
        self.store.as_ref().is_some_and(|store| store.no_inspection())
    }

    /// True if a parser asked to stop reassembly for this flow.
    pub fn no_reassembly(&self) -> bool {
        self.store.as_ref().is_some_and(|store| store.no_reassembly())
    }

    pub fn base_id(&self) -> u16 {
        self.store.as_ref().map_or(0, |s| s.cursors().base_id())
    }

    pub fn avail_id(&self) -> u16 {
        self.store.as_ref().map_or(0, |s| s.cursors().avail_id())
    }

    pub fn inspect_id(&self) -> u16 {
        self.store.as_ref().map_or(0, |s| s.cursors().inspect_id())
    }

    pub fn logged_id(&self) -> u16 {
        self.store.as_ref().map_or(0, |s| s.cursors().logged_id())
    }

    pub fn loggable_id(&self) -> u16 {
        self.store.as_ref().map_or(0, |s| s.cursors().loggable_id())
    }

    /// Mark the next transaction inspected in `direction`.
    pub fn update_inspect_id(&mut self, direction: Direction) -> bool {
        self.store
            .as_mut()
            .is_some_and(|s| s.cursors_mut().update_inspect_id(direction))
    }

    /// Advance the logged watermark by one, if possible.
    pub fn update_logged_id(&mut self) -> Option<u16> {
        self.store.as_mut().and_then(|s| s.cursors_mut().update_logged_id())
    }
}

impl fmt::Debug for AppLayerFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLayerFlow")
            .field("port", &self.port)
            .field("alproto", &self.alproto)
            .field("probe_to_server", &self.probe_to_server.outcome())
            .field("probe_to_client", &self.probe_to_client.outcome())
            .field("store", &self.store)
            .field(
                "allocated_states",
                &self.storage.iter().filter(|s| s.is_some()).count(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_without_store() {
        let mut flow = AppLayerFlow::new(80);
        assert_eq!(flow.protocol(), None);
        assert!(flow.parser_state().is_none());
        assert!(!flow.is_done(Direction::ToServer));
        assert!(!flow.no_payload_inspection());
        assert_eq!(flow.loggable_id(), 0);
        assert_eq!(flow.base_id(), 0);
        assert!(!flow.update_inspect_id(Direction::ToClient));
        assert_eq!(flow.update_logged_id(), None);
    }

    #[test]
    fn test_protocol_state_downcast() {
        let mut flow = AppLayerFlow::new(25);
        let state: Box<ProtocolState> = Box::new(7u32);
        flow.storage = vec![None, Some(state)];
        assert_eq!(flow.protocol_state::<u32>(1), Some(&7));
        assert!(flow.protocol_state::<u64>(1).is_none());
        assert!(flow.protocol_state::<u32>(0).is_none());
        assert!(flow.protocol_state::<u32>(5).is_none());

        if let Some(v) = flow.protocol_state_mut::<u32>(1) {
            *v += 1;
        }
        assert_eq!(flow.protocol_state::<u32>(1), Some(&8));
    }

    #[test]
    fn test_flow_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AppLayerFlow>();
    }
}
