//! Convenient re-exports for common usage.
//!
//! This module provides a curated set of the most commonly used types
//! from alparse-core, allowing you to import them with a single `use` statement.
//!
//! # Example
//!
//! ```rust
//! use alparse_core::prelude::*;
//!
//! let registry = RegistryBuilder::new().build().unwrap();
//! assert_eq!(registry.protocol_count(), 0);
//! ```

// Registration types
pub use crate::protocol::{
    DefaultState, ParseOutput, ParseStatus, ParserId, ParserResult, ProtocolId, ProtocolParser,
    ProtocolState, Registry, RegistryBuilder, ResultElement, StateLifecycle, TransactionHooks,
};

// Probing types
pub use crate::probe::{ProbeDirection, ProbePriority, ProbeRegistration, ProbeVerdict, Prober};

// Parser state
pub use crate::state::ParserState;

// Field helpers
pub use crate::fields::{parse_field_by_delimiter, parse_field_by_eof, parse_field_by_size, FieldStatus};

// Dispatch types
pub use crate::stream::{AppLayerFlow, DispatchConfig, DispatchStatus, Dispatcher, Direction, StreamFlags};

// Error types
pub use crate::error::{Error, FieldError, ParseError, Result};
