//! Error types for alparse-core.
//!
//! This module provides structured error types for all alparse-core operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`RegistrationError`] - Errors from building the parser registry
//! - [`ParseError`] - Errors from dispatching bytes to a parser
//! - [`FieldError`] - Errors from the field extraction helpers
//!
//! Probing that has not reached a verdict and fields that are not complete
//! yet are normal streaming states and are reported as statuses, not errors.

use thiserror::Error;

use crate::stream::Direction;

/// Main error type for alparse-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Error while registering protocols, parsers or probes
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Error while parsing a flow direction
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl From<FieldError> for Error {
    fn from(err: FieldError) -> Self {
        Error::Parse(ParseError::Field(err))
    }
}

/// Errors raised while building the registry.
///
/// All of these are fatal at startup. The registry is immutable once built,
/// so none of them can occur while flows are being parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A protocol already has an entry parser for this direction
    #[error("protocol {name} already registered for {direction:?}")]
    DuplicateProtocol { name: String, direction: Direction },

    /// A parser with this name already exists
    #[error("parser {name} already registered")]
    DuplicateParser { name: String },

    /// The protocol already has a parser with this local id
    #[error("{protocol}: local parser id {local_id} already registered")]
    DuplicateLocalId { protocol: String, local_id: u16 },

    /// Referenced protocol was never registered
    #[error("unknown protocol: {name}")]
    UnknownProtocol { name: String },

    /// A declared dependency does not name any registered parser
    #[error("parser {parser}: dependency {dependency} is not registered")]
    UnresolvedDependency { parser: String, dependency: String },

    /// A declared dependency belongs to a different protocol
    #[error("parser {parser}: dependency {dependency} belongs to another protocol")]
    CrossProtocolDependency { parser: String, dependency: String },

    /// Dependencies form a cycle
    #[error("parser {parser}: dependency cycle")]
    DependencyCycle { parser: String },

    /// Protocol has no state allocation callback
    #[error("protocol {name}: no state functions registered")]
    MissingStateFuncs { name: String },

    /// Probe depth window is empty or inverted
    #[error("probe for {protocol} on port {port}: invalid depth window {min_depth}..={max_depth}")]
    InvalidProbeDepth {
        protocol: String,
        port: u16,
        min_depth: usize,
        max_depth: usize,
    },

    /// The protocol or parser table has no free id left
    #[error("{kind} table is full")]
    TableFull { kind: &'static str },
}

/// Errors raised while dispatching bytes to a registered parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The parser cannot make sense of the stream
    #[error("{protocol}: parser {parser} failed on {direction:?} stream")]
    ParserFatal {
        protocol: String,
        parser: String,
        direction: Direction,
    },

    /// Nested field dispatch went deeper than allowed
    #[error("{protocol}: nested parsing exceeded depth {depth}")]
    NestingTooDeep { protocol: String, depth: usize },

    /// A parser asked to switch to a local id with no parser behind it
    #[error("{protocol}: no local parser with id {local_id}")]
    UnknownLocalParser { protocol: String, local_id: u16 },

    /// A parser asked to switch to a parser whose dependency has not run
    #[error("{protocol}: cannot switch from {from} to {to}")]
    InvalidParserSwitch {
        protocol: String,
        from: String,
        to: String,
    },

    /// A field helper failed inside the parser
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors raised by the field extraction helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Carry-over would grow past its configured cap
    #[error("carry-over buffer limit exceeded (limit {limit} bytes, need {needed})")]
    CarryOverLimit { limit: usize, needed: usize },

    /// Delimiter scan requested with an empty delimiter
    #[error("empty field delimiter")]
    EmptyDelimiter,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
