//! Persistence for retained-mode scene graphs: a compact binary stream format
//! that preserves object identity, shared components and cross-references that
//! may point forward in the stream or form cycles.
//!
//! Saving walks the live graph depth-first and assigns every distinct object a
//! stable integer identity on first reach; later reaches emit back-references
//! instead of repeating the record. Loading runs in two phases: phase one
//! constructs every object and records reference slots as raw identities,
//! phase two resolves those identities against the now-complete symbol table
//! and attaches children. See [`io`] for the stream layout, [`state`] for the
//! per-type adapter contract and [`graph`] for the live object model.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneIoError {
    #[error("The stream's magic value does not match the expectation {magic}")]
    InvalidMagicValue { magic: u32 },

    #[error("The stream declares version {version}, which this reader does not support")]
    UnsupportedVersion { version: u16 },

    #[error("The stream is violating the expected format, because: {reason}")]
    FormatError { reason: &'static str },

    /// A back-reference named an identity that no inline record has minted yet.
    #[error("Identity {identity} is referenced but no record has defined it")]
    UnknownIdentity { identity: u32 },

    #[error("The stream contains the unknown type tag {tag}")]
    UnknownTypeTag { tag: u16 },

    /// Raised for application-defined subtype names absent from the registry.
    /// Recoverable by configuring a fallback policy, see
    /// [`state::registry::FallbackPolicy`].
    #[error("The type \"{type_name}\" is not registered and no fallback is configured")]
    UnknownType { type_name: String },

    #[error("{type_name} uses a field encoding that cannot be persisted: {reason}")]
    UnsupportedEncoding {
        type_name: &'static str,
        reason: &'static str,
    },

    #[error("The stream ended early: the footer declares {expected} symbols, the reader minted {found}")]
    TruncatedStream { expected: u32, found: u32 },

    #[error(transparent)]
    GraphError(#[from] crate::graph::SceneError),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UTF8ConversationError(#[from] std::string::FromUtf8Error),
}

pub mod common;
pub mod graph;
pub mod io;
pub mod state;
