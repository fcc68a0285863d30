use std::path::PathBuf;

use thiserror::Error;

use crate::variants::{SvKind, VariantEnd, VariantId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("variant {id} ({kind}) is missing its {end} breakend")]
    MissingBreakend {
        id: VariantId,
        kind: SvKind,
        end: VariantEnd,
    },
    #[error("single breakend variant {id} must not define an end breakend")]
    UnexpectedEndBreakend { id: VariantId },
    #[error("breakends of variant {id} are inconsistent with its kind {kind}: {msg}")]
    InconsistentBreakends {
        id: VariantId,
        kind: SvKind,
        msg: String,
    },
    #[error("variant id {id} occurs more than once in the cluster")]
    DuplicateVariantId { id: VariantId },
    #[error("variant {id} is not part of the cluster")]
    UnknownVariant { id: VariantId },
    #[error("variant {id} cannot be linked to itself")]
    SelfLink { id: VariantId },
    #[error("{end} of variant {id} is already consumed by a committed link")]
    EndAlreadyUsed { id: VariantId, end: VariantEnd },
    #[error("breakends {first} and {second} share chromosome and orientation and cannot be joined")]
    UnlinkableBreakends { first: String, second: String },
    #[error("link {link} does not attach to an open end of chain {chain}")]
    DetachedLink { chain: usize, link: String },
    #[error("bug: attempt to mark already linked {end} of variant {id} as linked again")]
    EndAlreadyLinked { id: VariantId, end: VariantEnd },
    #[error("bug: {end} of variant {id} is consumed by more than one link of chain {chain}")]
    ChainInvariantViolated {
        chain: usize,
        id: VariantId,
        end: VariantEnd,
    },
    #[error("link {link} clashes with a link already committed to chain {chain}")]
    ClashDetected { chain: usize, link: String },
    #[error("invalid chaining configuration: {msg}")]
    InvalidConfig { msg: String },
    #[error("unsupported cluster file {path}: expected extension .yaml, .yml or .json")]
    UnsupportedInputFormat { path: PathBuf },
}

/// Coarse classification of errors, deciding how the engine recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Skipped and counted, the run continues.
    InvalidInput,
    /// Logic defect, halts the affected cluster.
    InvalidState,
    /// Not a failure, the candidate is simply not committed.
    ClashDetected,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EndAlreadyLinked { .. } | Error::ChainInvariantViolated { .. } => {
                ErrorKind::InvalidState
            }
            Error::ClashDetected { .. } => ErrorKind::ClashDetected,
            _ => ErrorKind::InvalidInput,
        }
    }
}

pub(crate) fn invalid_config(msg: &str) -> Error {
    Error::InvalidConfig {
        msg: msg.to_owned(),
    }
}
