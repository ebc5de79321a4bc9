use thiserror::Error;

use crate::utility::*;
use crate::term::*;

#[derive(Debug, Clone, Error)]
pub enum TypeError {
    #[error("Kind has no type (in {term})")]
    KindHasNoType { term: Term },
    #[error("no such variable in context: {name}")]
    UnboundVariable { name: Symbol },
    #[error("unknown reference {name}")]
    UnknownReference { name: Symbol },
    #[error("theorem {name} has no proof")]
    TheoremHasNoProof { name: Symbol },
    #[error("{name} expects {expected} arguments but was given {found}")]
    ArityMismatch {
        name: Symbol,
        expected: usize,
        found: usize
    },
    #[error("expected {term} to be typed by a sort but found {found}")]
    NotASort { term: Term, found: Term },
    #[error("not a function type: {term} has type {ty}")]
    NotAFunction { term: Term, ty: Term },
    #[error("type mismatch for {term}\n expected: {expected}\n    found: {found}")]
    Mismatch {
        term: Term,
        expected: Term,
        found: Term
    },
    #[error("reduction budget of {limit} steps exhausted")]
    FuelExhausted { limit: usize },
}

impl TypeError {
    /// The expected and synthesized types, when this is a mismatch.
    pub fn mismatch(&self) -> Option<(&Term, &Term)> {
        match self {
            TypeError::Mismatch { expected, found, .. } => Some((expected, found)),
            _ => None
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DeclError {
    #[error("the name {name} is already declared")]
    Duplicate { name: Symbol },
    #[error("the parameter {param} of {name} is bound twice")]
    DuplicateParameter { name: Symbol, param: Symbol },
    #[error("declaration of {name} is ill-typed: {source}")]
    IllTyped {
        name: Symbol,
        source: TypeError
    },
    #[error("opaque definition {name} must have a declared type")]
    OpaqueMissingType { name: Symbol },
    #[error("{name} is not declared")]
    Unknown { name: Symbol },
    #[error("{name} is not a theorem")]
    NotATheorem { name: Symbol },
    #[error("theorem {name} already has a proof")]
    AlreadyProved { name: Symbol },
}
