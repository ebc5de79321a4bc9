
use std::fmt;
use std::error;

use derive_more::Display;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use thiserror::Error;

use proofkit_core::prelude::*;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ProofError {
    #[error(transparent)]
    #[diagnostic(code(proofkit::type_error))]
    Type(#[from] TypeError),
    #[error(transparent)]
    #[diagnostic(code(proofkit::declaration))]
    Decl(#[from] DeclError),
    #[error("{name} : {declared} does not match expected hypothesis")]
    #[diagnostic(
        code(proofkit::hypothesis_mismatch),
        help("the goal expects a hypothesis of type {expected}")
    )]
    HypothesisMismatch {
        name: Symbol,
        declared: Term,
        expected: Term
    },
    #[error("{name} does not match expected hypothesis")]
    #[diagnostic(
        code(proofkit::no_hypothesis),
        help("the goal {goal} is not a product, there is nothing left to assume")
    )]
    NoHypothesis { name: Symbol, goal: Term },
    #[error("the name {name} is already bound in this proof")]
    #[diagnostic(code(proofkit::duplicate_hypothesis))]
    DuplicateHypothesis { name: Symbol },
    #[error("proof already closed")]
    #[diagnostic(code(proofkit::proof_closed))]
    ProofClosed,
    #[error("proof incomplete")]
    #[diagnostic(
        code(proofkit::incomplete),
        help("remaining goal: {goal}")
    )]
    Incomplete { goal: Term },
    #[error("nothing to conclude with")]
    #[diagnostic(
        code(proofkit::nothing_to_conclude),
        help("qed without a term concludes with the most recent have step")
    )]
    NothingToConclude,
    #[error("unknown implicit helper {name}")]
    #[diagnostic(code(proofkit::unknown_implicit))]
    UnknownImplicit { name: Symbol },
    #[error("implicit helper {name} could not infer the arguments of {target}")]
    #[diagnostic(
        code(proofkit::implicit_failed),
        help("explicit arguments have types: {types}")
    )]
    ImplicitFailed {
        name: Symbol,
        target: Symbol,
        types: String
    },
}

impl ProofError {
    /// Expected and synthesized types of a failed check, if that is what went wrong.
    pub fn mismatch(&self) -> Option<(&Term, &Term)> {
        match self {
            ProofError::Type(e) => e.mismatch(),
            ProofError::Decl(DeclError::IllTyped { source, .. }) => source.mismatch(),
            ProofError::HypothesisMismatch { declared, expected, .. } => Some((expected, declared)),
            _ => None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StepKind {
    #[display(fmt = "begin")]
    Begin,
    #[display(fmt = "assume")]
    Assume,
    #[display(fmt = "have")]
    Have,
    #[display(fmt = "qed")]
    Qed,
}

/// A step that could not be applied. Steps are numbered from 1, step 0 opens the proof.
#[derive(Debug, Clone)]
pub struct Failure {
    pub step: usize,
    pub kind: StepKind,
    pub span: Option<Span>,
    pub error: ProofError
}

impl Failure {
    pub fn begin(error: ProofError) -> Failure {
        Failure { step: 0, kind: StepKind::Begin, span: None, error }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.step, self.kind)?;
        if let Some((start, end)) = self.span {
            write!(f, " at {}..{}", start, end)?;
        }
        write!(f, ": {}", self.error)
    }
}

impl error::Error for Failure {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> { Some(&self.error) }
}

impl Diagnostic for Failure {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> { self.error.code() }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> { self.error.help() }
}

#[derive(Debug)]
pub enum ProofkitError {
    Proof(ProofError),
    Step(Failure),
    Collection(Vec<ProofkitError>)
}

fn render(f: &mut fmt::Formatter<'_>, diagnostic: &dyn Diagnostic) -> fmt::Result {
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .with_width(80)
        .render_report(&mut out, diagnostic)?;
    fmt::Display::fmt(&out, f)
}

impl fmt::Display for ProofkitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofkitError::Proof(e) => render(f, e),
            ProofkitError::Step(e) => render(f, e),
            ProofkitError::Collection(list) => {
                for e in list.iter() {
                    fmt::Display::fmt(e, f)?;
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}

impl error::Error for ProofkitError { }

impl From<ProofError> for ProofkitError {
    fn from(error: ProofError) -> Self { ProofkitError::Proof(error) }
}

impl From<Failure> for ProofkitError {
    fn from(error: Failure) -> Self { ProofkitError::Step(error) }
}

impl From<DeclError> for ProofkitError {
    fn from(error: DeclError) -> Self { ProofkitError::Proof(error.into()) }
}

impl From<TypeError> for ProofkitError {
    fn from(error: TypeError) -> Self { ProofkitError::Proof(error.into()) }
}

impl From<Vec<Failure>> for ProofkitError {
    fn from(failures: Vec<Failure>) -> Self {
        ProofkitError::Collection(failures.into_iter().map(ProofkitError::Step).collect())
    }
}

impl From<Vec<DeclError>> for ProofkitError {
    fn from(errors: Vec<DeclError>) -> Self {
        ProofkitError::Collection(errors.into_iter().map(ProofkitError::from).collect())
    }
}
