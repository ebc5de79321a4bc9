use proofkit_core::prelude::*;

use crate::error::{Failure, StepKind, ProofkitError};
use crate::implicit::Implicits;
use crate::session::{self, ProofSession, StepResult};

/// How the term of a `have` or `qed` step is obtained.
#[derive(Debug, Clone)]
pub enum By {
    Term(Term),
    Implicit {
        name: Symbol,
        args: Vec<Term>
    }
}

impl By {
    pub fn implicit(name: impl Into<Symbol>, args: Vec<Term>) -> By {
        By::Implicit { name: name.into(), args }
    }
}

impl From<Term> for By {
    fn from(term: Term) -> Self { By::Term(term) }
}

#[derive(Debug, Clone)]
pub enum Step {
    /// Hypotheses in order; a missing type reuses the goal's binder type.
    Assume(Vec<(Symbol, Option<Term>)>),
    Have {
        name: Symbol,
        ty: Option<Term>,
        by: By
    },
    /// Without a term, concludes with the most recent `have`.
    Qed(Option<By>),
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Assume(_) => StepKind::Assume,
            Step::Have { .. } => StepKind::Have,
            Step::Qed(_) => StepKind::Qed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<(Step, Option<Span>)>
}

impl Script {
    pub fn new() -> Script { Script::default() }

    pub fn push(&mut self, step: Step, span: Option<Span>) {
        self.steps.push((step, span));
    }

    pub fn assume<S: Into<Symbol>>(mut self, hypotheses: impl IntoIterator<Item = (S, Option<Term>)>) -> Script {
        let hypotheses = hypotheses.into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .collect();
        self.push(Step::Assume(hypotheses), None);
        self
    }

    pub fn have(mut self, name: impl Into<Symbol>, ty: Option<Term>, by: impl Into<By>) -> Script {
        self.push(Step::Have { name: name.into(), ty, by: by.into() }, None);
        self
    }

    pub fn qed(mut self, by: impl Into<By>) -> Script {
        self.push(Step::Qed(Some(by.into())), None);
        self
    }

    pub fn conclude(mut self) -> Script {
        self.push(Step::Qed(None), None);
        self
    }

    /// Attaches a source span to the most recently added step.
    pub fn at(mut self, span: Span) -> Script {
        if let Some((_, last)) = self.steps.last_mut() {
            *last = Some(span);
        }
        self
    }

    pub fn len(&self) -> usize { self.steps.len() }

    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &(Step, Option<Span>)> { self.steps.iter() }
}

/// Result of a strict run that did not fail.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// The proof closed and was installed.
    Qed { term: Term },
    Incomplete {
        goal: Term,
        context: Context
    }
}

/// Result of a tolerant run.
#[derive(Debug, Clone)]
pub enum Outcome {
    Qed { term: Term },
    Incomplete {
        goal: Term,
        context: Context
    },
    Failed(Vec<Failure>)
}

impl Outcome {
    pub fn is_qed(&self) -> bool { matches!(self, Outcome::Qed { .. }) }

    pub fn is_incomplete(&self) -> bool { matches!(self, Outcome::Incomplete { .. }) }

    pub fn failures(&self) -> &[Failure] {
        match self {
            Outcome::Failed(failures) => failures,
            _ => &[]
        }
    }

    /// The proof term, `None` for an incomplete run, every failure as one report otherwise.
    pub fn into_result(self) -> Result<Option<Term>, ProofkitError> {
        match self {
            Outcome::Qed { term } => Ok(Some(term)),
            Outcome::Incomplete { .. } => Ok(None),
            Outcome::Failed(failures) => Err(failures.into())
        }
    }
}

/// Runs `script` against the theorem `theorem`, stopping at the first failing step.
/// A closed proof is installed into `env`.
pub fn proof(env: &mut Environment
    , implicits: &Implicits
    , theorem: impl Into<Symbol>
    , script: &Script)
    -> Result<Verdict, Failure>
{
    let theorem = theorem.into();
    let mut session = session::begin_proof(env, theorem)
        .map_err(Failure::begin)?
        .with_implicits(implicits);
    for (step, span) in script.iter() {
        if let StepResult::Failed(failure) = session.step(step, *span) {
            log::info!("proof of {} failed\n{}", theorem, failure);
            return Err(failure)
        }
    }
    if !session.is_closed() {
        return Ok(Verdict::Incomplete {
            goal: session.goal().clone(),
            context: session.context().clone()
        })
    }
    let last = session.steps_taken();
    let completed = session.finish()
        .map_err(|error| Failure { step: last, kind: StepKind::Qed, span: None, error })?;
    let term = completed.term().clone();
    completed.install(env)
        .map_err(|error| Failure { step: last, kind: StepKind::Qed, span: None, error })?;
    Ok(Verdict::Qed { term })
}

fn run_tolerant(mut session: ProofSession, script: &Script) -> (ProofSession, Vec<Failure>) {
    let mut failures = vec![];
    for (step, span) in script.iter() {
        if let StepResult::Failed(failure) = session.step(step, *span) {
            log::debug!("skipping failed step\n{}", failure);
            failures.push(failure);
        }
    }
    (session, failures)
}

/// Attempts every step of `script`, collecting failures instead of stopping.
/// The proof is installed only if no step failed and the proof closed.
pub fn try_proof(env: &mut Environment
    , implicits: &Implicits
    , theorem: impl Into<Symbol>
    , script: &Script)
    -> Outcome
{
    let session = match session::begin_proof(env, theorem.into()) {
        Ok(session) => session.with_implicits(implicits),
        Err(error) => return Outcome::Failed(vec![Failure::begin(error)])
    };
    let (session, failures) = run_tolerant(session, script);
    if !failures.is_empty() { return Outcome::Failed(failures) }
    if !session.is_closed() {
        return Outcome::Incomplete {
            goal: session.goal().clone(),
            context: session.context().clone()
        }
    }
    let last = session.steps_taken();
    let installed = session.finish()
        .and_then(|completed| {
            let term = completed.term().clone();
            completed.install(env).map(|_| term)
        });
    match installed {
        Ok(term) => Outcome::Qed { term },
        Err(error) => Outcome::Failed(vec![Failure { step: last, kind: StepKind::Qed, span: None, error }])
    }
}

/// Like [`try_proof`] for an anonymous statement under `params`. Never touches `env`.
pub fn try_example(env: &Environment
    , implicits: &Implicits
    , params: Vec<(Symbol, Term)>
    , statement: Term
    , script: &Script)
    -> Outcome
{
    let session = match session::begin_example(env, params, statement) {
        Ok(session) => session.with_implicits(implicits),
        Err(error) => return Outcome::Failed(vec![Failure::begin(error)])
    };
    let (session, failures) = run_tolerant(session, script);
    if !failures.is_empty() { return Outcome::Failed(failures) }
    match session.proof() {
        Some(term) => Outcome::Qed { term: term.clone() },
        None => Outcome::Incomplete {
            goal: session.goal().clone(),
            context: session.context().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_records_steps_and_spans() {
        let script = Script::new()
            .assume(vec![("x", None)]).at((0, 8))
            .have("y", Some(Term::var("A")), Term::var("x"))
            .qed(By::implicit("h%", vec![Term::var("y")])).at((20, 30));
        let recorded: Vec<_> = script.iter().map(|(step, span)| (step.kind(), *span)).collect();
        assert_eq!(recorded, vec![
            (StepKind::Assume, Some((0, 8))),
            (StepKind::Have, None),
            (StepKind::Qed, Some((20, 30))),
        ]);
        assert_eq!(script.len(), 3);
    }

    #[test]
    fn span_without_steps_is_ignored() {
        assert!(Script::new().at((1, 2)).is_empty());
    }
}
