use std::fmt;

use colored::Colorize;
use imbl::Vector;

use proofkit_core::prelude::*;
use proofkit_core::infer;
use crate::error::{ProofError, Failure, StepKind};
use crate::implicit::Implicits;
use crate::script::{By, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Open,
    Closed
}

#[derive(Debug, Clone)]
pub enum StepResult {
    Qed,
    Incomplete,
    Failed(Failure)
}

impl StepResult {
    pub fn is_failed(&self) -> bool { matches!(self, StepResult::Failed(_)) }
}

#[derive(Debug, Clone)]
enum Record {
    Assumed { name: Symbol, ty: Term },
    Had { name: Symbol, proof: Term }
}

impl Record {
    fn definition(&self) -> Option<(Symbol, Term)> {
        match self {
            Record::Had { name, proof, .. } => Some((*name, proof.clone())),
            Record::Assumed { .. } => None
        }
    }
}

#[derive(Debug, Clone)]
struct Closed {
    term: Term,
    checked: Option<CheckedProof>
}

/// Everything a step may change; a step builds a new one or fails.
#[derive(Debug, Clone)]
struct Progress {
    ctx: Context,
    goal: Term,
    records: Vector<Record>,
    closed: Option<Closed>
}

#[derive(Debug, Clone)]
pub struct ProofSession {
    env: Environment,
    implicits: Implicits,
    theorem: Option<Symbol>,
    params: Context,
    statement: Term,
    progress: Progress,
    steps_taken: usize
}

/// A closed proof, ready to be installed.
#[derive(Debug, Clone)]
pub struct CompletedProof {
    theorem: Option<Symbol>,
    term: Term,
    checked: Option<CheckedProof>
}

impl CompletedProof {
    pub fn theorem(&self) -> Option<Symbol> { self.theorem }

    pub fn term(&self) -> &Term { &self.term }

    /// Attaches the proof to its theorem. Rechecked first if `env` changed since the
    /// session began. Examples have nothing to install.
    pub fn install(self, env: &mut Environment) -> Result<(), ProofError> {
        match self.checked {
            Some(checked) => Ok(env.attach(checked)?),
            None => Ok(())
        }
    }
}

/// Opens a proof of the declared, not yet proved theorem `name` against a snapshot of `env`.
pub fn begin_proof(env: &Environment, name: impl Into<Symbol>) -> Result<ProofSession, ProofError> {
    let name = name.into();
    let entry = env.lookup(name).ok_or(DeclError::Unknown { name })?;
    if !entry.is_theorem() { return Err(DeclError::NotATheorem { name }.into()) }
    if entry.is_proved() { return Err(DeclError::AlreadyProved { name }.into()) }
    let params = entry.context();
    log::trace!("{} {}\n{}\n{} {}", "begin".bright_blue(), name, params, "⊢".bright_blue(), entry.ty);
    Ok(ProofSession::new(env, Some(name), params, entry.ty.clone()))
}

/// Opens a proof of an anonymous `statement` under `params`.
pub fn begin_example(env: &Environment, params: Vec<(Symbol, Term)>, statement: Term) -> Result<ProofSession, ProofError> {
    let mut ctx = Context::new();
    for (name, ty) in params {
        if ctx.contains(name) { return Err(ProofError::DuplicateHypothesis { name }) }
        infer::sort_of(env, &ctx, &ty)?;
        ctx = ctx.bind(name, ty);
    }
    infer::sort_of(env, &ctx, &statement)?;
    Ok(ProofSession::new(env, None, ctx, statement))
}

impl ProofSession {
    fn new(env: &Environment, theorem: Option<Symbol>, params: Context, statement: Term) -> ProofSession {
        let progress = Progress {
            ctx: params.clone(),
            goal: statement.clone(),
            records: Vector::new(),
            closed: None
        };
        ProofSession {
            env: env.snapshot(),
            implicits: Implicits::new(),
            theorem,
            params,
            statement,
            progress,
            steps_taken: 0
        }
    }

    pub fn with_implicits(mut self, implicits: &Implicits) -> ProofSession {
        self.implicits = implicits.clone();
        self
    }

    pub fn theorem(&self) -> Option<Symbol> { self.theorem }

    pub fn statement(&self) -> &Term { &self.statement }

    pub fn goal(&self) -> &Term { &self.progress.goal }

    pub fn context(&self) -> &Context { &self.progress.ctx }

    pub fn state(&self) -> State {
        if self.progress.closed.is_some() { State::Closed } else { State::Open }
    }

    pub fn is_closed(&self) -> bool { self.state() == State::Closed }

    /// Number of steps attempted, failed ones included.
    pub fn steps_taken(&self) -> usize { self.steps_taken }

    /// The assembled proof term once the session is closed.
    pub fn proof(&self) -> Option<&Term> {
        self.progress.closed.as_ref().map(|closed| &closed.term)
    }

    pub fn assume(&mut self, hypotheses: Vec<(Symbol, Option<Term>)>) -> StepResult {
        self.run(StepKind::Assume, None, |s| s.assume_step(&hypotheses))
    }

    pub fn have(&mut self, name: impl Into<Symbol>, ty: Option<Term>, by: By) -> StepResult {
        let name = name.into();
        self.run(StepKind::Have, None, |s| s.have_step(name, ty.as_ref(), &by))
    }

    pub fn qed(&mut self, by: Option<By>) -> StepResult {
        self.run(StepKind::Qed, None, |s| s.qed_step(by.as_ref()))
    }

    pub fn step(&mut self, step: &Step, span: Option<Span>) -> StepResult {
        match step {
            Step::Assume(hypotheses) => self.run(StepKind::Assume, span, |s| s.assume_step(hypotheses)),
            Step::Have { name, ty, by } => self.run(StepKind::Have, span, |s| s.have_step(*name, ty.as_ref(), by)),
            Step::Qed(by) => self.run(StepKind::Qed, span, |s| s.qed_step(by.as_ref())),
        }
    }

    pub fn finish(self) -> Result<CompletedProof, ProofError> {
        match self.progress.closed {
            Some(Closed { term, checked }) => Ok(CompletedProof { theorem: self.theorem, term, checked }),
            None => Err(ProofError::Incomplete { goal: self.progress.goal })
        }
    }

    fn run<F>(&mut self, kind: StepKind, span: Option<Span>, step: F) -> StepResult
        where F: FnOnce(&ProofSession) -> Result<Progress, ProofError>
    {
        self.steps_taken += 1;
        let index = self.steps_taken;
        let result = if self.is_closed() { Err(ProofError::ProofClosed) } else { step(self) };
        match result {
            Ok(progress) => {
                self.progress = progress;
                log::trace!("{} {}\n{}\n{} {}", kind.to_string().bright_blue(), "ok".green(),
                    self.progress.ctx, "⊢".bright_blue(), self.progress.goal);
                if self.is_closed() { StepResult::Qed } else { StepResult::Incomplete }
            }
            Err(error) => {
                log::debug!("{} {} {}", kind.to_string().bright_blue(), "failed".red(), error);
                StepResult::Failed(Failure { step: index, kind, span, error })
            }
        }
    }

    /// Replaces every name introduced by `have` with its proof. Recorded proofs are
    /// already expanded, so one simultaneous substitution suffices.
    fn expand(&self, term: &Term) -> Term {
        let definitions: Vec<_> = self.progress.records.iter()
            .filter_map(Record::definition)
            .collect();
        term.substitute_many(&definitions)
    }

    fn assume_step(&self, hypotheses: &[(Symbol, Option<Term>)]) -> Result<Progress, ProofError> {
        let env = &self.env;
        let mut fuel = env.fuel();
        let mut progress = self.progress.clone();
        for (name, declared) in hypotheses.iter() {
            let name = *name;
            let declared = declared.as_ref().map(|ty| self.expand(ty));
            if progress.ctx.contains(name) {
                return Err(ProofError::DuplicateHypothesis { name })
            }
            let goal = whnf_with(env, &mut fuel, progress.goal.clone())?;
            let (bound, domain, body) = match goal.as_ref() {
                TermData::Pi { name, domain, body } => (*name, domain.clone(), body.clone()),
                _ => return Err(ProofError::NoHypothesis { name, goal: progress.goal })
            };
            let ty = match &declared {
                Some(declared) => {
                    infer::infer_sort(env, &mut fuel, &progress.ctx, declared)?;
                    if !convertible(env, &mut fuel, declared.clone(), domain.clone())? {
                        return Err(ProofError::HypothesisMismatch {
                            name,
                            declared: declared.clone(),
                            expected: domain
                        })
                    }
                    declared.clone()
                }
                None => domain
            };
            progress.goal = body.substitute(bound, &Term::var(name));
            progress.ctx = progress.ctx.bind(name, ty.clone());
            progress.records.push_back(Record::Assumed { name, ty });
        }
        Ok(progress)
    }

    fn elaborate(&self, by: &By) -> Result<Term, ProofError> {
        match by {
            By::Term(term) => Ok(self.expand(term)),
            By::Implicit { name, args } => {
                let args: Vec<_> = args.iter().map(|arg| self.expand(arg)).collect();
                self.implicits.elaborate(&self.env, &self.progress.ctx, &self.progress.goal, *name, &args)
            }
        }
    }

    fn have_step(&self, name: Symbol, ty: Option<&Term>, by: &By) -> Result<Progress, ProofError> {
        let env = &self.env;
        let mut progress = self.progress.clone();
        if progress.ctx.contains(name) {
            return Err(ProofError::DuplicateHypothesis { name })
        }
        let proof = self.elaborate(by)?;
        let mut fuel = env.fuel();
        let ty = match ty.map(|ty| self.expand(ty)) {
            Some(ty) => {
                infer::infer_sort(env, &mut fuel, &progress.ctx, &ty)?;
                infer::check_with(env, &mut fuel, &progress.ctx, &proof, &ty)?;
                ty
            }
            None => {
                let ty = infer::infer(env, &mut fuel, &progress.ctx, &proof)?;
                if ty.is_kind() {
                    return Err(TypeError::KindHasNoType { term: proof }.into())
                }
                ty
            }
        };
        progress.ctx = progress.ctx.bind(name, ty);
        progress.records.push_back(Record::Had { name, proof });
        Ok(progress)
    }

    fn last_have(&self) -> Option<Term> {
        self.progress.records.iter().rev().find_map(|record| match record {
            Record::Had { proof, .. } => Some(proof.clone()),
            Record::Assumed { .. } => None
        })
    }

    /// Abstracts the assumptions around `term`. `have` steps leave no trace, their
    /// proofs were substituted into every later step.
    fn assemble(&self, term: Term) -> Term {
        self.progress.records.iter().rev().fold(term, |rest, record| match record {
            Record::Assumed { name, ty } => Term::lambda(*name, ty.clone(), rest),
            Record::Had { .. } => rest
        })
    }

    fn qed_step(&self, by: Option<&By>) -> Result<Progress, ProofError> {
        let env = &self.env;
        let term = match by {
            Some(by) => self.elaborate(by)?,
            None => self.last_have().ok_or(ProofError::NothingToConclude)?
        };
        let mut progress = self.progress.clone();
        infer::check_with(env, &mut env.fuel(), &progress.ctx, &term, &progress.goal)?;
        let term = self.assemble(term);
        let checked = match self.theorem {
            Some(theorem) => Some(env.check_proof(theorem, term.clone())?),
            None => {
                infer::check(env, &self.params, &term, &self.statement)?;
                None
            }
        };
        log::trace!("{} {}", "assembled".bright_blue(), term);
        progress.closed = Some(Closed { term, checked });
        Ok(progress)
    }
}

impl fmt::Display for ProofSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.progress.ctx.is_empty() {
            writeln!(f, "{}", self.progress.ctx)?;
        }
        match self.state() {
            State::Open => write!(f, "⊢ {}", self.progress.goal),
            State::Closed => write!(f, "⊢ {} (closed)", self.statement)
        }
    }
}
