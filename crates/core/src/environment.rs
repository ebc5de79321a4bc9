use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use colored::Colorize;
use imbl::{HashMap, Vector};

use crate::utility::*;
use crate::term::*;
use crate::context::Context;
use crate::config::KernelConfig;
use crate::error::{TypeError, DeclError};
use crate::reduce::Fuel;
use crate::infer;

static STAMPS: AtomicU64 = AtomicU64::new(1);

fn next_stamp() -> u64 { STAMPS.fetch_add(1, Ordering::Relaxed) }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    Transparent,
    Opaque
}

#[derive(Debug, Clone)]
pub enum EntryKind {
    Definition {
        body: Term,
        transparency: Transparency
    },
    Axiom,
    Theorem {
        proof: Option<Term>,
        lemma: bool
    }
}

/// A checked global entry. `ty` and any body are closed under `params`.
#[derive(Debug, Clone)]
pub struct Entry {
    pub params: Vec<(Symbol, Term)>,
    pub ty: Term,
    pub kind: EntryKind
}

impl Entry {
    /// The parameters as a context, the scope of the type and the body.
    pub fn context(&self) -> Context {
        self.params.iter()
            .fold(Context::new(), |ctx, (name, ty)| ctx.bind(*name, ty.clone()))
    }

    pub fn keyword(&self) -> &'static str {
        match &self.kind {
            EntryKind::Definition { transparency: Transparency::Transparent, .. } => "def",
            EntryKind::Definition { transparency: Transparency::Opaque, .. } => "opaque",
            EntryKind::Axiom => "axiom",
            EntryKind::Theorem { lemma: false, .. } => "theorem",
            EntryKind::Theorem { lemma: true, .. } => "lemma",
        }
    }

    pub fn is_theorem(&self) -> bool { matches!(self.kind, EntryKind::Theorem { .. }) }

    pub fn is_proved(&self) -> bool {
        matches!(self.kind, EntryKind::Theorem { proof: Some(_), .. })
    }

    pub fn body(&self) -> Option<&Term> {
        match &self.kind {
            EntryKind::Definition { body, .. } => Some(body),
            EntryKind::Theorem { proof, .. } => proof.as_ref(),
            EntryKind::Axiom => None
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, ty) in self.params.iter() {
            write!(f, "({} : {}) ", name, ty)?;
        }
        write!(f, ": {}", self.ty)?;
        if let Some(body) = self.body() {
            write!(f, " := {}", body)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum DeclarationKind {
    Definition {
        ty: Option<Term>,
        body: Term,
        transparency: Transparency
    },
    Axiom { ty: Term },
    Theorem {
        ty: Term,
        proof: Option<Term>,
        lemma: bool
    }
}

/// An unchecked entry, handed to [`Environment::declare`].
#[derive(Debug, Clone)]
pub struct Declaration {
    params: Vec<(Symbol, Term)>,
    kind: DeclarationKind
}

impl Declaration {
    /// A transparent definition; the type is inferred from the body when absent.
    pub fn definition(params: Vec<(Symbol, Term)>, ty: Option<Term>, body: Term) -> Declaration {
        let kind = DeclarationKind::Definition { ty, body, transparency: Transparency::Transparent };
        Declaration { params, kind }
    }

    pub fn axiom(params: Vec<(Symbol, Term)>, ty: Term) -> Declaration {
        Declaration { params, kind: DeclarationKind::Axiom { ty } }
    }

    pub fn theorem(params: Vec<(Symbol, Term)>, ty: Term) -> Declaration {
        Declaration { params, kind: DeclarationKind::Theorem { ty, proof: None, lemma: false } }
    }

    pub fn lemma(params: Vec<(Symbol, Term)>, ty: Term) -> Declaration {
        Declaration { params, kind: DeclarationKind::Theorem { ty, proof: None, lemma: true } }
    }

    /// Marks a definition opaque. Has no effect on axioms and theorems.
    pub fn opaque(mut self) -> Declaration {
        if let DeclarationKind::Definition { transparency, .. } = &mut self.kind {
            *transparency = Transparency::Opaque;
        }
        self
    }

    /// Supplies the proof of a theorem up front. Has no effect on definitions and axioms.
    pub fn with_proof(mut self, term: Term) -> Declaration {
        if let DeclarationKind::Theorem { proof, .. } = &mut self.kind {
            *proof = Some(term);
        }
        self
    }
}

/// A proof term that passed checking against a particular environment state.
/// Only [`Environment::check_proof`] makes these.
#[derive(Debug, Clone)]
pub struct CheckedProof {
    theorem: Symbol,
    term: Term,
    stamp: u64,
    version: u64
}

impl CheckedProof {
    pub fn theorem(&self) -> Symbol { self.theorem }

    pub fn term(&self) -> &Term { &self.term }

    /// The version of the environment the proof was checked against.
    pub fn version(&self) -> u64 { self.version }
}

/// Global definitions, axioms and theorems. Clones are cheap snapshots.
#[derive(Debug, Clone)]
pub struct Environment {
    entries: HashMap<Symbol, Rc<Entry>>,
    order: Vector<Symbol>,
    version: u64,
    stamp: u64,
    config: KernelConfig
}

impl Default for Environment {
    fn default() -> Self { Environment::new() }
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            entries: HashMap::new(),
            order: Vector::new(),
            version: 0,
            stamp: next_stamp(),
            config: KernelConfig::default()
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Environment {
        self.config = config;
        self
    }

    pub fn config(&self) -> KernelConfig { self.config }

    /// Number of writes applied so far.
    pub fn version(&self) -> u64 { self.version }

    /// A fresh reduction budget for one query.
    pub fn fuel(&self) -> Fuel { Fuel::new(self.config.fuel) }

    pub fn lookup(&self, name: Symbol) -> Option<&Entry> {
        self.entries.get(&name).map(|entry| entry.as_ref())
    }

    pub fn contains(&self, name: Symbol) -> bool { self.entries.contains_key(&name) }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Every declared name, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ { self.order.iter().copied() }

    /// Declared names except lemmas.
    pub fn public_names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.names().filter(move |name| {
            !matches!(self.lookup(*name).map(|e| &e.kind), Some(EntryKind::Theorem { lemma: true, .. }))
        })
    }

    pub fn snapshot(&self) -> Environment { self.clone() }

    /// Delta-unfolds a transparent definition applied to `args`.
    pub fn unfold(&self, name: Symbol, args: &[Term]) -> Option<Term> {
        let entry = self.lookup(name)?;
        match &entry.kind {
            EntryKind::Definition { body, transparency: Transparency::Transparent }
            if entry.params.len() == args.len() => {
                let subst: Vec<(Symbol, Term)> = entry.params.iter()
                    .map(|(param, _)| *param)
                    .zip(args.iter().cloned())
                    .collect();
                Some(body.substitute_many(&subst))
            }
            _ => None
        }
    }

    fn check_telescope(&self, name: Symbol, fuel: &mut Fuel, params: &[(Symbol, Term)]) -> Result<Context, DeclError> {
        let mut ctx = Context::new();
        for (param, ty) in params.iter() {
            if ctx.contains(*param) {
                return Err(DeclError::DuplicateParameter { name, param: *param })
            }
            infer::infer_sort(self, fuel, &ctx, ty)
                .map_err(|source| DeclError::IllTyped { name, source })?;
            ctx = ctx.bind(*param, ty.clone());
        }
        Ok(ctx)
    }

    fn check_declaration(&self, name: Symbol, decl: Declaration) -> Result<Entry, DeclError> {
        let ill_typed = |source: TypeError| DeclError::IllTyped { name, source };
        let mut fuel = self.fuel();
        let fuel = &mut fuel;
        let Declaration { params, kind } = decl;
        let ctx = self.check_telescope(name, fuel, &params)?;
        let (ty, kind) = match kind {
            DeclarationKind::Definition { ty, body, transparency } => {
                let ty = match ty {
                    Some(ty) => {
                        infer::check_declared_type(self, fuel, &ctx, &ty).map_err(ill_typed)?;
                        infer::check_with(self, fuel, &ctx, &body, &ty).map_err(ill_typed)?;
                        ty
                    }
                    None if transparency == Transparency::Opaque => {
                        return Err(DeclError::OpaqueMissingType { name })
                    }
                    None => infer::infer(self, fuel, &ctx, &body).map_err(ill_typed)?
                };
                (ty, EntryKind::Definition { body, transparency })
            }
            DeclarationKind::Axiom { ty } => {
                infer::check_declared_type(self, fuel, &ctx, &ty).map_err(ill_typed)?;
                (ty, EntryKind::Axiom)
            }
            DeclarationKind::Theorem { ty, proof, lemma } => {
                infer::check_declared_type(self, fuel, &ctx, &ty).map_err(ill_typed)?;
                if let Some(proof) = &proof {
                    infer::check_with(self, fuel, &ctx, proof, &ty).map_err(ill_typed)?;
                }
                (ty, EntryKind::Theorem { proof, lemma })
            }
        };
        Ok(Entry { params, ty, kind })
    }

    fn write(&mut self, name: Symbol, entry: Entry) {
        if !self.entries.contains_key(&name) {
            self.order.push_back(name);
        }
        self.entries.insert(name, Rc::new(entry));
        self.version += 1;
        self.stamp = next_stamp();
    }

    /// Checks `decl` against the current environment and adds it under `name`.
    /// Nothing is written when checking fails.
    pub fn declare(&mut self, name: impl Into<Symbol>, decl: Declaration) -> Result<(), DeclError> {
        let name = name.into();
        if self.contains(name) {
            return Err(DeclError::Duplicate { name })
        }
        let entry = self.check_declaration(name, decl)?;
        log::info!("{} {} {} {}", entry.keyword(), name, entry, "declared".green());
        self.write(name, entry);
        Ok(())
    }

    fn open_theorem(&self, name: Symbol) -> Result<&Entry, DeclError> {
        let entry = self.lookup(name).ok_or(DeclError::Unknown { name })?;
        match &entry.kind {
            EntryKind::Theorem { proof: None, .. } => Ok(entry),
            EntryKind::Theorem { proof: Some(_), .. } => Err(DeclError::AlreadyProved { name }),
            _ => Err(DeclError::NotATheorem { name })
        }
    }

    /// Checks `term` as a proof of the theorem `name` without attaching it.
    pub fn check_proof(&self, name: Symbol, term: Term) -> Result<CheckedProof, DeclError> {
        let entry = self.open_theorem(name)?;
        infer::check(self, &entry.context(), &term, &entry.ty)
            .map_err(|source| DeclError::IllTyped { name, source })?;
        Ok(CheckedProof {
            theorem: name,
            term,
            stamp: self.stamp,
            version: self.version
        })
    }

    /// Attaches a checked proof. If the environment has changed since the proof
    /// was checked, it is checked again first.
    pub fn attach(&mut self, checked: CheckedProof) -> Result<(), DeclError> {
        let CheckedProof { theorem: name, term, stamp, version } = checked;
        let entry = self.open_theorem(name)?;
        if stamp != self.stamp {
            log::debug!("rechecking proof of {} (checked at version {}, now {})", name, version, self.version);
            infer::check(self, &entry.context(), &term, &entry.ty)
                .map_err(|source| DeclError::IllTyped { name, source })?;
        }
        let lemma = matches!(entry.kind, EntryKind::Theorem { lemma: true, .. });
        let proved = Entry {
            params: entry.params.clone(),
            ty: entry.ty.clone(),
            kind: EntryKind::Theorem { proof: Some(term), lemma }
        };
        log::info!("{} {}", name, "proved".green());
        self.write(name, proved);
        Ok(())
    }

    pub fn prove(&mut self, name: impl Into<Symbol>, term: Term) -> Result<(), DeclError> {
        let checked = self.check_proof(name.into(), term)?;
        self.attach(checked)
    }

    fn verify_entry(&self, name: Symbol, entry: &Entry) -> Result<(), DeclError> {
        let ill_typed = |source: TypeError| DeclError::IllTyped { name, source };
        let mut fuel = self.fuel();
        let ctx = self.check_telescope(name, &mut fuel, &entry.params)?;
        infer::check_declared_type(self, &mut fuel, &ctx, &entry.ty).map_err(ill_typed)?;
        if let Some(body) = entry.body() {
            infer::check_with(self, &mut fuel, &ctx, body, &entry.ty).map_err(ill_typed)?;
        }
        Ok(())
    }

    /// Rechecks every entry against the current environment, in declaration order.
    pub fn verify_all(&self) -> Vec<DeclError> {
        let mut failures = vec![];
        for name in self.names() {
            if let Some(entry) = self.lookup(name) {
                if let Err(e) = self.verify_entry(name, entry) {
                    failures.push(e);
                }
            }
        }
        log::info!("verified {} entries, {} failed", self.len(), failures.len());
        failures
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.names() {
            if let Some(entry) = self.lookup(name) {
                writeln!(f, "{} {} {}", entry.keyword(), name, entry)?;
            }
        }
        Ok(())
    }
}
