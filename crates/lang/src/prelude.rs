//! Propositional connectives in their impredicative encodings, together with their
//! introduction and elimination rules, each proved by an assume/have/qed script.

use proofkit_core::prelude::*;

use crate::error::ProofkitError;
use crate::implicit::Implicits;
use crate::script::{self, By, Script, Verdict};

/// Theorems proved by [`load`], in the order they are proved.
pub const THEOREMS: &[&str] = &[
    "modus_ponens",
    "and_intro",
    "and_elim_left",
    "and_elim_right",
    "or_intro_left",
    "or_intro_right",
    "or_elim",
    "ex_falso",
    "and_comm",
    "contrapositive",
    "and_to_or",
];

fn var(name: &str) -> Term { Term::var(name) }

fn arrow(domain: Term, body: Term) -> Term { Term::arrow(domain, body) }

fn types(names: &[&str]) -> Vec<(Symbol, Term)> {
    names.iter().map(|n| (Symbol::from(*n), Term::star())).collect()
}

pub fn and(a: Term, b: Term) -> Term { Term::reference("and", vec![a, b]) }

pub fn or(a: Term, b: Term) -> Term { Term::reference("or", vec![a, b]) }

pub fn not(a: Term) -> Term { Term::reference("not", vec![a]) }

pub fn falsity() -> Term { Term::constant("False") }

fn define_connectives(env: &mut Environment) -> Result<(), DeclError> {
    let (a, b, c) = (var("A"), var("B"), var("C"));
    // Π C:Type. (A → B → C) → C
    let and_body = Term::pi("C", Term::star(),
        arrow(arrow(a.clone(), arrow(b.clone(), c.clone())), c.clone()));
    env.declare("and", Declaration::definition(types(&["A", "B"]), None, and_body))?;
    // Π C:Type. (A → C) → (B → C) → C
    let or_body = Term::pi("C", Term::star(),
        arrow(arrow(a.clone(), c.clone()), arrow(arrow(b, c.clone()), c.clone())));
    env.declare("or", Declaration::definition(types(&["A", "B"]), None, or_body))?;
    env.declare("False", Declaration::definition(vec![], None, Term::pi("C", Term::star(), c)))?;
    env.declare("not", Declaration::definition(types(&["A"]), None, arrow(a, falsity())))?;
    Ok(())
}

fn theorem(env: &mut Environment
    , implicits: &Implicits
    , name: &str
    , params: &[&str]
    , statement: Term
    , script: Script)
    -> Result<(), ProofkitError>
{
    env.declare(name, Declaration::theorem(types(params), statement))?;
    match script::proof(env, implicits, name, &script)? {
        Verdict::Qed { .. } => Ok(()),
        Verdict::Incomplete { goal, .. } => Err(crate::error::ProofError::Incomplete { goal }.into())
    }
}

fn prove_rules(env: &mut Environment, implicits: &Implicits) -> Result<(), ProofkitError> {
    let (a, b, c) = (var("A"), var("B"), var("C"));
    let hole = None;

    theorem(env, implicits, "modus_ponens", &["A", "B"],
        arrow(arrow(a.clone(), b.clone()), arrow(a.clone(), b.clone())),
        Script::new()
            .assume(vec![("f", hole.clone()), ("x", hole.clone())])
            .qed(Term::apply(var("f"), var("x"))))?;

    theorem(env, implicits, "and_intro", &["A", "B"],
        arrow(a.clone(), arrow(b.clone(), and(a.clone(), b.clone()))),
        Script::new()
            .assume(vec![("x", hole.clone()), ("y", hole.clone())])
            .qed(Term::lambda("C", Term::star(),
                Term::lambda("f", arrow(a.clone(), arrow(b.clone(), c.clone())),
                    Term::apply_all(var("f"), vec![var("x"), var("y")])))))?;

    let first = Term::lambda("x", a.clone(), Term::lambda("y", b.clone(), var("x")));
    theorem(env, implicits, "and_elim_left", &["A", "B"],
        arrow(and(a.clone(), b.clone()), a.clone()),
        Script::new()
            .assume(vec![("p", hole.clone())])
            .have("k", Some(arrow(a.clone(), arrow(b.clone(), a.clone()))), first)
            .qed(Term::apply_all(var("p"), vec![a.clone(), var("k")])))?;

    let second = Term::lambda("x", a.clone(), Term::lambda("y", b.clone(), var("y")));
    theorem(env, implicits, "and_elim_right", &["A", "B"],
        arrow(and(a.clone(), b.clone()), b.clone()),
        Script::new()
            .assume(vec![("p", hole.clone())])
            .qed(Term::apply_all(var("p"), vec![b.clone(), second])))?;

    theorem(env, implicits, "or_intro_left", &["A", "B"],
        arrow(a.clone(), or(a.clone(), b.clone())),
        Script::new()
            .assume(vec![("x", hole.clone())])
            .qed(Term::lambda("C", Term::star(),
                Term::lambda("f", arrow(a.clone(), c.clone()),
                    Term::lambda("g", arrow(b.clone(), c.clone()),
                        Term::apply(var("f"), var("x")))))))?;

    theorem(env, implicits, "or_intro_right", &["A", "B"],
        arrow(b.clone(), or(a.clone(), b.clone())),
        Script::new()
            .assume(vec![("y", hole.clone())])
            .qed(Term::lambda("C", Term::star(),
                Term::lambda("f", arrow(a.clone(), c.clone()),
                    Term::lambda("g", arrow(b.clone(), c.clone()),
                        Term::apply(var("g"), var("y")))))))?;

    theorem(env, implicits, "or_elim", &["A", "B", "C"],
        arrow(or(a.clone(), b.clone()),
            arrow(arrow(a.clone(), c.clone()), arrow(arrow(b.clone(), c.clone()), c.clone()))),
        Script::new()
            .assume(vec![
                ("p", hole.clone()),
                ("f", Some(arrow(a.clone(), c.clone()))),
                ("g", Some(arrow(b.clone(), c.clone()))),
            ])
            .qed(Term::apply_all(var("p"), vec![c.clone(), var("f"), var("g")])))?;

    theorem(env, implicits, "ex_falso", &["A"],
        arrow(falsity(), a.clone()),
        Script::new()
            .assume(vec![("f", hole.clone())])
            .qed(Term::apply(var("f"), a.clone())))?;

    theorem(env, implicits, "and_comm", &["A", "B"],
        arrow(and(a.clone(), b.clone()), and(b.clone(), a.clone())),
        Script::new()
            .assume(vec![("p", hole.clone())])
            .have("x", hole.clone(), By::implicit("and_elim_left%", vec![var("p")]))
            .have("y", hole.clone(), By::implicit("and_elim_right%", vec![var("p")]))
            .qed(Term::apply_all(
                Term::reference("and_intro", vec![b.clone(), a.clone()]),
                vec![var("y"), var("x")])))?;

    theorem(env, implicits, "contrapositive", &["A", "B"],
        arrow(arrow(a.clone(), b.clone()), arrow(not(b.clone()), not(a.clone()))),
        Script::new()
            .assume(vec![("f", hole.clone()), ("nb", hole.clone()), ("x", hole.clone())])
            .have("y", Some(b.clone()), Term::apply(var("f"), var("x")))
            .qed(Term::apply(var("nb"), var("y"))))?;

    theorem(env, implicits, "and_to_or", &["A", "B"],
        arrow(and(a.clone(), b.clone()), or(a.clone(), b.clone())),
        Script::new()
            .assume(vec![("p", hole.clone())])
            .have("x", hole, By::implicit("and_elim_left%", vec![var("p")]))
            .qed(Term::apply(Term::reference("or_intro_left", vec![a, b]), var("x"))))?;

    Ok(())
}

/// Declares the connectives and proves their rules into `env`, registering the
/// `and_elim_left%` and `and_elim_right%` helpers in `implicits`.
pub fn load(env: &mut Environment, implicits: &mut Implicits) -> Result<(), ProofkitError> {
    define_connectives(env)?;
    implicits.register("and_elim_left%", "and_elim_left", Implicits::from_first_argument("and"));
    implicits.register("and_elim_right%", "and_elim_right", Implicits::from_first_argument("and"));
    prove_rules(env, implicits)
}

/// A fresh environment holding the library.
pub fn environment(config: KernelConfig) -> Result<(Environment, Implicits), ProofkitError> {
    let mut env = Environment::new().with_config(config);
    let mut implicits = Implicits::new();
    load(&mut env, &mut implicits)?;
    Ok((env, implicits))
}
