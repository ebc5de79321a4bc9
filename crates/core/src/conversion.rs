use colored::Colorize;
use if_chain::if_chain;

use crate::utility::*;
use crate::term::*;
use crate::environment::Environment;
use crate::error::TypeError;
use crate::reduce::*;

pub fn definitionally_equal(env: &Environment, lhs: &Term, rhs: &Term) -> Result<bool, TypeError> {
    convertible(env, &mut env.fuel(), lhs.clone(), rhs.clone())
}

/// Brings a pair of binder bodies under one common bound name.
fn align_binders(n1: Symbol, b1: &Term, n2: Symbol, b2: &Term) -> (Term, Term) {
    if n1 == n2 { return (b1.clone(), b2.clone()) }
    if !b2.occurs_free(n1) {
        return (b1.clone(), b2.substitute(n2, &Term::var(n1)))
    }
    let fresh = n1.fresh(|s| b1.occurs_free(s) || b2.occurs_free(s));
    let fresh_var = Term::var(fresh);
    (b1.substitute(n1, &fresh_var), b2.substitute(n2, &fresh_var))
}

pub fn convertible(env: &Environment, fuel: &mut Fuel, lhs: Term, rhs: Term) -> Result<bool, TypeError> {
    if lhs.alpha_eq(&rhs) { return Ok(true) }
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        let lhs = whnf_with(env, fuel, lhs)?;
        let rhs = whnf_with(env, fuel, rhs)?;
        log::debug!("\n{} {} {}", lhs, "=?".bright_blue(), rhs);
        match (lhs.as_ref(), rhs.as_ref()) {
            (TermData::Sort(s1), TermData::Sort(s2)) => Ok(s1 == s2),
            (TermData::Var { name: n1 }, TermData::Var { name: n2 }) => Ok(n1 == n2),
            (TermData::Reference { name: n1, args: a1 }, TermData::Reference { name: n2, args: a2 }) => {
                if n1 != n2 || a1.len() != a2.len() { return Ok(false) }
                for (x, y) in a1.iter().zip(a2.iter()) {
                    if !convertible(env, fuel, x.clone(), y.clone())? { return Ok(false) }
                }
                Ok(true)
            }
            (TermData::Apply { fun: f1, arg: a1 }, TermData::Apply { fun: f2, arg: a2 }) => {
                if_chain! {
                    if convertible(env, fuel, f1.clone(), f2.clone())?;
                    if convertible(env, fuel, a1.clone(), a2.clone())?;
                    then { Ok(true) }
                    else { Ok(false) }
                }
            }
            (TermData::Lambda { name: n1, domain: d1, body: b1 }, TermData::Lambda { name: n2, domain: d2, body: b2 })
            | (TermData::Pi { name: n1, domain: d1, body: b1 }, TermData::Pi { name: n2, domain: d2, body: b2 }) => {
                if !convertible(env, fuel, d1.clone(), d2.clone())? { return Ok(false) }
                let (b1, b2) = align_binders(*n1, b1, *n2, b2);
                convertible(env, fuel, b1, b2)
            }
            _ => Ok(false)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::environment::Declaration;

    /// `(λ x:Type. λ y:Type. y) a b`, two beta steps away from `b`.
    fn two_steps_from_b() -> Term {
        Term::apply_all(
            Term::lambda("x", Term::star(), Term::lambda("y", Term::star(), Term::var("y"))),
            vec![Term::var("a"), Term::var("b")])
    }

    #[test]
    fn exhausted_fuel_is_not_inequality() -> Result<(), TypeError> {
        let starved = Environment::new().with_config(KernelConfig::with_fuel(1));
        let result = definitionally_equal(&starved, &two_steps_from_b(), &Term::var("b"));
        assert!(matches!(result, Err(TypeError::FuelExhausted { limit: 1 })));

        let fed = Environment::new().with_config(KernelConfig::with_fuel(2));
        assert!(definitionally_equal(&fed, &two_steps_from_b(), &Term::var("b"))?);
        Ok(())
    }

    #[test]
    fn arrows_equal_dependent_spelling() -> Result<(), TypeError> {
        let env = Environment::new();
        let arrow = Term::arrow(Term::var("A"), Term::var("B"));
        let pi = Term::pi("x", Term::var("A"), Term::var("B"));
        assert!(definitionally_equal(&env, &arrow, &pi)?);
        Ok(())
    }

    #[test]
    fn beta_equal_terms_are_convertible() -> Result<(), TypeError> {
        let env = Environment::new();
        let redex = Term::apply(Term::lambda("x", Term::star(), Term::var("x")), Term::var("A"));
        assert!(definitionally_equal(&env, &redex, &Term::var("A"))?);
        assert!(!definitionally_equal(&env, &redex, &Term::var("B"))?);
        Ok(())
    }

    #[test]
    fn binder_comparison_avoids_capture() -> Result<(), TypeError> {
        let env = Environment::new();
        // λ x. y  is not  λ y. y
        let first = Term::lambda("x", Term::star(), Term::var("y"));
        let second = Term::lambda("y", Term::star(), Term::var("y"));
        assert!(!definitionally_equal(&env, &first, &second)?);
        Ok(())
    }

    #[test]
    fn sorts_are_distinct() -> Result<(), TypeError> {
        let env = Environment::new();
        assert!(!definitionally_equal(&env, &Term::star(), &Term::super_star())?);
        Ok(())
    }

    #[test]
    fn definitions_unfold_during_comparison() -> Result<(), Box<dyn std::error::Error>> {
        let mut env = Environment::new();
        let params = vec![(Symbol::from("A"), Term::star())];
        let endo = Term::arrow(Term::var("A"), Term::var("A"));
        env.declare("endo", Declaration::definition(params.clone(), None, endo))?;
        env.declare("sealed", Declaration::definition(params, Some(Term::star()), Term::var("A")).opaque())?;

        let reference = Term::reference("endo", vec![Term::var("B")]);
        let unfolded = Term::arrow(Term::var("B"), Term::var("B"));
        assert!(definitionally_equal(&env, &reference, &unfolded)?);

        let sealed = Term::reference("sealed", vec![Term::var("B")]);
        assert!(!definitionally_equal(&env, &sealed, &Term::var("B"))?);
        assert!(definitionally_equal(&env, &sealed, &sealed.clone())?);
        Ok(())
    }

    #[test]
    fn neutral_references_compare_arguments() -> Result<(), Box<dyn std::error::Error>> {
        let mut env = Environment::new();
        let params = vec![(Symbol::from("A"), Term::star())];
        env.declare("P", Declaration::axiom(params, Term::star()))?;
        let redex = Term::apply(Term::lambda("x", Term::star(), Term::var("x")), Term::var("B"));
        let lhs = Term::reference("P", vec![redex]);
        let rhs = Term::reference("P", vec![Term::var("B")]);
        assert!(definitionally_equal(&env, &lhs, &rhs)?);
        Ok(())
    }
}
