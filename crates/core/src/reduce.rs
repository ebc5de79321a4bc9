use colored::Colorize;

use crate::term::*;
use crate::environment::Environment;
use crate::error::TypeError;

/// Per-query reduction budget; every beta or delta step costs one unit.
#[derive(Debug, Clone)]
pub struct Fuel {
    limit: Option<usize>,
    remaining: usize,
}

impl Fuel {
    pub fn new(limit: Option<usize>) -> Fuel {
        Fuel { limit, remaining: limit.unwrap_or(0) }
    }

    pub fn unlimited() -> Fuel { Fuel::new(None) }

    pub fn remaining(&self) -> Option<usize> {
        self.limit.map(|_| self.remaining)
    }

    pub fn tick(&mut self) -> Result<(), TypeError> {
        match self.limit {
            None => Ok(()),
            Some(limit) => {
                if self.remaining == 0 {
                    Err(TypeError::FuelExhausted { limit })
                } else {
                    self.remaining -= 1;
                    Ok(())
                }
            }
        }
    }
}

pub fn whnf(env: &Environment, term: Term) -> Result<Term, TypeError> {
    whnf_with(env, &mut env.fuel(), term)
}

/// Reduces the head of `term` until it is neither a beta redex nor a transparent reference.
pub fn whnf_with(env: &Environment, fuel: &mut Fuel, term: Term) -> Result<Term, TypeError> {
    let mut result = term;
    loop {
        let (head, mut spine) = result.unapply();
        match head.as_ref() {
            TermData::Lambda { name, body, .. } if !spine.is_empty() => {
                fuel.tick()?;
                let arg = spine.remove(0);
                let reduced = body.substitute(*name, &arg);
                result = Term::apply_all(reduced, spine);
            }
            TermData::Reference { name, args } => {
                if let Some(unfolded) = env.unfold(*name, args) {
                    fuel.tick()?;
                    log::trace!("{} {} {}", head, "unfolds to".bright_blue(), unfolded);
                    result = Term::apply_all(unfolded, spine);
                } else { break }
            }
            _ => break
        }
    }
    Ok(result)
}

pub fn normalize(env: &Environment, term: Term) -> Result<Term, TypeError> {
    normalize_with(env, &mut env.fuel(), term)
}

/// Full normal form, weak-head reduction applied under binders and in argument positions.
pub fn normalize_with(env: &Environment, fuel: &mut Fuel, term: Term) -> Result<Term, TypeError> {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        let term = whnf_with(env, fuel, term)?;
        let result = match term.as_ref() {
            TermData::Sort(_)
            | TermData::Var { .. } => term.clone(),
            TermData::Reference { name, args } => {
                let args = args.iter()
                    .map(|a| normalize_with(env, fuel, a.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                Term::reference(*name, args)
            }
            TermData::Apply { fun, arg } => {
                let fun = normalize_with(env, fuel, fun.clone())?;
                let arg = normalize_with(env, fuel, arg.clone())?;
                Term::apply(fun, arg)
            }
            TermData::Lambda { name, domain, body } => {
                let domain = normalize_with(env, fuel, domain.clone())?;
                let body = normalize_with(env, fuel, body.clone())?;
                Term::lambda(*name, domain, body)
            }
            TermData::Pi { name, domain, body } => {
                let domain = normalize_with(env, fuel, domain.clone())?;
                let body = normalize_with(env, fuel, body.clone())?;
                Term::pi(*name, domain, body)
            }
        };
        Ok(result)
    })
}
