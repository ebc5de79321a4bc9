use std::fmt;

use imbl::Vector;

use crate::utility::*;
use crate::term::*;
use crate::environment::Environment;
use crate::error::TypeError;
use crate::infer;

/// Ordered free-variable bindings; names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    entries: Vector<(Symbol, Term)>
}

impl Context {
    pub fn new() -> Context { Context::default() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn lookup(&self, name: Symbol) -> Option<&Term> {
        self.entries.iter().rev()
            .find(|(n, _)| *n == name)
            .map(|(_, ty)| ty)
    }

    pub fn contains(&self, name: Symbol) -> bool { self.lookup(name).is_some() }

    pub fn iter(&self) -> impl Iterator<Item = &(Symbol, Term)> { self.entries.iter() }

    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ { self.entries.iter().map(|(n, _)| *n) }

    /// A variant of `name` that is neither bound here nor free in `avoid`.
    pub fn fresh_name(&self, name: Symbol, avoid: &Term) -> Symbol {
        name.fresh(|s| self.contains(s) || avoid.occurs_free(s))
    }

    /// Extends the context without checking `ty`, the caller guarantees `name` is unbound.
    pub fn bind(&self, name: Symbol, ty: Term) -> Context {
        let mut result = self.clone();
        result.entries.push_back((name, ty));
        result
    }

    /// Checks that `ty` has a sort and binds it, renaming `name` if it is already bound.
    /// Returns the extended context and the name actually bound.
    pub fn push(&self, env: &Environment, name: Symbol, ty: Term) -> Result<(Context, Symbol), TypeError> {
        infer::sort_of(env, self, &ty)?;
        let name = name.fresh(|s| self.contains(s));
        Ok((self.bind(name, ty), name))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, ty) in self.entries.iter() {
            if !first { writeln!(f)?; }
            write!(f, "{} : {}", name, ty)?;
            first = false;
        }
        Ok(())
    }
}
