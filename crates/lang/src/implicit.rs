use std::fmt;
use std::rc::Rc;

use colored::Colorize;
use if_chain::if_chain;
use imbl::HashMap;

use proofkit_core::prelude::*;
use proofkit_core::infer;
use crate::error::ProofError;

/// What a transformer sees of the application it is asked to complete.
pub struct ImplicitSite<'a> {
    pub name: Symbol,
    pub target: Symbol,
    pub args: &'a [Term],
    pub arg_types: &'a [Term],
    pub goal: &'a Term,
    pub context: &'a Context,
    pub env: &'a Environment
}

pub type Transformer = Rc<dyn Fn(&ImplicitSite<'_>) -> Option<Vec<Term>>>;

/// Helpers that expand `helper args` into `target[inferred] args`.
#[derive(Clone, Default)]
pub struct Implicits {
    helpers: HashMap<Symbol, (Symbol, Transformer)>
}

impl fmt::Debug for Implicits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.helpers.iter().map(|(name, (target, _))| (name, target)))
            .finish()
    }
}

impl Implicits {
    pub fn new() -> Implicits { Implicits::default() }

    pub fn register<F>(&mut self, helper: impl Into<Symbol>, target: impl Into<Symbol>, transformer: F)
        where F: Fn(&ImplicitSite<'_>) -> Option<Vec<Term>> + 'static
    {
        let transformer: Transformer = Rc::new(transformer);
        self.helpers.insert(helper.into(), (target.into(), transformer));
    }

    pub fn contains(&self, helper: Symbol) -> bool { self.helpers.contains_key(&helper) }

    pub fn target(&self, helper: Symbol) -> Option<Symbol> {
        self.helpers.get(&helper).map(|(target, _)| *target)
    }

    /// A transformer that copies the arguments of the first explicit argument's type,
    /// provided that type is a reference to `head`.
    pub fn from_first_argument(head: impl Into<Symbol>) -> impl Fn(&ImplicitSite<'_>) -> Option<Vec<Term>> + 'static {
        let head = head.into();
        move |site: &ImplicitSite<'_>| {
            if_chain! {
                if let Some(ty) = site.arg_types.first();
                if let TermData::Reference { name, args } = ty.as_ref();
                if *name == head;
                then { Some(args.clone()) }
                else { None }
            }
        }
    }

    /// Expands the helper `name` applied to `args` into a full application of its target.
    /// The result is not checked, the caller checks it where it is used.
    pub fn elaborate(&self
        , env: &Environment
        , ctx: &Context
        , goal: &Term
        , name: Symbol
        , args: &[Term])
        -> Result<Term, ProofError>
    {
        let (target, transformer) = self.helpers.get(&name)
            .ok_or(ProofError::UnknownImplicit { name })?;
        let arg_types = args.iter()
            .map(|arg| infer::synthesize(env, ctx, arg))
            .collect::<Result<Vec<_>, _>>()?;
        let site = ImplicitSite {
            name,
            target: *target,
            args,
            arg_types: &arg_types,
            goal,
            context: ctx,
            env
        };
        let inferred = transformer(&site)
            .ok_or_else(|| ProofError::ImplicitFailed {
                name,
                target: *target,
                types: arg_types.iter()
                    .map(|ty| ty.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })?;
        let result = Term::apply_all(Term::reference(*target, inferred), args.iter().cloned());
        log::trace!("{} {} {}", name, "expands to".bright_blue(), result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol { Symbol::from(s) }

    fn pair_environment() -> Result<Environment, DeclError> {
        let mut env = Environment::new();
        let params = vec![(sym("A"), Term::star()), (sym("B"), Term::star())];
        env.declare("Pair", Declaration::axiom(params.clone(), Term::star()))?;
        let statement = Term::arrow(Term::reference("Pair", vec![Term::var("A"), Term::var("B")]), Term::var("A"));
        env.declare("fst", Declaration::axiom(params, statement))?;
        Ok(env)
    }

    fn pair_context() -> Context {
        let pair = Term::reference("Pair", vec![Term::var("X"), Term::var("Y")]);
        Context::new()
            .bind(sym("X"), Term::star())
            .bind(sym("Y"), Term::star())
            .bind(sym("p"), pair)
    }

    #[test]
    fn expands_to_the_target() -> Result<(), Box<dyn std::error::Error>> {
        let env = pair_environment()?;
        let ctx = pair_context();
        let mut implicits = Implicits::new();
        implicits.register("fst%", "fst", Implicits::from_first_argument("Pair"));

        let term = implicits.elaborate(&env, &ctx, &Term::var("X"), sym("fst%"), &[Term::var("p")])?;
        let expected = Term::apply(
            Term::reference("fst", vec![Term::var("X"), Term::var("Y")]),
            Term::var("p"));
        assert_eq!(term, expected);
        assert_eq!(infer::synthesize(&env, &ctx, &term)?, Term::var("X"));
        Ok(())
    }

    #[test]
    fn unknown_helpers_are_reported() -> Result<(), DeclError> {
        let env = pair_environment()?;
        let result = Implicits::new().elaborate(&env, &pair_context(), &Term::star(), sym("snd%"), &[]);
        assert!(matches!(result, Err(ProofError::UnknownImplicit { .. })));
        Ok(())
    }

    #[test]
    fn declining_transformers_fail() -> Result<(), DeclError> {
        let env = pair_environment()?;
        let ctx = pair_context();
        let mut implicits = Implicits::new();
        implicits.register("fst%", "fst", Implicits::from_first_argument("Pair"));
        // X : Type is not a pair
        let result = implicits.elaborate(&env, &ctx, &Term::star(), sym("fst%"), &[Term::var("X")]);
        match result {
            Err(ProofError::ImplicitFailed { types, .. }) => assert_eq!(types, "Type"),
            other => panic!("expected the helper to decline, got {:?}", other)
        }
        let result = implicits.elaborate(&env, &ctx, &Term::star(), sym("fst%"), &[]);
        assert!(matches!(result, Err(ProofError::ImplicitFailed { .. })));
        Ok(())
    }

    #[test]
    fn ill_typed_arguments_are_type_errors() -> Result<(), DeclError> {
        let env = pair_environment()?;
        let mut implicits = Implicits::new();
        implicits.register("fst%", "fst", Implicits::from_first_argument("Pair"));
        let result = implicits.elaborate(&env, &pair_context(), &Term::star(), sym("fst%"), &[Term::var("q")]);
        assert!(matches!(result, Err(ProofError::Type(TypeError::UnboundVariable { .. }))));
        Ok(())
    }
}
