
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use ahash::AHashSet;

use crate::utility::*;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Term(Rc<TermData>);

#[derive(Debug, Hash, Clone, PartialEq, Eq)]
pub enum TermData {
    Sort(Sort),
    Var {
        name: Symbol
    },
    Reference {
        name: Symbol,
        args: Vec<Term>
    },
    Apply {
        fun: Term,
        arg: Term
    },
    Lambda {
        name: Symbol,
        domain: Term,
        body: Term
    },
    Pi {
        name: Symbol,
        domain: Term,
        body: Term
    },
}

impl Deref for Term {
    type Target = TermData;

    #[inline]
    fn deref(&self) -> &Self::Target {
        let Term(inner) = self;
        inner
    }
}

impl AsRef<TermData> for Term {
    fn as_ref(&self) -> &TermData { self }
}

impl From<TermData> for Term {
    fn from(data: TermData) -> Self { Term(Rc::new(data)) }
}

impl TermData {
    pub fn rced(self) -> Term { self.into() }
}

impl Term {
    pub fn sort(sort: Sort) -> Term { TermData::Sort(sort).rced() }

    pub fn star() -> Term { Term::sort(Sort::Type) }

    pub fn super_star() -> Term { Term::sort(Sort::Kind) }

    pub fn var(name: impl Into<Symbol>) -> Term {
        TermData::Var { name: name.into() }.rced()
    }

    pub fn reference(name: impl Into<Symbol>, args: Vec<Term>) -> Term {
        TermData::Reference { name: name.into(), args }.rced()
    }

    pub fn constant(name: impl Into<Symbol>) -> Term {
        Term::reference(name, vec![])
    }

    pub fn apply(fun: Term, arg: Term) -> Term {
        TermData::Apply { fun, arg }.rced()
    }

    pub fn apply_all(fun: Term, args: impl IntoIterator<Item = Term>) -> Term {
        args.into_iter().fold(fun, Term::apply)
    }

    pub fn lambda(name: impl Into<Symbol>, domain: Term, body: Term) -> Term {
        TermData::Lambda { name: name.into(), domain, body }.rced()
    }

    pub fn pi(name: impl Into<Symbol>, domain: Term, body: Term) -> Term {
        TermData::Pi { name: name.into(), domain, body }.rced()
    }

    /// Non-dependent product, the binder is named so that it cannot capture anything in `body`.
    pub fn arrow(domain: Term, body: Term) -> Term {
        let name = Symbol::default().fresh(|s| body.occurs_free(s));
        Term::pi(name, domain, body)
    }

    pub fn lambda_all(params: &[(Symbol, Term)], body: Term) -> Term {
        params.iter().rev()
            .fold(body, |acc, (name, domain)| Term::lambda(*name, domain.clone(), acc))
    }

    pub fn pi_all(params: &[(Symbol, Term)], body: Term) -> Term {
        params.iter().rev()
            .fold(body, |acc, (name, domain)| Term::pi(*name, domain.clone(), acc))
    }

    pub fn cloned(&self) -> TermData {
        let data: &TermData = self;
        data.clone()
    }

    pub fn as_sort(&self) -> Option<Sort> {
        match self.as_ref() {
            TermData::Sort(sort) => Some(*sort),
            _ => None
        }
    }

    pub fn is_kind(&self) -> bool { self.as_sort() == Some(Sort::Kind) }

    /// A product whose bound name does not occur in its codomain.
    pub fn is_arrow(&self) -> bool {
        match self.as_ref() {
            TermData::Pi { name, body, .. } => !body.occurs_free(*name),
            _ => false
        }
    }

    pub fn occurs_free(&self, var: Symbol) -> bool {
        match self.as_ref() {
            TermData::Sort(_) => false,
            TermData::Var { name } => *name == var,
            TermData::Reference { args, .. } => args.iter().any(|a| a.occurs_free(var)),
            TermData::Apply { fun, arg } => fun.occurs_free(var) || arg.occurs_free(var),
            TermData::Lambda { name, domain, body }
            | TermData::Pi { name, domain, body } => {
                domain.occurs_free(var) || (*name != var && body.occurs_free(var))
            }
        }
    }

    pub fn free_vars(&self) -> AHashSet<Symbol> {
        fn collect(term: &Term, bound: &mut Vec<Symbol>, out: &mut AHashSet<Symbol>) {
            match term.as_ref() {
                TermData::Sort(_) => { }
                TermData::Var { name } => {
                    if !bound.contains(name) { out.insert(*name); }
                }
                TermData::Reference { args, .. } => {
                    for arg in args.iter() { collect(arg, bound, out) }
                }
                TermData::Apply { fun, arg } => {
                    collect(fun, bound, out);
                    collect(arg, bound, out);
                }
                TermData::Lambda { name, domain, body }
                | TermData::Pi { name, domain, body } => {
                    collect(domain, bound, out);
                    bound.push(*name);
                    collect(body, bound, out);
                    bound.pop();
                }
            }
        }
        let mut out = AHashSet::new();
        collect(self, &mut Vec::new(), &mut out);
        out
    }

    pub fn substitute(&self, name: Symbol, replacement: &Term) -> Term {
        self.substitute_many(&[(name, replacement.clone())])
    }

    /// Simultaneous capture-avoiding substitution.
    pub fn substitute_many(&self, subst: &[(Symbol, Term)]) -> Term {
        if subst.is_empty() { return self.clone() }
        let mut avoid = AHashSet::new();
        for (_, replacement) in subst.iter() {
            avoid.extend(replacement.free_vars());
        }
        self.substitute_inner(subst, &avoid)
    }

    fn substitute_inner(&self, subst: &[(Symbol, Term)], avoid: &AHashSet<Symbol>) -> Term {
        match self.as_ref() {
            TermData::Sort(_) => self.clone(),
            TermData::Var { name } => {
                subst.iter().rev()
                    .find(|(var, _)| var == name)
                    .map(|(_, replacement)| replacement.clone())
                    .unwrap_or_else(|| self.clone())
            }
            TermData::Reference { name, args } => {
                let args = args.iter()
                    .map(|a| a.substitute_inner(subst, avoid))
                    .collect();
                Term::reference(*name, args)
            }
            TermData::Apply { fun, arg } => {
                let fun = fun.substitute_inner(subst, avoid);
                let arg = arg.substitute_inner(subst, avoid);
                Term::apply(fun, arg)
            }
            TermData::Lambda { name, domain, body } => {
                let domain = domain.substitute_inner(subst, avoid);
                let (name, body) = substitute_binder(*name, body, subst, avoid);
                Term::lambda(name, domain, body)
            }
            TermData::Pi { name, domain, body } => {
                let domain = domain.substitute_inner(subst, avoid);
                let (name, body) = substitute_binder(*name, body, subst, avoid);
                Term::pi(name, domain, body)
            }
        }
    }

    /// Structural equality up to consistent renaming of bound variables.
    pub fn alpha_eq(&self, other: &Term) -> bool {
        alpha_eq_inner(self, other, &mut Vec::new(), &mut Vec::new())
    }

    pub fn ambiguous(&self) -> bool {
        match self.as_ref() {
            TermData::Lambda { .. }
            | TermData::Pi { .. }
            | TermData::Apply { .. } => true,
            TermData::Reference { args, .. } => !args.is_empty(),
            TermData::Var { .. }
            | TermData::Sort(_) => false,
        }
    }

    /// Splits an application spine into its head and arguments, in application order.
    pub fn unapply(&self) -> (Term, Vec<Term>) {
        let mut head = self.clone();
        let mut args = vec![];
        while let TermData::Apply { fun, arg } = head.cloned() {
            args.push(arg);
            head = fun;
        }
        args.reverse();
        (head, args)
    }

    pub fn is_apply(&self) -> bool { matches!(self.as_ref(), TermData::Apply { .. }) }

    fn is_binder(&self) -> bool {
        matches!(self.as_ref(), TermData::Lambda { .. } | TermData::Pi { .. })
    }
}

fn substitute_binder(name: Symbol, body: &Term, subst: &[(Symbol, Term)], avoid: &AHashSet<Symbol>) -> (Symbol, Term) {
    let remaining: Vec<(Symbol, Term)> = subst.iter()
        .filter(|(var, _)| *var != name && body.occurs_free(*var))
        .cloned()
        .collect();
    if remaining.is_empty() { return (name, body.clone()) }
    if avoid.contains(&name) {
        let body_vars = body.free_vars();
        let fresh = name.fresh(|s| {
            avoid.contains(&s)
            || body_vars.contains(&s)
            || remaining.iter().any(|(var, _)| *var == s)
        });
        let renamed = body.substitute(name, &Term::var(fresh));
        (fresh, renamed.substitute_inner(&remaining, avoid))
    } else {
        (name, body.substitute_inner(&remaining, avoid))
    }
}

fn alpha_eq_inner(lhs: &Term, rhs: &Term, left: &mut Vec<Symbol>, right: &mut Vec<Symbol>) -> bool {
    match (lhs.as_ref(), rhs.as_ref()) {
        (TermData::Sort(s1), TermData::Sort(s2)) => s1 == s2,
        (TermData::Var { name: n1 }, TermData::Var { name: n2 }) => {
            let p1 = left.iter().rposition(|n| n == n1);
            let p2 = right.iter().rposition(|n| n == n2);
            match (p1, p2) {
                (Some(p1), Some(p2)) => p1 == p2,
                (None, None) => n1 == n2,
                _ => false
            }
        }
        (TermData::Reference { name: n1, args: a1 }, TermData::Reference { name: n2, args: a2 }) => {
            n1 == n2 && a1.len() == a2.len()
            && a1.iter().zip(a2.iter()).all(|(x, y)| alpha_eq_inner(x, y, left, right))
        }
        (TermData::Apply { fun: f1, arg: a1 }, TermData::Apply { fun: f2, arg: a2 }) => {
            alpha_eq_inner(f1, f2, left, right) && alpha_eq_inner(a1, a2, left, right)
        }
        (TermData::Lambda { name: n1, domain: d1, body: b1 }, TermData::Lambda { name: n2, domain: d2, body: b2 })
        | (TermData::Pi { name: n1, domain: d1, body: b1 }, TermData::Pi { name: n2, domain: d2, body: b2 }) => {
            if !alpha_eq_inner(d1, d2, left, right) { return false }
            left.push(*n1);
            right.push(*n2);
            let result = alpha_eq_inner(b1, b2, left, right);
            left.pop();
            right.pop();
            result
        }
        _ => false
    }
}

impl fmt::Display for TermData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermData::Sort(sort) => write!(f, "{}", sort),
            TermData::Var { name } => write!(f, "{}", name),
            TermData::Reference { name, args } => {
                write!(f, "{}", name)?;
                for arg in args.iter() {
                    if arg.ambiguous() { write!(f, " ({})", arg)? }
                    else { write!(f, " {}", arg)? }
                }
                Ok(())
            }
            TermData::Lambda { name, domain, body } => {
                if domain.ambiguous() { write!(f, "λ {}:({}). {}", name, domain, body) }
                else { write!(f, "λ {}:{}. {}", name, domain, body) }
            }
            TermData::Pi { name, domain, body } => {
                if !body.occurs_free(*name) {
                    if domain.is_binder() { write!(f, "({}) → {}", domain, body) }
                    else { write!(f, "{} → {}", domain, body) }
                } else if domain.ambiguous() {
                    write!(f, "Π {}:({}). {}", name, domain, body)
                } else {
                    write!(f, "Π {}:{}. {}", name, domain, body)
                }
            }
            TermData::Apply { fun, arg } => {
                match (fun.is_apply() || !fun.ambiguous(), arg.ambiguous()) {
                    (true, true) => write!(f, "{} ({})", fun, arg),
                    (true, false) => write!(f, "{} {}", fun, arg),
                    (false, true) => write!(f, "({}) ({})", fun, arg),
                    (false, false) => write!(f, "({}) {}", fun, arg),
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data: &TermData = self;
        fmt::Display::fmt(data, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol { Symbol::from(s) }

    #[test]
    fn substitution_replaces_free_occurrences() {
        let term = Term::apply(Term::var("f"), Term::var("x"));
        let result = term.substitute(sym("x"), &Term::var("y"));
        assert_eq!(result, Term::apply(Term::var("f"), Term::var("y")));
    }

    #[test]
    fn substitution_stops_at_shadowing_binder() {
        let term = Term::lambda("x", Term::star(), Term::var("x"));
        let result = term.substitute(sym("x"), &Term::var("y"));
        assert_eq!(result, term);
    }

    #[test]
    fn substitution_avoids_capture() {
        // (λ y:A. x)[x := y] must not become λ y:A. y
        let term = Term::lambda("y", Term::var("A"), Term::var("x"));
        let result = term.substitute(sym("x"), &Term::var("y"));
        match result.as_ref() {
            TermData::Lambda { name, body, .. } => {
                assert_ne!(*name, sym("y"));
                assert_eq!(*body, Term::var("y"));
            }
            _ => panic!("expected a lambda, found {}", result)
        }
        assert!(result.free_vars().contains(&sym("y")));
    }

    #[test]
    fn simultaneous_substitution_does_not_chain() {
        let term = Term::apply(Term::var("a"), Term::var("b"));
        let subst = [(sym("a"), Term::var("b")), (sym("b"), Term::var("a"))];
        let result = term.substitute_many(&subst);
        assert_eq!(result, Term::apply(Term::var("b"), Term::var("a")));
    }

    #[test]
    fn free_vars_excludes_bound_names() {
        let term = Term::pi("x", Term::var("A"), Term::apply(Term::var("x"), Term::var("z")));
        let vars = term.free_vars();
        assert!(vars.contains(&sym("A")));
        assert!(vars.contains(&sym("z")));
        assert!(!vars.contains(&sym("x")));
    }

    #[test]
    fn alpha_equivalence_ignores_bound_names() {
        let id1 = Term::lambda("x", Term::var("A"), Term::var("x"));
        let id2 = Term::lambda("y", Term::var("A"), Term::var("y"));
        let konst = Term::lambda("y", Term::var("A"), Term::var("x"));
        assert!(id1.alpha_eq(&id2));
        assert!(!id1.alpha_eq(&konst));
        assert_ne!(id1, id2);
    }

    #[test]
    fn alpha_equivalence_respects_binding_structure() {
        // λ x. λ y. x  vs  λ a. λ b. b
        let first = Term::lambda("x", Term::star(), Term::lambda("y", Term::star(), Term::var("x")));
        let second = Term::lambda("a", Term::star(), Term::lambda("b", Term::star(), Term::var("b")));
        assert!(!first.alpha_eq(&second));
    }

    #[test]
    fn arrow_is_a_non_dependent_pi() {
        let arrow = Term::arrow(Term::var("A"), Term::var("B"));
        assert!(arrow.is_arrow());
        let dependent = Term::pi("x", Term::var("A"), Term::apply(Term::var("P"), Term::var("x")));
        assert!(!dependent.is_arrow());
        assert!(arrow.alpha_eq(&Term::pi("x", Term::var("A"), Term::var("B"))));
    }

    #[test]
    fn arrow_binder_does_not_capture() {
        let arrow = Term::arrow(Term::var("A"), Term::var("_"));
        assert!(arrow.free_vars().contains(&sym("_")));
    }

    #[test]
    fn display_uses_arrows_and_parentheses() {
        let a = Term::var("A");
        let b = Term::var("B");
        let term = Term::arrow(Term::arrow(a.clone(), b.clone()), Term::arrow(a, b));
        assert_eq!(term.to_string(), "(A → B) → A → B");
        let id = Term::lambda("x", Term::var("A"), Term::var("x"));
        assert_eq!(id.to_string(), "λ x:A. x");
        let pi = Term::pi("A", Term::star(), Term::arrow(Term::var("A"), Term::var("A")));
        assert_eq!(pi.to_string(), "Π A:Type. A → A");
        let app = Term::apply_all(Term::var("f"), vec![Term::var("x"), Term::apply(Term::var("g"), Term::var("y"))]);
        assert_eq!(app.to_string(), "f x (g y)");
        let reference = Term::reference("and", vec![Term::var("A"), Term::var("B")]);
        assert_eq!(reference.to_string(), "and A B");
    }

    #[test]
    fn unapply_recovers_head_and_arguments() {
        let term = Term::apply_all(Term::var("f"), vec![Term::var("a"), Term::var("b")]);
        let (head, args) = term.unapply();
        assert_eq!(head, Term::var("f"));
        assert_eq!(args, vec![Term::var("a"), Term::var("b")]);
    }

    #[test]
    fn telescopes_nest_in_order() {
        let params = vec![(sym("A"), Term::star()), (sym("x"), Term::var("A"))];
        let term = Term::lambda_all(&params, Term::var("x"));
        let expected = Term::lambda("A", Term::star(), Term::lambda("x", Term::var("A"), Term::var("x")));
        assert_eq!(term, expected);
    }
}
