
use std::{ops, fmt};
use internment::LocalIntern;

pub type Span = (usize, usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Symbol(LocalIntern<String>);

impl From<&str> for Symbol {
    fn from(s: &str) -> Self { Symbol(LocalIntern::new(s.to_string())) }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self { Symbol(LocalIntern::new(s)) }
}

impl AsRef<String> for Symbol {
    fn as_ref(&self) -> &String { self.0.as_ref() }
}

impl ops::Deref for Symbol {
    type Target = String;
    fn deref(&self) -> &Self::Target { self.0.deref() }
}

impl Default for Symbol {
    fn default() -> Self { Self::from("_") }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl Symbol {
    pub fn is_anonymous(&self) -> bool { self.as_str() == "_" }

    /// The first variant of this name, `x1`, `x2`, ... for which `taken` answers false.
    /// Trailing digits of the original name are dropped before numbering.
    pub fn fresh(self, taken: impl Fn(Symbol) -> bool) -> Symbol {
        if !taken(self) { return self }
        let base = self.trim_end_matches(|c: char| c.is_ascii_digit());
        let base = if base.is_empty() { "x" } else { base };
        let mut counter = 1usize;
        loop {
            let candidate = Symbol::from(format!("{}{}", base, counter));
            if !taken(candidate) { return candidate }
            counter += 1;
        }
    }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sort {
    Type,
    Kind
}

impl Sort {
    /// Sort of a product whose domain lives in `self` and codomain in `other`.
    pub fn join(self, other: Sort) -> Sort {
        if self == Sort::Kind || other == Sort::Kind { Sort::Kind }
        else { Sort::Type }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Type => write!(f, "Type"),
            Sort::Kind => write!(f, "Kind")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_skips_taken_names() {
        let taken = [Symbol::from("x"), Symbol::from("x1")];
        let fresh = Symbol::from("x").fresh(|s| taken.contains(&s));
        assert_eq!(fresh, Symbol::from("x2"));
    }

    #[test]
    fn fresh_keeps_free_name() {
        let name = Symbol::from("h");
        assert_eq!(name.fresh(|_| false), name);
    }

    #[test]
    fn fresh_renumbers_suffixed_names() {
        let fresh = Symbol::from("y7").fresh(|s| s.as_str() == "y7");
        assert_eq!(fresh, Symbol::from("y1"));
    }

    #[test]
    fn join_is_kind_if_either_is_kind() {
        assert_eq!(Sort::Type.join(Sort::Type), Sort::Type);
        assert_eq!(Sort::Type.join(Sort::Kind), Sort::Kind);
        assert_eq!(Sort::Kind.join(Sort::Type), Sort::Kind);
    }
}
