use colored::Colorize;

use crate::utility::*;
use crate::term::*;
use crate::context::Context;
use crate::environment::{Environment, EntryKind};
use crate::error::TypeError;
use crate::reduce::*;
use crate::conversion::convertible;

pub fn synthesize(env: &Environment, ctx: &Context, term: &Term) -> Result<Term, TypeError> {
    infer(env, &mut env.fuel(), ctx, term)
}

pub fn check(env: &Environment, ctx: &Context, term: &Term, ty: &Term) -> Result<(), TypeError> {
    check_with(env, &mut env.fuel(), ctx, term, ty)
}

/// The sort classifying `ty`, failing if `ty` is not a type.
pub fn sort_of(env: &Environment, ctx: &Context, ty: &Term) -> Result<Sort, TypeError> {
    infer_sort(env, &mut env.fuel(), ctx, ty)
}

/// Accepts anything that may stand as the declared type of a global entry: a term typed by a
/// sort, or `Kind` itself for parametric type formers.
pub fn check_declared_type(env: &Environment, fuel: &mut Fuel, ctx: &Context, ty: &Term) -> Result<(), TypeError> {
    if ty.is_kind() { Ok(()) }
    else { infer_sort(env, fuel, ctx, ty).map(|_| ()) }
}

pub fn infer_sort(env: &Environment, fuel: &mut Fuel, ctx: &Context, ty: &Term) -> Result<Sort, TypeError> {
    let found = infer(env, fuel, ctx, ty)?;
    let found = whnf_with(env, fuel, found)?;
    found.as_sort()
        .ok_or_else(|| TypeError::NotASort { term: ty.clone(), found })
}

pub fn check_with(env: &Environment, fuel: &mut Fuel, ctx: &Context, term: &Term, ty: &Term) -> Result<(), TypeError> {
    let found = infer(env, fuel, ctx, term)?;
    if convertible(env, fuel, found.clone(), ty.clone())? { Ok(()) }
    else {
        Err(TypeError::Mismatch {
            term: term.clone(),
            expected: ty.clone(),
            found
        })
    }
}

/// Instantiates the parameter telescope of `name` with `args`, checking every argument.
/// Returns the substitution from parameter names to arguments.
pub fn check_arguments(env: &Environment
    , fuel: &mut Fuel
    , ctx: &Context
    , name: Symbol
    , params: &[(Symbol, Term)]
    , args: &[Term])
    -> Result<Vec<(Symbol, Term)>, TypeError>
{
    if params.len() != args.len() {
        return Err(TypeError::ArityMismatch { name, expected: params.len(), found: args.len() })
    }
    let mut subst = Vec::with_capacity(args.len());
    for ((param, param_ty), arg) in params.iter().zip(args.iter()) {
        let expected = param_ty.substitute_many(&subst);
        check_with(env, fuel, ctx, arg, &expected)?;
        subst.push((*param, arg.clone()));
    }
    Ok(subst)
}

/// Binds `name : domain` for checking `body`, renaming the binder if the name is taken.
fn enter_binder(ctx: &Context, name: Symbol, domain: &Term, body: &Term) -> (Context, Symbol, Term) {
    if ctx.contains(name) {
        let fresh = ctx.fresh_name(name, body);
        let body = body.substitute(name, &Term::var(fresh));
        (ctx.bind(fresh, domain.clone()), fresh, body)
    } else {
        (ctx.bind(name, domain.clone()), name, body.clone())
    }
}

pub fn infer(env: &Environment, fuel: &mut Fuel, ctx: &Context, term: &Term) -> Result<Term, TypeError> {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        let result = match term.as_ref() {
            TermData::Sort(Sort::Type) => Ok(Term::super_star()),
            TermData::Sort(Sort::Kind) => Err(TypeError::KindHasNoType { term: term.clone() }),
            TermData::Var { name } => {
                ctx.lookup(*name)
                    .cloned()
                    .ok_or(TypeError::UnboundVariable { name: *name })
            }
            TermData::Reference { name, args } => {
                let entry = env.lookup(*name)
                    .ok_or(TypeError::UnknownReference { name: *name })?;
                if let EntryKind::Theorem { proof: None, .. } = &entry.kind {
                    return Err(TypeError::TheoremHasNoProof { name: *name })
                }
                let subst = check_arguments(env, fuel, ctx, *name, &entry.params, args)?;
                Ok(entry.ty.substitute_many(&subst))
            }
            TermData::Pi { name, domain, body } => {
                let domain_sort = infer_sort(env, fuel, ctx, domain)?;
                let (body_ctx, _, body) = enter_binder(ctx, *name, domain, body);
                let body_sort = infer_sort(env, fuel, &body_ctx, &body)?;
                Ok(Term::sort(domain_sort.join(body_sort)))
            }
            TermData::Lambda { name, domain, body } => {
                infer_sort(env, fuel, ctx, domain)?;
                let (body_ctx, name, body) = enter_binder(ctx, *name, domain, body);
                let body_ty = infer(env, fuel, &body_ctx, &body)?;
                if body_ty.is_kind() {
                    Err(TypeError::KindHasNoType { term: body })
                } else {
                    Ok(Term::pi(name, domain.clone(), body_ty))
                }
            }
            TermData::Apply { fun, arg } => {
                let fun_ty = infer(env, fuel, ctx, fun)?;
                let fun_ty_whnf = whnf_with(env, fuel, fun_ty.clone())?;
                match fun_ty_whnf.as_ref() {
                    TermData::Pi { name, domain, body } => {
                        check_with(env, fuel, ctx, arg, domain)?;
                        Ok(body.substitute(*name, arg))
                    }
                    _ => Err(TypeError::NotAFunction { term: fun.clone(), ty: fun_ty })
                }
            }
        };
        if let Ok(ty) = &result {
            log::trace!("\n{} {} {}", term, "=>".bright_blue(), ty);
        }
        result
    })
}
