use proofkit_core::prelude::*;
use proofkit_core::infer;
use proofkit_lang::prelude;
use proofkit_lang::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Checks that the library theorem is proved and that, applied to fresh type
/// variables, it has its statement as type.
fn theorem_runner(name: &str) -> TestResult {
    let (env, _) = prelude::environment(KernelConfig::default())?;
    let name = Symbol::from(name);
    let entry = env.lookup(name).ok_or("theorem not declared")?;
    assert!(entry.is_proved(), "{} has no proof", name);

    let ctx = entry.context();
    let args: Vec<Term> = entry.params.iter().map(|(param, _)| Term::var(*param)).collect();
    let usage = Term::reference(name, args);
    infer::check(&env, &ctx, &usage, &entry.ty)?;
    Ok(())
}

macro_rules! test_theorem_success {
    ($id:ident) => {
        #[test]
        fn $id() -> TestResult {
            theorem_runner(stringify!($id))
        }
    }
}

test_theorem_success!(modus_ponens);
test_theorem_success!(and_intro);
test_theorem_success!(and_elim_left);
test_theorem_success!(and_elim_right);
test_theorem_success!(or_intro_left);
test_theorem_success!(or_intro_right);
test_theorem_success!(or_elim);
test_theorem_success!(ex_falso);
test_theorem_success!(and_comm);
test_theorem_success!(contrapositive);
test_theorem_success!(and_to_or);

#[test]
fn every_listed_theorem_has_a_test() {
    assert_eq!(prelude::THEOREMS.len(), 11);
}

#[test]
fn library_survives_batch_verification() -> TestResult {
    let (env, _) = prelude::environment(KernelConfig::unlimited())?;
    let failures = env.verify_all();
    assert!(failures.is_empty(), "{:?}", failures);
    assert_eq!(env.public_names().count(), env.len());
    Ok(())
}

#[test]
fn library_proofs_reduce() -> TestResult {
    let (env, _) = prelude::environment(KernelConfig::default())?;
    // and_comm B A (and_intro A B a b) reduces to a pair of b and a
    let ctx = Context::new()
        .bind(Symbol::from("A"), Term::star())
        .bind(Symbol::from("B"), Term::star())
        .bind(Symbol::from("a"), Term::var("A"))
        .bind(Symbol::from("b"), Term::var("B"));
    let pair = Term::apply_all(
        Term::reference("and_intro", vec![Term::var("A"), Term::var("B")]),
        vec![Term::var("a"), Term::var("b")]);
    let swapped = Term::apply(
        Term::reference("and_comm", vec![Term::var("A"), Term::var("B")]),
        pair);
    let ty = infer::synthesize(&env, &ctx, &swapped)?;
    assert!(definitionally_equal(&env, &ty, &prelude::and(Term::var("B"), Term::var("A")))?);
    // theorems are neutral, the proof terms are not unfolded
    assert_eq!(normalize(&env, swapped.clone())?, swapped);
    Ok(())
}

#[test]
fn exploring_with_the_library() -> TestResult {
    let (env, implicits) = prelude::environment(KernelConfig::default())?;
    let (a, b) = (Term::var("A"), Term::var("B"));
    let params = vec![(Symbol::from("A"), Term::star()), (Symbol::from("B"), Term::star())];
    let statement = Term::arrow(prelude::and(a.clone(), b.clone()), b.clone());

    let script = Script::new()
        .assume(vec![("p", None)])
        .have("x", None, By::implicit("and_elim_right%", vec![Term::var("p")]))
        .conclude();
    let outcome = try_example(&env, &implicits, params.clone(), statement.clone(), &script);
    assert!(outcome.is_qed(), "{:?}", outcome);

    let wrong = Script::new()
        .assume(vec![("p", None)])
        .have("x", Some(b.clone()), By::implicit("and_elim_left%", vec![Term::var("p")]))
        .conclude();
    let outcome = try_example(&env, &implicits, params, statement, &wrong);
    let failures = outcome.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].error.mismatch(), Some((&b, &a)));
    assert!(matches!(failures[1].error, ProofError::NothingToConclude));
    Ok(())
}
