use prop_theory::coins::ordering::{CoinOrdering, CoinProp};
use prop_theory::tasks::schedule::TaskSchedule;
use prop_theory::{Encoding, Error, Formula, Registry, Theory, Var};
use std::collections::{BTreeSet, HashSet};

fn model_set(theory: &Theory) -> BTreeSet<Vec<(Var, bool)>> {
    theory.models().map(|m| m.iter().collect()).collect()
}

fn random_formula(rng: &mut fastrand::Rng, vars: &[Var], depth: u32) -> Formula {
    if depth == 0 || rng.u8(0..4) == 0 {
        let v = vars[rng.usize(0..vars.len())];
        return Formula::lit(v, rng.bool());
    }
    let arity = rng.usize(1..=3);
    let children = (0..arity)
        .map(|_| random_formula(rng, vars, depth - 1))
        .collect::<Vec<_>>();
    match rng.u8(0..4) {
        0 => Formula::not(Formula::and(children).unwrap()),
        1 => Formula::and(children).unwrap(),
        2 => Formula::or(children).unwrap(),
        _ => Formula::iff(children[0].clone(), children[arity - 1].clone()),
    }
}

#[test]
fn compile_succeeds_exactly_once() {
    let mut encoding = Encoding::new();
    let a = encoding.var("a".to_string()).unwrap();
    encoding.add_constraint(a).unwrap();
    assert!(encoding.compile().is_ok());
    assert_eq!(encoding.compile(), Err(Error::AlreadyCompiled));
    assert_eq!(encoding.add_constraint(!a), Err(Error::AlreadyCompiled));
}

#[test]
fn equal_keys_share_a_variable() {
    let mut registry = Registry::new();
    let vars: HashSet<Var> = ["p", "q", "p", "q", "r"]
        .into_iter()
        .map(|k| registry.intern(k.to_string()).unwrap())
        .collect();
    assert_eq!(vars.len(), 3);
    assert_eq!(registry.len(), 3);
    assert_eq!(
        registry.intern("p".to_string()).unwrap(),
        registry.get(&"p".to_string()).unwrap()
    );
}

#[test]
fn double_negation_keeps_the_models() {
    let mut encoding = Encoding::new();
    let v = (0..4)
        .map(|i| encoding.var(format!("v{i}")).unwrap())
        .collect::<Vec<_>>();
    encoding.add_constraint((v[0] | v[1]) >> (v[2] & !v[3])).unwrap();
    encoding.add_at_most_one(v.clone()).unwrap();
    let theory = encoding.compile().unwrap();

    let twice = theory.negate().unwrap().negate().unwrap();
    assert_eq!(model_set(&theory), model_set(&twice));
}

#[test]
fn theory_and_negation_partition_the_valuations() {
    let mut encoding = Encoding::new();
    let v = (0..3)
        .map(|i| encoding.var(format!("v{i}")).unwrap())
        .collect::<Vec<_>>();
    encoding.add_exactly_one(v).unwrap();
    let theory = encoding.compile().unwrap();
    let negation = theory.negate().unwrap();

    assert_eq!(theory.count_solutions(), 3);
    assert_eq!(negation.count_solutions(), 5);
    assert!(model_set(&theory).is_disjoint(&model_set(&negation)));
}

#[test]
fn random_formulas_partition_the_valuations() {
    let mut rng = fastrand::Rng::with_seed(17);
    let mut registry = Registry::new();
    let vars = (0..5)
        .map(|i| registry.intern(format!("p{i}")).unwrap())
        .collect::<Vec<_>>();

    for _ in 0..40 {
        let formula = random_formula(&mut rng, &vars, 4);
        let theory = Theory::compile(formula.clone(), registry.vocabulary().unwrap()).unwrap();
        let negation = theory.negate().unwrap();
        let n = theory.vocabulary().len();
        assert_eq!(
            theory.count_solutions() + negation.count_solutions(),
            1u64 << n,
            "{formula}"
        );

        let expected = (0u32..1 << n)
            .filter(|bits| formula.eval_with(&|var: Var| bits >> var.index() & 1 == 1))
            .count() as u64;
        assert_eq!(theory.count_solutions(), expected, "{formula}");
    }
}

#[test]
fn contradictory_observations_are_unsatisfiable() {
    let mut ordering = CoinOrdering::new(2).unwrap();
    ordering.assert_less(1, 2).unwrap();
    ordering.assert_less(2, 1).unwrap();
    let theory = ordering.compile().unwrap();
    assert!(!theory.satisfiable());
    assert!(theory.solve().is_none());
    assert_eq!(theory.count_solutions(), 0);
    assert!(theory.negate().unwrap().valid().is_ok_and(|valid| valid));
}

#[test]
fn one_observation_among_three_coins() {
    let mut ordering = CoinOrdering::new(3).unwrap();
    ordering.assert_less(1, 2).unwrap();
    let theory = ordering.compile().unwrap();
    assert_eq!(theory.count_solutions(), 3);

    let c1_first = ordering.encoding().get(&CoinProp::At(1, 1));
    let p = theory.likelihood(c1_first.unwrap()).unwrap();
    assert!((p - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn forced_literals_are_certain() {
    let mut encoding = Encoding::new();
    let a = encoding.var("a".to_string()).unwrap();
    let b = encoding.var("b".to_string()).unwrap();
    encoding.add_constraint(a).unwrap();
    encoding.add_constraint(a >> !b).unwrap();
    let theory = encoding.compile().unwrap();

    assert_eq!(theory.likelihood(a), Ok(1.0));
    assert_eq!(theory.likelihood(b), Ok(0.0));
    assert_eq!(theory.likelihood(!b), Ok(1.0));
}

#[test]
fn schedules_match_brute_force() {
    let mut schedule = TaskSchedule::new(2, 2).unwrap();
    let theory = schedule.compile().unwrap();
    let vocabulary = theory.vocabulary();
    let formula = theory.formula();

    let n = vocabulary.len();
    let expected = (0u64..1 << n)
        .filter(|bits| {
            formula.eval_with(&|var: Var| {
                let i = vocabulary
                    .vars()
                    .iter()
                    .position(|&v| v == var)
                    .unwrap();
                bits >> i & 1 == 1
            })
        })
        .count() as u64;

    // two orders, and in each the later task may or may not depend on the
    // earlier one
    assert_eq!(expected, 4);
    assert_eq!(theory.count_solutions(), expected);
}

#[test]
fn deeply_nested_constraint_compiles_and_solves() {
    let mut encoding = Encoding::new();
    let a = encoding.var("a".to_string()).unwrap();
    let b = encoding.var("b".to_string()).unwrap();
    let f = (0..100_000).fold(Formula::var(a), |f, _| {
        Formula::or([Formula::not(f), Formula::var(b)]).unwrap()
    });
    encoding.add_constraint(f.clone()).unwrap();
    let theory = encoding.compile().unwrap();

    assert!(theory.satisfiable());
    let model = theory.solve().unwrap();
    assert!(f.eval(&model));
    assert!(theory.negate().unwrap().satisfiable());
}

#[test]
fn shared_subformulas_compile_once() {
    let mut encoding = Encoding::new();
    let a = encoding.var("a".to_string()).unwrap();
    let b = encoding.var("b".to_string()).unwrap();
    let f = (0..40).fold(Formula::var(a), |f, _| {
        let both = Formula::and([f.clone(), Formula::var(b)]).unwrap();
        Formula::or([both, f]).unwrap()
    });
    encoding.add_constraint(f).unwrap();
    let theory = encoding.compile().unwrap();

    assert_eq!(theory.num_aux(), 79);
    assert_eq!(theory.count_solutions(), 2);
    assert_eq!(theory.likelihood(a), Ok(1.0));
    assert_eq!(theory.likelihood(b), Ok(0.5));
}

#[test]
fn handles_are_matched_by_number_across_registries() {
    let mut ours = Registry::new();
    let a = ours.intern("a".to_string()).unwrap();
    let mut theirs = Registry::new();
    let x = theirs.intern("x".to_string()).unwrap();
    assert_eq!(a, x);

    let theory = Theory::compile(Formula::var(x), ours.vocabulary().unwrap()).unwrap();
    assert_eq!(theory.vocabulary().len(), 1);
    assert_eq!(theory.vocabulary().label(x), Some("a"));
    assert_eq!(theory.likelihood(a), Ok(1.0));
}
