use plyexec_execution::{run, run_with, DataKnot, Query};
use plyexec_vector::cardinality::Cardinality;
use plyexec_vector::functions::numeric;
use plyexec_vector::label::Label;
use plyexec_vector::scalar::ScalarValue;

fn ints(vals: impl IntoIterator<Item = i64>) -> ScalarValue {
    ScalarValue::List(vals.into_iter().map(ScalarValue::Int64).collect())
}

fn strs<'a>(vals: impl IntoIterator<Item = &'a str>) -> ScalarValue {
    ScalarValue::List(
        vals.into_iter()
            .map(|s| ScalarValue::Utf8(s.to_string()))
            .collect(),
    )
}

#[test]
fn identity_over_a_collection() {
    let input = DataKnot::from_values(["GARRY M", "ANTHONY R", "DANA A"]);
    let out = run(&input, Query::it()).unwrap();

    assert_eq!(Cardinality::ANY, out.card());
    assert_eq!(strs(["GARRY M", "ANTHONY R", "DANA A"]), out.get().unwrap());
}

#[test]
fn field_navigation_and_broadcast_add() {
    let input = DataKnot::record([("x", DataKnot::new(1)), ("y", DataKnot::new(2))]).unwrap();
    let out = run(&input, Query::get("x") + Query::get("y")).unwrap();

    assert_eq!(Cardinality::ONE, out.card());
    assert_eq!(ScalarValue::Int64(3), out.get().unwrap());
}

#[test]
fn each_confines_aggregation() {
    let q = Query::lift_list([1, 2, 3])
        >> Query::each(Query::lift_list(["a", "b", "c"]).then_count());
    let out = run(&DataKnot::unit(), q).unwrap();
    assert_eq!(ints([3, 3, 3]), out.get().unwrap());
}

#[test]
fn suffix_count_aggregates_whole_flow() {
    let q = Query::lift_list([1, 2, 3])
        >> Query::lift_list(["a", "b", "c"]).then_count();
    let out = run(&DataKnot::unit(), q).unwrap();
    // Without Each the outer flow is flattened before counting.
    assert_eq!(ScalarValue::Int64(9), out.get().unwrap());
}

#[test]
fn record_construction_with_labels() {
    let q = Query::lift_list([1, 2, 3])
        >> Query::record([
            Query::it().label("x"),
            (Query::it() * Query::it()).label("x2"),
        ]);
    let out = run(&DataKnot::unit(), q).unwrap();

    let expected = ScalarValue::List(
        [(1, 1), (2, 4), (3, 9)]
            .into_iter()
            .map(|(x, x2)| ScalarValue::Tuple {
                labels: vec![Label::new("x"), Label::new("x2")],
                values: vec![ScalarValue::Int64(x), ScalarValue::Int64(x2)],
            })
            .collect(),
    );
    assert_eq!(expected, out.get().unwrap());
}

#[test]
fn record_demotes_duplicate_labels() {
    let q = Query::lift(1)
        >> Query::record([Query::it().label("x"), Query::it().label("x")]);
    let out = run(&DataKnot::unit(), q).unwrap();
    match out.get().unwrap() {
        ScalarValue::Tuple { labels, .. } => {
            assert_eq!("#A", labels[0].as_str());
            assert_eq!("#B", labels[1].as_str());
        }
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn filter_keeps_odd_numbers() {
    let input = DataKnot::from_values([1, 2, 3, 4, 5]);
    let q = Query::filter(Query::apply(numeric::IsOdd, vec![Query::it()]));
    let out = run(&input, q).unwrap();
    assert_eq!(ints([1, 3, 5]), out.get().unwrap());
}

#[test]
fn filter_true_and_false() {
    let input = DataKnot::from_values([1, 2]);

    let all = run(&input, Query::filter(Query::lift(true))).unwrap();
    assert_eq!(ints([1, 2]), all.get().unwrap());

    let none = run(&input, Query::filter(Query::lift(false))).unwrap();
    assert_eq!(ScalarValue::List(Vec::new()), none.get().unwrap());
}

#[test]
fn keep_binds_and_navigates() {
    let q = Query::keep([("x", Query::lift(2))]) >> Query::get("x");
    let out = run(&DataKnot::unit(), q).unwrap();
    assert_eq!(ScalarValue::Int64(2), out.get().unwrap());

    let q = Query::keep([("x", Query::lift(2))]) >> (Query::it() + Query::get("x"));
    let out = run(&DataKnot::new(1), q).unwrap();
    assert_eq!(ScalarValue::Int64(3), out.get().unwrap());
}

#[test]
fn keep_rebinding_shadows() {
    let q = Query::keep([("x", Query::lift(1))])
        >> Query::keep([("x", Query::lift(2))])
        >> Query::get("x");
    let out = run(&DataKnot::unit(), q).unwrap();
    assert_eq!(ScalarValue::Int64(2), out.get().unwrap());
}

#[test]
fn given_keeps_bindings_local() {
    let q = Query::given(
        [("x", Query::lift(2))],
        Query::it() + Query::get("x"),
    );
    let out = run(&DataKnot::new(1), q).unwrap();
    assert_eq!(ScalarValue::Int64(3), out.get().unwrap());

    // The binding does not survive the body.
    let q = Query::given([("x", Query::lift(2))], Query::it()) >> Query::get("x");
    assert!(run(&DataKnot::new(1), q).is_err());
}

#[test]
fn take_and_drop_with_negative_counts() {
    let input = DataKnot::from_values(["a", "b", "c"]);

    let out = run(&input, Query::it() >> Query::take(-2)).unwrap();
    assert_eq!(strs(["a"]), out.get().unwrap());

    let out = run(&input, Query::it() >> Query::drop(-2)).unwrap();
    assert_eq!(strs(["b", "c"]), out.get().unwrap());
}

#[test]
fn drop_then_take_reconstructs_tail() {
    let input = DataKnot::from_values([1, 2, 3, 4]);
    let out = run(&input, Query::it() >> Query::drop(2) >> Query::take(i64::MAX)).unwrap();
    assert_eq!(ints([3, 4]), out.get().unwrap());
}

#[test]
fn take_with_query_count() {
    let input = DataKnot::from_values([1, 2, 3, 4]);
    let q = Query::it() >> Query::take_by(Query::get("n"));
    let out = run_with(&input, q, vec![(Label::new("n"), DataKnot::new(2))]).unwrap();
    assert_eq!(ints([1, 2]), out.get().unwrap());
}

#[test]
fn aggregates_over_empty_input() {
    let max = run(&DataKnot::unit(), Query::max(Query::lift_list(Vec::<i64>::new()))).unwrap();
    assert_eq!(Cardinality::OPT, max.card());
    assert_eq!(ScalarValue::Missing, max.get().unwrap());

    let sum = run(&DataKnot::unit(), Query::sum(Query::lift_list(Vec::<i64>::new()))).unwrap();
    assert_eq!(ScalarValue::Int64(0), sum.get().unwrap());
}

#[test]
fn min_max_sum_over_values() {
    let input = DataKnot::from_values([3, 1, 2]);
    assert_eq!(
        ScalarValue::Int64(1),
        run(&input, Query::it().then_min()).unwrap().get().unwrap()
    );
    assert_eq!(
        ScalarValue::Int64(3),
        run(&input, Query::it().then_max()).unwrap().get().unwrap()
    );
    assert_eq!(
        ScalarValue::Int64(6),
        run(&input, Query::it().then_sum()).unwrap().get().unwrap()
    );
    assert_eq!(
        ScalarValue::Int64(3),
        run(&input, Query::it().then_count()).unwrap().get().unwrap()
    );
}

#[test]
fn exists_over_flows() {
    let input = DataKnot::from_values([1, 2]);
    assert_eq!(
        ScalarValue::Bool(true),
        run(&input, Query::it().then_exists()).unwrap().get().unwrap()
    );

    let empty = DataKnot::from_values(Vec::<i64>::new());
    assert_eq!(
        ScalarValue::Bool(false),
        run(&empty, Query::it().then_exists()).unwrap().get().unwrap()
    );
}

#[test]
fn any_and_all_over_boolean_flows() {
    let input = DataKnot::from_values([1, 2, 3]);
    let odd = Query::apply(numeric::IsOdd, vec![Query::it()]);

    let any = run(&input, odd.clone().then_any()).unwrap();
    assert_eq!(ScalarValue::Bool(true), any.get().unwrap());

    let all = run(&input, odd.then_all()).unwrap();
    assert_eq!(ScalarValue::Bool(false), all.get().unwrap());
}

#[test]
fn identity_composition_laws() {
    let input = DataKnot::from_values([1, 2, 3]);
    let x = Query::filter(Query::apply(numeric::IsOdd, vec![Query::it()]));

    let plain = run(&input, x.clone()).unwrap();
    let left = run(&input, Query::it() >> x.clone()).unwrap();
    let right = run(&input, x >> Query::it()).unwrap();

    assert_eq!(plain.get().unwrap(), left.get().unwrap());
    assert_eq!(plain.get().unwrap(), right.get().unwrap());
}

#[test]
fn lift_constant_matches_knot_constant() {
    let input = DataKnot::from_values([10, 20]);
    let lifted = run(&input, Query::lift(5)).unwrap();
    let knotted = run(&input, Query::knot(DataKnot::new(5))).unwrap();
    assert_eq!(lifted.get().unwrap(), knotted.get().unwrap());
}

#[test]
fn take_bounds_count() {
    let input = DataKnot::from_values([1, 2, 3, 4, 5]);
    for n in 0..7 {
        let out = run(&input, Query::it() >> Query::take(n) >> Query::it().then_count())
            .unwrap();
        match out.get().unwrap() {
            ScalarValue::Int64(count) => assert!(count <= n.max(0)),
            other => panic!("unexpected value: {other:?}"),
        }
    }
}

#[test]
fn first_and_last() {
    let input = DataKnot::from_values([1, 2, 3]);
    assert_eq!(
        ints([1]),
        run(&input, Query::first(Query::it())).unwrap().get().unwrap()
    );
    assert_eq!(
        ints([3]),
        run(&input, Query::last(Query::it())).unwrap().get().unwrap()
    );
}

#[test]
fn query_method_wraps_in_each() {
    let input = DataKnot::from_values([1, 2, 3]);
    let out = input
        .query(Query::lift_list(["a", "b"]).then_count())
        .unwrap();
    // Index-style access confines aggregation per element.
    assert_eq!(ints([2, 2, 2]), out.get().unwrap());
}

#[test]
fn parameters_via_scope() {
    let q = Query::get("p") + Query::get("q");
    let out = run_with(
        &DataKnot::unit(),
        q,
        vec![
            (Label::new("p"), DataKnot::new(3)),
            (Label::new("q"), DataKnot::new(4)),
        ],
    )
    .unwrap();
    assert_eq!(ScalarValue::Int64(7), out.get().unwrap());
}

#[test]
fn parameters_inside_each_elementwise() {
    let input = DataKnot::from_values([1, 2, 3]);
    let q = Query::it() + Query::get("p");
    let out = run_with(&input, q, vec![(Label::new("p"), DataKnot::new(10))]).unwrap();
    assert_eq!(ints([11, 12, 13]), out.get().unwrap());
}

#[test]
fn unknown_name_fails_assembly() {
    let input = DataKnot::record([("x", DataKnot::new(1))]).unwrap();
    let err = run(&input, Query::get("z")).unwrap_err();
    assert!(err.to_string().contains("Unknown name 'z'"));
}

#[test]
fn filter_rejects_non_predicate() {
    let input = DataKnot::from_values([1, 2]);
    let err = run(&input, Query::filter(Query::lift(1))).unwrap_err();
    assert!(err.to_string().contains("boolean predicate"));
}

#[test]
fn take_rejects_non_integer_count() {
    let input = DataKnot::from_values([1, 2]);
    let q = Query::it() >> Query::take_by(Query::lift("two"));
    let err = run(&input, q).unwrap_err();
    assert!(err.to_string().contains("integer count"));
}

#[test]
fn apply_rejects_bad_argument_types() {
    let input = DataKnot::from_values(["a", "b"]);
    let err = run(&input, Query::it() + Query::lift(1)).unwrap_err();
    assert!(err.to_string().contains("Cannot apply"));
}

#[test]
fn nested_navigation() {
    let inner = DataKnot::record([("b", DataKnot::new(7))]).unwrap();
    let input = DataKnot::record([("a", inner)]).unwrap();
    let out = run(&input, Query::path(["a", "b"])).unwrap();
    assert_eq!(ScalarValue::Int64(7), out.get().unwrap());
}

#[test]
fn labels_propagate_to_output() {
    let input = DataKnot::record([("name", DataKnot::from_values(["a", "b"]))]).unwrap();
    let out = run(&input, Query::get("name")).unwrap();
    assert_eq!(Some(&Label::new("name")), out.shape().label());
}
