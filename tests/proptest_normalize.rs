//! Property tests for normalization.
//!
//! Checks the algebraic laws the canonical string is meant to respect on
//! randomly generated condition trees.

use oqr::{CompareOp, Condition, Config, Node, Scalar, normalize};
use proptest::prelude::*;

// ============================================================================
// Condition Generators
// ============================================================================

fn arb_field() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "nested.d"]).prop_map(String::from)
}

fn arb_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        (0..4i64).prop_map(Scalar::Integer),
        // strings that render like the integers and booleans above
        prop::sample::select(vec!["x", "y", "2", "true"]).prop_map(Scalar::from),
        any::<bool>().prop_map(Scalar::Boolean),
    ]
}

fn arb_op() -> impl Strategy<Value = CompareOp> {
    prop::sample::select(vec![
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Ge,
        CompareOp::Lt,
        CompareOp::Le,
    ])
}

/// Generate a leaf: comparison, existence or membership
fn arb_leaf() -> impl Strategy<Value = Condition> {
    prop_oneof![
        3 => (arb_field(), arb_op(), arb_scalar())
            .prop_map(|(field, op, value)| Condition::compare(field, op, value)),
        1 => (arb_field(), any::<bool>()).prop_map(|(field, present)| {
            if present { Condition::exists(field) } else { Condition::missing(field) }
        }),
        1 => (arb_field(), prop::collection::vec(arb_scalar(), 1..4))
            .prop_map(|(field, values)| Condition::is_in(field, values)),
    ]
}

/// Generate a tree of bounded depth with non-empty junctions
fn arb_condition() -> impl Strategy<Value = Condition> {
    arb_leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(|c| Condition::from(Node::And(c))),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|c| Condition::from(Node::Or(c))),
            inner.prop_map(|c| !c),
        ]
    })
}

fn canonical(c: &Condition) -> String {
    normalize::normalized_string(c).unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn normalization_is_idempotent(c in arb_condition()) {
        let once = normalize::normalize(&c).unwrap();
        let (twice, passes) = normalize::normalize_counted(&once, &Config::default()).unwrap();
        prop_assert_eq!(&twice, &once);
        prop_assert_eq!(passes, 1);
    }

    #[test]
    fn double_negation_vanishes(c in arb_condition()) {
        prop_assert_eq!(canonical(&!!c.clone()), canonical(&c));
    }

    #[test]
    fn de_morgan_holds(x in arb_condition(), y in arb_condition()) {
        prop_assert_eq!(
            canonical(&!(x.clone() & y.clone())),
            canonical(&(!x.clone() | !y.clone()))
        );
        prop_assert_eq!(canonical(&!(x.clone() | y.clone())), canonical(&(!x & !y)));
    }

    #[test]
    fn nesting_is_flattened(x in arb_condition(), y in arb_condition(), z in arb_condition()) {
        let nested = (x.clone() | y.clone()) | z.clone();
        let flat = Condition::from(Node::Or(vec![x.clone(), y.clone(), z.clone()]));
        prop_assert_eq!(canonical(&nested), canonical(&flat));

        let nested = x.clone() & (y.clone() & z.clone());
        let flat = Condition::from(Node::And(vec![x, y, z]));
        prop_assert_eq!(canonical(&nested), canonical(&flat));
    }

    #[test]
    fn child_order_is_irrelevant(
        (children, shuffled) in prop::collection::vec(arb_condition(), 2..5)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let and = Condition::from(Node::And(children.clone()));
        let and_shuffled = Condition::from(Node::And(shuffled.clone()));
        prop_assert_eq!(normalize::normalize(&and).unwrap(), normalize::normalize(&and_shuffled).unwrap());

        let or = Condition::from(Node::Or(children));
        let or_shuffled = Condition::from(Node::Or(shuffled));
        prop_assert_eq!(normalize::normalize(&or).unwrap(), normalize::normalize(&or_shuffled).unwrap());
    }

    #[test]
    fn canonical_output_has_only_positive_comparisons(c in arb_condition()) {
        let s = canonical(&c);
        prop_assert!(!s.contains(" != "));
        prop_assert!(!s.contains(" > "));
        prop_assert!(!s.contains(" >= "));
        prop_assert!(!s.contains("not(and("));
        prop_assert!(!s.contains("not(or("));
        prop_assert!(!s.contains("not(not("));
    }

    #[test]
    fn rewriting_terminates_within_a_small_bound(c in arb_condition()) {
        let config = Config::default().with_max_passes(2 * c.depth() + 2);
        prop_assert!(normalize::normalize_counted(&c, &config).is_ok());
    }
}
