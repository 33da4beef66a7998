//! Property-based tests for unification over the union-find type table.

use proptest::prelude::*;
use reach_compiler::{Type, TypeError, TypeTable};

const VARS: usize = 3;

/// Table-independent description of a type, turned into a `Type` against a
/// fixed set of variables.
#[derive(Debug, Clone)]
enum Shape {
    Name(&'static str),
    Var(usize),
    Rigid(usize),
    Binding(&'static str, Box<Shape>),
    Array(Box<Shape>),
    Tuple(Vec<Shape>),
    Record(Vec<(&'static str, Shape)>),
    Function(Vec<Shape>, Box<Shape>),
}

/// Flexible variables first, then as many rigid ones.
fn fixture() -> (TypeTable, Vec<Type>) {
    let mut table = TypeTable::new();
    let flexible = (0..VARS)
        .map(|index| Type::Var(table.new_var(&format!("v{index}"), false, false, 1)))
        .collect::<Vec<_>>();
    let rigid = (0..VARS)
        .map(|index| Type::Var(table.new_var(&format!("R{index}"), false, true, 1)))
        .collect::<Vec<_>>();
    (table, flexible.into_iter().chain(rigid).collect())
}

/// Bindings only name a type, so unified types agree once they are erased.
fn erase_bindings(ty: Type) -> Type {
    match ty {
        Type::Binding(_, inner) => erase_bindings(*inner),
        Type::Array(item) => Type::array(erase_bindings(*item)),
        Type::Tuple(items) => Type::Tuple(items.into_iter().map(erase_bindings).collect()),
        Type::Record(fields) => Type::Record(
            fields
                .into_iter()
                .map(|(name, ty)| (name, erase_bindings(ty)))
                .collect(),
        ),
        Type::Function {
            params,
            return_type,
            implicit_count,
        } => Type::Function {
            params: params.into_iter().map(erase_bindings).collect(),
            return_type: Box::new(erase_bindings(*return_type)),
            implicit_count,
        },
        Type::Union(lhs, rhs) => Type::union(erase_bindings(*lhs), erase_bindings(*rhs)),
        other => other,
    }
}

fn build(shape: &Shape, vars: &[Type]) -> Type {
    match shape {
        Shape::Name(name) => Type::Name((*name).to_string()),
        Shape::Var(index) => vars[*index].clone(),
        Shape::Rigid(index) => vars[VARS + *index].clone(),
        Shape::Binding(name, inner) => Type::binding(*name, build(inner, vars)),
        Shape::Array(item) => Type::array(build(item, vars)),
        Shape::Tuple(items) => Type::Tuple(items.iter().map(|item| build(item, vars)).collect()),
        Shape::Record(fields) => Type::record(
            fields
                .iter()
                .map(|(name, ty)| (*name, build(ty, vars)))
                .collect(),
        ),
        Shape::Function(params, return_type) => Type::function(
            params.iter().map(|param| build(param, vars)).collect(),
            build(return_type, vars),
        ),
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn leaf_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        prop_oneof![Just("Number"), Just("String"), Just("Bool"), Just("Void")]
            .prop_map(Shape::Name),
        (0..VARS).prop_map(Shape::Var),
        (0..VARS).prop_map(Shape::Rigid),
    ]
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    leaf_shape().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|item| Shape::Array(Box::new(item))),
            (prop_oneof![Just("T"), Just("U")], inner.clone())
                .prop_map(|(name, item)| Shape::Binding(name, Box::new(item))),
            prop::collection::vec(inner.clone(), 0..3).prop_map(Shape::Tuple),
            prop::collection::vec(
                (prop_oneof![Just("x"), Just("y"), Just("z")], inner.clone()),
                0..3
            )
            .prop_map(Shape::Record),
            (prop::collection::vec(inner.clone(), 0..3), inner)
                .prop_map(|(params, ret)| Shape::Function(params, Box::new(ret))),
        ]
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn every_type_unifies_with_itself(shape in arb_shape()) {
        let (mut table, vars) = fixture();
        let ty = build(&shape, &vars);
        prop_assert!(table.unify(&ty, &ty).is_ok());
    }

    #[test]
    fn unification_outcome_is_symmetric(lhs in arb_shape(), rhs in arb_shape()) {
        let (mut forward, vars) = fixture();
        let forward_result = forward.unify(&build(&lhs, &vars), &build(&rhs, &vars));

        let (mut backward, vars) = fixture();
        let backward_result = backward.unify(&build(&rhs, &vars), &build(&lhs, &vars));

        prop_assert_eq!(forward_result.is_ok(), backward_result.is_ok());
    }

    #[test]
    fn unified_types_resolve_to_the_same_type(lhs in arb_shape(), rhs in arb_shape()) {
        let (mut table, vars) = fixture();
        let lhs = build(&lhs, &vars);
        let rhs = build(&rhs, &vars);
        if table.unify(&lhs, &rhs).is_ok() {
            prop_assert_eq!(
                erase_bindings(table.resolve_deep(&lhs)),
                erase_bindings(table.resolve_deep(&rhs))
            );
        }
    }

    #[test]
    fn record_field_order_does_not_matter(
        fields in prop::collection::btree_map(
            prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")],
            arb_shape(),
            0..4,
        )
    ) {
        let (mut table, vars) = fixture();
        let forward: Vec<_> = fields.iter().map(|(name, shape)| (*name, shape.clone())).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let lhs = build(&Shape::Record(forward), &vars);
        let rhs = build(&Shape::Record(backward), &vars);
        prop_assert!(table.unify(&lhs, &rhs).is_ok());
        prop_assert_eq!(table.resolve_deep(&lhs), table.resolve_deep(&rhs));
    }

    #[test]
    fn rigid_variables_only_unify_with_themselves(index in 0..VARS, shape in arb_shape()) {
        let (mut table, vars) = fixture();
        let rigid = vars[VARS + index].clone();
        let ty = build(&shape, &vars);
        let unifies = match erase_bindings(ty.clone()) {
            Type::Var(var) => !var.rigid || Type::Var(var) == rigid,
            _ => false,
        };
        prop_assert_eq!(table.unify(&rigid, &ty).is_ok(), unifies);
        prop_assert_eq!(table.unify(&ty, &rigid).is_ok(), unifies);
    }

    #[test]
    fn occurs_check_rejects_self_containing_types(shape in arb_shape()) {
        let (mut table, vars) = fixture();
        let containing = Type::array(Type::Tuple(vec![vars[0].clone(), build(&shape, &vars)]));
        let result = table.unify(&vars[0], &containing);
        prop_assert!(
            matches!(result, Err(TypeError::InfiniteType { .. })),
            "expected infinite type error, got {:?}",
            result
        );
    }

    #[test]
    fn failed_union_branch_leaves_no_trace(
        first in arb_shape(),
        second in arb_shape(),
        target in arb_shape(),
    ) {
        prop_assume!(!matches!(target, Shape::Var(_)));

        let (mut alone, vars) = fixture();
        let first_fails = alone
            .unify(&build(&first, &vars), &build(&target, &vars))
            .is_err();

        let (mut reference, vars) = fixture();
        let target_type = build(&target, &vars);
        let second_succeeds = reference.unify(&build(&second, &vars), &target_type).is_ok();

        if first_fails && second_succeeds {
            let expected = reference.resolve_deep(&target_type);

            let (mut table, vars) = fixture();
            let union = Type::union(build(&first, &vars), build(&second, &vars));
            let target_type = build(&target, &vars);
            prop_assert!(table.unify(&union, &target_type).is_ok());
            prop_assert_eq!(table.resolve_deep(&target_type), expected);
        }
    }
}

// ============================================================================
// Fixed cases
// ============================================================================

#[test]
fn union_prefers_the_left_member() {
    let (mut table, vars) = fixture();
    let union = Type::union(
        Type::Tuple(vec![Type::number()]),
        Type::Tuple(vec![Type::string()]),
    );
    table
        .unify(&union, &Type::Tuple(vec![vars[0].clone()]))
        .expect("both members match");
    assert_eq!(table.resolve_deep(&vars[0]), Type::number());

    table
        .unify(&Type::union(Type::number(), Type::string()), &Type::string())
        .expect("right member matches");
}

#[test]
fn variables_bind_to_whole_unions() {
    let (mut table, vars) = fixture();
    let union = Type::union(Type::number(), Type::string());
    table
        .unify(&Type::array(union.clone()), &Type::array(vars[1].clone()))
        .expect("array of union against array of variable");
    assert_eq!(table.resolve_deep(&vars[1]), union);
}

#[test]
fn record_mismatch_names_the_missing_field() {
    let mut table = TypeTable::new();
    let expected = Type::record(vec![("x", Type::number()), ("y", Type::number())]);
    let found = Type::record(vec![("x", Type::number())]);
    let error = table.unify(&expected, &found).expect_err("missing field");
    assert_eq!(
        error.to_string(),
        "Missing field `y` in `{ x: Number }`"
    );
}
