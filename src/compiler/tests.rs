use super::*;
use crate::analysis::UnitChecker;
use crate::ast::{ArithOp, Constant, FunctionOp, MathNode, Piece};
use crate::config::EngineOptions;
use crate::model::Model;
use rstest::rstest;

fn q(value: f64, unit: &str) -> MathNode {
    MathNode::real(value, Some(unit))
}

fn plus(args: Vec<MathNode>) -> MathNode {
    MathNode::arithmetic(ArithOp::Plus, args)
}

fn times(args: Vec<MathNode>) -> MathNode {
    MathNode::arithmetic(ArithOp::Times, args)
}

fn model(json: &str) -> Model {
    Model::from_json_str(json).unwrap()
}

fn strict() -> DimensionalAnalyzer<'static> {
    DimensionalAnalyzer::standalone(EngineOptions::strict())
}

#[rstest]
#[case(plus(vec![q(3.0, "mole"), q(2.0, "mole")]), 5.0, "mole")]
#[case(times(vec![q(3.0, "metre"), q(2.0, "second")]), 6.0, "metre*second")]
#[case(
    MathNode::arithmetic(ArithOp::Power, vec![q(2.0, "metre"), MathNode::integer(3, None)]),
    8.0,
    "metre^3"
)]
#[case(MathNode::function(FunctionOp::Sqrt, vec![q(4.0, "dimensionless")]), 2.0, "dimensionless")]
#[case(
    MathNode::arithmetic(ArithOp::Divide, vec![q(6.0, "metre"), q(2.0, "second")]),
    3.0,
    "metre*second^-1"
)]
#[case(times(vec![q(2.0, "metre"), q(5.0, "dimensionless")]), 10.0, "metre")]
fn test_basic_scenarios(#[case] node: MathNode, #[case] value: f64, #[case] unit: &str) {
    let result = strict().compile(&node).unwrap();
    assert!((result.to_number() - value).abs() < 1e-12);
    assert_eq!(result.unit_string(), unit);
}

#[test]
fn test_root_composition() {
    let volume = MathNode::arithmetic(ArithOp::Power, vec![q(3.0, "metre"), MathNode::integer(3, None)]);
    let node = MathNode::function(FunctionOp::Root, vec![MathNode::integer(3, None), volume]);
    let result = strict().compile(&node).unwrap();
    assert!((result.to_number() - 3.0).abs() < 1e-9);
    assert_eq!(result.unit_string(), "metre");
}

#[test]
fn test_compile_is_deterministic() {
    let node = plus(vec![q(1.0, "litre"), MathNode::real(500.0, Some("dimensionless"))]);
    let mut engine = DimensionalAnalyzer::standalone(EngineOptions::permissive());
    let first = engine.compile(&node).unwrap();
    let second = engine.compile(&node).unwrap();
    assert_eq!(first, second);

    let node = times(vec![q(3.0, "metre"), q(2.0, "second")]);
    let mut engine = strict();
    assert_eq!(engine.compile(&node).unwrap(), engine.compile(&node).unwrap());
}

#[test]
fn test_sin_of_metre_strict_and_permissive() {
    let node = MathNode::function(FunctionOp::Sin, vec![q(1.0, "metre")]);

    let err = strict().compile(&node).unwrap_err();
    assert!(matches!(err, CompileError::Unit(UnitError::DimensionlessRequired { .. })));
    assert!(err.to_string().starts_with("unit error"));

    let result = DimensionalAnalyzer::standalone(EngineOptions::permissive())
        .compile(&node)
        .unwrap();
    assert!(result.has_invalid_units());
}

#[test]
fn test_valid_unit_is_adopted_over_invalid_operands() {
    let mut engine = DimensionalAnalyzer::standalone(EngineOptions::permissive());
    let poisoned = MathNode::function(FunctionOp::Sin, vec![q(2.0, "metre")]);

    let result = engine.compile(&plus(vec![q(3.0, "mole"), poisoned.clone()])).unwrap();
    assert_eq!(result.unit_string(), "mole");
    assert!((result.to_number() - (3.0 + 2f64.sin())).abs() < 1e-12);

    let result = engine.compile(&plus(vec![poisoned.clone(), poisoned])).unwrap();
    assert!(result.has_invalid_units());
}

#[test]
fn test_minus_adopts_subtrahend_unit_after_invalid_minuend() {
    let mut engine = DimensionalAnalyzer::standalone(EngineOptions::permissive());
    let poisoned = MathNode::function(FunctionOp::Sin, vec![q(2.0, "metre")]);
    let node = MathNode::arithmetic(ArithOp::Minus, vec![poisoned, q(3.0, "mole")]);

    let result = engine.compile(&node).unwrap();
    assert_eq!(result.unit_string(), "mole");
    assert!((result.to_number() - (2f64.sin() - 3.0)).abs() < 1e-12);
}

#[test]
fn test_unresolvable_token_has_no_unit() {
    let mut engine = strict();
    let result = engine.compile(&MathNode::real(2.0, Some("furlong"))).unwrap();
    assert!(result.unit().is_none());

    let result = engine.compile(&plus(vec![MathNode::real(2.0, Some("furlong")), q(3.0, "mole")])).unwrap();
    assert_eq!(result.to_number(), 5.0);
    assert_eq!(result.unit_string(), "mole");
}

#[test]
fn test_rational_has_no_unit() {
    let node = MathNode::Rational { numerator: 1, denominator: 4 };
    let result = strict().compile(&node).unwrap();
    assert_eq!(result.to_number(), 0.25);
    assert!(result.unit().is_none());
}

#[test]
fn test_self_referencing_rule_is_invalid() {
    let m = model(
        r#"{
        "species": [{"id": "S", "value": 1, "units": "mole"}],
        "assignment_rules": [{"variable": "S", "math": {"kind": "arithmetic", "op": "plus", "args": [
            {"kind": "name", "id": "S"}, {"kind": "integer", "value": 1}]}}]
    }"#,
    );
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    let result = engine.compile(&MathNode::name("S")).unwrap();
    assert!(result.has_invalid_units());
    assert!(result.to_number().is_nan());
    assert_eq!(engine.cycle_guard().confirmed(), vec!["S".to_string()]);

    let rule = &m.assignment_rules[0];
    let result = engine.compile_definition(&rule.variable, &rule.math).unwrap();
    assert!(result.has_invalid_units());
}

#[rstest]
#[case("assignment_rules", "variable")]
#[case("initial_assignments", "symbol")]
fn test_mutual_definitions_are_invalid(#[case] section: &str, #[case] key: &str) {
    let json = format!(
        r#"{{
        "parameters": [{{"id": "A", "units": "mole"}}, {{"id": "B", "units": "mole"}}],
        "{section}": [
            {{"{key}": "A", "math": {{"kind": "name", "id": "B"}}}},
            {{"{key}": "B", "math": {{"kind": "name", "id": "A"}}}}
        ]
    }}"#
    );
    let m = model(&json);
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    assert!(engine.compile(&MathNode::name("A")).unwrap().has_invalid_units());
    assert!(engine.compile(&MathNode::name("B")).unwrap().has_invalid_units());
}

#[test]
fn test_kinetic_law_loop_is_invalid() {
    let m = model(
        r#"{
        "extent_units": "mole",
        "reactions": [
            {"id": "R1", "kinetic_law": {"math": {"kind": "name", "id": "R2"}}},
            {"id": "R2", "kinetic_law": {"math": {"kind": "name", "id": "R1"}}}
        ]
    }"#,
    );
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    assert!(engine.compile(&MathNode::name("R1")).unwrap().has_invalid_units());

    let r1 = m.reaction("R1").unwrap();
    assert!(engine.compile_kinetic_law(r1).unwrap().has_invalid_units());
}

const KINETICS: &str = r#"{
    "extent_units": "mole",
    "unit_definitions": [
        {"id": "per_second", "units": [{"kind": "second", "exponent": -1}]},
        {"id": "mM", "units": [{"kind": "mole", "scale": -3}, {"kind": "litre", "exponent": -1}]}
    ],
    "species": [{"id": "S", "value": 4, "units": "mole"}],
    "parameters": [
        {"id": "k", "value": 0.5, "units": "per_second"},
        {"id": "total", "units": "mole"}
    ],
    "initial_assignments": [{"symbol": "total", "math": {"kind": "arithmetic", "op": "plus", "args": [
        {"kind": "name", "id": "S"}, {"kind": "real", "value": 6, "units": "mole"}]}}],
    "reactions": [
        {"id": "R1", "kinetic_law": {"math": {"kind": "arithmetic", "op": "times", "args": [
            {"kind": "name", "id": "k"}, {"kind": "name", "id": "S"}]}}},
        {"id": "R2", "kinetic_law": {
            "math": {"kind": "arithmetic", "op": "times", "args": [
                {"kind": "name", "id": "k"}, {"kind": "name", "id": "S"}]},
            "local_parameters": [{"id": "k", "value": 2, "units": "per_second"}]
        }}
    ],
    "function_definitions": [
        {"id": "area", "math": {"kind": "lambda", "params": ["w", "h"], "body": {"kind": "arithmetic", "op": "times", "args": [
            {"kind": "name", "id": "w"}, {"kind": "name", "id": "h"}]}}},
        {"id": "forever", "math": {"kind": "lambda", "params": ["x"], "body": {"kind": "call", "name": "forever", "args": [
            {"kind": "name", "id": "x"}]}}}
    ]
}"#;

#[test]
fn test_symbols_resolve_through_definitions() {
    let m = model(KINETICS);
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());

    let total = engine.compile(&MathNode::name("total")).unwrap();
    assert_eq!(total.to_number(), 10.0);
    assert_eq!(total.unit_string(), "mole");

    let rate = engine.compile(&MathNode::name("R1")).unwrap();
    assert_eq!(rate.to_number(), 2.0);
    assert_eq!(rate.unit_string(), "mole*second^-1");
}

#[test]
fn test_local_parameters_shadow_model_quantities() {
    let m = model(KINETICS);
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    let r2 = m.reaction("R2").unwrap();
    let result = engine.compile_kinetic_law(r2).unwrap();
    assert_eq!(result.to_number(), 8.0);
    assert_eq!(result.unit_string(), "mole*second^-1");

    // Outside the law the global `k` is visible again.
    let k = engine.compile(&MathNode::name("k")).unwrap();
    assert_eq!(k.to_number(), 0.5);
}

#[test]
fn test_rule_reading_a_law_with_a_same_named_local() {
    let m = model(
        r#"{
        "extent_units": "mole",
        "unit_definitions": [
            {"id": "per_second", "units": [{"kind": "second", "exponent": -1}]},
            {"id": "mps", "units": [{"kind": "mole"}, {"kind": "second", "exponent": -1}]}
        ],
        "species": [{"id": "S", "value": 4, "units": "mole"}],
        "parameters": [{"id": "k", "units": "mps"}],
        "assignment_rules": [{"variable": "k", "math": {"kind": "name", "id": "R1"}}],
        "reactions": [{"id": "R1", "kinetic_law": {
            "math": {"kind": "arithmetic", "op": "times", "args": [
                {"kind": "name", "id": "k"}, {"kind": "name", "id": "S"}]},
            "local_parameters": [{"id": "k", "value": 2, "units": "per_second"}]
        }}]
    }"#,
    );
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());

    let rate = engine.compile(&MathNode::name("R1")).unwrap();
    assert_eq!(rate.to_number(), 8.0);
    assert_eq!(rate.unit_string(), "mole*second^-1");

    let k = engine.compile(&MathNode::name("k")).unwrap();
    assert_eq!(k.to_number(), 8.0);
    assert!(!k.has_invalid_units());

    assert_eq!(UnitChecker::new(&m, EngineOptions::strict()).check(), Ok(()));
}

#[test]
fn test_function_call_binds_arguments_in_scope() {
    let m = model(KINETICS);
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    let call = MathNode::Call {
        name: "area".into(),
        args: vec![q(2.0, "metre"), q(3.0, "metre")],
    };
    let result = engine.compile(&call).unwrap();
    assert_eq!(result.to_number(), 6.0);
    assert_eq!(result.unit_string(), "metre^2");

    // The argument table does not leak past the call.
    let node = times(vec![call, MathNode::name("w")]);
    let result = engine.compile(&node).unwrap();
    assert!(result.to_number().is_nan());
    assert_eq!(result.unit_string(), "metre^2");
}

#[test]
fn test_recursive_function_is_invalid() {
    let m = model(KINETICS);
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    let call = MathNode::Call {
        name: "forever".into(),
        args: vec![MathNode::integer(1, None)],
    };
    assert!(engine.compile(&call).unwrap().has_invalid_units());
}

#[test]
fn test_model_unit_definition_as_literal_token() {
    let m = model(KINETICS);
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    let result = engine.compile(&q(2.0, "mM")).unwrap();
    assert_eq!(result.unit_string(), "litre^-1*(10^-3 mole)");
}

#[test]
fn test_rate_of() {
    let m = model(KINETICS);
    let mut engine = DimensionalAnalyzer::for_model(&m, EngineOptions::strict());
    let result = engine.compile(&MathNode::RateOf { target: "S".into() }).unwrap();
    assert_eq!(result.to_number(), 4.0);
    assert_eq!(result.unit_string(), "mole*second^-1");
}

fn piecewise(pieces: Vec<(MathNode, MathNode)>, otherwise: Option<MathNode>) -> MathNode {
    MathNode::Piecewise {
        pieces: pieces
            .into_iter()
            .map(|(value, condition)| Piece { value, condition })
            .collect(),
        otherwise: otherwise.map(Box::new),
    }
}

#[test]
fn test_piecewise_selects_first_true_branch() {
    let mut engine = strict();
    let node = piecewise(
        vec![(q(1.0, "mole"), MathNode::constant(Constant::False))],
        Some(q(2.0, "mole")),
    );
    assert_eq!(engine.compile(&node).unwrap().to_number(), 2.0);

    let node = piecewise(
        vec![
            (q(1.0, "mole"), MathNode::constant(Constant::False)),
            (q(7.0, "mole"), MathNode::constant(Constant::False)),
        ],
        None,
    );
    assert_eq!(engine.compile(&node).unwrap().to_number(), 7.0);
}

#[test]
fn test_piecewise_conditions_stop_at_first_true() {
    let node = piecewise(
        vec![
            (q(1.0, "mole"), MathNode::constant(Constant::True)),
            (q(2.0, "mole"), MathNode::Unknown { tag: "csymbol".into() }),
        ],
        None,
    );
    let result = strict().compile(&node).unwrap();
    assert_eq!(result.to_number(), 1.0);
    assert_eq!(result.unit_string(), "mole");
}

#[test]
fn test_piecewise_branch_mismatch() {
    let node = piecewise(
        vec![(q(1.0, "mole"), MathNode::constant(Constant::True))],
        Some(q(2.0, "second")),
    );
    let err = strict().compile(&node).unwrap_err();
    assert!(matches!(err, CompileError::Unit(UnitError::PiecewiseMismatch { .. })));

    let result = DimensionalAnalyzer::standalone(EngineOptions::permissive())
        .compile(&node)
        .unwrap();
    assert_eq!(result.to_number(), 1.0);
    assert!(result.has_invalid_units());
}

const HOURLY: &str = r#"{
    "time_units": "second",
    "unit_definitions": [{"id": "hour", "units": [{"kind": "second", "multiplier": 3600}]}]
}"#;

#[test]
fn test_delay_time_units() {
    let m = model(HOURLY);
    let ok = MathNode::Delay {
        value: Box::new(q(5.0, "mole")),
        delay: Box::new(q(1.0, "second")),
    };
    let result = DimensionalAnalyzer::for_model(&m, EngineOptions::strict()).compile(&ok).unwrap();
    assert_eq!(result.to_number(), 5.0);
    assert_eq!(result.unit_string(), "mole");

    let bad = MathNode::Delay {
        value: Box::new(q(5.0, "mole")),
        delay: Box::new(q(1.0, "hour")),
    };
    let err = DimensionalAnalyzer::for_model(&m, EngineOptions::strict())
        .compile(&bad)
        .unwrap_err();
    assert!(matches!(err, CompileError::Unit(UnitError::DelayTimeMismatch { .. })));

    let result = DimensionalAnalyzer::for_model(&m, EngineOptions::permissive())
        .compile(&bad)
        .unwrap();
    assert!(result.has_invalid_units());
}

#[test]
fn test_delay_unchecked_without_model_time_units() {
    let m = model(r#"{"unit_definitions": [{"id": "hour", "units": [{"kind": "second", "multiplier": 3600}]}]}"#);
    let node = MathNode::Delay {
        value: Box::new(q(5.0, "mole")),
        delay: Box::new(q(1.0, "hour")),
    };
    let result = DimensionalAnalyzer::for_model(&m, EngineOptions::strict()).compile(&node).unwrap();
    assert_eq!(result.to_number(), 5.0);
    assert_eq!(result.unit_string(), "mole");
}

#[test]
fn test_time_symbol() {
    let options = EngineOptions {
        current_time: 12.5,
        ..EngineOptions::strict()
    };
    let time = MathNode::Time { name: "t".into() };
    let result = DimensionalAnalyzer::standalone(options).compile(&time).unwrap();
    assert_eq!(result.to_number(), 12.5);
    assert_eq!(result.unit_string(), "second");

    let m = model(r#"{"time_units": "hour", "unit_definitions": [{"id": "hour", "units": [{"kind": "second", "multiplier": 3600}]}]}"#);
    let result = DimensionalAnalyzer::for_model(&m, options).compile(&time).unwrap();
    assert_eq!(result.unit_string(), "(3600 second)");
}

#[rstest]
#[case(3, 2, 6.022_140_76e23)]
#[case(3, 1, 6.022_141_79e23)]
#[case(2, 4, 6.022_141_79e23)]
fn test_avogadro_by_version(#[case] level: u32, #[case] version: u32, #[case] expected: f64) {
    assert_eq!(avogadro(level, version), expected);
    let m = Model::new(level, version);
    let result = DimensionalAnalyzer::for_model(&m, EngineOptions::strict())
        .compile(&MathNode::constant(Constant::Avogadro))
        .unwrap();
    assert_eq!(result.to_number(), expected);
    assert_eq!(result.unit_string(), "mole^-1");
    assert_eq!((result.level(), result.version()), (level, version));
}

#[test]
fn test_unknown_node() {
    let node = MathNode::Unknown { tag: "semantics".into() };
    let err = strict().compile(&node).unwrap_err();
    assert_eq!(err, CompileError::UnsupportedNode { tag: "semantics".into() });

    let result = DimensionalAnalyzer::standalone(EngineOptions::permissive())
        .compile(&node)
        .unwrap();
    assert!(result.has_invalid_units());
}

#[test]
fn test_comparison_and_logic_are_dimensionless() {
    let node = MathNode::logical(
        crate::ast::LogicOp::And,
        vec![
            MathNode::relational(crate::ast::RelOp::Lt, q(1.0, "metre"), q(2.0, "metre")),
            MathNode::constant(Constant::True),
        ],
    );
    let result = strict().compile(&node).unwrap();
    assert!(result.to_boolean());
    assert_eq!(result.unit_string(), "dimensionless");
}

#[test]
fn test_selector_is_undefined() {
    let node = MathNode::Selector { args: vec![q(1.0, "metre")] };
    let result = strict().compile(&node).unwrap();
    assert!(result.to_number().is_nan());
    assert!(result.unit().is_none());
}
