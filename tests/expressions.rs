use expression_parser::{
    EvalError, Expression, LexError, SyntaxError, SyntaxErrorKind, UnknownVariableError,
};

const EPS: f64 = 1e-10;

fn assert_value(input: &str, variables: &[(&str, f64)], expected: f64) {
    let mut expr = Expression::new(input).unwrap_or_else(|e| panic!("{input}: {e:?}"));
    for (name, value) in variables {
        expr.set_value(name, *value).unwrap();
    }
    let result = expr.evaluate().unwrap_or_else(|e| panic!("{input}: {e:?}"));
    assert!(
        (result - expected).abs() <= EPS,
        "{input}: {result} != {expected}"
    );
}

fn assert_eq_value(input: &str, expected: f64) {
    assert_value(input, &[], expected);
}

#[test]
fn constants() {
    assert_eq_value("pi", std::f64::consts::PI);
    assert_eq_value("ln2 + ln10", 2f64.ln() + 10f64.ln());
    assert_eq_value("sqrt2^2", 2.0);
}

#[test]
fn arithmetic() {
    assert_eq_value("1+2+3+4", 10.0);
    assert_eq_value("(1+2)*(3+4)", 21.0);
    assert_eq_value("10 - 4 - 3", 3.0);
    assert_eq_value("7 % 4 * 2", 6.0);
    assert_eq_value("1 / 4", 0.25);
}

#[test]
fn negative_exponents() {
    assert_eq_value("4^-2", 1.0 / 16.0);
    assert_eq_value("4^(-2)", 1.0 / 16.0);
    assert_eq_value("4^-2*4", 0.25);
}

#[test]
fn power_associativity() {
    assert_eq_value("2^2^3", 256.0);
    assert_eq_value("(2^2)^3", 64.0);
    assert_eq_value("2^(2^3)", 256.0);
}

#[test]
fn unary_minus_binds_looser_than_power() {
    assert_eq_value("-1^2", -1.0);
    assert_eq_value("(-1)^2", 1.0);
    assert_eq_value("2^-2^2", 1.0 / 16.0);
    assert_eq_value("2^(-2)^2", 16.0);
    assert_eq_value("(2^-2)^2", 1.0 / 16.0);
    assert_eq_value("2^-2^-2", 2f64.powf(-0.25));
}

#[test]
fn functions() {
    assert_eq_value("sqrt(25 - abs(3 * (2 - 5)))", 4.0);
    assert_eq_value("lg(10000)", 4.0);
    assert_eq_value("cbrt(8)", 2.0);
    assert_eq_value("cbrt(-8)", -2.0);
    assert_eq_value("e^pi - exp(2*acos(0))", 0.0);
    assert_eq_value("log2(1024)", 10.0);
    assert_eq_value("tg(pi/4) * ctg(pi/4)", 1.0);
    assert_eq_value("sign(-3) + sign(0)", -1.0);
}

#[test]
fn binary_functions() {
    assert_eq_value("max(6,8)", 8.0);
    assert_eq_value("min(6, 8)", 6.0);
    assert_eq_value("log(2,8)", 3.0);
    assert_eq_value("pow(2, 8)", 256.0);
    assert_eq_value("root(4,256)", 4.0);
    assert_eq_value("root(8 / 4 + log(2, 4), 2 ^ 8)", 4.0);
    assert_eq_value("max(1, -2)", 1.0);
}

#[test]
fn variables() {
    assert_value("sqrt(x)", &[("x", 625.0)], 25.0);
    assert_value("sin(arcsin(x))", &[("x", 0.4)], 0.4);
    assert_value("(x1 + x2) ^ 2", &[("x1", 3.0), ("x2", 5.0)], 64.0);
    assert_value("(x123 + x26x) ^ 2", &[("x123", 3.0), ("x26x", 5.0)], 64.0);
}

#[test]
fn input_is_case_insensitive() {
    assert_value("SQRT(X) + PI", &[("x", 16.0)], 4.0 + std::f64::consts::PI);
    let mut expr = Expression::new("Abc * 2").unwrap();
    expr.set_value("ABC", 21.0).unwrap();
    assert_eq!(expr.evaluate().unwrap(), 42.0);
    assert_eq!(expr.source(), "abc * 2");
}

#[test]
fn rebinding_reuses_the_program() {
    let mut expr = Expression::new("sqrt(abs(x))").unwrap();
    let rpn = expr.rpn().to_vec();
    for x in -10..=10 {
        expr.set_value("x", x as f64).unwrap();
        let expected = (x as f64).abs().sqrt();
        assert!((expr.evaluate().unwrap() - expected).abs() <= EPS);
        assert_eq!(expr.rpn(), rpn.as_slice());
    }
}

#[test]
fn unset_variables_default_to_zero() {
    let expr = Expression::new("x + 1").unwrap();
    assert_eq!(expr.evaluate().unwrap(), 1.0);
    assert_eq!(expr.unbound_variables().collect::<Vec<_>>(), ["x"]);
    let err = expr.evaluate_strict().unwrap_err();
    assert!(err.downcast_ref::<EvalError>().is_some());
}

#[test]
fn setting_an_unknown_variable_fails() {
    let mut expr = Expression::new("x + 1").unwrap();
    let err = expr.set_value("y", 2.0).unwrap_err();
    assert_eq!(err.downcast_ref::<UnknownVariableError>().unwrap().name, "y");
    assert_eq!(expr.evaluate().unwrap(), 1.0);
}

#[test]
fn variables_are_listed_in_order() {
    let expr = Expression::new("b * a + b").unwrap();
    assert_eq!(expr.variables().collect::<Vec<_>>(), ["b", "a"]);
    assert_eq!(expr.postfix().to_string(), "b a * b +");
}

#[test]
fn unsupported_character() {
    let err = Expression::new("2 & 3").unwrap_err();
    assert!(err.downcast_ref::<LexError>().is_some());
}

#[test]
fn unbalanced_brackets() {
    for input in ["(1+2", "1+2)", "((1)", "max(1, 2"] {
        let err = Expression::new(input).unwrap_err();
        let err = err
            .downcast_ref::<SyntaxError>()
            .unwrap_or_else(|| panic!("{input}: {err:?}"));
        assert_eq!(err.kind, SyntaxErrorKind::DisbalancedBrackets);
    }
}

#[test]
fn comma_outside_group() {
    let err = Expression::new("1,2").unwrap_err();
    assert_eq!(
        err.downcast_ref::<SyntaxError>().unwrap().kind,
        SyntaxErrorKind::StrayComma
    );
}

#[test]
fn malformed_programs_fail_at_evaluation() {
    for input in ["", "1 +", "2*-3", "max(1)", "1 2"] {
        let expr = Expression::new(input).unwrap_or_else(|e| panic!("{input}: {e:?}"));
        let err = expr.evaluate().unwrap_err();
        assert!(
            err.downcast_ref::<EvalError>().is_some(),
            "{input}: {err:?}"
        );
    }
}
