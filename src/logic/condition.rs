use crate::models::{Condition, Facts, Operator, Value};
use std::cmp::Ordering;

/// Evaluate a single condition against the facts.
///
/// Never fails. An absent fact compares equal only to an absent operand and
/// has no ordering, so `<`/`>` style operators are false and `!=` is true.
/// `in`/`not_in` need a list operand, `contains` needs a list fact; anything
/// else is false.
pub fn matches(facts: &Facts, condition: &Condition) -> bool {
    let actual = facts.get(&condition.fact);
    let actual = actual.as_ref();
    let expected = condition.value.as_ref();

    match &condition.op {
        Operator::Eq => actual == expected,
        Operator::Ne => actual != expected,
        Operator::Gt => ordering(actual, expected) == Some(Ordering::Greater),
        Operator::Ge => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => ordering(actual, expected) == Some(Ordering::Less),
        Operator::Le => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::In => match expected.and_then(Value::as_list) {
            Some(items) => actual.is_some_and(|v| items.contains(v)),
            None => false,
        },
        Operator::NotIn => match expected.and_then(Value::as_list) {
            Some(items) => !actual.is_some_and(|v| items.contains(v)),
            None => false,
        },
        Operator::Contains => match (actual.and_then(Value::as_list), expected) {
            (Some(items), Some(v)) => items.contains(v),
            _ => false,
        },
        Operator::Missing | Operator::Unknown(_) => false,
    }
}

fn ordering(actual: Option<&Value>, expected: Option<&Value>) -> Option<Ordering> {
    actual?.compare(expected?)
}

/// True when every condition holds. An empty list always holds.
pub fn all_match(facts: &Facts, conditions: &[Condition]) -> bool {
    conditions.iter().all(|c| matches(facts, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FactField, Sex};

    fn facts() -> Facts {
        Facts {
            age: 25,
            sex: Sex::M,
            height_cm: 175.0,
            weight_kg: 55.0,
            activity: "moderate".into(),
            conditions: vec!["diabetes".into(), "anemia".into()],
            bmi: 17.0,
        }
    }

    fn cond(fact: FactField, op: &str, value: Option<Value>) -> Condition {
        Condition {
            fact,
            op: Operator::from(op.to_string()),
            value,
        }
    }

    fn num(n: f64) -> Option<Value> {
        Some(Value::Number(n))
    }

    fn list(items: &[&str]) -> Option<Value> {
        Some(Value::from(
            items.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        ))
    }

    #[test]
    fn numeric_comparisons() {
        let f = facts();
        assert!(matches(&f, &cond(FactField::Bmi, "<", num(18.5))));
        assert!(!matches(&f, &cond(FactField::Bmi, ">=", num(18.5))));
        assert!(matches(&f, &cond(FactField::Bmi, "<=", num(17.0))));
        assert!(matches(&f, &cond(FactField::Bmi, ">=", num(17.0))));
        assert!(!matches(&f, &cond(FactField::Bmi, ">", num(17.0))));
        assert!(matches(&f, &cond(FactField::Age, "==", num(25.0))));
        assert!(matches(&f, &cond(FactField::Age, "!=", num(26.0))));
    }

    #[test]
    fn text_equality() {
        let f = facts();
        assert!(matches(
            &f,
            &cond(FactField::Activity, "==", Some(Value::from("moderate")))
        ));
        assert!(matches(
            &f,
            &cond(FactField::Sex, "!=", Some(Value::from("F")))
        ));
    }

    #[test]
    fn membership_operators() {
        let f = facts();
        assert!(matches(
            &f,
            &cond(FactField::Activity, "in", list(&["moderate", "active"]))
        ));
        assert!(!matches(
            &f,
            &cond(FactField::Activity, "not_in", list(&["moderate", "active"]))
        ));
        assert!(matches(
            &f,
            &cond(FactField::Activity, "not_in", list(&["sedentary"]))
        ));
        assert!(matches(
            &f,
            &cond(FactField::Conditions, "contains", Some(Value::from("diabetes")))
        ));
        assert!(!matches(
            &f,
            &cond(FactField::Conditions, "contains", Some(Value::from("hypertension")))
        ));
    }

    #[test]
    fn contains_on_a_scalar_fact_is_false() {
        let f = facts();
        assert!(!matches(
            &f,
            &cond(FactField::Activity, "contains", Some(Value::from("mod")))
        ));
    }

    #[test]
    fn membership_needs_a_list_operand() {
        let f = facts();
        assert!(!matches(
            &f,
            &cond(FactField::Activity, "in", Some(Value::from("moderate")))
        ));
        assert!(!matches(
            &f,
            &cond(FactField::Activity, "not_in", Some(Value::from("x")))
        ));
    }

    #[test]
    fn absent_fact_semantics() {
        let f = facts();
        let missing = || FactField::Unknown("waist_cm".into());

        assert!(!matches(&f, &cond(missing(), "<", num(90.0))));
        assert!(!matches(&f, &cond(missing(), ">=", num(90.0))));
        assert!(!matches(&f, &cond(missing(), "==", num(90.0))));
        assert!(matches(&f, &cond(missing(), "!=", num(90.0))));
        assert!(!matches(&f, &cond(missing(), "in", list(&["a"]))));
        assert!(matches(&f, &cond(missing(), "not_in", list(&["a"]))));
        assert!(!matches(&f, &cond(missing(), "contains", Some(Value::from("a")))));

        // absent compared with absent
        assert!(matches(&f, &cond(missing(), "==", None)));
    }

    #[test]
    fn mixed_kinds_never_order() {
        let f = facts();
        assert!(!matches(
            &f,
            &cond(FactField::Bmi, "<", Some(Value::from("30")))
        ));
        assert!(!matches(
            &f,
            &cond(FactField::Bmi, ">=", Some(Value::from("30")))
        ));
        assert!(matches(
            &f,
            &cond(FactField::Bmi, "!=", Some(Value::from("17")))
        ));
    }

    #[test]
    fn unknown_operator_is_false() {
        let f = facts();
        assert!(!matches(&f, &cond(FactField::Bmi, "~=", num(17.0))));
        assert!(!matches(&f, &cond(FactField::Bmi, "", num(17.0))));
    }

    #[test]
    fn all_match_is_conjunction() {
        let f = facts();
        assert!(all_match(&f, &[]));
        assert!(all_match(
            &f,
            &[
                cond(FactField::Bmi, ">=", num(10.0)),
                cond(FactField::Bmi, "<", num(18.5)),
            ]
        ));
        assert!(!all_match(
            &f,
            &[
                cond(FactField::Bmi, ">=", num(25.0)),
                cond(FactField::Bmi, "<", num(30.0)),
            ]
        ));
    }
}
