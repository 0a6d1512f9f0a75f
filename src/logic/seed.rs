use crate::models::{
    Condition, Diet, EnergyDescriptor, FactField, KcalTarget, MacroSplit, Operator, Rule,
    MIFFLIN_ST_JEOR,
};

fn mifflin(deficit_pct: Option<f64>, surplus_pct: Option<f64>) -> Option<KcalTarget> {
    Some(KcalTarget::Estimated(EnergyDescriptor {
        method: MIFFLIN_ST_JEOR.to_string(),
        deficit_pct,
        surplus_pct,
    }))
}

fn bmi(op: Operator, value: f64) -> Condition {
    Condition::new(FactField::Bmi, op, value)
}

/// Base BMI rule set installed into an empty database
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("R1", "Bajo peso", 20)
            .with_condition(bmi(Operator::Lt, 18.5))
            .with_diagnosis("Bajo peso")
            .with_diet(Diet {
                kcal_target: mifflin(None, Some(0.15)),
                macro_split: Some(MacroSplit::new(0.50, 0.20, 0.30)),
                restrictions: vec![],
                advice: vec!["Aumentar densidad calórica".into()],
            })
            .with_explain("IMC < 18.5"),
        Rule::new("R2", "Sobrepeso", 10)
            .with_condition(bmi(Operator::Ge, 25.0))
            .with_condition(bmi(Operator::Lt, 30.0))
            .with_diagnosis("Sobrepeso")
            .with_diet(Diet {
                kcal_target: mifflin(Some(0.15), None),
                macro_split: Some(MacroSplit::new(0.45, 0.25, 0.30)),
                restrictions: vec!["bebidas_azucaradas".into()],
                advice: vec!["Déficit moderado".into()],
            })
            .with_explain("IMC 25–29.9"),
        Rule::new("R3", "Obesidad", 11)
            .with_condition(bmi(Operator::Ge, 30.0))
            .with_diagnosis("Obesidad")
            .with_diet(Diet {
                kcal_target: mifflin(Some(0.20), None),
                macro_split: Some(MacroSplit::new(0.40, 0.30, 0.30)),
                restrictions: vec!["ultraprocesados".into()],
                advice: vec!["Más proteína y fibra".into()],
            })
            .with_explain("IMC ≥ 30"),
    ]
}
