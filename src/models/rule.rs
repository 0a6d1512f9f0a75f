use super::facts::FactField;
use super::value::Value;
use crate::error::{NutriError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Name of the only supported energy estimation method.
pub const MIFFLIN_ST_JEOR: &str = "mifflin_st_jeor";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Contains,
    #[default]
    Missing,
    /// Unrecognized symbol; never matches
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::Missing => "",
            Operator::Unknown(op) => op,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Missing | Operator::Unknown(_))
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "contains" => Operator::Contains,
            "" => Operator::Missing,
            _ => Operator::Unknown(s),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub fact: FactField,
    #[serde(default)]
    pub op: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Condition {
    pub fn new(fact: FactField, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            fact,
            op,
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyDescriptor {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deficit_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surplus_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KcalTarget {
    Fixed(f64),
    Estimated(EnergyDescriptor),
}

/// Macronutrient split. Keys beyond the three percentages are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroSplit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carb_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prot_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_pct: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MacroSplit {
    pub fn new(carb_pct: f64, prot_pct: f64, fat_pct: f64) -> Self {
        Self {
            carb_pct: Some(carb_pct),
            prot_pct: Some(prot_pct),
            fat_pct: Some(fat_pct),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.carb_pct.is_none()
            && self.prot_pct.is_none()
            && self.fat_pct.is_none()
            && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diet {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub kcal_target: Option<KcalTarget>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub macro_split: Option<MacroSplit>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub restrictions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub advice: Vec<String>,
}

/// The then-clause of a rule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Effect {
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub diagnosis: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub diet: Option<Diet>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub explain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub when: Vec<Condition>,
    #[serde(default)]
    pub then: Effect,
}

impl Rule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, priority: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            when: Vec::new(),
            then: Effect::default(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.when.push(condition);
        self
    }

    pub fn with_diagnosis(mut self, label: &str) -> Self {
        self.then.diagnosis.push(label.to_string());
        self
    }

    pub fn with_diet(mut self, diet: Diet) -> Self {
        self.then.diet = Some(diet);
        self
    }

    pub fn with_explain(mut self, explain: impl Into<String>) -> Self {
        self.then.explain = Some(explain.into());
        self
    }

    /// Structural checks applied before a rule is stored.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(NutriError::InvalidRule("rule id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(NutriError::InvalidRule(format!(
                "rule '{}' must have a name",
                self.id
            )));
        }
        if let Some(pos) = self
            .when
            .iter()
            .position(|c| c.fact == FactField::Missing)
        {
            return Err(NutriError::InvalidRule(format!(
                "rule '{}' condition {} has no fact",
                self.id,
                pos + 1
            )));
        }
        Ok(())
    }

    /// Operators and fact names this rule uses that the evaluator doesn't know.
    /// Unknown facts read as absent; unknown operators never match.
    pub fn unknown_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        for c in &self.when {
            if !c.fact.is_known() {
                terms.push(format!("fact '{}'", c.fact.as_str()));
            }
            if !c.op.is_known() {
                terms.push(format!("operator '{}'", c.op.as_str()));
            }
        }
        terms
    }
}

/// Deserialize an optional field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| match serde_json::from_value(v) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed effect field");
            None
        }
    }))
}

/// Like `lenient`, for list fields: a value of the wrong shape reads as empty.
fn lenient_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}
