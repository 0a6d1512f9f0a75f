use super::value::Value;
use crate::error::{NutriError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Sex::M),
            "F" => Some(Sex::F),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field of [`Facts`] that a rule condition can read.
///
/// Names that don't match a known field are kept verbatim so a rule
/// survives a round trip through storage; they read as absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FactField {
    Age,
    Sex,
    HeightCm,
    WeightKg,
    Activity,
    Conditions,
    Bmi,
    #[default]
    Missing,
    Unknown(String),
}

impl FactField {
    pub fn as_str(&self) -> &str {
        match self {
            FactField::Age => "age",
            FactField::Sex => "sex",
            FactField::HeightCm => "height_cm",
            FactField::WeightKg => "weight_kg",
            FactField::Activity => "activity",
            FactField::Conditions => "conditions",
            FactField::Bmi => "bmi",
            FactField::Missing => "",
            FactField::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FactField::Missing | FactField::Unknown(_))
    }
}

impl From<String> for FactField {
    fn from(s: String) -> Self {
        match s.as_str() {
            "age" => FactField::Age,
            "sex" => FactField::Sex,
            "height_cm" => FactField::HeightCm,
            "weight_kg" => FactField::WeightKg,
            "activity" => FactField::Activity,
            "conditions" => FactField::Conditions,
            "bmi" => FactField::Bmi,
            "" => FactField::Missing,
            _ => FactField::Unknown(s),
        }
    }
}

impl From<FactField> for String {
    fn from(field: FactField) -> Self {
        field.as_str().to_string()
    }
}

/// Facts as supplied by a caller, before range checks.
#[derive(Debug, Clone, Deserialize)]
pub struct FactsInput {
    pub age: i64,
    pub sex: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Derived from height and weight when omitted
    #[serde(default)]
    pub bmi: Option<f64>,
}

/// Validated snapshot of one patient's state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facts {
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: String,
    pub conditions: Vec<String>,
    pub bmi: f64,
}

impl Facts {
    pub fn from_json(json: &str) -> Result<Self> {
        let input: FactsInput = serde_json::from_str(json)
            .map_err(|e| NutriError::InvalidFacts(format!("malformed facts: {}", e)))?;
        Facts::try_from(input)
    }

    /// Read a field for condition evaluation.
    pub fn get(&self, field: &FactField) -> Option<Value> {
        match field {
            FactField::Age => Some(Value::Number(self.age as f64)),
            FactField::Sex => Some(Value::Text(self.sex.as_str().to_string())),
            FactField::HeightCm => Some(Value::Number(self.height_cm)),
            FactField::WeightKg => Some(Value::Number(self.weight_kg)),
            FactField::Activity => Some(Value::Text(self.activity.clone())),
            FactField::Conditions => Some(Value::from(self.conditions.clone())),
            FactField::Bmi => Some(Value::Number(self.bmi)),
            FactField::Missing | FactField::Unknown(_) => None,
        }
    }
}

/// weight / height², rounded to one decimal
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    (weight_kg / (height_m * height_m) * 10.0).round() / 10.0
}

fn check_open_range(name: &str, value: f64, low: f64, high: f64) -> Result<()> {
    if value > low && value < high {
        Ok(())
    } else {
        Err(NutriError::InvalidFacts(format!(
            "{} must be greater than {} and less than {} (got {})",
            name, low, high, value
        )))
    }
}

impl TryFrom<FactsInput> for Facts {
    type Error = NutriError;

    fn try_from(input: FactsInput) -> Result<Self> {
        if input.age <= 0 || input.age >= 120 {
            return Err(NutriError::InvalidFacts(format!(
                "age must be greater than 0 and less than 120 (got {})",
                input.age
            )));
        }
        let sex = Sex::from_str(&input.sex).ok_or_else(|| {
            NutriError::InvalidFacts(format!("sex must be 'M' or 'F' (got '{}')", input.sex))
        })?;
        check_open_range("height_cm", input.height_cm, 50.0, 250.0)?;
        check_open_range("weight_kg", input.weight_kg, 20.0, 300.0)?;

        let bmi = input
            .bmi
            .unwrap_or_else(|| body_mass_index(input.weight_kg, input.height_cm));
        check_open_range("bmi", bmi, 10.0, 100.0)?;

        Ok(Facts {
            age: input.age as u32,
            sex,
            height_cm: input.height_cm,
            weight_kg: input.weight_kg,
            activity: input.activity,
            conditions: input.conditions,
            bmi,
        })
    }
}
