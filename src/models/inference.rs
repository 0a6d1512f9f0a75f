use super::rule::MacroSplit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DietPlan {
    pub kcal_target: Option<i64>,
    pub macro_split: Option<MacroSplit>,
    pub restrictions: Vec<String>,
    pub advice: Vec<String>,
}

/// Trail entry for a rule whose conditions all held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredRule {
    pub id: String,
    pub name: String,
    pub explain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceResult {
    pub diagnosis: Vec<String>,
    pub plan: DietPlan,
    pub fired_rules: Vec<FiredRule>,
}
