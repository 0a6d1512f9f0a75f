use crate::models::Sex;

/// Activity multipliers applied to basal metabolic rate
pub const ACTIVITY_FACTORS: [(&str, f64); 5] = [
    ("sedentary", 1.2),
    ("light", 1.375),
    ("moderate", 1.55),
    ("active", 1.725),
    ("very_active", 1.9),
];

/// Factor used for activity levels not in the table
pub const DEFAULT_ACTIVITY_FACTOR: f64 = 1.2;

pub fn activity_factor(activity: &str) -> f64 {
    ACTIVITY_FACTORS
        .iter()
        .find(|(name, _)| *name == activity)
        .map(|(_, factor)| *factor)
        .unwrap_or(DEFAULT_ACTIVITY_FACTOR)
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day
pub fn basal_metabolic_rate(sex: Sex, age: u32, height_cm: f64, weight_kg: f64) -> f64 {
    let sex_offset = match sex {
        Sex::M => 5.0,
        Sex::F => -161.0,
    };
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + sex_offset
}

/// Estimate total daily energy expenditure (kcal/day)
pub fn estimate_tdee(sex: Sex, age: u32, height_cm: f64, weight_kg: f64, activity: &str) -> f64 {
    basal_metabolic_rate(sex, age, height_cm, weight_kg) * activity_factor(activity)
}
