use super::condition::all_match;
use super::energy::estimate_tdee;
use crate::models::{
    Diet, DietPlan, Facts, FiredRule, InferenceResult, KcalTarget, Rule, MIFFLIN_ST_JEOR,
};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use tracing::debug;

/// Forward-chaining engine over a fixed rule snapshot.
///
/// Rules are ordered once, at construction, by descending priority. The sort
/// is stable, so rules with equal priority keep the order they were given in
/// (the repository hands them over by ascending id).
pub struct InferenceEngine {
    agenda: Vec<Rule>,
}

impl InferenceEngine {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| Reverse(r.priority));
        Self { agenda: rules }
    }

    pub fn agenda(&self) -> &[Rule] {
        &self.agenda
    }

    /// Single pass over the agenda. Derived results never feed back into
    /// the facts, so no rule is evaluated twice.
    pub fn infer(&self, facts: &Facts) -> InferenceResult {
        debug!(rules = self.agenda.len(), "Running inference");

        let mut diagnosis: Vec<String> = Vec::new();
        let mut plan = DietPlan::default();
        let mut fired_rules = Vec::new();

        for rule in &self.agenda {
            if !all_match(facts, &rule.when) {
                continue;
            }
            debug!(rule_id = %rule.id, priority = rule.priority, "Rule fired");

            fired_rules.push(FiredRule {
                id: rule.id.clone(),
                name: rule.name.clone(),
                explain: rule.then.explain.clone(),
            });

            for label in &rule.then.diagnosis {
                if !diagnosis.contains(label) {
                    diagnosis.push(label.clone());
                }
            }

            if let Some(ref diet) = rule.then.diet {
                apply_diet(&mut plan, diet, facts);
            }
        }

        plan.restrictions = sorted_unique(plan.restrictions);
        plan.advice = sorted_unique(plan.advice);

        InferenceResult {
            diagnosis,
            plan,
            fired_rules,
        }
    }
}

/// Run one inference over `rules` without keeping the engine around.
pub fn infer(facts: &Facts, rules: &[Rule]) -> InferenceResult {
    InferenceEngine::new(rules.to_vec()).infer(facts)
}

fn apply_diet(plan: &mut DietPlan, diet: &Diet, facts: &Facts) {
    if let Some(kcal) = diet.kcal_target.as_ref().and_then(|t| kcal_target(t, facts)) {
        plan.kcal_target = Some(kcal);
    }
    if let Some(ref split) = diet.macro_split {
        if !split.is_empty() {
            plan.macro_split = Some(split.clone());
        }
    }
    plan.restrictions.extend(diet.restrictions.iter().cloned());
    plan.advice.extend(diet.advice.iter().cloned());
}

/// Resolve a kcal target. `None` leaves any earlier target in place.
fn kcal_target(target: &KcalTarget, facts: &Facts) -> Option<i64> {
    match target {
        KcalTarget::Fixed(kcal) => Some(kcal.trunc() as i64),
        KcalTarget::Estimated(descriptor) if descriptor.method == MIFFLIN_ST_JEOR => {
            let tdee = estimate_tdee(
                facts.sex,
                facts.age,
                facts.height_cm,
                facts.weight_kg,
                &facts.activity,
            );
            let factor = 1.0 - descriptor.deficit_pct.unwrap_or(0.0)
                + descriptor.surplus_pct.unwrap_or(0.0);
            Some((tdee * factor).round_ties_even() as i64)
        }
        KcalTarget::Estimated(descriptor) => {
            debug!(method = %descriptor.method, "Unsupported kcal method, skipping");
            None
        }
    }
}

fn sorted_unique(items: Vec<String>) -> Vec<String> {
    items.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
