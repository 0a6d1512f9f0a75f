use crate::error::Result;
use crate::models::Rule;

/// Storage for the rule base.
///
/// `list_all_ordered` returns an owned snapshot sorted by descending priority,
/// then ascending id. Later mutations never affect a snapshot already taken.
pub trait RuleRepository {
    fn list_all_ordered(&self) -> Result<Vec<Rule>>;

    /// Fails with `InvalidRule` if the stored row cannot be decoded
    fn get(&self, id: &str) -> Result<Option<Rule>>;

    /// Fails with `DuplicateKey` if a rule with the same id exists
    fn insert(&self, rule: &Rule) -> Result<()>;

    /// Fails with `NotFound` if `id` is absent, `IdMismatch` if `rule.id != id`
    fn replace(&self, id: &str, rule: &Rule) -> Result<()>;

    /// Fails with `NotFound` if `id` is absent
    fn delete(&self, id: &str) -> Result<()>;
}
