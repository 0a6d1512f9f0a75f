use crate::db::{Database, RuleRepository};
use crate::error::{NutriError, Result};
use crate::logic::seed::default_rules;
use crate::models::Rule;
use chrono::Utc;
use rusqlite::{ffi, params};
use tracing::{info, warn};

impl Database {
    pub fn count_rules(&self) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(1) FROM rules", [], |row| row.get(0))
                .map_err(Into::into)
        })
    }

    /// Install the base rule set if the table is empty.
    /// Returns the number of rules inserted.
    pub fn seed_default_rules(&self) -> Result<usize> {
        if self.count_rules()? > 0 {
            return Ok(0);
        }
        let rules = default_rules();
        for rule in &rules {
            self.insert(rule)?;
        }
        info!(count = rules.len(), "Seeded default rules");
        Ok(rules.len())
    }
}

fn decode_rule(id: &str, json: &str) -> Result<Rule> {
    let rule = serde_json::from_str::<Rule>(json)
        .map_err(|e| NutriError::InvalidRule(format!("stored rule '{}': {}", id, e)))?;
    for term in rule.unknown_terms() {
        warn!(rule_id = %id, term = %term, "Rule uses an unknown term; condition never matches");
    }
    Ok(rule)
}

impl RuleRepository for Database {
    fn list_all_ordered(&self) -> Result<Vec<Rule>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, json FROM rules ORDER BY priority DESC, id ASC")?;
            let rules = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .filter_map(|row| match row {
                    Ok((id, json)) => match decode_rule(&id, &json) {
                        Ok(rule) => Some(rule),
                        Err(e) => {
                            warn!(rule_id = %id, error = %e, "Skipping undecodable rule");
                            None
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable rule row");
                        None
                    }
                })
                .collect();
            Ok(rules)
        })
    }

    fn get(&self, id: &str) -> Result<Option<Rule>> {
        self.with_conn(|conn| {
            let json: Option<String> = conn
                .query_row("SELECT json FROM rules WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            json.map(|j| decode_rule(id, &j)).transpose()
        })
    }

    fn insert(&self, rule: &Rule) -> Result<()> {
        rule.validate()?;
        let json = serde_json::to_string(rule)?;
        let now = Utc::now().to_rfc3339();

        self.with_conn(|conn| {
            let result = conn.execute(
                r#"
                INSERT INTO rules (id, name, priority, json, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![rule.id, rule.name, rule.priority, json, now, now],
            );
            match result {
                Ok(_) => {
                    info!(rule_id = %rule.id, priority = rule.priority, "Inserted rule");
                    Ok(())
                }
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                {
                    Err(NutriError::DuplicateKey(rule.id.clone()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn replace(&self, id: &str, rule: &Rule) -> Result<()> {
        if rule.id != id {
            return Err(NutriError::IdMismatch {
                path: id.to_string(),
                body: rule.id.clone(),
            });
        }
        rule.validate()?;
        let json = serde_json::to_string(rule)?;

        self.with_conn(|conn| {
            let changed = conn.execute(
                r#"
                UPDATE rules SET name = ?1, priority = ?2, json = ?3, updated_at = ?4
                WHERE id = ?5
                "#,
                params![rule.name, rule.priority, json, Utc::now().to_rfc3339(), id],
            )?;
            if changed == 0 {
                return Err(NutriError::NotFound(format!("rule '{}'", id)));
            }
            info!(rule_id = %id, "Replaced rule");
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM rules WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(NutriError::NotFound(format!("rule '{}'", id)));
            }
            info!(rule_id = %id, "Deleted rule");
            Ok(())
        })
    }
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::infer;
    use crate::models::{Condition, FactField, Facts, Operator, Sex};

    fn ids(rules: &[Rule]) -> Vec<&str> {
        rules.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn lists_by_priority_then_id() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Rule::new("b", "B", 5)).unwrap();
        db.insert(&Rule::new("c", "C", 1)).unwrap();
        db.insert(&Rule::new("a", "A", 5)).unwrap();
        db.insert(&Rule::new("d", "D", 9)).unwrap();

        let rules = db.list_all_ordered().unwrap();
        assert_eq!(ids(&rules), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn insert_duplicate_id_fails() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Rule::new("R1", "Bajo peso", 20)).unwrap();
        let err = db.insert(&Rule::new("R1", "Otra", 1)).unwrap_err();
        assert!(matches!(err, NutriError::DuplicateKey(id) if id == "R1"));
    }

    #[test]
    fn insert_rejects_invalid_rule() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert(&Rule::new("R1", "", 0)).unwrap_err();
        assert!(matches!(err, NutriError::InvalidRule(_)));
        assert_eq!(db.count_rules().unwrap(), 0);
    }

    #[test]
    fn replace_updates_priority_and_body() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Rule::new("R1", "Bajo peso", 20)).unwrap();
        db.insert(&Rule::new("R2", "Sobrepeso", 10)).unwrap();

        let updated = Rule::new("R2", "Sobrepeso grave", 30).with_diagnosis("Sobrepeso");
        db.replace("R2", &updated).unwrap();

        let rules = db.list_all_ordered().unwrap();
        assert_eq!(ids(&rules), vec!["R2", "R1"]);
        assert_eq!(db.get("R2").unwrap(), Some(updated));
    }

    #[test]
    fn replace_missing_rule_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.replace("R9", &Rule::new("R9", "Nada", 0)).unwrap_err();
        assert!(matches!(err, NutriError::NotFound(_)));
    }

    #[test]
    fn replace_with_mismatched_id_fails() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Rule::new("R1", "Bajo peso", 20)).unwrap();
        let err = db.replace("R1", &Rule::new("R2", "Otra", 0)).unwrap_err();
        assert!(matches!(err, NutriError::IdMismatch { .. }));
    }

    #[test]
    fn delete_removes_and_reports_missing() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Rule::new("R1", "Bajo peso", 20)).unwrap();
        db.delete("R1").unwrap();
        assert_eq!(db.get("R1").unwrap(), None);
        assert!(matches!(db.delete("R1"), Err(NutriError::NotFound(_))));
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let db = Database::open_in_memory().unwrap();
        db.seed_default_rules().unwrap();
        let snapshot = db.list_all_ordered().unwrap();
        db.delete("R1").unwrap();
        assert_eq!(ids(&snapshot), vec!["R1", "R3", "R2"]);
        assert_eq!(db.count_rules().unwrap(), 2);
    }

    #[test]
    fn seeding_only_fills_an_empty_table() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.seed_default_rules().unwrap(), 3);
        assert_eq!(db.seed_default_rules().unwrap(), 0);
        assert_eq!(db.count_rules().unwrap(), 3);
    }

    #[test]
    fn undecodable_rows_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Rule::new("R1", "Bajo peso", 20)).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rules (id, name, priority, json) VALUES ('BAD', 'bad', 99, '{not json')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let rules = db.list_all_ordered().unwrap();
        assert_eq!(ids(&rules), vec!["R1"]);
        assert!(matches!(db.get("BAD"), Err(NutriError::InvalidRule(_))));
        db.delete("BAD").unwrap();
    }

    #[test]
    fn unreadable_rows_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        db.insert(&Rule::new("R1", "Bajo peso", 20)).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rules (id, name, priority, json) VALUES ('BLOB', 'b', 1, x'00ff')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let rules = db.list_all_ordered().unwrap();
        assert_eq!(ids(&rules), vec!["R1"]);
    }

    #[test]
    fn stored_rule_with_malformed_list_still_loads() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                r#"INSERT INTO rules (id, name, priority, json) VALUES ('X', 'x', 1,
                   '{"id":"X","name":"x","then":{"diagnosis":["Obesidad"],"diet":{"restrictions":"sal"}}}')"#,
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let rule = db.get("X").unwrap().unwrap();
        assert_eq!(rule.then.diagnosis, vec!["Obesidad"]);
        assert_eq!(ids(&db.list_all_ordered().unwrap()), vec!["X"]);
    }

    #[test]
    fn other_constraint_failures_are_not_duplicates() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER no_zero BEFORE INSERT ON rules WHEN NEW.priority = 0
                 BEGIN SELECT RAISE(ABORT, 'zero priority'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let err = db.insert(&Rule::new("R1", "Bajo peso", 0)).unwrap_err();
        assert!(matches!(err, NutriError::Database(_)));
    }

    #[test]
    fn unknown_operator_survives_storage() {
        let db = Database::open_in_memory().unwrap();
        let rule = Rule::new("R5", "Raro", 1).with_condition(Condition {
            fact: FactField::Bmi,
            op: Operator::Unknown("between".into()),
            value: None,
        });
        db.insert(&rule).unwrap();
        assert_eq!(db.get("R5").unwrap(), Some(rule));
    }

    #[test]
    fn seeded_rules_drive_inference() {
        let db = Database::open_in_memory().unwrap();
        db.seed_default_rules().unwrap();
        let facts = Facts {
            age: 40,
            sex: Sex::F,
            height_cm: 165.0,
            weight_kg: 75.0,
            activity: "light".into(),
            conditions: vec![],
            bmi: 27.5,
        };
        let result = infer(&facts, &db.list_all_ordered().unwrap());
        assert_eq!(result.diagnosis, vec!["Sobrepeso"]);
        assert_eq!(result.plan.restrictions, vec!["bebidas_azucaradas"]);
        assert_eq!(result.plan.advice, vec!["Déficit moderado"]);
    }
}
