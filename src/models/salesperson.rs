//! Vendedor (tabela `team_members`, papel "Vendedor")

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::deadline::Deadlines;

/// Linha de `team_members` projetada em `id, company_id, prospect_ai_settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalespersonRecord {
    pub id: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub prospect_ai_settings: Option<Value>,
}

/// Parte de `prospect_ai_settings` que interessa ao job.
/// Demais chaves (metas do Hunter, KPIs) são ignoradas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProspectAiSettings {
    #[serde(default)]
    pub deadlines: Option<Deadlines>,
}

impl SalespersonRecord {
    pub fn new(id: impl Into<String>, company_id: impl Into<String>, settings: Option<Value>) -> Self {
        Self {
            id: id.into(),
            company_id: Some(company_id.into()),
            prospect_ai_settings: settings,
        }
    }

    /// Prazos configurados; `Ok(None)` quando não há configuração salva
    pub fn deadlines(&self) -> Result<Option<Deadlines>, serde_json::Error> {
        match &self.prospect_ai_settings {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => {
                let settings: ProspectAiSettings = serde_json::from_value(raw.clone())?;
                Ok(settings.deadlines)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeadlineKind, ReassignmentMode};
    use serde_json::json;

    #[test]
    fn test_deadlines_from_settings() {
        let sp = SalespersonRecord::new(
            "sp-1",
            "c-1",
            Some(json!({
                "hunter_goals": {"type": "monthly", "value": 10},
                "deadlines": {
                    "initial_contact": {"minutes": 30, "auto_reassign_enabled": true,
                                        "reassignment_mode": "random", "reassignment_target_id": null}
                }
            })),
        );

        let deadlines = sp.deadlines().unwrap().unwrap();
        let rule = deadlines.rule(DeadlineKind::InitialContact).unwrap();
        assert!(rule.auto_reassign_enabled);
        assert_eq!(rule.reassignment_mode, ReassignmentMode::Random);
        assert!(deadlines.rule(DeadlineKind::FirstFeedback).is_none());
    }

    #[test]
    fn test_missing_settings() {
        assert!(SalespersonRecord::new("sp", "c", None).deadlines().unwrap().is_none());
        assert!(SalespersonRecord::new("sp", "c", Some(json!({}))).deadlines().unwrap().is_none());
    }

    #[test]
    fn test_malformed_settings_is_an_error() {
        let sp = SalespersonRecord::new("sp", "c", Some(json!({"deadlines": "sempre"})));
        assert!(sp.deadlines().is_err());
    }
}
