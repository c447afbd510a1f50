//! Empresa e etapas do pipeline (coluna `companies.pipeline_stages`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StageNames;

/// Etapa do funil de vendas de uma empresa, como salva pelo CRM (camelCase)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stage_order: i64,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Linha de `companies` projetada em `id, pipeline_stages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: String,
    #[serde(default)]
    pub pipeline_stages: Option<Value>,
}

impl CompanyRecord {
    pub fn new(id: impl Into<String>, stages: Vec<PipelineStage>) -> Self {
        Self {
            id: id.into(),
            pipeline_stages: serde_json::to_value(stages).ok(),
        }
    }

    /// Etapas da empresa; `None` quando a coluna não é um array.
    /// Entradas malformadas dentro do array são ignoradas.
    pub fn stages(&self) -> Option<Vec<PipelineStage>> {
        let items = self.pipeline_stages.as_ref()?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
        )
    }
}

/// Etapas que o job conhece pelo nome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownStage {
    /// Leads recém-chegados, aguardando primeiro contato
    NovosLeads,
    /// Prospecção iniciada, aguardando primeiro feedback
    PrimeiraTentativa,
    /// Destino do remanejamento manual
    Remanejados,
}

impl WellKnownStage {
    pub fn name<'a>(&self, names: &'a StageNames) -> &'a str {
        match self {
            WellKnownStage::NovosLeads => &names.initial_contact,
            WellKnownStage::PrimeiraTentativa => &names.first_feedback,
            WellKnownStage::Remanejados => &names.reassigned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stages_parsed_from_camel_case() {
        let company = CompanyRecord {
            id: "c-1".to_string(),
            pipeline_stages: Some(json!([
                {"id": "s0", "name": "Novos Leads", "stageOrder": 0, "isFixed": true, "isEnabled": true},
                {"id": "s1", "name": "Primeira Tentativa", "stageOrder": 1, "isFixed": false, "isEnabled": true}
            ])),
        };

        let stages = company.stages().unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name, "Novos Leads");
        assert!(stages[0].is_fixed);
        assert_eq!(stages[1].stage_order, 1);
    }

    #[test]
    fn test_missing_or_non_array_stages() {
        let null_stages = CompanyRecord { id: "c".into(), pipeline_stages: None };
        assert!(null_stages.stages().is_none());

        let object_stages = CompanyRecord { id: "c".into(), pipeline_stages: Some(json!({"a": 1})) };
        assert!(object_stages.stages().is_none());

        let empty = CompanyRecord { id: "c".into(), pipeline_stages: Some(json!([])) };
        assert_eq!(empty.stages().unwrap().len(), 0);
    }

    #[test]
    fn test_malformed_stage_entries_are_skipped() {
        let company = CompanyRecord {
            id: "c".into(),
            pipeline_stages: Some(json!([{"name": "sem id"}, {"id": "s1", "name": "Agendado"}])),
        };
        let stages = company.stages().unwrap();
        assert_eq!(stages.len(), 1);
        assert!(stages[0].is_enabled);
    }
}
