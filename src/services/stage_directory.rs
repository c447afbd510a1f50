//! Resolução nome → id das etapas conhecidas, uma vez por empresa por execução
//!
//! O CRM identifica etapas pelo nome exato ("Novos Leads", "Primeira Tentativa").
//! Renomear uma etapa desliga a regra correspondente para aquela empresa; aqui isso
//! vira um [`StageLookup::NotConfigured`] explícito e uma linha de log com o nome
//! mais parecido encontrado, em vez de um skip silencioso.

use deunicode::deunicode;
use std::collections::HashMap;

use crate::config::StageNames;
use crate::models::{CompanyRecord, PipelineStage, WellKnownStage};
use crate::utils::logging::log_stage_not_configured;

const SIMILARITY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub enum StageLookup<'a> {
    Found(&'a PipelineStage),
    NotConfigured,
}

#[derive(Debug, Clone)]
pub struct StageDirectory {
    company_id: String,
    names: StageNames,
    stages: Vec<PipelineStage>,
    /// Nome exato → índice da primeira etapa com esse nome
    by_name: HashMap<String, usize>,
}

impl StageDirectory {
    /// `None` quando a empresa não tem array de etapas
    pub fn build(company: &CompanyRecord, names: &StageNames) -> Option<Self> {
        let stages = company.stages()?;

        let mut by_name = HashMap::new();
        for (index, stage) in stages.iter().enumerate() {
            by_name.entry(stage.name.clone()).or_insert(index);
        }

        Some(Self {
            company_id: company.id.clone(),
            names: names.clone(),
            stages,
            by_name,
        })
    }

    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    pub fn resolve(&self, stage: WellKnownStage) -> StageLookup<'_> {
        match self.by_name.get(stage.name(&self.names)) {
            Some(&index) => StageLookup::Found(&self.stages[index]),
            None => StageLookup::NotConfigured,
        }
    }

    /// Loga as etapas pedidas que não existem nesta empresa
    pub fn report_missing(&self, wanted: &[WellKnownStage]) {
        for stage in wanted {
            if self.resolve(*stage) == StageLookup::NotConfigured {
                let name = stage.name(&self.names);
                log_stage_not_configured(&self.company_id, name, self.closest_name(name));
            }
        }
    }

    /// Nome de etapa parecido (sem acento/caixa, Jaro-Winkler) para diagnóstico
    pub fn closest_name(&self, wanted: &str) -> Option<&str> {
        let wanted_normalized = normalize(wanted);

        self.stages
            .iter()
            .map(|stage| {
                let score = strsim::jaro_winkler(&wanted_normalized, &normalize(&stage.name));
                (stage.name.as_str(), score)
            })
            .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name)
    }
}

fn normalize(name: &str) -> String {
    deunicode(name).trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(id: &str, name: &str, order: i64) -> PipelineStage {
        PipelineStage {
            id: id.to_string(),
            name: name.to_string(),
            stage_order: order,
            is_fixed: false,
            is_enabled: true,
        }
    }

    fn company(stages: Vec<PipelineStage>) -> CompanyRecord {
        CompanyRecord::new("c-1", stages)
    }

    #[test]
    fn test_resolves_default_stages() {
        let directory = StageDirectory::build(
            &company(vec![
                stage("s0", "Novos Leads", 0),
                stage("s1", "Primeira Tentativa", 1),
                stage("s99", "Finalizados", 99),
            ]),
            &StageNames::default(),
        )
        .unwrap();

        assert!(matches!(directory.resolve(WellKnownStage::NovosLeads), StageLookup::Found(s) if s.id == "s0"));
        assert!(matches!(directory.resolve(WellKnownStage::PrimeiraTentativa), StageLookup::Found(s) if s.id == "s1"));
        assert_eq!(directory.resolve(WellKnownStage::Remanejados), StageLookup::NotConfigured);
    }

    #[test]
    fn test_lookup_is_exact() {
        let directory = StageDirectory::build(
            &company(vec![stage("s0", "novos leads", 0)]),
            &StageNames::default(),
        )
        .unwrap();

        assert_eq!(directory.resolve(WellKnownStage::NovosLeads), StageLookup::NotConfigured);
        assert_eq!(directory.closest_name("Novos Leads"), Some("novos leads"));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let directory = StageDirectory::build(
            &company(vec![stage("a", "Novos Leads", 0), stage("b", "Novos Leads", 1)]),
            &StageNames::default(),
        )
        .unwrap();

        assert!(matches!(directory.resolve(WellKnownStage::NovosLeads), StageLookup::Found(s) if s.id == "a"));
    }

    #[test]
    fn test_company_without_stage_array() {
        let company = CompanyRecord { id: "c".into(), pipeline_stages: None };
        assert!(StageDirectory::build(&company, &StageNames::default()).is_none());
    }

    #[test]
    fn test_custom_stage_names() {
        let names = StageNames {
            initial_contact: "Leads Novos".to_string(),
            ..StageNames::default()
        };
        let directory = StageDirectory::build(&company(vec![stage("x", "Leads Novos", 0)]), &names).unwrap();
        assert!(matches!(directory.resolve(WellKnownStage::NovosLeads), StageLookup::Found(_)));
    }

    #[test]
    fn test_closest_name_ignores_unrelated() {
        let directory = StageDirectory::build(
            &company(vec![stage("s0", "Agendado", 0), stage("s1", "Primeira Tentatíva", 1)]),
            &StageNames::default(),
        )
        .unwrap();

        assert_eq!(directory.closest_name("Primeira Tentativa"), Some("Primeira Tentatíva"));
        assert_eq!(directory.closest_name("Remanejados"), None);
    }
}
