//! Verificação de prazos e remanejamento automático de leads
//!
//! A cada execução:
//!
//! 1. Carrega empresas (etapas do pipeline) e vendedores (papel "Vendedor"). Falha
//!    aqui aborta a execução.
//! 2. Para cada vendedor com prazos configurados e ao menos um colega na empresa,
//!    avalia as duas regras:
//!    - **initial_contact**: leads em "Novos Leads" com `created_at` anterior ao corte
//!    - **first_feedback**: leads em "Primeira Tentativa" com `prospected_at` anterior
//!      ao corte e sem nenhum feedback
//! 3. Cada lead atrasado vai para o alvo fixo (`specific`) ou para um colega sorteado
//!    (`random`, sorteio independente por lead) com escrita condicional no dono atual.
//!
//! Falhas de consulta (por regra/vendedor) e de escrita (por lead) só são logadas e
//! contadas no [`ScanReport`]; a execução continua.

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::config::ScannerSettings;
use crate::models::{
    DeadlineKind, DeadlineRule, Deadlines, LeadRecord, ReassignmentAudit, ReassignmentMode,
    WellKnownStage,
};
use crate::services::clock::Clock;
use crate::services::lead_store::{LeadReassignment, LeadStore, OverdueLeadQuery, ReassignOutcome};
use crate::services::stage_directory::{StageDirectory, StageLookup};
use crate::utils::logging::*;
use crate::utils::AppResult;

/// Resultado de uma execução
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub salespeople_scanned: usize,
    pub reassigned: usize,
    /// Escrita condicional perdeu: outro processo já tinha mudado o dono
    pub skipped_conflicts: usize,
    /// Leads que acabaram de ser remanejados para o dono atual e ainda estão na janela
    pub skipped_recently_reassigned: usize,
    pub query_failures: usize,
    pub update_failures: usize,
}

impl ScanReport {
    /// Soma os contadores de uma avaliação parcial
    pub fn merge(&mut self, other: &ScanReport) {
        self.salespeople_scanned += other.salespeople_scanned;
        self.reassigned += other.reassigned;
        self.skipped_conflicts += other.skipped_conflicts;
        self.skipped_recently_reassigned += other.skipped_recently_reassigned;
        self.query_failures += other.query_failures;
        self.update_failures += other.update_failures;
    }

    pub fn failures(&self) -> usize {
        self.query_failures + self.update_failures
    }

    pub fn message(&self) -> String {
        format!("Verification complete. Reassigned {} leads.", self.reassigned)
    }
}

/// Um vendedor pronto para ser avaliado
struct SalespersonScan {
    salesperson_id: String,
    deadlines: Deadlines,
    directory: Arc<StageDirectory>,
    /// Outros vendedores da mesma empresa
    pool: Vec<String>,
}

pub struct DeadlineScanner {
    store: Arc<dyn LeadStore>,
    clock: Arc<dyn Clock>,
    settings: ScannerSettings,
    rng: Mutex<StdRng>,
}

impl DeadlineScanner {
    pub fn new(store: Arc<dyn LeadStore>, clock: Arc<dyn Clock>, settings: ScannerSettings) -> Self {
        Self {
            store,
            clock,
            settings,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Sorteios reproduzíveis (testes)
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    pub async fn run(&self) -> AppResult<ScanReport> {
        let run_id = Uuid::new_v4();
        let started_at = self.clock.now();

        let companies = self.store.list_companies().await.map_err(|e| {
            log_scan_failed(&e.to_string());
            e
        })?;
        let salespeople = self
            .store
            .list_salespeople(&self.settings.salesperson_role)
            .await
            .map_err(|e| {
                log_scan_failed(&e.to_string());
                e
            })?;

        log_scan_started(&run_id.to_string(), salespeople.len(), companies.len());

        let directories: HashMap<String, Arc<StageDirectory>> = companies
            .iter()
            .filter_map(|company| {
                StageDirectory::build(company, &self.settings.stages)
                    .map(|directory| (company.id.clone(), Arc::new(directory)))
            })
            .collect();

        let mut members_by_company: HashMap<&str, Vec<&str>> = HashMap::new();
        for salesperson in &salespeople {
            if let Some(company_id) = salesperson.company_id.as_deref() {
                members_by_company
                    .entry(company_id)
                    .or_default()
                    .push(salesperson.id.as_str());
            }
        }

        let mut scans = Vec::new();
        let mut needed_stages: HashSet<(String, WellKnownStage)> = HashSet::new();

        for salesperson in &salespeople {
            let Some(company_id) = salesperson.company_id.as_deref() else {
                continue;
            };

            let deadlines = match salesperson.deadlines() {
                Ok(Some(deadlines)) => deadlines,
                Ok(None) => continue,
                Err(e) => {
                    log_invalid_settings(&salesperson.id, &e.to_string());
                    continue;
                }
            };

            let Some(directory) = directories.get(company_id) else {
                continue;
            };

            let pool: Vec<String> = members_by_company
                .get(company_id)
                .map(|members| {
                    members
                        .iter()
                        .filter(|id| **id != salesperson.id)
                        .map(|id| id.to_string())
                        .collect()
                })
                .unwrap_or_default();

            if pool.is_empty() {
                tracing::debug!(
                    "Vendedor {} é o único da empresa {} - nada a remanejar",
                    salesperson.id, company_id
                );
                continue;
            }

            for kind in DeadlineKind::ALL {
                if deadlines.rule(kind).map_or(false, |rule| rule.auto_reassign_enabled) {
                    needed_stages.insert((company_id.to_string(), kind.stage()));
                }
            }

            scans.push(SalespersonScan {
                salesperson_id: salesperson.id.clone(),
                deadlines,
                directory: Arc::clone(directory),
                pool,
            });
        }

        for (company_id, stage) in &needed_stages {
            if let Some(directory) = directories.get(company_id.as_str()) {
                directory.report_missing(&[*stage]);
            }
        }

        let concurrency = self.settings.concurrency.max(1);
        let partials: Vec<ScanReport> = stream::iter(scans)
            .map(|scan| self.scan_salesperson(scan, started_at))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = ScanReport {
            run_id: Some(run_id),
            started_at: Some(started_at),
            ..Default::default()
        };
        for partial in &partials {
            report.merge(partial);
        }

        let finished_at = self.clock.now();
        report.finished_at = Some(finished_at);

        log_scan_finished(
            &run_id.to_string(),
            report.reassigned,
            report.skipped_conflicts,
            report.failures(),
            (finished_at - started_at).num_milliseconds(),
        );

        Ok(report)
    }

    async fn scan_salesperson(&self, scan: SalespersonScan, now: DateTime<Utc>) -> ScanReport {
        let mut report = ScanReport {
            salespeople_scanned: 1,
            ..Default::default()
        };

        for kind in DeadlineKind::ALL {
            let Some(rule) = scan.deadlines.rule(kind) else {
                continue;
            };
            if !rule.auto_reassign_enabled {
                continue;
            }

            let stage_id = match scan.directory.resolve(kind.stage()) {
                StageLookup::Found(stage) => stage.id.clone(),
                StageLookup::NotConfigured => continue,
            };

            // Prazo fora do intervalo representável também é configuração inválida
            let Some(cutoff) = rule
                .threshold(kind)
                .and_then(|threshold| now.checked_sub_signed(threshold))
            else {
                log_warning(&format!(
                    "⚠️ Prazo {} inválido para vendedor {}: {:?} minutos",
                    kind.label(),
                    scan.salesperson_id,
                    rule.minutes_threshold
                ));
                continue;
            };

            let query = OverdueLeadQuery {
                salesperson_id: scan.salesperson_id.clone(),
                stage_id,
                clock: kind.clock(),
                before: cutoff,
                require_no_feedback: kind.requires_empty_feedback(),
            };

            let leads = match self.store.find_overdue_leads(&query).await {
                Ok(leads) => leads,
                Err(e) => {
                    log_lead_query_error(&scan.salesperson_id, kind.label(), &e.to_string());
                    report.query_failures += 1;
                    continue;
                }
            };

            for lead in &leads {
                self.reassign_overdue(&scan, kind, rule, lead, cutoff, &mut report).await;
            }
        }

        report
    }

    async fn reassign_overdue(
        &self,
        scan: &SalespersonScan,
        kind: DeadlineKind,
        rule: &DeadlineRule,
        lead: &LeadRecord,
        cutoff: DateTime<Utc>,
        report: &mut ScanReport,
    ) {
        let owner = scan.salesperson_id.as_str();

        // O prazo do novo dono conta a partir do remanejamento
        if let Some(reassigned_at) = lead.reassigned_to_at(owner) {
            if reassigned_at >= cutoff {
                report.skipped_recently_reassigned += 1;
                return;
            }
        }

        let Some(target) = self.resolve_target(rule, owner, &scan.pool) else {
            return;
        };

        let audit = ReassignmentAudit::system(owner, &target, self.clock.now(), kind.reason());
        let change = LeadReassignment {
            lead_id: lead.id.clone(),
            expected_owner: owner.to_string(),
            new_owner: target.clone(),
            new_stage_id: None,
            details: audit.merge_into(lead.details.as_ref()),
        };

        match self.store.reassign_lead(&change).await {
            Ok(ReassignOutcome::Applied) => {
                log_lead_reassigned(&lead.id, owner, &target, kind.reason());
                report.reassigned += 1;
            }
            Ok(ReassignOutcome::OwnerChanged) | Ok(ReassignOutcome::NotFound) => {
                log_lead_owner_changed(&lead.id, owner);
                report.skipped_conflicts += 1;
            }
            Err(e) => {
                log_lead_update_error(&lead.id, kind.label(), &e.to_string());
                report.update_failures += 1;
            }
        }
    }

    /// Novo dono do lead; `None` quando não há alvo válido ou o alvo é o próprio dono
    fn resolve_target(&self, rule: &DeadlineRule, owner: &str, pool: &[String]) -> Option<String> {
        let target = match rule.reassignment_mode {
            ReassignmentMode::Specific => {
                let target = rule.specific_target()?;
                if target == owner {
                    return None;
                }
                if !pool.iter().any(|id| id == target) {
                    log_warning(&format!(
                        "⚠️ Alvo {} não é vendedor da mesma empresa de {} - remanejamento ignorado",
                        target, owner
                    ));
                    return None;
                }
                target.to_string()
            }
            ReassignmentMode::Random => {
                let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                pool.choose(&mut *rng)?.clone()
            }
        };

        if target == owner {
            None
        } else {
            Some(target)
        }
    }
}
