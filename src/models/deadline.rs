//! Configuração de prazos (SLA) por vendedor
//!
//! Formato salvo em `team_members.prospect_ai_settings.deadlines`:
//!
//! ```json
//! {
//!   "initial_contact": {"minutes": 60, "auto_reassign_enabled": true,
//!                       "reassignment_mode": "specific", "reassignment_target_id": "uuid"},
//!   "first_feedback":  {"minutes": 240, "auto_reassign_enabled": false,
//!                       "reassignment_mode": "random", "reassignment_target_id": null}
//! }
//! ```

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize};

use super::company::WellKnownStage;
use super::lead::LeadClock;

/// Como escolher o novo dono de um lead atrasado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReassignmentMode {
    /// Sorteio uniforme entre os outros vendedores da empresa
    #[default]
    Random,
    /// Sempre o `reassignment_target_id` configurado
    Specific,
}

// Qualquer valor diferente de "specific" (inclusive null) cai no sorteio
impl<'de> Deserialize<'de> for ReassignmentMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("specific") => ReassignmentMode::Specific,
            _ => ReassignmentMode::Random,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeadlineRule {
    #[serde(default, rename = "minutes", alias = "minutesThreshold", alias = "minutes_threshold")]
    pub minutes_threshold: Option<f64>,
    #[serde(default, alias = "autoReassignEnabled")]
    pub auto_reassign_enabled: bool,
    #[serde(default, alias = "reassignmentMode")]
    pub reassignment_mode: ReassignmentMode,
    #[serde(default, alias = "reassignmentTargetId")]
    pub reassignment_target_id: Option<String>,
}

impl DeadlineRule {
    /// Prazo efetivo; `None` para valores negativos, não finitos ou grandes demais
    pub fn threshold(&self, kind: DeadlineKind) -> Option<Duration> {
        let minutes = self.minutes_threshold.unwrap_or(kind.default_minutes());
        if !minutes.is_finite() || minutes < 0.0 {
            return None;
        }
        let millis = (minutes * 60_000.0).round();
        if millis >= i64::MAX as f64 {
            return None;
        }
        Duration::try_milliseconds(millis as i64)
    }

    /// Alvo fixo do modo `specific` (string vazia conta como ausente)
    pub fn specific_target(&self) -> Option<&str> {
        self.reassignment_target_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deadlines {
    #[serde(default)]
    pub initial_contact: Option<DeadlineRule>,
    #[serde(default)]
    pub first_feedback: Option<DeadlineRule>,
}

impl Deadlines {
    pub fn rule(&self, kind: DeadlineKind) -> Option<&DeadlineRule> {
        match kind {
            DeadlineKind::InitialContact => self.initial_contact.as_ref(),
            DeadlineKind::FirstFeedback => self.first_feedback.as_ref(),
        }
    }
}

/// As duas regras de prazo. Cada uma observa uma etapa diferente, então um lead
/// nunca é elegível para as duas ao mesmo tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadlineKind {
    /// Tempo desde a chegada do lead (`created_at`) em "Novos Leads"
    InitialContact,
    /// Tempo desde o início da prospecção (`prospected_at`) em "Primeira Tentativa",
    /// sem nenhum feedback registrado
    FirstFeedback,
}

impl DeadlineKind {
    pub const ALL: [DeadlineKind; 2] = [DeadlineKind::InitialContact, DeadlineKind::FirstFeedback];

    pub fn stage(&self) -> WellKnownStage {
        match self {
            DeadlineKind::InitialContact => WellKnownStage::NovosLeads,
            DeadlineKind::FirstFeedback => WellKnownStage::PrimeiraTentativa,
        }
    }

    pub fn clock(&self) -> LeadClock {
        match self {
            DeadlineKind::InitialContact => LeadClock::CreatedAt,
            DeadlineKind::FirstFeedback => LeadClock::ProspectedAt,
        }
    }

    pub fn requires_empty_feedback(&self) -> bool {
        matches!(self, DeadlineKind::FirstFeedback)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            DeadlineKind::InitialContact => "Initial contact deadline missed.",
            DeadlineKind::FirstFeedback => "First feedback deadline missed.",
        }
    }

    /// Valores padrão do CRM quando `minutes` não foi salvo
    pub fn default_minutes(&self) -> f64 {
        match self {
            DeadlineKind::InitialContact => 60.0,
            DeadlineKind::FirstFeedback => 240.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeadlineKind::InitialContact => "initial",
            DeadlineKind::FirstFeedback => "feedback",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_from_crm_format() {
        let rule: DeadlineRule = serde_json::from_value(json!({
            "minutes": 90,
            "auto_reassign_enabled": true,
            "reassignment_mode": "specific",
            "reassignment_target_id": "sp-2"
        }))
        .unwrap();

        assert_eq!(rule.minutes_threshold, Some(90.0));
        assert!(rule.auto_reassign_enabled);
        assert_eq!(rule.reassignment_mode, ReassignmentMode::Specific);
        assert_eq!(rule.specific_target(), Some("sp-2"));
        assert_eq!(rule.threshold(DeadlineKind::InitialContact), Some(Duration::minutes(90)));
    }

    #[test]
    fn test_camel_case_aliases() {
        let rule: DeadlineRule = serde_json::from_value(json!({
            "minutesThreshold": 15,
            "autoReassignEnabled": true,
            "reassignmentMode": "random",
            "reassignmentTargetId": null
        }))
        .unwrap();

        assert_eq!(rule.threshold(DeadlineKind::FirstFeedback), Some(Duration::minutes(15)));
        assert!(rule.auto_reassign_enabled);
        assert_eq!(rule.specific_target(), None);
    }

    #[test]
    fn test_defaults_follow_crm() {
        let rule: DeadlineRule = serde_json::from_value(json!({})).unwrap();
        assert!(!rule.auto_reassign_enabled);
        assert_eq!(rule.reassignment_mode, ReassignmentMode::Random);
        assert_eq!(rule.threshold(DeadlineKind::InitialContact), Some(Duration::minutes(60)));
        assert_eq!(rule.threshold(DeadlineKind::FirstFeedback), Some(Duration::minutes(240)));
    }

    #[test]
    fn test_unknown_mode_falls_back_to_random() {
        let rule: DeadlineRule = serde_json::from_value(json!({"reassignment_mode": "round_robin"})).unwrap();
        assert_eq!(rule.reassignment_mode, ReassignmentMode::Random);

        let rule: DeadlineRule = serde_json::from_value(json!({"reassignment_mode": null})).unwrap();
        assert_eq!(rule.reassignment_mode, ReassignmentMode::Random);
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let rule = DeadlineRule {
            minutes_threshold: Some(-5.0),
            ..Default::default()
        };
        assert_eq!(rule.threshold(DeadlineKind::InitialContact), None);
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let rule = DeadlineRule {
            minutes_threshold: Some(1e300),
            ..Default::default()
        };
        assert_eq!(rule.threshold(DeadlineKind::InitialContact), None);

        // Cabe em um Duration, mas não pode ser subtraído de uma data
        let rule = DeadlineRule {
            minutes_threshold: Some(1e13),
            ..Default::default()
        };
        let threshold = rule.threshold(DeadlineKind::InitialContact).unwrap();
        assert_eq!(chrono::Utc::now().checked_sub_signed(threshold), None);
    }

    #[test]
    fn test_blank_specific_target_is_absent() {
        let rule = DeadlineRule {
            reassignment_mode: ReassignmentMode::Specific,
            reassignment_target_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(rule.specific_target(), None);
    }

    #[test]
    fn test_rules_watch_distinct_stages() {
        assert_ne!(DeadlineKind::InitialContact.stage(), DeadlineKind::FirstFeedback.stage());
        assert!(DeadlineKind::FirstFeedback.requires_empty_feedback());
        assert!(!DeadlineKind::InitialContact.requires_empty_feedback());
    }
}
