//! Lead do pipeline Farm (tabela `prospectai`) e trilha de auditoria de remanejamento

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub salesperson_id: Option<String>,
    #[serde(default)]
    pub stage_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prospected_at: Option<DateTime<Utc>>,
    /// Lista de `{text, images, createdAt}`; nula/vazia enquanto ninguém registrou contato
    #[serde(default)]
    pub feedback: Option<Value>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl LeadRecord {
    pub fn new(id: impl Into<String>, company_id: impl Into<String>, salesperson_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company_id: Some(company_id.into()),
            salesperson_id: Some(salesperson_id.into()),
            stage_id: None,
            created_at: None,
            prospected_at: None,
            feedback: None,
            details: None,
        }
    }

    /// Verdadeiro quando existe ao menos um feedback registrado.
    /// Qualquer valor que não seja null nem array vazio conta como feedback.
    pub fn has_feedback(&self) -> bool {
        match &self.feedback {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Instante em que o lead foi remanejado para `owner`, se o último remanejamento
    /// registrado em `details` foi para ele
    pub fn reassigned_to_at(&self, owner: &str) -> Option<DateTime<Utc>> {
        let details = self.details.as_ref()?.as_object()?;
        if details.get("reassigned_to")?.as_str()? != owner {
            return None;
        }
        let at = details.get("reassigned_at")?.as_str()?;
        DateTime::parse_from_rfc3339(at).ok().map(|at| at.with_timezone(&Utc))
    }

    pub fn timestamp(&self, clock: LeadClock) -> Option<DateTime<Utc>> {
        match clock {
            LeadClock::CreatedAt => self.created_at,
            LeadClock::ProspectedAt => self.prospected_at,
        }
    }
}

/// Qual relógio do lead uma regra de prazo observa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadClock {
    /// Chegada do lead
    CreatedAt,
    /// Início da prospecção (primeiro contato)
    ProspectedAt,
}

impl LeadClock {
    pub fn column(&self) -> &'static str {
        match self {
            LeadClock::CreatedAt => "created_at",
            LeadClock::ProspectedAt => "prospected_at",
        }
    }
}

/// Formato ISO-8601 usado pelo CRM (`2025-01-01T10:00:00.000Z`)
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Registro de auditoria gravado em `details` a cada remanejamento
#[derive(Debug, Clone, PartialEq)]
pub struct ReassignmentAudit {
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
    pub by_system: bool,
    pub reason: Option<String>,
}

impl ReassignmentAudit {
    /// Remanejamento automático por prazo estourado
    pub fn system(from: &str, to: &str, at: DateTime<Utc>, reason: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            at,
            by_system: true,
            reason: Some(reason.to_string()),
        }
    }

    /// Remanejamento feito por um gestor no CRM
    pub fn manual(from: &str, to: &str, at: DateTime<Utc>) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            at,
            by_system: false,
            reason: None,
        }
    }

    /// Novo `details`: todas as chaves anteriores + as chaves de auditoria no topo
    /// (um remanejamento anterior tem suas chaves de auditoria sobrescritas).
    ///
    /// `details` que não seja objeto (null, string solta) começa de um mapa vazio.
    pub fn merge_into(&self, details: Option<&Value>) -> Map<String, Value> {
        let mut merged = match details {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        merged.insert("reassigned_by_system".to_string(), json!(self.by_system));
        merged.insert("reassigned_from".to_string(), json!(self.from));
        merged.insert("reassigned_to".to_string(), json!(self.to));
        merged.insert("reassigned_at".to_string(), json!(iso8601(self.at)));
        if let Some(reason) = &self.reason {
            merged.insert("reason".to_string(), json!(reason));
        }

        merged
    }
}
