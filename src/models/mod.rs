pub mod company;
pub mod deadline;
pub mod lead;
pub mod salesperson;

pub use company::{CompanyRecord, PipelineStage, WellKnownStage};
pub use deadline::{DeadlineKind, DeadlineRule, Deadlines, ReassignmentMode};
pub use lead::{iso8601, LeadClock, LeadRecord, ReassignmentAudit};
pub use salesperson::{ProspectAiSettings, SalespersonRecord};
