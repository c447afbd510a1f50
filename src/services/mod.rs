pub mod clock;
pub mod deadline_scanner;
pub mod lead_store;
pub mod manual_reassign;
pub mod memory_store;
pub mod scan_scheduler;
pub mod stage_directory;
pub mod supabase_store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use deadline_scanner::{DeadlineScanner, ScanReport};
pub use lead_store::{LeadReassignment, LeadStore, OverdueLeadQuery, ReassignOutcome};
pub use manual_reassign::{reassign_manually, ManualReassignRequest, ManualReassignResult};
pub use memory_store::InMemoryLeadStore;
pub use scan_scheduler::{ScanCoordinator, ScanStatus};
pub use stage_directory::{StageDirectory, StageLookup};
pub use supabase_store::SupabaseLeadStore;
