// Handlers HTTP do job
pub mod health;
pub mod leads;
pub mod prazos;

pub use health::*;
pub use leads::*;
pub use prazos::*;
