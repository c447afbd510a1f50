pub mod settings;

pub use settings::{
    ScannerSettings, ServerSettings, Settings, StageNames, StoreBackend, StoreSettings,
    SupabaseSettings, TableNames,
};
