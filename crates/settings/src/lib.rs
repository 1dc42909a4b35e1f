pub mod preferences;

pub use preferences::{default_store_dir, SettingsError, SettingsStore, SignetSettings};
