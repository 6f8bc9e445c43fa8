mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    LoggingSettings, MessagingSettings, ServerSettings, Settings, StorageProviderSetting,
    StorageSettings, TranscriptionProviderSetting, TranscriptionSettings, WorkerSettings,
};
