pub mod api_key;
pub mod integration_log;
pub mod lead;
pub mod profile;
pub mod settings;

pub use api_key::ApiKeyRepository;
pub use integration_log::IntegrationLogRepository;
pub use lead::LeadRepository;
pub use profile::ProfileRepository;
pub use settings::SettingsRepository;
