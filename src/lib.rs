pub mod error;
pub mod extract;
pub mod job;
pub mod languages;
pub mod logging;
mod paths;
pub mod providers;
pub mod report;
pub mod scheduler;
pub mod settings;
pub mod store;
#[cfg(test)]
mod test_util;
mod translator;
pub mod window;

pub use error::TranslateError;
pub use extract::extract_translation;
pub use job::{BATCH_SIZE, BatchJob, Clock, SystemClock, TickOutcome, TickSummary};
pub use providers::{CompletionRequest, HttpProvider, Provider, ProviderFuture, ProviderKind};
pub use report::{Diagnostics, Report};
pub use scheduler::{LocalScheduler, Scheduler, TASK_NAME, TICK_INTERVAL, arm_schedule};
pub use settings::{ConfigSource, ProviderSettings, SettingsFiles, TranslationConfig};
pub use store::{Catalog, CatalogImage, CatalogItem, ContentStore, ImageId, ItemId, MemoryStore};
pub use translator::Translator;
pub use window::ActiveWindow;

/// Default location of the persisted diagnostics report.
pub fn default_report_path() -> std::path::PathBuf {
    paths::report_path()
}
