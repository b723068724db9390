use anyhow::{Context, Result};
use std::sync::Arc;
use time::{OffsetDateTime, Time};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::providers::Provider;
use crate::report::Diagnostics;
use crate::scheduler::{Scheduler, TASK_NAME};
use crate::settings::{ConfigSource, TranslationConfig};
use crate::store::{ContentStore, ImageId, ItemId, TRANSLATED_FLAG, TRANSLATED_VALUE};
use crate::translator::Translator;

/// Items pulled from the store per tick.
pub const BATCH_SIZE: usize = 10;

pub trait Clock: Send + Sync {
    fn time_of_day(&self) -> Time;
}

/// Local wall-clock time, or UTC when the local offset cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn time_of_day(&self) -> Time {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .time()
    }
}

impl Clock for Time {
    fn time_of_day(&self) -> Time {
        *self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub selected: usize,
    /// Titles that changed and were flagged as translated.
    pub flagged: usize,
    /// Titles left unchanged, so the item stays eligible for the next tick.
    pub retry: usize,
    /// Items abandoned because a store read or write failed.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick still holds the job.
    Busy,
    OutsideWindow,
    HostUnavailable,
    /// Nothing left to translate; the recurring task was deregistered.
    Drained,
    Processed(TickSummary),
}

/// One scheduler tick's worth of work: pick a page of untranslated items,
/// translate each title (and optionally image alt texts), write the results
/// back, and flag the items whose title changed.
pub struct BatchJob<P: Provider> {
    store: Arc<dyn ContentStore>,
    provider: P,
    scheduler: Arc<dyn Scheduler>,
    config: Arc<dyn ConfigSource>,
    diagnostics: Arc<Diagnostics>,
    clock: Arc<dyn Clock>,
    running: Mutex<()>,
}

impl<P: Provider> BatchJob<P> {
    pub fn new(
        store: Arc<dyn ContentStore>,
        provider: P,
        scheduler: Arc<dyn Scheduler>,
        config: Arc<dyn ConfigSource>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            store,
            provider,
            scheduler,
            config,
            diagnostics,
            clock: Arc::new(SystemClock),
            running: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run(&self) -> Result<TickOutcome> {
        let Ok(_running) = self.running.try_lock() else {
            debug!("previous tick still running; skipping");
            return Ok(TickOutcome::Busy);
        };

        let config = self
            .config
            .load()
            .with_context(|| "failed to load translation settings")?;

        if let Some(window) = config.active_window {
            let now = self.clock.time_of_day();
            if !window.contains(now) {
                debug!("outside translation window {}; skipping", window);
                return Ok(TickOutcome::OutsideWindow);
            }
        }

        if !self.store.is_available() {
            debug!("store unavailable; skipping");
            return Ok(TickOutcome::HostUnavailable);
        }

        let ids = self
            .store
            .list_unflagged_published(BATCH_SIZE)
            .with_context(|| "failed to list untranslated products")?;
        if ids.is_empty() {
            self.scheduler.deregister(TASK_NAME);
            info!("no untranslated products left; unscheduled {}", TASK_NAME);
            return Ok(TickOutcome::Drained);
        }

        let translator = Translator::new(
            self.provider.clone(),
            config.provider.clone(),
            self.diagnostics.clone(),
        );
        let mut summary = TickSummary {
            selected: ids.len(),
            ..TickSummary::default()
        };
        for id in ids {
            match self.process_item(&translator, &config, id).await {
                Ok(true) => summary.flagged += 1,
                Ok(false) => summary.retry += 1,
                Err(err) => {
                    warn!("product {} skipped: {:#}", id, err);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "tick done: {} selected, {} translated, {} left for retry, {} failed",
            summary.selected, summary.flagged, summary.retry, summary.failed
        );
        Ok(TickOutcome::Processed(summary))
    }

    /// Returns whether the item was flagged as translated.
    async fn process_item(
        &self,
        translator: &Translator<P>,
        config: &TranslationConfig,
        id: ItemId,
    ) -> Result<bool> {
        let original = self.store.get_title(id)?;
        let translated = translator
            .translate(&original, &config.target_language)
            .await;
        self.store.set_title(id, &translated)?;
        info!("Translated product {}: {} -> {}", id, original, translated);

        if config.translate_image_alt {
            self.translate_images(translator, &config.target_language, id).await;
        }

        if translated == original {
            return Ok(false);
        }
        self.store.set_flag(id, TRANSLATED_FLAG, TRANSLATED_VALUE)?;
        Ok(true)
    }

    /// Image failures are logged and do not abort the item; the title alone
    /// decides whether it gets flagged.
    async fn translate_images(
        &self,
        translator: &Translator<P>,
        target_language: &str,
        id: ItemId,
    ) {
        match self.store.primary_image_id(id) {
            Ok(Some(image)) => {
                self.translate_alt(translator, target_language, image, "featured").await;
            }
            Ok(None) => {}
            Err(err) => warn!("featured image of product {} unreadable: {:#}", id, err),
        }

        match self.store.gallery_image_ids(id) {
            Ok(images) => {
                for image in images {
                    self.translate_alt(translator, target_language, image, "gallery").await;
                }
            }
            Err(err) => warn!("gallery of product {} unreadable: {:#}", id, err),
        }
    }

    async fn translate_alt(
        &self,
        translator: &Translator<P>,
        target_language: &str,
        image: ImageId,
        kind: &str,
    ) {
        let alt = match self.store.get_image_alt(image) {
            Ok(alt) => alt,
            Err(err) => {
                warn!("failed to read alt text of {} image {}: {:#}", kind, image, err);
                return;
            }
        };
        if alt.trim().is_empty() {
            return;
        }
        let translated = translator.translate(&alt, target_language).await;
        match self.store.set_image_alt(image, &translated) {
            Ok(()) => info!(
                "Translated {} image {} alt: {} -> {}",
                kind, image, alt, translated
            ),
            Err(err) => warn!(
                "failed to write alt text of {} image {}: {:#}",
                kind, image, err
            ),
        }
    }
}
