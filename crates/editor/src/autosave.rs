use std::time::Duration;

use serde::Serialize;

use crate::backend::SaveContent;
use crate::config::EditorConfig;
use crate::error::SaveError;
use crate::store::ContentStore;
use crate::time::{Deadline, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", content = "count", rename_all = "snake_case")]
pub enum AutosaveNotice {
    /// Background saves have failed this many times in a row.
    RepeatedFailures(u32),
}

/// Debounced background saving. Each edit pushes the deadline out; only the
/// quiet period after the last edit produces a save.
#[derive(Debug)]
pub struct AutosaveScheduler {
    delay: Duration,
    deadline: Deadline,
    consecutive_failures: u32,
    notice_threshold: u32,
    notice: Option<AutosaveNotice>,
}

impl AutosaveScheduler {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            delay: config.autosave_delay(),
            deadline: Deadline::default(),
            consecutive_failures: 0,
            notice_threshold: config.failure_notice_threshold.max(1),
            notice: None,
        }
    }

    pub fn schedule(&mut self, now: Timestamp) {
        self.deadline.arm(now, self.delay);
        tracing::trace!(at = ?self.deadline.at(), "autosave scheduled");
    }

    pub fn cancel(&mut self) {
        self.deadline.cancel();
    }

    pub fn pending_until(&self) -> Option<Timestamp> {
        self.deadline.at()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn notice(&self) -> Option<AutosaveNotice> {
        self.notice
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Runs the debounced save if it is due and there is something to save.
    /// Failures are logged and counted, not returned to the user.
    pub fn poll(
        &mut self,
        now: Timestamp,
        store: &mut ContentStore,
        saver: &mut impl SaveContent,
    ) -> Option<Result<(), SaveError>> {
        if !self.deadline.fire(now) {
            return None;
        }
        if !store.has_unsaved_changes() {
            return None;
        }

        let result = run_save(now, store, saver);
        match &result {
            Ok(()) => {
                tracing::debug!("autosave complete");
                self.consecutive_failures = 0;
                self.notice = None;
            }
            Err(SaveError::Unauthenticated) => {
                tracing::info!("autosave skipped: not logged in");
            }
            Err(err) => {
                self.consecutive_failures += 1;
                tracing::warn!(%err, failures = self.consecutive_failures, "autosave failed");
                if self.consecutive_failures >= self.notice_threshold {
                    self.notice = Some(AutosaveNotice::RepeatedFailures(self.consecutive_failures));
                }
            }
        }
        Some(result)
    }

    /// Explicit save: cancels the debounce and reports the result.
    pub fn save_now(
        &mut self,
        now: Timestamp,
        store: &mut ContentStore,
        saver: &mut impl SaveContent,
    ) -> Result<(), SaveError> {
        self.deadline.cancel();
        let result = run_save(now, store, saver);
        match &result {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.notice = None;
            }
            Err(err) => tracing::warn!(%err, "save failed"),
        }
        result
    }
}

fn run_save(
    now: Timestamp,
    store: &mut ContentStore,
    saver: &mut impl SaveContent,
) -> Result<(), SaveError> {
    let snapshot = store.snapshot();
    store.set_is_saving(true);
    let result = saver.save(&snapshot);
    store.set_is_saving(false);

    match &result {
        Ok(()) => {
            store.set_last_saved(now);
            store.mark_unsaved_changes(false);
            store.set_login_required(false);
        }
        Err(SaveError::Unauthenticated) => store.set_login_required(true),
        Err(SaveError::Backend(_)) => {}
    }
    result
}
