/*!
 * Progress aggregation.
 *
 * Every stage of a run owns a band of the 0..=100 range. Stage-local
 * progress is mapped into its band, and the tracker only ever reports
 * values that are at least as large as the last one it reported.
 */

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Stage of a translation run as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Uploading,
    Extracting,
    Translating,
    Building,
    Finalizing,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uploading => "Uploading document",
            Self::Extracting => "Extracting text",
            Self::Translating => "Translating",
            Self::Building => "Building document",
            Self::Finalizing => "Finalizing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which set of stage bands applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressProfile {
    /// Extraction and chunk translation on this side
    Local,
    /// Whole-document submission to the secondary backend
    Fallback,
}

impl ProgressProfile {
    /// Inclusive `[start, end]` band of a stage
    pub fn band(&self, stage: Stage) -> (u8, u8) {
        match (self, stage) {
            (Self::Local, Stage::Uploading) => (0, 5),
            (Self::Local, Stage::Extracting) => (5, 15),
            (Self::Local, Stage::Translating) => (15, 90),
            (Self::Local, Stage::Building) => (90, 95),
            (Self::Local, Stage::Finalizing) => (95, 100),
            (Self::Fallback, Stage::Uploading) => (0, 30),
            (Self::Fallback, Stage::Extracting) => (30, 50),
            (Self::Fallback, Stage::Translating) => (50, 85),
            (Self::Fallback, Stage::Building) => (85, 95),
            (Self::Fallback, Stage::Finalizing) => (95, 100),
        }
    }
}

/// Map stage-local progress (0..=100) into the overall range
pub fn map_stage_progress(profile: ProgressProfile, stage: Stage, stage_percent: f64) -> u8 {
    let (start, end) = profile.band(stage);
    let fraction = (stage_percent / 100.0).clamp(0.0, 1.0);
    let mapped = start as f64 + (end - start) as f64 * fraction;
    mapped.floor() as u8
}

/// Overall progress after `completed` of `total` chunks
pub fn chunk_progress(completed: usize, total: usize) -> u8 {
    let (start, end) = ProgressProfile::Local.band(Stage::Translating);
    if total == 0 {
        return end;
    }
    let span = (end - start) as usize;
    let done = completed.min(total);
    start + (done * span / total) as u8
}

/// One observable progress change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub stage: Stage,
}

/// Callback receiving progress updates
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Monotonic progress for one run
pub struct ProgressTracker {
    current: Mutex<ProgressUpdate>,
    callback: Option<ProgressCallback>,
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("current", &*self.current.lock())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            current: Mutex::new(ProgressUpdate { percent: 0, stage: Stage::Uploading }),
            callback,
        }
    }

    /// Last reported percentage
    pub fn percent(&self) -> u8 {
        self.current.lock().percent
    }

    pub fn stage(&self) -> Stage {
        self.current.lock().stage
    }

    /// Report `percent`; lower values than the current one are clamped up
    pub fn set(&self, stage: Stage, percent: u8) -> u8 {
        let update = {
            let mut current = self.current.lock();
            let percent = percent.min(100).max(current.percent);
            if percent == current.percent && stage == current.stage {
                return percent;
            }
            *current = ProgressUpdate { percent, stage };
            *current
        };

        if let Some(callback) = &self.callback {
            callback(update);
        }
        update.percent
    }

    /// Report stage-local progress mapped through `profile`
    pub fn set_stage(&self, profile: ProgressProfile, stage: Stage, stage_percent: f64) -> u8 {
        self.set(stage, map_stage_progress(profile, stage, stage_percent))
    }
}
