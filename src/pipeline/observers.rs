//! Observer adapters for training runs

use std::sync::{Arc, Mutex, MutexGuard};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    episode::Termination,
    ports::Observer,
    training::{EpisodeSummary, TickOutcome},
};

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    episodes: usize,
    goals: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            episodes: 0,
            goals: 0,
        }
    }

    fn message(&self) -> String {
        format!("episodes:{} goals:{}", self.episodes, self.goals)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_ticks: u64) -> Result<()> {
        let pb = ProgressBar::new(total_ticks);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_tick(&mut self, tick: u64, _outcome: &TickOutcome) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(tick + 1);
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.episodes += 1;
        if summary.termination == Termination::GoalReached {
            self.goals += 1;
        }
        if let Some(pb) = &self.progress_bar {
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Per-episode record kept by [`MetricsObserver`]
#[derive(Debug, Clone, Default)]
pub struct EpisodeMetrics {
    returns: Vec<f64>,
    terminations: Vec<Termination>,
    learning_ticks: Vec<usize>,
    goal_notifications: usize,
}

impl EpisodeMetrics {
    pub fn episodes(&self) -> usize {
        self.returns.len()
    }

    /// Total reward of every finished episode, in order
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn terminations(&self) -> &[Termination] {
        &self.terminations
    }

    pub fn learning_ticks(&self) -> &[usize] {
        &self.learning_ticks
    }

    /// Number of one-shot goal notifications delivered
    pub fn goal_notifications(&self) -> usize {
        self.goal_notifications
    }

    pub fn count(&self, termination: Termination) -> usize {
        self.terminations
            .iter()
            .filter(|&&t| t == termination)
            .count()
    }

    /// Trailing moving average of episode returns
    ///
    /// Entry `i` averages episodes `i + 1 - window ..= i`, or all episodes
    /// so far while fewer than `window` have finished.
    pub fn moving_average(&self, window: usize) -> Vec<f64> {
        let window = window.max(1);
        let mut averages = Vec::with_capacity(self.returns.len());
        let mut sum = 0.0;
        for (i, &value) in self.returns.iter().enumerate() {
            sum += value;
            if i >= window {
                sum -= self.returns[i - window];
            }
            averages.push(sum / (i + 1).min(window) as f64);
        }
        averages
    }

    pub fn summary(&self) -> MetricsSummary {
        let episodes = self.episodes();
        let mean_return = if episodes == 0 {
            0.0
        } else {
            self.returns.iter().sum::<f64>() / episodes as f64
        };
        let avg_episode_length = if episodes == 0 {
            0.0
        } else {
            self.learning_ticks.iter().sum::<usize>() as f64 / episodes as f64
        };
        MetricsSummary {
            episodes,
            goals_reached: self.count(Termination::GoalReached),
            falls: self.count(Termination::Fallen),
            timeouts: self.count(Termination::TimedOut),
            mean_return,
            avg_episode_length,
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub goals_reached: usize,
    pub falls: usize,
    pub timeouts: usize,
    pub mean_return: f64,
    pub avg_episode_length: f64,
}

/// Metrics observer - Tracks per-episode returns and terminations
///
/// The data lives behind a shared handle so it can be read after the
/// observer has been moved into a pipeline.
pub struct MetricsObserver {
    metrics: Arc<Mutex<EpisodeMetrics>>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(EpisodeMetrics::default())),
        }
    }

    /// Shared handle to the collected metrics
    pub fn handle(&self) -> Arc<Mutex<EpisodeMetrics>> {
        Arc::clone(&self.metrics)
    }

    fn lock(&self) -> MutexGuard<'_, EpisodeMetrics> {
        // A poisoned lock still holds consistent data: every update is a push.
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let mut metrics = self.lock();
        metrics.returns.push(summary.total_reward);
        metrics.terminations.push(summary.termination);
        metrics.learning_ticks.push(summary.learning_ticks);
        Ok(())
    }

    fn on_goal_reached(&mut self, _episode: usize) -> Result<()> {
        self.lock().goal_notifications += 1;
        Ok(())
    }
}
