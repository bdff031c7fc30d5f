//! Training pipeline and observer wiring

use std::sync::{Arc, Mutex};

use qnav::{
    ControllerConfig, EpisodeEvent, OutOfRangeMode, Result, TableLayout, TrainingLoop,
    pipeline::{MetricsObserver, Observer, RunConfig, TrainingPipeline, TrainingResult},
    training::{EpisodeSummary, TickOutcome},
};
use tempfile::NamedTempFile;

fn arena_config(seed: u64) -> ControllerConfig {
    ControllerConfig::default()
        .with_seed(seed)
        .with_table_layout(TableLayout::Sparse)
        .with_out_of_range(OutOfRangeMode::Clamp)
}

/// Records the order of observer callbacks
#[derive(Default)]
struct EventLog {
    started: Option<u64>,
    ticks: u64,
    goals_seen_in_ticks: usize,
    goal_callbacks: Vec<usize>,
    episode_ends: Vec<usize>,
    finished: bool,
}

struct RecordingObserver(Arc<Mutex<EventLog>>);

impl Observer for RecordingObserver {
    fn on_training_start(&mut self, total_ticks: u64) -> Result<()> {
        self.0.lock().unwrap().started = Some(total_ticks);
        Ok(())
    }

    fn on_tick(&mut self, tick: u64, outcome: &TickOutcome) -> Result<()> {
        let mut log = self.0.lock().unwrap();
        assert_eq!(tick, log.ticks);
        log.ticks += 1;
        if outcome.event == EpisodeEvent::GoalReached {
            log.goals_seen_in_ticks += 1;
        }
        Ok(())
    }

    fn on_goal_reached(&mut self, episode: usize) -> Result<()> {
        self.0.lock().unwrap().goal_callbacks.push(episode);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.0.lock().unwrap().episode_ends.push(summary.episode);
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.0.lock().unwrap().finished = true;
        Ok(())
    }
}

#[test]
fn test_result_totals_are_consistent() {
    let mut controller = TrainingLoop::new(arena_config(42)).unwrap();
    let metrics = MetricsObserver::new();
    let handle = metrics.handle();

    let result = TrainingPipeline::new(RunConfig { ticks: 2_000 })
        .with_observer(Box::new(metrics))
        .run(&mut controller)
        .unwrap();

    assert_eq!(result.total_ticks, 2_000);
    assert_eq!(controller.total_ticks(), 2_000);
    assert!(result.episodes > 0);
    assert_eq!(
        result.goals_reached + result.falls + result.timeouts,
        result.episodes
    );
    assert_eq!(result.falls, 0);
    assert!((0.0..=1.0).contains(&result.goal_rate));
    assert!(result.visited_states > 0);
    assert_eq!(result.final_epsilon, 0.1);

    let metrics = handle.lock().unwrap();
    assert_eq!(metrics.episodes(), result.episodes);
    assert_eq!(metrics.goal_notifications(), result.goals_reached);
    let best = metrics.returns().iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.best_episode_reward, Some(best));
}

#[test]
fn test_observer_event_sequence() {
    let log = Arc::new(Mutex::new(EventLog::default()));
    let config = arena_config(7)
        .with_positions(
            qnav::Position::new(0.0, 1.0, 0.0),
            qnav::Position::new(1.0, 1.0, 0.0),
        )
        .with_exploration(0.0, 1.0, 0.0);
    let mut controller = TrainingLoop::new(config).unwrap();

    TrainingPipeline::new(RunConfig { ticks: 30 })
        .with_observer(Box::new(RecordingObserver(Arc::clone(&log))))
        .run(&mut controller)
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.started, Some(30));
    assert_eq!(log.ticks, 30);
    assert!(log.finished);
    // Greedy +x reaches the goal on the first step; every second tick resets.
    assert_eq!(log.goals_seen_in_ticks, 15);
    assert_eq!(log.goal_callbacks, (0..15).collect::<Vec<_>>());
    assert_eq!(log.episode_ends, log.goal_callbacks);
}

#[test]
fn test_zero_ticks_produces_empty_result() {
    let mut controller = TrainingLoop::new(arena_config(1)).unwrap();
    let result = TrainingPipeline::new(RunConfig { ticks: 0 })
        .run(&mut controller)
        .unwrap();
    assert_eq!(result.episodes, 0);
    assert_eq!(result.goal_rate, 0.0);
    assert_eq!(result.best_episode_reward, None);
}

#[test]
fn test_result_save_load() {
    let mut controller = TrainingLoop::new(arena_config(3)).unwrap();
    let result = TrainingPipeline::new(RunConfig { ticks: 500 })
        .run(&mut controller)
        .unwrap();

    let file = NamedTempFile::new().unwrap();
    result.save(file.path()).unwrap();
    let loaded = TrainingResult::load(file.path()).unwrap();

    assert_eq!(loaded.total_ticks, result.total_ticks);
    assert_eq!(loaded.episodes, result.episodes);
    assert_eq!(loaded.goals_reached, result.goals_reached);
    assert_eq!(loaded.timeouts, result.timeouts);
    assert_eq!(loaded.visited_states, result.visited_states);
}
