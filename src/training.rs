//! The per-tick learning loop
//!
//! [`TrainingLoop`] owns every piece of mutable learning state: the value
//! table, the exploration schedule, the policy's random stream and the
//! episode clock. An external scheduler (a render loop, a test harness,
//! [`crate::pipeline::TrainingPipeline`]) calls [`TrainingLoop::tick`] once
//! per step with the agent's current position and gets back the position
//! to display next.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    actions::{Action, ActionSet},
    config::ControllerConfig,
    discretizer::StateDiscretizer,
    episode::{EpisodeController, EpisodeStatus, Termination},
    error::{Error, Result},
    q_learning::{EpsilonGreedy, ExplorationSchedule, ValueTable},
    reward::RewardModel,
    types::{DiscreteState, Position},
};

/// Notification for the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EpisodeEvent {
    #[default]
    None,
    /// The agent reached the goal; show it, the agent is already back at start
    GoalReached,
}

/// One learning step as applied to the value table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: DiscreteState,
    pub action_index: usize,
    pub action: Action,
    pub reward: f64,
    pub next_state: DiscreteState,
    pub td_error: f64,
}

/// Totals for a finished episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub termination: Termination,
    /// Sum of rewards received during the episode
    pub total_reward: f64,
    /// Ticks that performed a learning update
    pub learning_ticks: usize,
    pub elapsed: f64,
}

/// Result of a single [`TrainingLoop::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Where the agent is after this tick
    pub position: Position,
    pub event: EpisodeEvent,
    /// Set when the episode ended during this tick
    pub termination: Option<Termination>,
    /// The update applied this tick, if any
    pub transition: Option<Transition>,
    pub episode_end: Option<EpisodeSummary>,
}

/// Tabular Q-learning controller for the point-mass agent
#[derive(Debug, Clone)]
pub struct TrainingLoop {
    config: ControllerConfig,
    discretizer: StateDiscretizer,
    actions: ActionSet,
    table: ValueTable,
    policy: EpsilonGreedy,
    schedule: ExplorationSchedule,
    reward_model: RewardModel,
    episode: EpisodeController,
    episode_return: f64,
    episode_ticks: usize,
    total_ticks: u64,
}

impl TrainingLoop {
    /// Build a controller with a zeroed value table
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `config` fails validation.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        let table = ValueTable::new(
            config.grid_size,
            config.table_layout,
            config.learning_rate,
            config.discount_factor,
        );
        Self::assemble(config, table)
    }

    /// Build a controller that starts from an existing value table
    ///
    /// The table's own learning rate and discount factor are used for updates.
    pub fn with_table(config: ControllerConfig, table: ValueTable) -> Result<Self> {
        config.validate()?;
        if table.grid_size() != config.grid_size {
            return Err(Error::invalid_config(format!(
                "value table grid size {} does not match configured grid_size {}",
                table.grid_size(),
                config.grid_size
            )));
        }
        Self::assemble(config, table)
    }

    fn assemble(config: ControllerConfig, table: ValueTable) -> Result<Self> {
        let discretizer = StateDiscretizer::new(config.grid_size, config.out_of_range)?;
        Ok(Self {
            discretizer,
            actions: ActionSet::new(config.step_size, config.jump_height),
            table,
            policy: EpsilonGreedy::new(config.seed),
            schedule: ExplorationSchedule::new(
                config.exploration_rate,
                config.exploration_decay,
                config.min_exploration_rate,
            ),
            reward_model: RewardModel::new(
                config.fall_penalty,
                config.goal_bonus,
                config.goal_proximity_threshold,
            ),
            episode: EpisodeController::new(
                config.start_position,
                config.episode_timeout,
                config.time_step,
                config.goal_proximity_threshold,
                config.fall_height,
            ),
            episode_return: 0.0,
            episode_ticks: 0,
            total_ticks: 0,
            config,
        })
    }

    /// Advance the controller by one step
    ///
    /// Order of work: advance the episode clock, clamp the agent to the
    /// ground height, check for termination (fall, timeout, goal), then
    /// select and apply an action and update the value table.
    ///
    /// Reaching the goal ends the tick: the agent is returned to the start
    /// position with [`EpisodeEvent::GoalReached`] and no update is made.
    /// A fall or timeout also resets the agent and the clock, but the tick
    /// carries on and learns from the start position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeState`] or [`Error::NonFinitePosition`]
    /// when the current or candidate position cannot be discretized. The
    /// value table is left untouched in that case.
    pub fn tick(&mut self, current: Position, goal: Position) -> Result<TickOutcome> {
        self.total_ticks += 1;
        self.episode.advance();

        // The clamp keeps y at or above ground_height, so the fall branch
        // below only fires when ground_height is configured under fall_height.
        let mut position = current.with_min_height(self.config.ground_height);

        let mut ended = None;
        match self.episode.check(&position, &goal) {
            EpisodeStatus::Running => {}
            EpisodeStatus::Terminated(Termination::GoalReached) => {
                let (summary, start) = self.close_episode(Termination::GoalReached);
                return Ok(TickOutcome {
                    position: start,
                    event: EpisodeEvent::GoalReached,
                    termination: Some(Termination::GoalReached),
                    transition: None,
                    episode_end: Some(summary),
                });
            }
            EpisodeStatus::Terminated(reason) => {
                let (summary, start) = self.close_episode(reason);
                ended = Some(summary);
                position = start;
            }
        }

        // A start inside the goal radius only happens with a per-tick goal
        // other than the configured one.
        if ended.is_some() && self.episode.at_goal(&position, &goal) {
            return Ok(TickOutcome {
                position,
                event: EpisodeEvent::GoalReached,
                termination: ended.map(|summary| summary.termination),
                transition: None,
                episode_end: ended,
            });
        }

        let transition = self.learn(position, &goal)?;
        Ok(TickOutcome {
            position: transition.action.apply(position),
            event: EpisodeEvent::None,
            termination: ended.map(|summary| summary.termination),
            transition: Some(transition),
            episode_end: ended,
        })
    }

    /// Select, apply and learn from one action taken at `position`
    fn learn(&mut self, position: Position, goal: &Position) -> Result<Transition> {
        let state = self.discretizer.discretize(&position)?;
        let action_index = self
            .policy
            .select_action(&self.table, &state, self.schedule.epsilon());
        let action = self.actions.get(action_index);
        let candidate = action.apply(position);

        let fell = self.episode.has_fallen(&candidate);
        let reward = self.reward_model.reward(&candidate, goal, fell);
        let next_state = self.discretizer.discretize(&candidate)?;
        let td_error = self.table.update(&state, action_index, reward, &next_state);

        self.episode_return += reward;
        self.episode_ticks += 1;
        trace!(
            position = %candidate,
            %action,
            reward,
            elapsed = self.episode.elapsed(),
            "tick"
        );

        Ok(Transition {
            state,
            action_index,
            action,
            reward,
            next_state,
            td_error,
        })
    }

    /// Summarise the running episode, then reset it
    fn close_episode(&mut self, termination: Termination) -> (EpisodeSummary, Position) {
        let summary = EpisodeSummary {
            episode: self.episode.episode(),
            termination,
            total_reward: self.episode_return,
            learning_ticks: self.episode_ticks,
            elapsed: self.episode.elapsed(),
        };

        match termination {
            Termination::GoalReached => info!(
                episode = summary.episode,
                total_reward = summary.total_reward,
                ticks = summary.learning_ticks,
                "goal reached"
            ),
            _ => debug!(
                episode = summary.episode,
                %termination,
                total_reward = summary.total_reward,
                "episode reset"
            ),
        }

        let start = self.episode.reset();
        self.schedule.on_episode_end();
        self.episode_return = 0.0;
        self.episode_ticks = 0;
        (summary, start)
    }

    /// Forget everything learned and restart from the first episode
    pub fn reset(&mut self) {
        self.table.reset();
        self.schedule.reset();
        self.policy.reset();
        self.episode = EpisodeController::new(
            self.config.start_position,
            self.config.episode_timeout,
            self.config.time_step,
            self.config.goal_proximity_threshold,
            self.config.fall_height,
        );
        self.episode_return = 0.0;
        self.episode_ticks = 0;
        self.total_ticks = 0;
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn discretizer(&self) -> &StateDiscretizer {
        &self.discretizer
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn epsilon(&self) -> f64 {
        self.schedule.epsilon()
    }

    /// Zero-based index of the running episode
    pub fn episode(&self) -> usize {
        self.episode.episode()
    }

    pub fn elapsed(&self) -> f64 {
        self.episode.elapsed()
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn start_position(&self) -> Position {
        self.config.start_position
    }

    pub fn goal_position(&self) -> Position {
        self.config.goal_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q_learning::TableLayout;

    fn config() -> ControllerConfig {
        ControllerConfig::default()
            .with_seed(3)
            .with_table_layout(TableLayout::Sparse)
    }

    #[test]
    fn test_invalid_config_refuses_to_start() {
        let result = TrainingLoop::new(config().with_learning(0.0, 0.9));
        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_table_grid_must_match() {
        let table = ValueTable::new(10, TableLayout::Sparse, 0.1, 0.9);
        assert!(matches!(
            TrainingLoop::with_table(config(), table),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_greedy_first_tick_steps_positive_x() {
        let mut controller =
            TrainingLoop::new(config().with_exploration(0.0, 1.0, 0.0)).unwrap();
        let start = controller.start_position();
        let goal = controller.goal_position();

        let outcome = controller.tick(start, goal).unwrap();
        assert_eq!(outcome.position, Position::new(-23.0, 1.0, 0.0));
        assert_eq!(outcome.event, EpisodeEvent::None);

        let transition = outcome.transition.unwrap();
        assert_eq!(transition.action_index, 0);
        let expected_reward = -Position::new(-23.0, 1.0, 0.0).distance(&goal);
        assert!((transition.reward - expected_reward).abs() < 1e-12);
        assert!(
            (controller.table().get(&transition.state, 0) - 0.1 * expected_reward).abs() < 1e-12
        );
    }

    #[test]
    fn test_clamp_lifts_agent_before_acting() {
        let mut controller =
            TrainingLoop::new(config().with_exploration(0.0, 1.0, 0.0)).unwrap();
        let goal = controller.goal_position();
        let outcome = controller.tick(Position::new(0.0, -0.5, 0.0), goal).unwrap();

        assert_eq!(outcome.termination, None);
        assert_eq!(outcome.position, Position::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_timeout_restart_inside_goal_radius_skips_update() {
        let mut controller = TrainingLoop::new(config().with_timing(0.5, 1.0)).unwrap();
        let start = controller.start_position();
        let moved_goal = Position::new(start.x + 0.5, start.y, start.z);

        let outcome = controller.tick(start, moved_goal).unwrap();
        assert_eq!(outcome.termination, Some(Termination::TimedOut));
        assert_eq!(outcome.event, EpisodeEvent::GoalReached);
        assert_eq!(outcome.position, start);
        assert!(outcome.transition.is_none());
        assert_eq!(controller.table().visited_states(), 0);
    }

    #[test]
    fn test_out_of_range_surfaces_to_caller() {
        let mut controller = TrainingLoop::new(config()).unwrap();
        let goal = controller.goal_position();
        let before = controller.table().visited_states();
        let err = controller.tick(Position::new(75.0, 1.0, 0.0), goal).unwrap_err();
        assert!(matches!(err, Error::OutOfRangeState { .. }));
        assert_eq!(controller.table().visited_states(), before);
    }

    #[test]
    fn test_reset_forgets_learning() {
        let mut controller = TrainingLoop::new(config()).unwrap();
        let goal = controller.goal_position();
        let mut position = controller.start_position();
        for _ in 0..20 {
            position = controller.tick(position, goal).unwrap().position;
        }
        assert!(controller.table().visited_states() > 0);

        controller.reset();
        assert_eq!(controller.table().visited_states(), 0);
        assert_eq!(controller.total_ticks(), 0);
        assert_eq!(controller.elapsed(), 0.0);
        assert_eq!(controller.episode(), 0);
    }
}
