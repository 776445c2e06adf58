//! Orchestration for one agent session: the current page, the turn state and
//! both trajectory logs.
//!
//! A turn starts with [`Session::observe`]. Within a turn the agent may commit
//! at most one click, type or go-back when `enforce_single_action` is set.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::error::TreeError;
use crate::core::markdown::markdown;
use crate::core::query::Query;
use crate::core::types::{Action, ActionRecord, ActionType, ElementRef, ScrollDirection};
use crate::io::config::{SessionConfig, ViewportConfig};
use crate::io::env::{Environment, StepResult};
use crate::io::observation::{Observation, build_clean_tree};
use crate::io::trajectory_log::{
    HighLevelRecord, LowLevelEntry, TrajectoryPaths, TrajectoryWriteRequest, new_run_id,
    write_trajectories,
};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("only one {action} action is allowed per turn")]
    UsageViolation { action: ActionType },
    #[error("no observation loaded yet")]
    NoObservation,
    #[error("node {0:?} is not part of the current tree")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("invalid observation: {0:#}")]
    InvalidObservation(anyhow::Error),
    #[error("environment failed: {0:#}")]
    Environment(anyhow::Error),
}

pub struct Session<E: Environment> {
    env: E,
    config: SessionConfig,
    tree: Option<Tree>,
    url: String,
    action_taken: bool,
    high_level: Vec<HighLevelRecord>,
    low_level: Vec<LowLevelEntry>,
}

impl<E: Environment> Session<E> {
    pub fn new(env: E, config: SessionConfig) -> Self {
        Self {
            env,
            config,
            tree: None,
            url: String::new(),
            action_taken: false,
            high_level: Vec::new(),
            low_level: Vec::new(),
        }
    }

    /// Load a fresh observation and start a new turn.
    pub fn observe(&mut self, observation: &Observation) -> Result<&Tree, SessionError> {
        self.replace_page(observation)?;
        self.action_taken = false;
        debug!(url = %self.url, "new turn");
        self.tree()
    }

    pub fn tree(&self) -> Result<&Tree, SessionError> {
        self.tree.as_ref().ok_or(SessionError::NoObservation)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a committing action was taken since the last `observe`.
    pub fn action_taken(&self) -> bool {
        self.action_taken
    }

    pub fn high_level(&self) -> &[HighLevelRecord] {
        &self.high_level
    }

    pub fn low_level(&self) -> &[LowLevelEntry] {
        &self.low_level
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// First match for `query` in the current page.
    pub fn find(&self, query: &Query) -> Result<Option<NodeId>, SessionError> {
        let tree = self.tree()?;
        Ok(tree.find(tree.root(), query))
    }

    /// Markdown rendering of the current page.
    pub fn markdown(&self) -> Result<String, SessionError> {
        Ok(markdown(self.tree()?)?)
    }

    #[instrument(skip(self))]
    pub fn click(&mut self, node: NodeId) -> Result<StepResult, SessionError> {
        let element = self.element(node)?;
        self.check_turn(ActionType::Click)?;
        let element_id = element.id;
        self.record(ActionRecord::Click { element })?;
        self.make_in_viewport(element_id)?;
        self.perform(Action::Click { element_id })
    }

    #[instrument(skip(self, text))]
    pub fn type_text(&mut self, node: NodeId, text: &str) -> Result<StepResult, SessionError> {
        let element = self.element(node)?;
        self.check_turn(ActionType::Type)?;
        let element_id = element.id;
        self.record(ActionRecord::Type {
            element,
            text: text.to_string(),
        })?;
        self.make_in_viewport(element_id)?;
        self.perform(Action::Type {
            element_id,
            text: text.to_string(),
        })
    }

    pub fn press_enter(&mut self) -> Result<StepResult, SessionError> {
        self.record(ActionRecord::PressEnter)?;
        self.perform(Action::key("Enter"))
    }

    pub fn go_back(&mut self) -> Result<StepResult, SessionError> {
        self.check_turn(ActionType::GoBack)?;
        self.record(ActionRecord::GoBack)?;
        self.perform(Action::GoBack)
    }

    /// Final answer for the task. Nothing is sent to the environment.
    pub fn answer(&mut self, text: &str) -> Result<(), SessionError> {
        self.record(ActionRecord::Print {
            text: text.to_string(),
        })?;
        self.low_level.push(LowLevelEntry::Action {
            action: Action::Stop {
                answer: text.to_string(),
            },
        });
        info!(url = %self.url, "answered");
        Ok(())
    }

    /// Drop both trajectory logs. The current page is kept.
    pub fn reset(&mut self) {
        self.high_level.clear();
        self.low_level.clear();
    }

    /// Persist both logs under `<root>/.axtree/trajectories/<run_id>/`.
    pub fn save(&self, root: &Path, run_id: &str) -> anyhow::Result<TrajectoryPaths> {
        write_trajectories(&TrajectoryWriteRequest {
            root,
            run_id,
            high_level: &self.high_level,
            low_level: &self.low_level,
        })
    }

    /// Persist both logs under a freshly allocated run id.
    pub fn save_new_run(&self, root: &Path) -> anyhow::Result<TrajectoryPaths> {
        let run_id = new_run_id(root)?;
        self.save(root, &run_id)
    }

    /// Bring an element into the configured band near the top of the
    /// viewport. Gives up without error when the element stops moving or the
    /// adjustment limit is reached.
    pub fn make_in_viewport(&mut self, element_id: i64) -> Result<(), SessionError> {
        let ViewportConfig {
            band_top,
            band_bottom,
            max_adjustments,
        } = self.config.viewport.clone();
        let mut last_y = None;
        for _ in 0..max_adjustments {
            let (_, y) = self
                .env
                .element_center(element_id)
                .map_err(SessionError::Environment)?;
            if (band_top..=band_bottom).contains(&y) {
                return Ok(());
            }
            if last_y == Some(y) {
                warn!(element_id, y, "element stopped moving; acting in place");
                return Ok(());
            }
            last_y = Some(y);
            let action = adjustment_action(y, band_top);
            debug!(element_id, y, ?action, "adjusting viewport");
            self.step_logged(&action)?;
        }
        warn!(element_id, max_adjustments, "viewport adjustment limit reached");
        Ok(())
    }

    fn check_turn(&mut self, action: ActionType) -> Result<(), SessionError> {
        if !action.is_committing() {
            return Ok(());
        }
        if self.action_taken && self.config.enforce_single_action {
            return Err(SessionError::UsageViolation { action });
        }
        if self.action_taken {
            debug!(%action, "second committing action in one turn");
        }
        self.action_taken = true;
        Ok(())
    }

    fn element(&self, node: NodeId) -> Result<ElementRef, SessionError> {
        let tree = self.tree()?;
        tree.try_get(node)
            .map(ElementRef::from)
            .ok_or(SessionError::UnknownNode(node))
    }

    fn record(&mut self, action: ActionRecord) -> Result<(), SessionError> {
        let snapshot = self.tree()?.detach();
        self.high_level.push(HighLevelRecord {
            url: self.url.clone(),
            snapshot,
            action,
        });
        Ok(())
    }

    fn perform(&mut self, action: Action) -> Result<StepResult, SessionError> {
        let result = self.step_logged(&action)?;
        self.replace_page(&result.observation)?;
        Ok(result)
    }

    fn step_logged(&mut self, action: &Action) -> Result<StepResult, SessionError> {
        self.low_level.push(LowLevelEntry::Action {
            action: action.clone(),
        });
        let result = self.env.step(action).map_err(SessionError::Environment)?;
        self.low_level.push(LowLevelEntry::Observation {
            observation: result.observation.clone(),
            info: result.info.clone(),
        });
        Ok(result)
    }

    fn replace_page(&mut self, observation: &Observation) -> Result<(), SessionError> {
        let tree = build_clean_tree(observation).map_err(SessionError::InvalidObservation)?;
        self.tree = Some(tree);
        self.url = observation.url.clone();
        Ok(())
    }
}

/// Off screen scrolls a page; on screen but outside the band nudges with an
/// arrow key.
fn adjustment_action(y: f64, band_top: f64) -> Action {
    if y < 0.0 {
        Action::Scroll {
            direction: ScrollDirection::Up,
        }
    } else if y > 1.0 {
        Action::Scroll {
            direction: ScrollDirection::Down,
        }
    } else if y < band_top {
        Action::key("ArrowUp")
    } else {
        Action::key("ArrowDown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::observation::parse_observation;
    use crate::test_support::{
        ScriptedEnvironment, observation, raw_node, sample_observation_json, step_result,
    };

    fn page() -> Observation {
        parse_observation(sample_observation_json()).expect("parse")
    }

    fn cart_page() -> Observation {
        observation(
            "https://shop.test/cart",
            vec![
                raw_node(1, "RootWebArea", "Cart", &[2]),
                raw_node(2, "heading", "Your cart", &[]),
            ],
        )
    }

    fn session_with(steps: Vec<Observation>, enforce: bool) -> Session<ScriptedEnvironment> {
        let env = ScriptedEnvironment::new(steps.into_iter().map(step_result).collect());
        let config = SessionConfig {
            enforce_single_action: enforce,
            ..SessionConfig::default()
        };
        let mut session = Session::new(env, config);
        session.observe(&page()).expect("observe");
        session
    }

    fn link(session: &Session<ScriptedEnvironment>, name: &str) -> NodeId {
        session
            .find(&Query::new().category("link").name(name))
            .expect("tree")
            .expect("link")
    }

    #[test]
    fn click_records_snapshot_before_action_then_replaces_page() {
        let mut session = session_with(vec![cart_page()], true);
        let cart = link(&session, "Cart");

        session.click(cart).expect("click");

        let high = session.high_level();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].url, "https://shop.test/");
        assert_eq!(high[0].snapshot.nodes[0].name, "Shop");
        match &high[0].action {
            ActionRecord::Click { element } => {
                assert_eq!(element.id, 4);
                assert_eq!(element.name, "Cart");
            }
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(session.url(), "https://shop.test/cart");
        assert_eq!(session.env().actions(), &[Action::Click { element_id: 4 }]);
        assert_eq!(session.low_level().len(), 2);
        assert!(session.action_taken());
    }

    #[test]
    fn second_click_in_turn_is_rejected_when_enforced() {
        let mut session = session_with(vec![page(), page()], true);
        let home = link(&session, "Home");
        session.click(home).expect("first click");

        let home = link(&session, "Home");
        let err = session.click(home).expect_err("second click");

        assert!(matches!(
            err,
            SessionError::UsageViolation {
                action: ActionType::Click
            }
        ));
        assert_eq!(session.high_level().len(), 1);
        assert_eq!(session.env().actions().len(), 1);
    }

    #[test]
    fn second_click_allowed_when_not_enforced() {
        let mut session = session_with(vec![page(), page()], false);
        let home = link(&session, "Home");
        session.click(home).expect("first click");
        let home = link(&session, "Home");
        session.click(home).expect("second click");

        assert!(session.action_taken());
        assert_eq!(session.high_level().len(), 2);
    }

    #[test]
    fn observe_starts_new_turn() {
        let mut session = session_with(vec![page(), page()], true);
        let home = link(&session, "Home");
        session.click(home).expect("click");
        session.observe(&page()).expect("observe");
        assert!(!session.action_taken());
        let home = link(&session, "Home");
        session.click(home).expect("click in new turn");
    }

    #[test]
    fn go_back_counts_as_committing_but_press_enter_does_not() {
        let mut session = session_with(vec![page(), page(), page()], true);
        session.press_enter().expect("enter");
        assert!(!session.action_taken());
        session.go_back().expect("back");
        let home = link(&session, "Home");
        assert!(session.click(home).is_err());
        assert_eq!(
            session.env().actions(),
            &[Action::key("Enter"), Action::GoBack]
        );
    }

    #[test]
    fn answer_records_print_and_stop_without_stepping() {
        let mut session = session_with(Vec::new(), true);
        session.answer("42").expect("answer");

        assert!(matches!(
            &session.high_level()[0].action,
            ActionRecord::Print { text } if text == "42"
        ));
        assert_eq!(
            session.low_level(),
            &[LowLevelEntry::Action {
                action: Action::Stop {
                    answer: "42".to_string()
                }
            }]
        );
        assert!(session.env().actions().is_empty());
    }

    #[test]
    fn reset_clears_logs_but_keeps_page() {
        let mut session = session_with(vec![cart_page()], true);
        let cart = link(&session, "Cart");
        session.click(cart).expect("click");
        session.reset();
        assert!(session.high_level().is_empty());
        assert!(session.low_level().is_empty());
        assert_eq!(session.url(), "https://shop.test/cart");
    }

    #[test]
    fn actions_need_an_observation() {
        let env = ScriptedEnvironment::new(Vec::new());
        let mut session = Session::new(env, SessionConfig::default());
        assert!(matches!(
            session.press_enter(),
            Err(SessionError::NoObservation)
        ));
        assert!(matches!(session.markdown(), Err(SessionError::NoObservation)));
    }

    #[test]
    fn environment_failure_surfaces() {
        let mut session = session_with(Vec::new(), true);
        let home = link(&session, "Home");
        let err = session.click(home).expect_err("no step scripted");
        assert!(matches!(err, SessionError::Environment(_)));
    }

    #[test]
    fn viewport_scrolls_then_nudges_into_band() {
        let env = ScriptedEnvironment::new(vec![
            step_result(page()),
            step_result(page()),
            step_result(cart_page()),
        ])
        .with_centers(vec![(0.5, 1.6), (0.6, 0.7), (0.5, 0.3)]);
        let mut session = Session::new(env, SessionConfig::default());
        session.observe(&page()).expect("observe");
        let cart = link(&session, "Cart");

        session.click(cart).expect("click");

        assert_eq!(
            session.env().actions(),
            &[
                Action::Scroll {
                    direction: ScrollDirection::Down
                },
                Action::key("ArrowDown"),
                Action::Click { element_id: 4 },
            ]
        );
        assert_eq!(session.low_level().len(), 6);
        assert_eq!(session.high_level().len(), 1);
    }

    #[test]
    fn viewport_stops_when_position_repeats() {
        let env = ScriptedEnvironment::new(vec![step_result(page()), step_result(cart_page())])
            .with_centers(vec![(0.5, 0.9), (0.5, 0.9)]);
        let mut session = Session::new(env, SessionConfig::default());
        session.observe(&page()).expect("observe");
        let cart = link(&session, "Cart");

        session.click(cart).expect("click proceeds anyway");

        assert_eq!(
            session.env().actions(),
            &[Action::key("ArrowDown"), Action::Click { element_id: 4 }]
        );
    }

    #[test]
    fn viewport_respects_adjustment_limit() {
        let env = ScriptedEnvironment::new(vec![step_result(page()), step_result(page())])
            .with_default_center((0.5, -1.0))
            .with_centers(vec![(0.5, -3.0), (0.5, -2.0)]);
        let mut config = SessionConfig::default();
        config.viewport.max_adjustments = 2;
        let mut session = Session::new(env, config);
        session.observe(&page()).expect("observe");

        session.make_in_viewport(4).expect("best effort");

        let up = Action::Scroll {
            direction: ScrollDirection::Up,
        };
        assert_eq!(session.env().actions(), &[up.clone(), up]);
        assert_eq!(session.env().center_queries(), &[4, 4]);
    }

    #[test]
    fn adjustment_action_picks_scroll_or_arrow() {
        assert_eq!(
            adjustment_action(-0.2, 0.1),
            Action::Scroll {
                direction: ScrollDirection::Up
            }
        );
        assert_eq!(
            adjustment_action(1.2, 0.1),
            Action::Scroll {
                direction: ScrollDirection::Down
            }
        );
        assert_eq!(adjustment_action(0.05, 0.1), Action::key("ArrowUp"));
        assert_eq!(adjustment_action(0.8, 0.1), Action::key("ArrowDown"));
    }

    #[test]
    fn click_on_pruned_node_is_unknown() {
        let mut session = session_with(vec![cart_page()], true);
        let tree = session.tree().expect("tree");
        let pruned = (0..tree.arena_len())
            .map(|index| tree.node_id(index))
            .find(|id| tree.get(*id).category == "StaticText")
            .expect("pruned text stays in the arena");
        assert!(!tree.contains(pruned));

        let err = session.click(pruned).expect_err("pruned node");

        assert!(matches!(err, SessionError::UnknownNode(id) if id == pruned));
        assert!(session.env().actions().is_empty());
        assert!(session.high_level().is_empty());
        assert!(!session.action_taken());
    }

    #[test]
    fn ids_from_previous_page_are_unknown() {
        let mut session = session_with(vec![cart_page()], true);
        let stale = link(&session, "Home");
        session.observe(&page()).expect("same page again");

        let err = session.type_text(stale, "hi").expect_err("stale id");

        assert!(matches!(err, SessionError::UnknownNode(_)));
        assert!(session.env().actions().is_empty());
        let fresh = link(&session, "Home");
        assert_eq!(fresh.index(), stale.index());
        session.click(fresh).expect("fresh id");
    }
}
