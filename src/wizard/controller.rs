//! WizardController — step sequencing, gating, and the terminal side effect.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::celebrate::{CelebrationEffect, spawn_celebration};
use crate::config::{GatingPolicy, StepSpec, WizardConfig};
use crate::error::{Error, FormError};
use crate::form::{FieldValue, FormSnapshot, FormState};
use crate::progress::{self, Progress};

use super::state::{AdvanceOutcome, RetreatOutcome, WizardState};

/// One-shot celebration slot: fired flag plus the live task handle.
#[derive(Default)]
struct CelebrationSlot {
    fired: bool,
    handle: Option<JoinHandle<()>>,
}

/// Session status returned to the presentation layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WizardStatus {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub current_index: usize,
    pub current_step: String,
    pub current_label: String,
    /// Highest index reached this session; progress coloring only.
    pub visited_max_index: usize,
    pub terminal: bool,
    /// Set when the terminal step was first reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// External join link for the terminal action.
    pub community_url: String,
    pub progress: Progress,
}

/// Coordinates the wizard session: the index machine, per-step forms, the
/// progress subscription, and the one-shot celebration.
///
/// The controller owns all mutable session state. Presentation layers read
/// snapshots and invoke `advance`/`retreat`; they never reach in.
pub struct WizardController {
    config: Arc<WizardConfig>,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    state: RwLock<WizardState>,
    forms: RwLock<HashMap<String, FormState>>,
    /// Read-only side channel carrying the current index. Ambient UI state
    /// (theme, nav chrome, scroll) observes this; it is not wizard state.
    index_tx: watch::Sender<usize>,
    effect: Arc<dyn CelebrationEffect>,
    celebration: Mutex<CelebrationSlot>,
    completed_at: RwLock<Option<DateTime<Utc>>>,
}

impl WizardController {
    /// Build a controller from a validated configuration.
    ///
    /// Fails fast on definition bugs (duplicate keys, gated steps without
    /// forms, empty option sets); nothing here can fail later at runtime.
    pub fn new(
        config: WizardConfig,
        effect: Arc<dyn CelebrationEffect>,
    ) -> Result<Arc<Self>, Error> {
        config.validate()?;

        let forms = config
            .steps
            .iter()
            .filter_map(|step| {
                step.form.as_ref().map(|form| {
                    (
                        step.key.clone(),
                        FormState::new(Arc::new(form.clone())),
                    )
                })
            })
            .collect();

        let (index_tx, _) = watch::channel(0);
        let controller = Arc::new(Self {
            config: Arc::new(config),
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            state: RwLock::new(WizardState::new()),
            forms: RwLock::new(forms),
            index_tx,
            effect,
            celebration: Mutex::new(CelebrationSlot::default()),
            completed_at: RwLock::new(None),
        });
        tracing::info!(
            session_id = %controller.session_id,
            steps = controller.config.step_count(),
            "Wizard session created"
        );
        Ok(controller)
    }

    /// Attempt to move forward one step.
    ///
    /// A gated step with an incomplete form blocks: the position is
    /// unchanged and repeated calls return the same `Blocked`. Reaching the
    /// last step fires the one-shot celebration. At the last step there is
    /// no outgoing transition; the join action is the external community
    /// link, not an index move.
    pub async fn advance(&self) -> AdvanceOutcome {
        let mut state = self.state.write().await;
        let step = &self.config.steps[state.current_index];

        if step.gating == GatingPolicy::GatedOnCompleteness {
            let forms = self.forms.read().await;
            let complete = forms
                .get(&step.key)
                .map(FormState::is_complete)
                .unwrap_or(false);
            if !complete {
                tracing::debug!(step = %step.key, "Advance blocked, form incomplete");
                return AdvanceOutcome::Blocked;
            }
        }

        match state.advance(self.config.step_count()) {
            Some(index) => {
                let terminal = state.is_terminal(self.config.step_count());
                self.index_tx.send_replace(index);
                drop(state);
                tracing::info!(index, step = %self.config.steps[index].key, "Advanced");
                if terminal {
                    self.on_terminal_reached().await;
                }
                AdvanceOutcome::Advanced { index }
            }
            None => AdvanceOutcome::Blocked,
        }
    }

    /// Move back one step. Never gated; from index 0 the wizard hands
    /// control to the landing screen and stays where it is.
    pub async fn retreat(&self) -> RetreatOutcome {
        let mut state = self.state.write().await;
        match state.retreat() {
            Some(index) => {
                self.index_tx.send_replace(index);
                drop(state);
                tracing::info!(index, "Retreated");
                RetreatOutcome::Retreated { index }
            }
            None => {
                tracing::debug!("Retreat from first step, delegating to exit");
                RetreatOutcome::DelegatedToExit
            }
        }
    }

    /// Record first arrival at the terminal step and fire the celebration.
    ///
    /// Fire-and-forget: the task is spawned, never awaited, never retried;
    /// burst failures are swallowed inside the task. Exactly one firing per
    /// session, even if the user retreats and returns.
    async fn on_terminal_reached(&self) {
        let mut slot = self.celebration.lock().await;
        if slot.fired {
            return;
        }
        slot.fired = true;
        *self.completed_at.write().await = Some(Utc::now());
        let duration = Duration::from_secs(self.config.celebration_secs);
        slot.handle = Some(spawn_celebration(Arc::clone(&self.effect), duration));
        tracing::info!(session_id = %self.session_id, "Terminal step reached");
    }

    /// Move the sub-section cursor inside a multi-field step. Sections are
    /// freely browsable; this never crosses a step boundary.
    pub async fn jump_to_section(&self, step_key: &str, index: usize) -> Result<usize, Error> {
        let mut forms = self.forms.write().await;
        let form = Self::form_mut(&self.config, &mut forms, step_key)?;
        Ok(form.jump_to_section(index)?)
    }

    /// Set one field of a step's form.
    pub async fn set_field(
        &self,
        step_key: &str,
        field_key: &str,
        value: FieldValue,
    ) -> Result<FormSnapshot, Error> {
        let mut forms = self.forms.write().await;
        let form = Self::form_mut(&self.config, &mut forms, step_key)?;
        form.set_field(field_key, value)?;
        Ok(form.snapshot())
    }

    /// Toggle membership in a multi-choice field. Returns the updated
    /// snapshot so the caller can re-render without a second round trip.
    pub async fn toggle_member(
        &self,
        step_key: &str,
        field_key: &str,
        member: &str,
    ) -> Result<FormSnapshot, Error> {
        let mut forms = self.forms.write().await;
        let form = Self::form_mut(&self.config, &mut forms, step_key)?;
        form.toggle_member(field_key, member)?;
        Ok(form.snapshot())
    }

    /// Immutable snapshot of a step's form.
    pub async fn form_snapshot(&self, step_key: &str) -> Result<FormSnapshot, Error> {
        let forms = self.forms.read().await;
        if self.config.step(step_key).is_none() {
            return Err(FormError::UnknownStep(step_key.to_string()).into());
        }
        forms
            .get(step_key)
            .map(FormState::snapshot)
            .ok_or_else(|| FormError::NoForm(step_key.to_string()).into())
    }

    fn form_mut<'a>(
        config: &WizardConfig,
        forms: &'a mut HashMap<String, FormState>,
        step_key: &str,
    ) -> Result<&'a mut FormState, FormError> {
        if config.step(step_key).is_none() {
            return Err(FormError::UnknownStep(step_key.to_string()));
        }
        forms
            .get_mut(step_key)
            .ok_or_else(|| FormError::NoForm(step_key.to_string()))
    }

    /// Current renderable progress.
    pub async fn get_progress(&self) -> Progress {
        let state = self.state.read().await;
        progress::project(state.current_index, self.config.step_count())
    }

    /// Read-only subscription to the current index, for side-channel
    /// observers.
    pub fn subscribe_index(&self) -> watch::Receiver<usize> {
        self.index_tx.subscribe()
    }

    /// Full session status for the REST surface.
    pub async fn status(&self) -> WizardStatus {
        let state = self.state.read().await;
        let step: &StepSpec = &self.config.steps[state.current_index];
        WizardStatus {
            session_id: self.session_id,
            started_at: self.started_at,
            current_index: state.current_index,
            current_step: step.key.clone(),
            current_label: step.label.clone(),
            visited_max_index: state.visited_max_index,
            terminal: state.is_terminal(self.config.step_count()),
            completed_at: *self.completed_at.read().await,
            community_url: self.config.community_url.clone(),
            progress: progress::project(state.current_index, self.config.step_count()),
        }
    }

    /// Abort any live celebration task. Called on session teardown; also
    /// runs on drop so an interval can never outlive the session.
    pub async fn teardown(&self) {
        let mut slot = self.celebration.lock().await;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
            tracing::debug!(session_id = %self.session_id, "Celebration task aborted");
        }
    }
}

impl Drop for WizardController {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.celebration.try_lock() {
            if let Some(handle) = slot.handle.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEffect {
        bursts: AtomicUsize,
    }

    impl CountingEffect {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                bursts: AtomicUsize::new(0),
            })
        }
        fn count(&self) -> usize {
            self.bursts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CelebrationEffect for CountingEffect {
        async fn burst(&self, _intensity: f64, _origin: f64) -> anyhow::Result<()> {
            self.bursts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn controller_with(effect: Arc<CountingEffect>) -> Arc<WizardController> {
        WizardController::new(WizardConfig::default(), effect).unwrap()
    }

    async fn complete_profile(controller: &WizardController) {
        controller
            .set_field(
                "profile",
                "motivation",
                FieldValue::Text("I love building things".to_string()),
            )
            .await
            .unwrap();
        // experience defaults to "beginner"
        controller
            .set_field("profile", "hours", FieldValue::Text("10".to_string()))
            .await
            .unwrap();
        controller
            .toggle_member("profile", "stack", "frontend")
            .await
            .unwrap();
        controller
            .toggle_member("profile", "goals", "side_projects")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_invalid_configuration() {
        let config = WizardConfig {
            steps: Vec::new(),
            community_url: String::new(),
            celebration_secs: 3,
        };
        assert!(WizardController::new(config, CountingEffect::new()).is_err());
    }

    #[tokio::test]
    async fn ungated_steps_advance_freely() {
        let controller = controller_with(CountingEffect::new());
        assert_eq!(controller.advance().await, AdvanceOutcome::Advanced { index: 1 });
        assert_eq!(controller.advance().await, AdvanceOutcome::Advanced { index: 2 });
    }

    #[tokio::test]
    async fn gated_step_blocks_until_form_complete() {
        let controller = controller_with(CountingEffect::new());
        controller.advance().await;
        controller.advance().await;
        assert_eq!((controller.status().await).current_step, "profile");

        // Incomplete form blocks, repeatedly and without moving.
        assert_eq!(controller.advance().await, AdvanceOutcome::Blocked);
        assert_eq!(controller.advance().await, AdvanceOutcome::Blocked);
        assert_eq!((controller.status().await).current_index, 2);

        complete_profile(&controller).await;
        assert_eq!(controller.advance().await, AdvanceOutcome::Advanced { index: 3 });
    }

    #[tokio::test]
    async fn retreat_is_never_gated_and_delegates_at_zero() {
        let controller = controller_with(CountingEffect::new());
        assert_eq!(controller.retreat().await, RetreatOutcome::DelegatedToExit);
        assert_eq!((controller.status().await).current_index, 0);

        controller.advance().await;
        controller.advance().await;
        // Leaving the gated step backwards needs no completeness.
        assert_eq!(controller.retreat().await, RetreatOutcome::Retreated { index: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn celebration_fires_exactly_once() {
        let effect = CountingEffect::new();
        let controller = controller_with(effect.clone());
        controller.advance().await;
        controller.advance().await;
        complete_profile(&controller).await;
        controller.advance().await;

        assert_eq!(controller.advance().await, AdvanceOutcome::Advanced { index: 4 });
        let completed_at = (controller.status().await).completed_at;
        assert!(completed_at.is_some());

        // Let the whole effect run out.
        tokio::time::sleep(Duration::from_secs(5)).await;
        let fired = effect.count();
        assert!(fired > 0);

        // Leaving and returning must not refire.
        controller.retreat().await;
        assert_eq!(controller.advance().await, AdvanceOutcome::Advanced { index: 4 });
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(effect.count(), fired);
        assert_eq!((controller.status().await).completed_at, completed_at);
    }

    #[tokio::test]
    async fn terminal_step_has_no_forward_transition() {
        let controller = controller_with(CountingEffect::new());
        controller.advance().await;
        controller.advance().await;
        complete_profile(&controller).await;
        controller.advance().await;
        controller.advance().await;

        let status = controller.status().await;
        assert!(status.terminal);
        assert_eq!(status.community_url, "https://t.me/kumotechs");
        assert_eq!(controller.advance().await, AdvanceOutcome::Blocked);
        assert_eq!((controller.status().await).current_index, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_aborts_a_live_celebration() {
        let effect = CountingEffect::new();
        let controller = controller_with(effect.clone());
        controller.advance().await;
        controller.advance().await;
        complete_profile(&controller).await;
        controller.advance().await;
        controller.advance().await;

        controller.teardown().await;
        let after_teardown = effect.count();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(effect.count(), after_teardown);
    }

    #[tokio::test]
    async fn index_subscription_tracks_navigation() {
        let controller = controller_with(CountingEffect::new());
        let rx = controller.subscribe_index();
        assert_eq!(*rx.borrow(), 0);

        controller.advance().await;
        assert_eq!(*rx.borrow(), 1);
        controller.retreat().await;
        assert_eq!(*rx.borrow(), 0);
    }

    #[tokio::test]
    async fn form_operations_validate_step_and_field() {
        let controller = controller_with(CountingEffect::new());
        assert!(matches!(
            controller.form_snapshot("nope").await,
            Err(Error::Form(FormError::UnknownStep(_)))
        ));
        assert!(matches!(
            controller.form_snapshot("vision").await,
            Err(Error::Form(FormError::NoForm(_)))
        ));
        assert!(matches!(
            controller
                .set_field("profile", "nope", FieldValue::Text("x".to_string()))
                .await,
            Err(Error::Form(FormError::UnknownField(_)))
        ));
    }

    #[tokio::test]
    async fn section_navigation_is_bounded() {
        let controller = controller_with(CountingEffect::new());
        assert_eq!(controller.jump_to_section("profile", 3).await.unwrap(), 3);
        assert!(matches!(
            controller.jump_to_section("profile", 4).await,
            Err(Error::Form(FormError::SectionOutOfRange { .. }))
        ));
        let snapshot = controller.form_snapshot("profile").await.unwrap();
        assert_eq!(snapshot.current_section, 3);
    }

    #[tokio::test]
    async fn progress_tracks_position() {
        let controller = controller_with(CountingEffect::new());
        let progress = controller.get_progress().await;
        assert_eq!(progress.ratio, 0.0);

        controller.advance().await;
        controller.advance().await;
        let progress = controller.get_progress().await;
        assert_eq!(progress.ratio, 0.5);
    }
}
