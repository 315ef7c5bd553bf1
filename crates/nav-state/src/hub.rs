//! The navigation hub
//!
//! A single-task reactive core merging the engine snapshot stream with the
//! gesture queue. All state mutation (projection memory, camera mode, pose,
//! generation counter) happens on this one logical execution context, so a
//! location tick and a concurrent gesture can never race.
//!
//! Shells subscribe to the published [`NavigationUiState`]/[`CameraState`]
//! pair (watch channels, or the synchronous [`current`](NavigationHub::current)
//! mirror for render threads) and enqueue gestures; they never mutate core
//! state directly. Discrete [`NavigationEvent`]s are broadcast for
//! transition/haptic side effects.

use crate::camera::{CameraConfig, CameraController, CameraMode, CameraPose, CameraState};
use crate::projector::{project, NavigationUiState, ProjectionMemory};
use crate::router::GestureEvent;
use nav_engine::{EngineSnapshot, NavigationStatus, VisualInstruction};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::debug;

/// Gesture queue depth; gestures beyond this are dropped under backpressure
const GESTURE_QUEUE_DEPTH: usize = 32;

/// Hub errors
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub's update task has shut down
    #[error("Navigation hub is shut down")]
    Closed,

    /// The gesture queue is full
    #[error("Gesture queue full")]
    QueueFull,
}

/// Result type for hub operations
pub type Result<T> = std::result::Result<T, HubError>;

/// Discrete navigation events, for side effects that should fire once per
/// transition rather than on every published state
#[derive(Debug, Clone)]
pub enum NavigationEvent {
    /// A new instruction became active
    InstructionChanged(VisualInstruction),
    /// The destination was reached
    Arrived,
    /// The camera changed mode
    CameraModeChanged(CameraMode),
    /// The engine failed; the UI is in its terminal error state
    EngineFailed,
}

/// The reactive navigation core
///
/// Single writer, many independent readers: one background task consumes
/// snapshots and gestures in arrival order and publishes derived state.
pub struct NavigationHub {
    ui_tx: watch::Sender<NavigationUiState>,
    camera_tx: watch::Sender<CameraState>,
    events_tx: broadcast::Sender<NavigationEvent>,
    gesture_tx: mpsc::Sender<GestureEvent>,
    gesture_rx: Mutex<Option<mpsc::Receiver<GestureEvent>>>,
    latest: Arc<RwLock<(NavigationUiState, CameraState)>>,
    camera_config: CameraConfig,
    initial_pose: CameraPose,
}

impl NavigationHub {
    /// Create a hub with the given camera tuning and initial pose
    pub fn new(camera_config: CameraConfig, initial_pose: CameraPose) -> Self {
        let initial_camera = *CameraController::new(camera_config, initial_pose).state();
        let (ui_tx, _) = watch::channel(NavigationUiState::default());
        let (camera_tx, _) = watch::channel(initial_camera);
        let (events_tx, _) = broadcast::channel(16);
        let (gesture_tx, gesture_rx) = mpsc::channel(GESTURE_QUEUE_DEPTH);

        Self {
            ui_tx,
            camera_tx,
            events_tx,
            gesture_tx,
            gesture_rx: Mutex::new(Some(gesture_rx)),
            latest: Arc::new(RwLock::new((NavigationUiState::default(), initial_camera))),
            camera_config,
            initial_pose,
        }
    }

    /// Start the update task over an engine snapshot stream
    ///
    /// The returned handle stops the task when dropped. `start` consumes the
    /// hub's single gesture receiver and therefore runs at most once.
    pub fn start(
        self: &Arc<Self>,
        snapshots: watch::Receiver<Option<EngineSnapshot>>,
    ) -> Result<HubHandle> {
        let gesture_rx = self.gesture_rx.lock().take().ok_or(HubError::Closed)?;
        let (stop_tx, stop_rx) = oneshot::channel();
        let hub = Arc::clone(self);
        let camera = CameraController::new(self.camera_config, self.initial_pose);

        let task = tokio::spawn(run_core(hub, camera, snapshots, gesture_rx, stop_rx));
        Ok(HubHandle { stop_tx: Some(stop_tx), _task: task })
    }

    /// Subscribe to UI state updates
    pub fn subscribe_ui_state(&self) -> watch::Receiver<NavigationUiState> {
        self.ui_tx.subscribe()
    }

    /// Subscribe to camera state updates
    pub fn subscribe_camera(&self) -> watch::Receiver<CameraState> {
        self.camera_tx.subscribe()
    }

    /// Subscribe to discrete navigation events
    pub fn subscribe_events(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events_tx.subscribe()
    }

    /// Enqueue a gesture without awaiting (render-thread safe)
    ///
    /// Gestures are processed in arrival order relative to snapshots; a
    /// gesture always observes, and overrides, the most recent camera pose.
    pub fn enqueue_gesture(&self, gesture: GestureEvent) -> Result<()> {
        self.gesture_tx.try_send(gesture).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => HubError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => HubError::Closed,
        })
    }

    /// The latest published state pair, readable synchronously
    pub fn current(&self) -> (NavigationUiState, CameraState) {
        self.latest.read().clone()
    }

    fn publish_ui(&self, state: NavigationUiState) {
        self.latest.write().0 = state.clone();
        self.ui_tx.send_replace(state);
    }

    fn publish_camera(&self, state: CameraState) {
        self.latest.write().1 = state;
        self.camera_tx.send_replace(state);
    }

    fn emit(&self, event: NavigationEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events_tx.send(event);
    }
}

async fn run_core(
    hub: Arc<NavigationHub>,
    mut camera: CameraController,
    mut snapshots: watch::Receiver<Option<EngineSnapshot>>,
    mut gesture_rx: mpsc::Receiver<GestureEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut memory = ProjectionMemory::new();
    let mut ui = NavigationUiState::default();
    let mut was_arrived = false;
    let mut was_error = false;

    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => break,

            Some(gesture) = gesture_rx.recv() => {
                apply_gesture(&hub, &mut camera, &gesture, &ui);
                hub.publish_camera(*camera.state());
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    debug!("snapshot stream closed; stopping navigation core");
                    break;
                }
                let Some(snapshot) = snapshots.borrow_and_update().clone() else {
                    continue;
                };

                // Token taken before projection: any gesture that lands
                // during this tick invalidates the automatic pose below.
                let token = camera.begin_automatic_update();
                let projection = project(&snapshot, &mut memory);
                ui = projection.state;

                if projection.instruction_changed {
                    if let Some(instruction) = ui.instruction.clone() {
                        hub.emit(NavigationEvent::InstructionChanged(instruction));
                    }
                }
                if ui.arrived && !was_arrived {
                    hub.emit(NavigationEvent::Arrived);
                }
                was_arrived = ui.arrived;
                let is_error = ui.status == NavigationStatus::Error;
                if is_error && !was_error {
                    hub.emit(NavigationEvent::EngineFailed);
                }
                was_error = is_error;

                hub.publish_ui(ui.clone());

                // Drain gestures that raced this tick before applying the
                // automatic pose: the gesture wins the tie-break.
                while let Ok(gesture) = gesture_rx.try_recv() {
                    apply_gesture(&hub, &mut camera, &gesture, &ui);
                }

                let mode_before = camera.state().mode;
                camera.apply_automatic(token, &ui);
                if camera.state().mode != mode_before {
                    hub.emit(NavigationEvent::CameraModeChanged(camera.state().mode));
                }
                hub.publish_camera(*camera.state());
            }
        }
    }
}

fn apply_gesture(
    hub: &NavigationHub,
    camera: &mut CameraController,
    gesture: &GestureEvent,
    ui: &NavigationUiState,
) {
    let mode_before = camera.state().mode;
    camera.apply_gesture(gesture, ui);
    if camera.state().mode != mode_before {
        hub.emit(NavigationEvent::CameraModeChanged(camera.state().mode));
    }
}

/// Handle for the hub's update task
///
/// Dropping the handle stops the task; no further state is published.
pub struct HubHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl HubHandle {
    /// Stop the update task explicitly
    pub fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for HubHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}
