//! Engine adapter
//!
//! Wraps a [`NavigationEngine`] and republishes its updates on a `watch`
//! channel with the guarantees downstream code relies on:
//!
//! - snapshot timestamps never decrease (late snapshots are dropped)
//! - nothing is delivered after a terminal snapshot (`Arrived`/`Error`)
//!   until a new route is set
//! - a fatal engine failure is surfaced as a terminal `Error` snapshot
//!   instead of silently ending the stream
//!
//! Dropping the [`AdapterHandle`] stops the pump task and releases the
//! underlying engine subscription.

use crate::engine::NavigationEngine;
use crate::error::Result;
use crate::models::{EngineSnapshot, NavigationStatus, RouteHandle, UserLocation};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

/// Adapter between a [`NavigationEngine`] and the reactive core
pub struct EngineAdapter<E: NavigationEngine> {
    engine: Arc<E>,
    snapshot_tx: watch::Sender<Option<EngineSnapshot>>,
    terminal: Arc<AtomicBool>,
    last_timestamp_ms: Arc<AtomicU64>,
}

impl<E: NavigationEngine> EngineAdapter<E> {
    /// Subscribe to the engine and start the snapshot pump
    ///
    /// Returns the adapter plus a handle that stops the pump when dropped.
    pub async fn start(engine: Arc<E>) -> Result<(Self, AdapterHandle)> {
        let updates = engine.observe_state().await?;
        let (snapshot_tx, _) = watch::channel(None);
        let terminal = Arc::new(AtomicBool::new(false));
        let last_timestamp_ms = Arc::new(AtomicU64::new(0));

        let (stop_tx, stop_rx) = oneshot::channel();
        let pump = tokio::spawn(pump_snapshots(
            updates,
            snapshot_tx.clone(),
            Arc::clone(&terminal),
            Arc::clone(&last_timestamp_ms),
            stop_rx,
        ));

        let adapter = Self { engine, snapshot_tx, terminal, last_timestamp_ms };
        Ok((adapter, AdapterHandle { stop_tx: Some(stop_tx), _pump: pump }))
    }

    /// Subscribe to published snapshots
    ///
    /// The value is `None` until the first snapshot arrives.
    pub fn subscribe(&self) -> watch::Receiver<Option<EngineSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Forward a raw location fix to the engine (fire-and-forget)
    pub async fn update_location(&self, location: UserLocation) {
        self.engine.update_location(location).await;
    }

    /// Start navigating a new route, re-arming delivery after a terminal
    /// snapshot
    pub async fn set_route(&self, route: RouteHandle) -> Result<()> {
        self.engine.set_route(route).await?;
        self.last_timestamp_ms.store(0, Ordering::SeqCst);
        self.terminal.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Stop navigation; no further snapshots are delivered until a new
    /// route is set
    pub async fn stop(&self) -> Result<()> {
        self.terminal.store(true, Ordering::SeqCst);
        self.engine.stop().await
    }
}

async fn pump_snapshots(
    mut updates: mpsc::Receiver<Result<EngineSnapshot>>,
    snapshot_tx: watch::Sender<Option<EngineSnapshot>>,
    terminal: Arc<AtomicBool>,
    last_timestamp_ms: Arc<AtomicU64>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            item = updates.recv() => {
                match item {
                    Some(Ok(snapshot)) => {
                        if terminal.load(Ordering::SeqCst) {
                            debug!(
                                timestamp_ms = snapshot.timestamp_ms,
                                "dropping snapshot delivered after terminal state"
                            );
                            continue;
                        }

                        let last = last_timestamp_ms.load(Ordering::SeqCst);
                        if snapshot.timestamp_ms < last {
                            warn!(
                                timestamp_ms = snapshot.timestamp_ms,
                                last_timestamp_ms = last,
                                "dropping out-of-order snapshot"
                            );
                            continue;
                        }
                        last_timestamp_ms.store(snapshot.timestamp_ms, Ordering::SeqCst);

                        if snapshot.status.is_terminal() {
                            terminal.store(true, Ordering::SeqCst);
                        }
                        snapshot_tx.send_replace(Some(snapshot));
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "engine failure; publishing terminal error snapshot");
                        publish_error_snapshot(&snapshot_tx, &last_timestamp_ms);
                        terminal.store(true, Ordering::SeqCst);
                    }
                    None => {
                        // Stream ended without an explicit terminal snapshot.
                        if !terminal.load(Ordering::SeqCst) {
                            warn!("engine stream closed unexpectedly; publishing terminal error snapshot");
                            publish_error_snapshot(&snapshot_tx, &last_timestamp_ms);
                            terminal.store(true, Ordering::SeqCst);
                        }
                        break;
                    }
                }
            }
            _ = &mut stop_rx => break,
        }
    }
}

/// Synthesize a terminal error snapshot, carrying forward the last known
/// location and route so the UI does not jump
fn publish_error_snapshot(
    snapshot_tx: &watch::Sender<Option<EngineSnapshot>>,
    last_timestamp_ms: &AtomicU64,
) {
    let previous = snapshot_tx.borrow().clone();
    let snapshot = EngineSnapshot {
        timestamp_ms: last_timestamp_ms.load(Ordering::SeqCst),
        location: previous.as_ref().and_then(|s| s.location),
        route: previous.and_then(|s| s.route),
        progress: None,
        instruction: None,
        status: NavigationStatus::Error,
    };
    snapshot_tx.send_replace(Some(snapshot));
}

/// Handle for the adapter's pump task
///
/// Dropping the handle stops the pump and releases the engine subscription.
pub struct AdapterHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    _pump: tokio::task::JoinHandle<()>,
}

impl AdapterHandle {
    /// Stop the pump explicitly
    pub fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for AdapterHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}
