//! Monitor loop implementation

use crate::lifecycle::{Lifecycle, MonitorState, Transition};
use crate::source::{DetectError, FrameSource};
use chrono::Utc;
use focus_engine::{
    EngineConfig, FocusAlert, FocusEngine, FocusError, FrameObservation, SessionSummary,
    TickOutcome, TimerContext,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

/// Monitor loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Gap between detection ticks (default: 16 ms, ~60 Hz)
    pub tick_interval_ms: u64,
    /// Pause between stopping and restarting on a device switch
    pub settle_delay_ms: u64,
    /// Capacity of the event channel handed to consumers
    pub event_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            settle_delay_ms: 500,
            event_capacity: 64,
        }
    }
}

impl MonitorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Control input from the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCommand {
    Start,
    Pause,
    Resume,
    Stop,
    RevokePermission,
    SwitchDevice(String),
    Shutdown,
}

/// Output towards the UI and stats layers
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    StateChanged {
        state: MonitorState,
        has_permission: Option<bool>,
    },
    Tick(TickOutcome),
    Alert(FocusAlert),
    SessionEnded(SessionSummary),
}

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Event receiver dropped")]
    EventsClosed,

    #[error(transparent)]
    Engine(#[from] FocusError),
}

type Detection = Result<FrameObservation, DetectError>;

/// A detection running on its own task, tagged with the generation it belongs to
struct InFlight {
    generation: u64,
    handle: JoinHandle<Detection>,
}

async fn join_in_flight(in_flight: &mut Option<InFlight>) -> (u64, Result<Detection, JoinError>) {
    match in_flight {
        Some(job) => {
            let joined = (&mut job.handle).await;
            (job.generation, joined)
        }
        None => std::future::pending().await,
    }
}

/// Focus monitor driving a [`FocusEngine`] from a [`FrameSource`]
pub struct FocusMonitor<S: FrameSource> {
    config: MonitorConfig,
    engine: FocusEngine,
    lifecycle: Lifecycle,
    source: Arc<S>,
    in_flight: Option<InFlight>,
    pending_device: Option<String>,
}

impl<S: FrameSource> FocusMonitor<S> {
    pub fn new(config: MonitorConfig, engine: FocusEngine, source: Arc<S>) -> Self {
        Self {
            config,
            engine,
            lifecycle: Lifecycle::new(),
            source,
            in_flight: None,
            pending_device: None,
        }
    }

    /// Build the engine from its configuration as well
    pub fn with_engine_config(
        config: MonitorConfig,
        engine_config: EngineConfig,
        source: Arc<S>,
    ) -> Result<Self, MonitorError> {
        Ok(Self::new(config, FocusEngine::new(engine_config)?, source))
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn engine(&self) -> &FocusEngine {
        &self.engine
    }

    /// Run until `Shutdown` or until the command channel closes
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<MonitorCommand>,
        context: watch::Receiver<TimerContext>,
        events: mpsc::Sender<MonitorEvent>,
    ) -> Result<(), MonitorError> {
        info!(
            interval_ms = self.config.tick_interval_ms,
            "Starting focus monitor"
        );

        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let settle = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(settle);

        let result = loop {
            tokio::select! {
                command = commands.recv() => {
                    let command = match command {
                        Some(MonitorCommand::Shutdown) | None => break Ok(()),
                        Some(command) => command,
                    };
                    if let Err(e) = self.handle_command(command, &events, settle.as_mut()).await {
                        break Err(e);
                    }
                }
                _ = ticker.tick(), if self.lifecycle.is_tracking() && self.in_flight.is_none() => {
                    self.spawn_detection();
                }
                (generation, joined) = join_in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    if let Err(e) = self.apply_detection(generation, joined, &context, &events).await {
                        break Err(e);
                    }
                }
                _ = &mut settle, if self.pending_device.is_some() => {
                    if let Err(e) = self.finish_device_switch(&events).await {
                        break Err(e);
                    }
                }
            }
        };

        self.cancel_detection();
        if matches!(self.lifecycle.state(), MonitorState::Tracking | MonitorState::Paused) {
            let transition = self.lifecycle.stop();
            // Consumers may already be gone during shutdown
            let _ = self.end_session(transition, &events).await;
        }
        info!("Focus monitor stopped");
        result
    }

    fn spawn_detection(&mut self) {
        let source = Arc::clone(&self.source);
        let handle = tokio::spawn(async move { source.detect().await });
        self.in_flight = Some(InFlight {
            generation: self.lifecycle.generation(),
            handle,
        });
    }

    fn cancel_detection(&mut self) {
        if let Some(job) = self.in_flight.take() {
            debug!(generation = job.generation, "Cancelling in-flight detection");
            job.handle.abort();
        }
    }

    async fn apply_detection(
        &mut self,
        generation: u64,
        joined: Result<Detection, JoinError>,
        context: &watch::Receiver<TimerContext>,
        events: &mpsc::Sender<MonitorEvent>,
    ) -> Result<(), MonitorError> {
        if generation != self.lifecycle.generation() || !self.lifecycle.is_tracking() {
            debug!(
                generation,
                current = self.lifecycle.generation(),
                "Discarding stale detection result"
            );
            counter!("focus_stale_results_total").increment(1);
            return Ok(());
        }

        let observation = match joined {
            Ok(Ok(observation)) => observation,
            Ok(Err(e)) => {
                warn!("Detection failed, treating as no face: {}", e);
                counter!("focus_detector_failures_total").increment(1);
                FrameObservation::NoFace
            }
            Err(e) => {
                warn!("Detection task failed, treating as no face: {}", e);
                counter!("focus_detector_failures_total").increment(1);
                FrameObservation::NoFace
            }
        };

        let timer = *context.borrow();
        let outcome = self.engine.process(&observation, timer, Utc::now());
        counter!("focus_ticks_total").increment(1);

        let alert = outcome.alert.clone();
        match events.try_send(MonitorEvent::Tick(outcome)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Event channel full, dropping tick"),
            Err(TrySendError::Closed(_)) => return Err(MonitorError::EventsClosed),
        }

        if let Some(alert) = alert {
            counter!("focus_alerts_total").increment(1);
            emit(events, MonitorEvent::Alert(alert)).await?;
        }
        Ok(())
    }

    async fn handle_command(
        &mut self,
        command: MonitorCommand,
        events: &mpsc::Sender<MonitorEvent>,
        settle: Pin<&mut Sleep>,
    ) -> Result<(), MonitorError> {
        debug!(?command, state = %self.lifecycle.state(), "Monitor command");

        match command {
            MonitorCommand::Start => {
                if let Some(device) = self.pending_device.take() {
                    self.select_device(&device);
                }
                match self.lifecycle.start() {
                    Ok(transition) => {
                        self.announce(events).await?;
                        if transition.to == MonitorState::RequestingPermission {
                            self.request_permission(events).await?;
                        }
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            MonitorCommand::Pause => match self.lifecycle.pause() {
                Ok(_) => self.announce(events).await?,
                Err(e) => warn!("{}", e),
            },
            MonitorCommand::Resume => match self.lifecycle.resume() {
                Ok(_) => self.announce(events).await?,
                Err(e) => warn!("{}", e),
            },
            MonitorCommand::Stop => {
                self.pending_device = None;
                self.cancel_detection();
                let transition = self.lifecycle.stop();
                if transition.from != transition.to {
                    self.end_session(transition, events).await?;
                }
            }
            MonitorCommand::RevokePermission => {
                warn!("Camera permission revoked");
                self.pending_device = None;
                self.cancel_detection();
                let transition = self.lifecycle.revoke_permission();
                self.end_session(transition, events).await?;
            }
            MonitorCommand::SwitchDevice(device) => match self.lifecycle.begin_device_switch() {
                Ok(transition) => {
                    info!("Switching capture device to {}", device);
                    self.cancel_detection();
                    self.end_session(transition, events).await?;
                    self.pending_device = Some(device);
                    settle.reset(Instant::now() + self.config.settle_delay());
                }
                Err(_) => {
                    // Not tracking: nothing to restart
                    self.select_device(&device);
                }
            },
            MonitorCommand::Shutdown => {}
        }
        Ok(())
    }

    async fn request_permission(
        &mut self,
        events: &mpsc::Sender<MonitorEvent>,
    ) -> Result<(), MonitorError> {
        let granted = self.source.request_permission().await;
        if granted {
            info!("Camera permission granted");
        } else {
            warn!("Camera permission denied");
        }
        match self.lifecycle.permission_answered(granted) {
            Ok(_) => self.announce(events).await,
            Err(e) => {
                warn!("{}", e);
                Ok(())
            }
        }
    }

    async fn finish_device_switch(
        &mut self,
        events: &mpsc::Sender<MonitorEvent>,
    ) -> Result<(), MonitorError> {
        let Some(device) = self.pending_device.take() else {
            return Ok(());
        };
        if !self.select_device(&device) {
            return Ok(());
        }
        match self.lifecycle.finish_device_switch() {
            Ok(_) => self.announce(events).await,
            Err(e) => {
                warn!("{}", e);
                Ok(())
            }
        }
    }

    fn select_device(&self, device: &str) -> bool {
        match self.source.select_device(device) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to select capture device: {}", e);
                false
            }
        }
    }

    async fn end_session(
        &mut self,
        transition: Transition,
        events: &mpsc::Sender<MonitorEvent>,
    ) -> Result<(), MonitorError> {
        if transition.reset {
            let summary = self.engine.reset(Utc::now());
            emit(events, MonitorEvent::SessionEnded(summary)).await?;
        }
        self.announce(events).await
    }

    async fn announce(&self, events: &mpsc::Sender<MonitorEvent>) -> Result<(), MonitorError> {
        emit(
            events,
            MonitorEvent::StateChanged {
                state: self.lifecycle.state(),
                has_permission: self.lifecycle.has_permission(),
            },
        )
        .await
    }
}

async fn emit(events: &mpsc::Sender<MonitorEvent>, event: MonitorEvent) -> Result<(), MonitorError> {
    events
        .send(event)
        .await
        .map_err(|_| MonitorError::EventsClosed)
}
