//! Tokio host loop for a [`TimerController`].
//!
//! The driver task owns the controller outright. Commands arrive over an
//! `mpsc` channel, events leave over a `broadcast` channel, and the task
//! sleeps until the controller's single pending callback is due. Stopping
//! the task (explicit shutdown or every client dropped) resets the
//! controller first so nothing is left scheduled.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

use super::engine::TimerController;
use super::listener::EventSink;
use super::schedule::TimerHandle;
use crate::error::TimerError;
use crate::events::Event;
use crate::stage::Stage;

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 1024;

enum Command {
    Start(oneshot::Sender<Result<(), TimerError>>),
    Pause(oneshot::Sender<bool>),
    Skip(oneshot::Sender<Result<(), TimerError>>),
    Reset(oneshot::Sender<()>),
    SetStages(Vec<Stage>, oneshot::Sender<()>),
    Snapshot(oneshot::Sender<Event>),
    Shutdown,
}

/// Cloneable handle for talking to a running driver.
#[derive(Debug, Clone)]
pub struct TimerClient {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl TimerClient {
    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn start(&self) -> Result<(), TimerError> {
        self.request(Command::Start).await?
    }

    pub async fn pause(&self) -> Result<bool, TimerError> {
        self.request(Command::Pause).await
    }

    pub async fn skip(&self) -> Result<(), TimerError> {
        self.request(Command::Skip).await?
    }

    pub async fn reset(&self) -> Result<(), TimerError> {
        self.request(Command::Reset).await
    }

    pub async fn set_stages(&self, stages: Vec<Stage>) -> Result<(), TimerError> {
        self.request(|reply| Command::SetStages(stages, reply)).await
    }

    pub async fn snapshot(&self) -> Result<Event, TimerError> {
        self.request(Command::Snapshot).await
    }

    /// Ask the driver to reset and exit.
    pub async fn shutdown(&self) -> Result<(), TimerError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| TimerError::DriverClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, TimerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| TimerError::DriverClosed)?;
        response.await.map_err(|_| TimerError::DriverClosed)
    }
}

/// Spawn the driver task. Must be called within a tokio runtime.
pub fn spawn(mut controller: TimerController) -> (TimerClient, JoinHandle<()>) {
    let (commands, receiver) = mpsc::channel(COMMAND_CAPACITY);
    let (events, _) = broadcast::channel(EVENT_CAPACITY);

    let forward = events.clone();
    controller.add_listener(EventSink(move |event| {
        // No subscribers is fine.
        let _ = forward.send(event);
    }));

    let task = tokio::spawn(run(controller, receiver));
    (TimerClient { commands, events }, task)
}

async fn run(mut controller: TimerController, mut commands: mpsc::Receiver<Command>) {
    let mut armed: Option<(TimerHandle, Instant)> = None;
    loop {
        armed = rearm(&controller, armed);
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut controller, command),
            },
            _ = wait_until(armed.map(|(_, at)| at)) => {
                if let Some((handle, at)) = armed {
                    trace!(%handle, "callback due");
                    controller.fire(handle);
                    // Repeating callbacks keep their cadence from the
                    // original deadline.
                    armed = controller
                        .pending()
                        .filter(|p| p.handle == handle)
                        .map(|p| (handle, at + p.delay));
                }
            }
        }
    }
    controller.reset();
    debug!("timer driver stopped");
}

fn rearm(
    controller: &TimerController,
    armed: Option<(TimerHandle, Instant)>,
) -> Option<(TimerHandle, Instant)> {
    match (controller.pending(), armed) {
        (Some(pending), Some((handle, at))) if pending.handle == handle => Some((handle, at)),
        (Some(pending), _) => Some((pending.handle, Instant::now() + pending.delay)),
        (None, _) => None,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn apply(controller: &mut TimerController, command: Command) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Start(reply) => {
            let _ = reply.send(controller.start());
        }
        Command::Pause(reply) => {
            let _ = reply.send(controller.pause());
        }
        Command::Skip(reply) => {
            let _ = reply.send(controller.skip());
        }
        Command::Reset(reply) => {
            controller.reset();
            let _ = reply.send(());
        }
        Command::SetStages(stages, reply) => {
            controller.set_stages(stages);
            let _ = reply.send(());
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(controller.snapshot());
        }
        Command::Shutdown => {}
    }
}
