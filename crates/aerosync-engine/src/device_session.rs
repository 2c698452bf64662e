//! The device session actor.
//!
//! A [`DeviceSession`] is the single owner of a [`ComponentRegistry`] and its
//! timers. It runs as one tokio task and processes [`SessionCommand`]s one at
//! a time, so every state transition, deadline firing and notification for a
//! device happens on one serialized context without locks around the
//! registry.
//!
//! ```text
//! SessionHandle ──(mpsc)──┐
//!                         ├──> DeviceSession ──> ComponentRegistry ──> listeners
//! TokioTimers  ──(mpsc)───┘
//! ```
//!
//! Listeners run inside the actor. Work they want to do in response to a
//! notification is posted back through [`SessionHandle::try_execute`] and
//! runs after the current command has finished.

use std::ops::ControlFlow;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::error::{SyncError, SyncResult};
use crate::registry::ComponentRegistry;
use crate::timer::{TimerFired, TimerService, TokioTimers};

/// Closure run on the session's context with exclusive access to its state.
pub type SessionJob = Box<dyn FnOnce(&mut ComponentRegistry, &mut dyn TimerService) + Send>;

fn into_job<F>(f: F) -> SessionJob
where
    F: FnOnce(&mut ComponentRegistry, &mut dyn TimerService) + Send + 'static,
{
    Box::new(f)
}

/// Messages processed by a [`DeviceSession`].
pub enum SessionCommand {
    /// Run a closure against the registry.
    Execute(SessionJob),
    /// A setting deadline expired.
    TimerFired(TimerFired),
    /// The link to the device was lost.
    LinkLost,
    /// Promote pending settings, unpublish everything and stop.
    Shutdown(oneshot::Sender<()>),
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execute(_) => f.write_str("Execute"),
            Self::TimerFired(fired) => f.debug_tuple("TimerFired").field(fired).finish(),
            Self::LinkLost => f.write_str("LinkLost"),
            Self::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

/// Actor owning the state of one connected device.
pub struct DeviceSession {
    config: SessionConfig,
    registry: ComponentRegistry,
    timers: TokioTimers,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    commands: mpsc::Receiver<SessionCommand>,
}

impl DeviceSession {
    /// Create a session and the handle used to talk to it.
    ///
    /// The session does nothing until [`run`](Self::run) is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfiguration`] if `config` does not
    /// validate.
    pub fn new(config: SessionConfig) -> SyncResult<(Self, SessionHandle)> {
        config.validate()?;
        let (tx, commands) = mpsc::channel(config.mailbox_capacity);
        let (timers, timer_rx) = TokioTimers::new();
        let session = Self {
            config,
            registry: ComponentRegistry::new(),
            timers,
            timer_rx,
            commands,
        };
        Ok((session, SessionHandle { tx }))
    }

    /// Create a session and spawn it on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn spawn(config: SessionConfig) -> SyncResult<(SessionHandle, JoinHandle<()>)> {
        let (session, handle) = Self::new(config)?;
        Ok((handle, tokio::spawn(session.run())))
    }

    /// Process commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(session = %self.config.name, "Device session started");
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        self.teardown();
                        break;
                    };
                    if self.handle(command).is_break() {
                        break;
                    }
                }
                Some(fired) = self.timer_rx.recv() => {
                    if self.handle(SessionCommand::TimerFired(fired)).is_break() {
                        break;
                    }
                }
            }
        }
        tracing::info!(session = %self.config.name, "Device session stopped");
    }

    fn handle(&mut self, command: SessionCommand) -> ControlFlow<()> {
        match command {
            SessionCommand::Execute(job) => {
                let timers: &mut dyn TimerService = &mut self.timers;
                job(&mut self.registry, timers);
            }
            SessionCommand::TimerFired(fired) => {
                self.timers.reap(fired.handle);
                self.registry.fire_timer(fired, &mut self.timers);
            }
            SessionCommand::LinkLost => {
                tracing::info!(
                    session = %self.config.name,
                    promote = self.config.promote_pending_on_link_loss,
                    "Device link lost"
                );
                if self.config.promote_pending_on_link_loss {
                    self.registry.cancel_all_pending_everywhere(&mut self.timers);
                }
            }
            SessionCommand::Shutdown(reply) => {
                self.teardown();
                if reply.send(()).is_err() {
                    tracing::trace!(session = %self.config.name, "Shutdown requester went away");
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn teardown(&mut self) {
        let promoted = self.registry.cancel_all_pending_everywhere(&mut self.timers);
        let kinds: Vec<_> = self.registry.kinds().collect();
        for kind in kinds {
            self.registry.unpublish(kind, &mut self.timers);
        }
        tracing::info!(session = %self.config.name, promoted, "Device session torn down");
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("armed_timers", &self.timers.armed_count())
            .finish_non_exhaustive()
    }
}

/// Cloneable front door to a running [`DeviceSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Run `f` on the session's context and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SessionClosed`] if the session has stopped.
    pub async fn execute<R, F>(&self, f: F) -> SyncResult<R>
    where
        F: FnOnce(&mut ComponentRegistry, &mut dyn TimerService) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = into_job(move |registry, timers| {
            if reply_tx.send(f(registry, timers)).is_err() {
                tracing::trace!("Execute caller went away before the reply");
            }
        });
        self.tx
            .send(SessionCommand::Execute(job))
            .await
            .map_err(|_closed| SyncError::SessionClosed)?;
        reply_rx.await.map_err(|_dropped| SyncError::SessionClosed)
    }

    /// Queue `f` without waiting. Usable from synchronous code such as
    /// subscription listeners.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MailboxFull`] if the mailbox has no room and
    /// [`SyncError::SessionClosed`] if the session has stopped.
    pub fn try_execute<F>(&self, f: F) -> SyncResult<()>
    where
        F: FnOnce(&mut ComponentRegistry, &mut dyn TimerService) + Send + 'static,
    {
        self.tx
            .try_send(SessionCommand::Execute(into_job(f)))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => {
                    tracing::warn!("Device session mailbox full, deferred work dropped");
                    SyncError::MailboxFull
                }
                mpsc::error::TrySendError::Closed(_) => SyncError::SessionClosed,
            })
    }

    /// Report that the link to the device was lost.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SessionClosed`] if the session has stopped.
    pub async fn link_lost(&self) -> SyncResult<()> {
        self.tx
            .send(SessionCommand::LinkLost)
            .await
            .map_err(|_closed| SyncError::SessionClosed)
    }

    /// Stop the session and wait until it has torn down its components.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SessionClosed`] if the session had already stopped.
    pub async fn shutdown(&self) -> SyncResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Shutdown(reply_tx))
            .await
            .map_err(|_closed| SyncError::SessionClosed)?;
        reply_rx.await.map_err(|_dropped| SyncError::SessionClosed)
    }

    /// Whether the session has stopped accepting commands.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::constraint::Bounds;
    use crate::kind::ComponentKind;
    use crate::setting::{RangeSetting, Setting, SettingControl};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    struct Beacon {
        brightness: RangeSetting<u8>,
    }

    impl Component for Beacon {
        fn kind(&self) -> ComponentKind {
            ComponentKind::Leds
        }

        fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
            visit(&mut self.brightness);
        }
    }

    fn beacon() -> Box<dyn Component> {
        Box::new(Beacon {
            brightness: Setting::new(Bounds::new(0, 100), 20),
        })
    }

    async fn brightness(handle: &SessionHandle) -> SyncResult<Option<(u8, bool)>> {
        handle
            .execute(|registry, _| {
                registry
                    .get_as::<Beacon>(ComponentKind::Leds)
                    .map(|b| (*b.brightness.value(), b.brightness.is_updating()))
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_change_rolls_back_after_deadline() -> TestResult {
        let (handle, task) = DeviceSession::spawn(SessionConfig::default())?;
        let notified = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&notified);

        let subscription = handle
            .execute(move |registry, timers| {
                registry.publish(beacon());
                let sub = registry.subscribe(ComponentKind::Leds, move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                });
                registry.update::<Beacon, _>(ComponentKind::Leds, timers, |b, session| {
                    b.brightness.request_change(80, |_| true, session)
                })?;
                Ok::<_, SyncError>(sub)
            })
            .await??;

        assert_eq!(brightness(&handle).await?, Some((80, true)));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(brightness(&handle).await?, Some((20, false)));
        assert_eq!(notified.load(Ordering::SeqCst), 2);

        drop(subscription);
        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_beats_deadline() -> TestResult {
        let (handle, task) = DeviceSession::spawn(SessionConfig::default())?;
        handle
            .execute(|registry, timers| {
                registry.publish(beacon());
                registry.update::<Beacon, _>(ComponentKind::Leds, timers, |b, session| {
                    b.brightness.request_change(60, |_| true, session)
                })
            })
            .await??;

        tokio::time::sleep(Duration::from_secs(2)).await;
        handle
            .execute(|registry, timers| {
                registry.update::<Beacon, _>(ComponentKind::Leds, timers, |b, session| {
                    b.brightness.confirm(60, session)
                })
            })
            .await??;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(brightness(&handle).await?, Some((60, false)));

        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_loss_promotes_pending() -> TestResult {
        let (handle, task) = DeviceSession::spawn(SessionConfig::default())?;
        handle
            .execute(|registry, timers| {
                registry.publish(beacon());
                registry.update::<Beacon, _>(ComponentKind::Leds, timers, |b, session| {
                    b.brightness.request_change(90, |_| true, session)
                })
            })
            .await??;

        handle.link_lost().await?;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(brightness(&handle).await?, Some((90, false)));

        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_loss_without_promotion_waits_for_deadline() -> TestResult {
        let config = SessionConfig::builder()
            .promote_pending_on_link_loss(false)
            .build()?;
        let (handle, task) = DeviceSession::spawn(config)?;
        handle
            .execute(|registry, timers| {
                registry.publish(beacon());
                registry.update::<Beacon, _>(ComponentKind::Leds, timers, |b, session| {
                    b.brightness.request_change(90, |_| true, session)
                })
            })
            .await??;

        handle.link_lost().await?;
        assert_eq!(brightness(&handle).await?, Some((90, true)));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(brightness(&handle).await?, Some((20, false)));

        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_session_rejects_commands() -> TestResult {
        let (handle, task) = DeviceSession::spawn(SessionConfig::default())?;
        handle.shutdown().await?;
        task.await?;

        assert!(handle.is_closed());
        assert_eq!(handle.link_lost().await, Err(SyncError::SessionClosed));
        assert_eq!(
            handle.try_execute(|_, _| {}),
            Err(SyncError::SessionClosed)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_deferred_work_from_listener_runs_after_commit() -> TestResult {
        let (handle, task) = DeviceSession::spawn(SessionConfig::default())?;
        let follow_ups = Arc::new(AtomicUsize::new(0));

        let deferred = handle.clone();
        let counter = Arc::clone(&follow_ups);
        let subscription = handle
            .execute(move |registry, timers| {
                registry.publish(beacon());
                let sub = registry.subscribe(ComponentKind::Leds, move |_| {
                    let counter = Arc::clone(&counter);
                    let posted = deferred.try_execute(move |registry, _| {
                        if registry.is_published(ComponentKind::Leds) {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                    assert!(posted.is_ok());
                });
                registry.update::<Beacon, _>(ComponentKind::Leds, timers, |b, session| {
                    b.brightness.confirm(50, session)
                })?;
                Ok::<_, SyncError>(sub)
            })
            .await??;

        handle.execute(|_, _| ()).await?;
        assert_eq!(follow_ups.load(Ordering::SeqCst), 1);

        drop(subscription);
        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SessionConfig {
            mailbox_capacity: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            DeviceSession::new(config),
            Err(SyncError::InvalidConfiguration(_))
        ));
    }
}
