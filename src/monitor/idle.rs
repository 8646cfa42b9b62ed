//! The idle logout timer: arms a deadline, replaces it on every activity
//! signal, and logs the session out when it expires.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::client::{LogoutOutcome, SessionGateway};
use crate::session::navigator::Navigator;
use crate::utils::clock::Clock;

use super::activity::ActivitySignal;
use super::LOGIN_PATH;

/// At most one deadline is pending at any time; re-arming replaces it.
/// Once fired, the timer stays dormant until the next activity signal.
enum TimerState {
    Armed { deadline: Instant },
    Fired,
}

pub struct IdleLogoutModule {
    signals: mpsc::Receiver<ActivitySignal>,
    session: Arc<dyn SessionGateway>,
    navigator: Box<dyn Navigator>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
}

impl IdleLogoutModule {
    pub fn new(
        signals: mpsc::Receiver<ActivitySignal>,
        session: Arc<dyn SessionGateway>,
        navigator: Box<dyn Navigator>,
        idle_timeout: Duration,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            signals,
            session,
            navigator,
            idle_timeout,
            shutdown,
            clock,
        }
    }

    /// Executes the timer event loop. The timer arms immediately; closing
    /// the signal channel or cancelling the shutdown token ends the loop and
    /// drops whatever deadline was pending.
    pub async fn run(mut self) -> Result<()> {
        let mut state = TimerState::Armed {
            deadline: self.clock.instant() + self.idle_timeout,
        };
        loop {
            state = match state {
                TimerState::Armed { deadline } => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => {
                            debug!("Shutdown requested, dropping the pending logout deadline");
                            return Ok(());
                        }
                        signal = self.signals.recv() => match signal {
                            Some(signal) => self.rearm(signal),
                            None => return Ok(()),
                        },
                        _ = self.clock.sleep_until(deadline) => {
                            info!("No activity for {:?}, logging the session out", self.idle_timeout);
                            self.log_out().await;
                            TimerState::Fired
                        }
                    }
                }
                TimerState::Fired => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return Ok(()),
                        signal = self.signals.recv() => match signal {
                            Some(signal) => self.rearm(signal),
                            None => return Ok(()),
                        },
                    }
                }
            };
        }
    }

    fn rearm(&self, signal: ActivitySignal) -> TimerState {
        debug!(
            "Activity signal {signal:?} at {}, resetting the logout deadline",
            self.clock.time()
        );
        TimerState::Armed {
            deadline: self.clock.instant() + self.idle_timeout,
        }
    }

    async fn log_out(&self) {
        match self.session.log_out().await {
            Ok(LogoutOutcome::LoggedOut) => self.navigator.navigate(LOGIN_PATH),
            Ok(LogoutOutcome::Rejected { status }) => {
                warn!("Server refused the logout, answered with status {status:?}")
            }
            Err(e) => warn!("Logout request failed: {e:?}"),
        }
    }
}
