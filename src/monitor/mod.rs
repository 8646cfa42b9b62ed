//! The idle session monitor: an activity channel feeding the logout timer,
//! plus an auth poller running on its own schedule. Both timers share one
//! cancellation token, so tearing the monitor down also drops any pending
//! logout deadline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::session::client::{SessionClient, SessionGateway};
use crate::session::navigator::{LoggingNavigator, Navigator};
use crate::utils::clock::{Clock, DefaultClock};

pub mod activity;
pub mod idle;
pub mod poller;

use activity::{ActivitySignal, StdinActivitySource};
use idle::IdleLogoutModule;
use poller::AuthPollModule;

/// Where both a confirmed logout and a failed auth check send the user.
pub const LOGIN_PATH: &str = "/auth/login/";

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime settings of the monitor.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub base_url: String,
    pub cookie_string: String,
    pub idle_timeout: Duration,
    pub poll_interval: Duration,
}

/// Represents the starting point of the monitor. Runs until ctrl-c, reading
/// activity from stdin.
pub async fn start_monitor(settings: MonitorSettings) -> Result<()> {
    let session: Arc<dyn SessionGateway> = Arc::new(SessionClient::new(
        settings.base_url,
        settings.cookie_string,
    )?);

    let (signal_tx, signal_rx) = mpsc::channel::<ActivitySignal>(16);
    let shutdown = CancellationToken::new();

    let idle = create_idle_module(
        signal_rx,
        session.clone(),
        Box::new(LoggingNavigator),
        settings.idle_timeout,
        &shutdown,
        DefaultClock,
    );
    let poller = create_poll_module(
        session,
        Box::new(LoggingNavigator),
        settings.poll_interval,
        &shutdown,
        DefaultClock,
    );
    let source = StdinActivitySource::new(signal_tx, shutdown.clone());

    let (_, source_result, idle_result, poll_result) = tokio::join!(
        detect_shutdown(shutdown.clone()),
        source.run(),
        idle.run(),
        poller.run(),
    );

    if let Err(source_result) = source_result {
        error!("Activity source got an error {:?}", source_result);
    }

    if let Err(idle_result) = idle_result {
        error!("Idle logout module got an error {:?}", idle_result);
    }

    if let Err(poll_result) = poll_result {
        error!("Auth poll module got an error {:?}", poll_result);
    }

    Ok(())
}

fn create_idle_module(
    signals: mpsc::Receiver<ActivitySignal>,
    session: Arc<dyn SessionGateway>,
    navigator: Box<dyn Navigator>,
    idle_timeout: Duration,
    shutdown: &CancellationToken,
    clock: impl Clock,
) -> IdleLogoutModule {
    IdleLogoutModule::new(
        signals,
        session,
        navigator,
        idle_timeout,
        shutdown.clone(),
        Box::new(clock),
    )
}

fn create_poll_module(
    session: Arc<dyn SessionGateway>,
    navigator: Box<dyn Navigator>,
    poll_interval: Duration,
    shutdown: &CancellationToken,
    clock: impl Clock,
) -> AuthPollModule {
    AuthPollModule::new(
        session,
        navigator,
        poll_interval,
        shutdown.clone(),
        Box::new(clock),
    )
}

/// Detects signals sent to the process and cancels the monitor.
async fn detect_shutdown(cancelation: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}

#[cfg(test)]
mod monitor_tests {
    use mockall::predicate::eq;

    use crate::session::client::{LogoutOutcome, MockSessionGateway};
    use crate::session::navigator::MockNavigator;
    use crate::utils::logging::TEST_LOGGING;

    use super::*;

    /// Smoke test wiring both modules the way [start_monitor] does: some
    /// activity, then nothing, until the idle timer logs the session out
    /// while the poller keeps confirming the session in the background.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_monitor() -> Result<()> {
        *TEST_LOGGING;
        let mut session = MockSessionGateway::new();
        session.expect_check_auth().returning(|| Ok(true));
        session
            .expect_log_out()
            .times(1)
            .returning(|| Ok(LogoutOutcome::LoggedOut));
        let session: Arc<dyn SessionGateway> = Arc::new(session);

        let mut idle_navigator = MockNavigator::new();
        idle_navigator
            .expect_navigate()
            .with(eq(LOGIN_PATH))
            .times(1)
            .return_const(());
        // The poller never sees an unauthenticated answer here, so its
        // navigator expects nothing.
        let poll_navigator = MockNavigator::new();

        let (tx, rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();

        let idle = create_idle_module(
            rx,
            session.clone(),
            Box::new(idle_navigator),
            DEFAULT_IDLE_TIMEOUT,
            &shutdown,
            DefaultClock,
        );
        let poller = create_poll_module(
            session,
            Box::new(poll_navigator),
            DEFAULT_POLL_INTERVAL,
            &shutdown,
            DefaultClock,
        );

        let (_, idle_result, poll_result) = tokio::join!(
            async {
                tx.send(ActivitySignal::PageLoad).await.unwrap();
                tokio::time::sleep(Duration::from_secs(200)).await;
                tx.send(ActivitySignal::Click).await.unwrap();
                // The logout lands 300 seconds after the click.
                tokio::time::sleep(Duration::from_secs(400)).await;
                shutdown.cancel();
            },
            idle.run(),
            poller.run(),
        );

        idle_result?;
        poll_result?;
        Ok(())
    }
}
