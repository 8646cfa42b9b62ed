//! Recurring server-side session check, independent of user activity.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::client::SessionGateway;
use crate::session::navigator::Navigator;
use crate::utils::clock::Clock;

use super::LOGIN_PATH;

pub struct AuthPollModule {
    session: Arc<dyn SessionGateway>,
    navigator: Box<dyn Navigator>,
    poll_interval: Duration,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
}

impl AuthPollModule {
    pub fn new(
        session: Arc<dyn SessionGateway>,
        navigator: Box<dyn Navigator>,
        poll_interval: Duration,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            session,
            navigator,
            poll_interval,
            shutdown,
            clock,
        }
    }

    /// Executes the poll loop. Checks land on interval multiples counted
    /// from start, the first one a full interval in. A failed request is
    /// logged and the schedule keeps going.
    pub async fn run(self) -> Result<()> {
        let mut poll_point = self.clock.instant();
        loop {
            poll_point += self.poll_interval;

            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                _ = self.clock.sleep_until(poll_point) => ()
            }

            match self.session.check_auth().await {
                Ok(true) => debug!("Session is still authenticated"),
                Ok(false) => {
                    info!("Session is no longer authenticated, redirecting to login");
                    self.navigator.navigate(LOGIN_PATH);
                }
                Err(e) => warn!("Auth check failed: {e:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use crate::session::client::MockSessionGateway;
    use crate::session::navigator::MockNavigator;
    use crate::utils::clock::DefaultClock;

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn module(
        session: MockSessionGateway,
        navigator: MockNavigator,
        shutdown: &CancellationToken,
    ) -> AuthPollModule {
        AuthPollModule::new(
            Arc::new(session),
            Box::new(navigator),
            INTERVAL,
            shutdown.clone(),
            Box::new(DefaultClock),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_every_interval_multiple() {
        let mut session = MockSessionGateway::new();
        session.expect_check_auth().times(3).returning(|| Ok(true));
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().never();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(module(session, navigator, &shutdown).run());

        // Polls at 60, 120 and 180 seconds; stop before the fourth.
        tokio::time::sleep(Duration::from_secs(190)).await;

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unauthenticated_answer_redirects_to_login() {
        let mut session = MockSessionGateway::new();
        session.expect_check_auth().times(1).returning(|| Ok(false));
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq(LOGIN_PATH))
            .times(1)
            .return_const(());

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(module(session, navigator, &shutdown).run());

        tokio::time::sleep(Duration::from_secs(70)).await;

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_survives_request_failures() {
        let mut session = MockSessionGateway::new();
        let mut calls = 0;
        session.expect_check_auth().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(anyhow::anyhow!("connection reset"))
            } else {
                Ok(true)
            }
        });
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().never();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(module(session, navigator, &shutdown).run());

        tokio::time::sleep(Duration::from_secs(130)).await;

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }
}
