use tracing::info;

/// Decides what it means to send the user somewhere else. The monitor only
/// ever targets the login page; an embedding client substitutes its own
/// implementation. Implementations must tolerate being invoked twice for
/// the same location, the idle timer and the auth poller can both decide to
/// redirect around the same moment.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Navigator of the standalone binary. There is no page to steer, so the
/// redirect is recorded in the log for whoever supervises the process.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, location: &str) {
        info!("Redirecting to {location}");
    }
}
