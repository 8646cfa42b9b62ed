//! Activity signals feeding the idle logout timer.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A user-interaction event proving the session is still in use. Any of
/// these resets the logout deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PageLoad,
    PointerMove,
    KeyPress,
    Scroll,
    Click,
}

impl ActivitySignal {
    /// Parses the keyword form used by the stdin source. Words that aren't
    /// activity keywords are ignored by the caller.
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "load" => Some(Self::PageLoad),
            "move" => Some(Self::PointerMove),
            "key" => Some(Self::KeyPress),
            "scroll" => Some(Self::Scroll),
            "click" => Some(Self::Click),
            _ => None,
        }
    }
}

/// Forwards activity signals read from stdin, one keyword per line. This is
/// how the standalone binary is driven by whatever process owns the real
/// input events; an embedding client skips this and holds the channel
/// sender directly.
pub struct StdinActivitySource {
    signals: mpsc::Sender<ActivitySignal>,
    shutdown: CancellationToken,
}

impl StdinActivitySource {
    pub fn new(signals: mpsc::Sender<ActivitySignal>, shutdown: CancellationToken) -> Self {
        Self { signals, shutdown }
    }

    pub async fn run(self) -> Result<()> {
        // Starting up counts as the load signal.
        self.signals.send(ActivitySignal::PageLoad).await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if let Some(signal) = ActivitySignal::parse(&line) {
                            debug!("Forwarding activity signal {signal:?}");
                            if self.signals.send(signal).await.is_err() {
                                return Ok(());
                            }
                        }
                    }
                    None => {
                        // Closed input isn't a reason to stop monitoring; the
                        // session will simply idle out.
                        info!("Input closed, no further activity will be reported");
                        self.shutdown.cancelled().await;
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_map_to_signals() {
        assert_eq!(ActivitySignal::parse("load"), Some(ActivitySignal::PageLoad));
        assert_eq!(ActivitySignal::parse("move"), Some(ActivitySignal::PointerMove));
        assert_eq!(ActivitySignal::parse("key"), Some(ActivitySignal::KeyPress));
        assert_eq!(ActivitySignal::parse("scroll"), Some(ActivitySignal::Scroll));
        assert_eq!(ActivitySignal::parse("click"), Some(ActivitySignal::Click));
    }

    #[test]
    fn parsing_is_forgiving_about_case_and_whitespace() {
        assert_eq!(ActivitySignal::parse(" Click \n"), Some(ActivitySignal::Click));
        assert_eq!(ActivitySignal::parse("MOVE"), Some(ActivitySignal::PointerMove));
    }

    #[test]
    fn unknown_words_are_not_activity() {
        assert_eq!(ActivitySignal::parse("quit"), None);
        assert_eq!(ActivitySignal::parse(""), None);
    }
}
