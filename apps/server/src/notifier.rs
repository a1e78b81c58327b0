//! Signal delivery.

use async_trait::async_trait;
use chrono::Utc;
use sma_monitor_core::SignalEvent;
use std::io::Write;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Console write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Severity of an operational message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

impl MessageLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageLevel::Info => "INFO",
            MessageLevel::Warning => "WARNING",
            MessageLevel::Error => "ERROR",
        }
    }
}

/// Body of the message sent by `--test-notification`.
pub const TEST_NOTIFICATION: &str = "🔔 SMA monitor notification test";

/// Delivery collaborator for emitted signals.
#[async_trait]
pub trait SignalNotifier: Send + Sync {
    /// Deliver one signal together with its rendered summary.
    async fn notify(&self, event: &SignalEvent, summary: &str) -> Result<(), NotifyError>;

    /// Deliver an operational message (start, stop, failures).
    async fn system_message(&self, message: &str, level: MessageLevel)
        -> Result<(), NotifyError>;

    /// Push a fixed message through the channel to check it end to end.
    async fn send_test(&self) -> Result<(), NotifyError> {
        self.system_message(TEST_NOTIFICATION, MessageLevel::Info)
            .await
    }
}

const SEPARATOR_WIDTH: usize = 60;

/// Frame `message` between separator lines.
pub fn format_console_block(message: &str) -> String {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    format!("\n{separator}\n{message}\n{separator}\n")
}

/// Prints summaries to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    fn write(&self, text: &str) -> Result<(), NotifyError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

#[async_trait]
impl SignalNotifier for ConsoleNotifier {
    async fn notify(&self, event: &SignalEvent, summary: &str) -> Result<(), NotifyError> {
        info!(
            symbol = %event.symbol,
            kind = event.kind().as_str(),
            price = event.price,
            "Signal alert"
        );
        self.write(&format_console_block(summary))
    }

    async fn system_message(
        &self,
        message: &str,
        level: MessageLevel,
    ) -> Result<(), NotifyError> {
        match level {
            MessageLevel::Info => info!("{}", message),
            MessageLevel::Warning => warn!("{}", message),
            MessageLevel::Error => error!("{}", message),
        }
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        self.write(&format!("[{}] [{}] {}", timestamp, level.as_str(), message))
    }

    async fn send_test(&self) -> Result<(), NotifyError> {
        info!("Sending test notification");
        self.write(&format_console_block(TEST_NOTIFICATION))
    }
}
