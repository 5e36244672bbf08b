//! Progress event stream for one job.
//!
//! Events are produced in order by the job's own task and consumed by
//! whoever drove the request (an SSE connection, the CLI printer). The
//! stream is terminal on `error` or `success`; percent never decreases
//! within a job.

use serde::Serialize;
use tokio::sync::mpsc;

/// One entry in a job's ordered progress stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// A stage started or advanced
    Progress { message: String, percent: u8 },
    /// A stage finished
    Done { message: String },
    /// Terminal: the job failed
    Error { message: String },
    /// Terminal: the finished bundle is available under this filename
    Success { filename: String },
}

impl ProgressEvent {
    /// True for the two terminal variants.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Success { .. })
    }
}

/// Sending half of a job's progress stream.
///
/// Enforces monotone percent: a stage reporting a lower value than an
/// earlier one is clamped up, never reset.
#[derive(Debug)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    last_percent: u8,
}

impl ProgressSink {
    /// Creates a sink and the receiver the consumer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                last_percent: 0,
            },
            rx,
        )
    }

    pub fn progress(&mut self, message: impl Into<String>, percent: u8) {
        let percent = percent.max(self.last_percent);
        self.last_percent = percent;
        self.emit(ProgressEvent::Progress {
            message: message.into(),
            percent,
        });
    }

    pub fn done(&mut self, message: impl Into<String>) {
        self.emit(ProgressEvent::Done {
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.emit(ProgressEvent::Error {
            message: message.into(),
        });
    }

    pub fn success(&mut self, filename: impl Into<String>) {
        self.emit(ProgressEvent::Success {
            filename: filename.into(),
        });
    }

    fn emit(&self, event: ProgressEvent) {
        // A dropped receiver means the caller disconnected; the build keeps
        // running to completion regardless, so send failures are ignored.
        if self.tx.send(event).is_err() {
            log::debug!("progress consumer disconnected");
        }
    }
}
