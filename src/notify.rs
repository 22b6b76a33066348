//! The Notification Sink seam.
//!
//! The controller emits exactly one terminal notification per utterance
//! (success, command-confirmation-needed, or failure) plus occasional
//! transient state notices. [`LogNotificationSink`] is the default adapter —
//! a host embedding this crate substitutes a richer sink (toast, tray icon)
//! behind the same trait.

use std::fmt;

/// A user-facing notice emitted by the pipeline controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Dictation finished and text was inserted.
    Inserted { chars: usize },
    /// Every insertion strategy failed; the text is on the clipboard instead.
    Deferred { chars: usize },
    /// A recognized command needs the user to confirm before it runs.
    NeedsConfirmation { utterance: String },
    /// The pipeline failed at some stage; `message` is safe to show verbatim.
    Failed { message: String },
    /// A transient, non-terminal status update (e.g. "listening").
    Status(String),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Inserted { chars } => write!(f, "inserted {chars} characters"),
            Notification::Deferred { chars } => {
                write!(f, "text copied — paste manually ({chars} characters)")
            }
            Notification::NeedsConfirmation { utterance } => {
                write!(f, "confirm command: {utterance}")
            }
            Notification::Failed { message } => write!(f, "failed: {message}"),
            Notification::Status(s) => write!(f, "{s}"),
        }
    }
}

/// Delivers [`Notification`]s to whatever the host considers "the user".
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn NotificationSink>) {}
};

/// Routes every notification through the `log` facade. Terminal outcomes
/// log at `info`/`warn`; transient status notices log at `debug`.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::Failed { .. } => log::warn!("{notification}"),
            Notification::Status(_) => log::debug!("{notification}"),
            _ => log::info!("{notification}"),
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification it receives, for assertions in tests.
    #[derive(Default)]
    pub struct RecordingSink {
        pub received: Mutex<Vec<Notification>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.received.lock().unwrap().push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingSink;
    use super::*;

    #[test]
    fn log_sink_does_not_panic_on_any_variant() {
        let sink = LogNotificationSink;
        sink.notify(Notification::Inserted { chars: 10 });
        sink.notify(Notification::Deferred { chars: 10 });
        sink.notify(Notification::NeedsConfirmation {
            utterance: "juno delete that".into(),
        });
        sink.notify(Notification::Failed {
            message: "timed out".into(),
        });
        sink.notify(Notification::Status("listening".into()));
    }

    #[test]
    fn recording_sink_collects_in_order() {
        let sink = RecordingSink::default();
        sink.notify(Notification::Status("a".into()));
        sink.notify(Notification::Status("b".into()));
        let received = sink.received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], Notification::Status("a".into()));
    }
}
