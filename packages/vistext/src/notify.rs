//! User-facing notifications.

use std::sync::{Arc, Mutex};

pub const TEXT_DETECTION_ERROR: &str = "Text Detection Error";
pub const IMAGE_REQUEST_FAILED: &str = "Image Request Failed";

/// A dismissible message with a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Presents notifications. Only ever called from the task that owns the display.
pub trait Notifier: Send {
    fn present(&self, notification: &Notification);
}

/// Writes notifications to stderr, once each, whatever the log filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn format(notification: &Notification) -> String {
        format!("[{}] {}", notification.title, notification.message)
    }
}

impl Notifier for ConsoleNotifier {
    fn present(&self, notification: &Notification) {
        eprintln!("{}", Self::format(notification));
    }
}

/// Keeps every presented notification; clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    presented: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> Vec<Notification> {
        self.presented
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn present(&self, notification: &Notification) {
        if let Ok(mut log) = self.presented.lock() {
            log.push(notification.clone());
        }
    }
}
