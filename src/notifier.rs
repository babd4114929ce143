use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::domain::{Toast, ToastVariant};

/// Host side sink for user facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Forwards toasts to the UI loop, which owns their display.
pub struct ChannelNotifier {
    tx: UnboundedSender<Toast>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<Toast>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Error => error!(title = %toast.title, "{}", toast.message),
            ToastVariant::Warning => warn!(title = %toast.title, "{}", toast.message),
            ToastVariant::Info | ToastVariant::Success => {
                info!(title = %toast.title, "{}", toast.message)
            }
        }
        // The UI may already be gone while a late response arrives.
        let _ = self.tx.send(toast);
    }
}
