//! Where view-state snapshots go.

use crate::types::ViewState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

pub trait RenderSink: Send + Sync {
    fn render(&self, snapshot: Arc<ViewState>);
}

impl RenderSink for UnboundedSender<Arc<ViewState>> {
    fn render(&self, snapshot: Arc<ViewState>) {
        if self.send(snapshot).is_err() {
            log::debug!("render channel closed, dropping snapshot");
        }
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> RenderSink for FnSink<F>
where
    F: Fn(Arc<ViewState>) + Send + Sync,
{
    fn render(&self, snapshot: Arc<ViewState>) {
        (self.0)(snapshot)
    }
}

/// Discards every snapshot; for callers that only read `view()`.
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&self, _snapshot: Arc<ViewState>) {}
}
