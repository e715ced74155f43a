//! Per-observer notification proxy with scoped mute.
//!
//! # Responsibility
//! - Forward every event of one synchronizer to exactly one observer.
//! - Let that observer suppress its own echo while it edits the selection,
//!   without suppressing delivery to any other observer.
//!
//! # Invariants
//! - A proxy never forwards events of an operation published while at least
//!   one of its `MuteGuard`s was alive, even when delivery is deferred.
//! - Mutes nest; forwarding resumes when the outermost guard drops.
//! - The proxy holds the synchronizer weakly and never keeps it alive.

use crate::selection::error::{SelectionError, SelectionResult};
use crate::selection::event::SelectionEvent;
use crate::selection::synchronizer::{SelectionSynchronizer, SyncCore};
use log::trace;
use std::cell::Cell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

/// Shared state of one proxy. The synchronizer keeps a weak handle to it.
pub(crate) struct ProxyCore {
    label: String,
    mute_depth: Cell<usize>,
    delivered: Cell<u64>,
    suppressed: Cell<u64>,
    handler: Box<dyn Fn(&SelectionEvent)>,
}

impl ProxyCore {
    pub(crate) fn is_muted(&self) -> bool {
        self.mute_depth.get() > 0
    }

    /// Forwards `event` unless the proxy was `muted` when the broadcast
    /// carrying it was queued.
    pub(crate) fn deliver(&self, event: &SelectionEvent, muted: bool) {
        if muted {
            self.suppressed.set(self.suppressed.get() + 1);
            trace!(
                "event=proxy_suppressed module=selection proxy={} kind={}",
                self.label,
                event.name()
            );
            return;
        }
        self.delivered.set(self.delivered.get() + 1);
        (self.handler)(event);
    }
}

/// Observer-side endpoint of a `SelectionSynchronizer`.
///
/// Create one per observer and keep it for the observer's lifetime;
/// dropping the proxy unsubscribes it.
pub struct NotificationProxy {
    core: Rc<ProxyCore>,
    source: Weak<SyncCore>,
}

impl NotificationProxy {
    /// Subscribes `handler` to every event `synchronizer` emits.
    ///
    /// `label` only names the proxy in logs and diagnostics.
    pub fn new(
        synchronizer: &SelectionSynchronizer,
        label: impl Into<String>,
        handler: impl Fn(&SelectionEvent) + 'static,
    ) -> Self {
        let core = Rc::new(ProxyCore {
            label: label.into(),
            mute_depth: Cell::new(0),
            delivered: Cell::new(0),
            suppressed: Cell::new(0),
            handler: Box::new(handler),
        });
        synchronizer.attach(&core);
        Self {
            core,
            source: synchronizer.downgrade(),
        }
    }

    pub fn label(&self) -> &str {
        &self.core.label
    }

    /// Suspends forwarding until the returned guard is dropped.
    ///
    /// Hold the guard for exactly the duration of the local edit:
    ///
    /// ```ignore
    /// let _mute = proxy.mute();
    /// proxy.synchronizer()?.set_selected_items(items)?;
    /// ```
    pub fn mute(&self) -> MuteGuard<'_> {
        let depth = self.core.mute_depth.get() + 1;
        self.core.mute_depth.set(depth);
        trace!(
            "event=proxy_mute module=selection proxy={} depth={}",
            self.core.label,
            depth
        );
        MuteGuard { core: &self.core }
    }

    /// Runs `edit` with this proxy muted.
    pub fn while_muted<R>(&self, edit: impl FnOnce() -> R) -> R {
        let _mute = self.mute();
        edit()
    }

    pub fn is_muted(&self) -> bool {
        self.core.is_muted()
    }

    /// Events forwarded to the observer so far.
    pub fn delivered_count(&self) -> u64 {
        self.core.delivered.get()
    }

    /// Events withheld because the proxy was muted.
    pub fn suppressed_count(&self) -> u64 {
        self.core.suppressed.get()
    }

    /// Returns the synchronizer this proxy is bound to.
    ///
    /// # Errors
    /// - `SelectionError::SynchronizerDropped` when every synchronizer handle
    ///   is gone.
    pub fn synchronizer(&self) -> SelectionResult<SelectionSynchronizer> {
        self.source
            .upgrade()
            .map(SelectionSynchronizer::from_core)
            .ok_or(SelectionError::SynchronizerDropped)
    }
}

impl Debug for NotificationProxy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationProxy")
            .field("label", &self.core.label)
            .field("mute_depth", &self.core.mute_depth.get())
            .field("delivered", &self.core.delivered.get())
            .field("suppressed", &self.core.suppressed.get())
            .field("bound", &(self.source.strong_count() > 0))
            .finish()
    }
}

/// Keeps a proxy muted while alive.
#[must_use = "the proxy is unmuted as soon as the guard is dropped"]
pub struct MuteGuard<'a> {
    core: &'a ProxyCore,
}

impl Drop for MuteGuard<'_> {
    fn drop(&mut self) {
        let depth = self.core.mute_depth.get().saturating_sub(1);
        self.core.mute_depth.set(depth);
        trace!(
            "event=proxy_unmute module=selection proxy={} depth={}",
            self.core.label,
            depth
        );
    }
}

impl Debug for MuteGuard<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MuteGuard")
            .field("proxy", &self.core.label)
            .finish()
    }
}
