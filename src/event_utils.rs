use std::borrow::Cow;

use gloo::events::{EventListener, EventListenerOptions};
use web_sys::{Event, EventTarget};

#[derive(Clone, Debug)]
pub struct EventOptions {
    pub passive: bool,
    pub once: bool,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self { passive: true, once: false }
    }
}

impl EventOptions {
    /// Non-passive, so the handler may call `prevent_default`.
    pub fn active() -> Self {
        Self { passive: false, ..Self::default() }
    }

    /// Removed after the first event.
    pub fn once() -> Self {
        Self { once: true, ..Self::default() }
    }

    fn to_gloo(&self) -> EventListenerOptions {
        if self.passive {
            EventListenerOptions::default()
        } else {
            EventListenerOptions::enable_prevent_default()
        }
    }
}

/// Registers `cb` on `target`. The listener is removed when the returned
/// handle is dropped.
pub fn listen(
    target: &EventTarget,
    event: impl Into<Cow<'static, str>>,
    options: &EventOptions,
    mut cb: impl FnMut(&Event) + 'static,
) -> EventListener {
    if options.once {
        EventListener::once_with_options(target, event, options.to_gloo(), move |e| cb(e))
    } else {
        EventListener::new_with_options(target, event, options.to_gloo(), cb)
    }
}

/// Listeners owned together, e.g. every handler bound to one plot element.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<EventListener>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(
        &mut self,
        target: &EventTarget,
        event: impl Into<Cow<'static, str>>,
        options: &EventOptions,
        cb: impl FnMut(&Event) + 'static,
    ) {
        self.listeners.push(listen(target, event, options, cb));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
