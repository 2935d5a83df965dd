//! Browser glue: finds plot elements, binds pointer listeners, and keeps
//! rescanning while the charting library renders asynchronously.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use js_sys::Array;
use strum::IntoEnumIterator;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Event, HtmlElement, MouseEvent, MutationObserver, MutationObserverInit,
    Node, PointerEvent,
};

use crate::application::coordinator::WindowLevelCoordinator;
use crate::application::ports::ChartSurface;
use crate::config::{DiscoveryConfig, WindowLevelConfig};
use crate::domain::discovery::{Attacher, DiscoveryLoop, InstanceLocator, InstanceNotifier, RetrySchedule, ScanReport};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::gesture::{Cursor, GestureInput, PointerEventKind, PointerSample};
use crate::domain::logging::LogComponent;
use crate::domain::registry::InstanceId;
use crate::domain::window::DisplayRange;
use crate::event_utils::{listen, EventOptions, ListenerSet};
use crate::{log_debug, log_info, log_trace, log_warn};

pub fn document() -> AppResult<Document> {
    web_sys::window()
        .ok_or_else(|| AppError::Browser("Window not available".to_string()))?
        .document()
        .ok_or_else(|| AppError::Browser("Document not available".to_string()))
}

pub fn set_cursor(element: &HtmlElement, cursor: Cursor) {
    if element.style().set_property("cursor", cursor.as_ref()).is_err() {
        log_debug!(LogComponent::Infrastructure("Dom"), "cursor style rejected");
    }
}

pub fn capture_pointer(element: &HtmlElement, pointer_id: i32) -> AppResult<()> {
    element
        .set_pointer_capture(pointer_id)
        .map_err(|e| AppError::browser("setPointerCapture", &e))
}

/// Browser panning and zooming would swallow touch drags.
fn prepare_element(element: &HtmlElement) {
    if element.style().set_property("touch-action", "none").is_err() {
        log_debug!(LogComponent::Infrastructure("Dom"), "touch-action style rejected");
    }
}

/// Converts a DOM event into gesture input; `None` for foreign event types.
pub fn gesture_input(kind: PointerEventKind, event: &Event) -> Option<GestureInput> {
    if let Some(pointer) = event.dyn_ref::<PointerEvent>() {
        let sample = PointerSample::new(
            pointer.pointer_id(),
            pointer.pointer_type().parse().unwrap_or_default(),
            pointer.client_x() as f64,
            pointer.client_y() as f64,
            event.time_stamp(),
        );
        return Some(GestureInput::new(kind, sample));
    }
    let mouse = event.dyn_ref::<MouseEvent>()?;
    let mut sample = PointerSample::mouse(mouse.client_x() as f64, mouse.client_y() as f64);
    sample.time_ms = event.time_stamp();
    Some(GestureInput::new(kind, sample))
}

/// Looks up `#slot` and the plot element inside it (or the slot itself when
/// it carries the marker).
pub struct DomLocator {
    document: Document,
    plot_selector: String,
}

impl DomLocator {
    pub fn new(document: Document, plot_selector: impl Into<String>) -> Self {
        Self { document, plot_selector: plot_selector.into() }
    }

    pub fn from_config(config: &DiscoveryConfig) -> AppResult<Self> {
        Ok(Self::new(document()?, config.plot_selector.clone()))
    }
}

impl InstanceLocator for DomLocator {
    type Handle = HtmlElement;

    fn locate(&self, slot: &str) -> Option<HtmlElement> {
        let outer = self.document.get_element_by_id(slot)?;
        let plot = if outer.matches(&self.plot_selector).unwrap_or(false) {
            outer
        } else {
            outer.query_selector(&self.plot_selector).ok().flatten()?
        };
        plot.dyn_into::<HtmlElement>().ok()
    }

    fn same_instance(&self, a: &HtmlElement, b: &HtmlElement) -> bool {
        let b: &Node = b;
        a.is_same_node(Some(b))
    }
}

/// Binds pointer listeners for each attached element and forwards every
/// event to the shared coordinator.
///
/// The coordinator may be borrowed when discovery runs (a rescan triggered
/// from inside a restyle). Attaching then fails and the slot stays pending;
/// detaching drops the listeners right away and queues the coordinator
/// record for the next call that finds it free.
pub struct DomAttacher<S: ChartSurface<Target = HtmlElement> + 'static> {
    coordinator: Rc<RefCell<WindowLevelCoordinator<S>>>,
    listeners: HashMap<InstanceId, ListenerSet>,
    stale: Vec<InstanceId>,
}

impl<S: ChartSurface<Target = HtmlElement> + 'static> DomAttacher<S> {
    pub fn new(coordinator: Rc<RefCell<WindowLevelCoordinator<S>>>) -> Self {
        Self { coordinator, listeners: HashMap::new(), stale: Vec::new() }
    }

    /// Number of listeners bound for `id`; zero when it is not attached.
    pub fn listener_count(&self, id: InstanceId) -> usize {
        self.listeners.get(&id).map_or(0, ListenerSet::len)
    }

    /// Instances whose coordinator record is still waiting to be removed.
    pub fn stale_count(&self) -> usize {
        self.stale.len()
    }

    /// Removes queued coordinator records; returns how many were removed.
    pub fn flush_detached(&mut self) -> usize {
        if self.stale.is_empty() {
            return 0;
        }
        let Ok(mut coordinator) = self.coordinator.try_borrow_mut() else {
            return 0;
        };
        let flushed = self.stale.len();
        for id in self.stale.drain(..) {
            coordinator.detach(id);
        }
        log_debug!(LogComponent::Infrastructure("Dom"), "released {} queued instance(s)", flushed);
        flushed
    }
}

impl<S: ChartSurface<Target = HtmlElement> + 'static> Attacher<HtmlElement> for DomAttacher<S> {
    fn attach(&mut self, id: InstanceId, element: &HtmlElement) -> bool {
        if self.listeners.contains_key(&id) {
            return true;
        }
        self.flush_detached();
        match self.coordinator.try_borrow_mut() {
            Ok(mut coordinator) => {
                coordinator.attach(id, element.clone());
            }
            Err(_) => {
                log_warn!(LogComponent::Infrastructure("Dom"), "⚠️ {} not attached yet: coordinator busy", id);
                return false;
            }
        }
        prepare_element(element);

        let mut set = ListenerSet::new();
        for kind in PointerEventKind::iter() {
            let coordinator = Rc::clone(&self.coordinator);
            let options = if kind == PointerEventKind::DoubleClick {
                EventOptions::active()
            } else {
                EventOptions::default()
            };
            let name: &'static str = kind.into();
            set.listen(element, name, &options, move |event| dispatch(&coordinator, id, kind, event));
        }
        self.listeners.insert(id, set);
        true
    }

    fn detach(&mut self, id: InstanceId) {
        self.listeners.remove(&id);
        self.stale.push(id);
        if self.flush_detached() == 0 {
            log_warn!(LogComponent::Infrastructure("Dom"), "⚠️ {} release queued: coordinator busy", id);
        }
    }
}

fn dispatch<S: ChartSurface>(
    coordinator: &Rc<RefCell<WindowLevelCoordinator<S>>>,
    id: InstanceId,
    kind: PointerEventKind,
    event: &Event,
) {
    let Some(input) = gesture_input(kind, event) else {
        return;
    };
    if kind == PointerEventKind::DoubleClick {
        event.prevent_default();
    }
    log_trace!(LogComponent::Infrastructure("Dom"), "{} {} at ({}, {})", id, kind, input.sample.x, input.sample.y);
    match coordinator.try_borrow_mut() {
        Ok(mut coordinator) => {
            coordinator.handle_input(id, input);
        }
        Err(_) => {
            log_warn!(LogComponent::Infrastructure("Dom"), "⚠️ {} {} dropped: coordinator busy", id, kind);
        }
    }
}

/// `MutationObserver` on a subtree, reporting any child list change.
pub struct MutationNotifier {
    root: Node,
    active: Option<(MutationObserver, Closure<dyn FnMut(Array, MutationObserver)>)>,
}

impl MutationNotifier {
    pub fn new(root: Node) -> Self {
        Self { root, active: None }
    }

    pub fn disconnect(&mut self) {
        if let Some((observer, _callback)) = self.active.take() {
            observer.disconnect();
        }
    }
}

impl InstanceNotifier for MutationNotifier {
    fn subscribe(&mut self, mut on_change: Box<dyn FnMut()>) -> AppResult<()> {
        let callback = Closure::wrap(
            Box::new(move |_records: Array, _observer: MutationObserver| on_change())
                as Box<dyn FnMut(Array, MutationObserver)>,
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| AppError::browser("MutationObserver", &e))?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(&self.root, &init)
            .map_err(|e| AppError::browser("MutationObserver.observe", &e))?;

        self.disconnect();
        self.active = Some((observer, callback));
        Ok(())
    }
}

impl Drop for MutationNotifier {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Installed window/level machinery for one document.
pub struct DomRuntime<S: ChartSurface<Target = HtmlElement> + 'static> {
    locator: DomLocator,
    discovery: RefCell<DiscoveryLoop<HtmlElement>>,
    attacher: RefCell<DomAttacher<S>>,
    coordinator: Rc<RefCell<WindowLevelCoordinator<S>>>,
    retry: Cell<RetrySchedule>,
    retry_scheduled: Cell<bool>,
    notifier: RefCell<Option<MutationNotifier>>,
    ready_listener: RefCell<Option<EventListener>>,
}

impl<S: ChartSurface<Target = HtmlElement> + 'static> DomRuntime<S> {
    /// Scans right away, or once `DOMContentLoaded` fires if the document is
    /// still loading, and keeps rescanning on DOM mutations.
    pub fn install(surface: S, config: &WindowLevelConfig) -> AppResult<Rc<Self>> {
        let document = document()?;
        let coordinator = Rc::new(RefCell::new(WindowLevelCoordinator::new(surface, config)));
        let runtime = Rc::new(Self {
            locator: DomLocator::from_config(&config.discovery)?,
            discovery: RefCell::new(DiscoveryLoop::from_config(&config.discovery)),
            attacher: RefCell::new(DomAttacher::new(Rc::clone(&coordinator))),
            coordinator,
            retry: Cell::new(RetrySchedule::from_config(&config.discovery)),
            retry_scheduled: Cell::new(false),
            notifier: RefCell::new(None),
            ready_listener: RefCell::new(None),
        });

        if document.ready_state() == "loading" {
            let weak = Rc::downgrade(&runtime);
            let listener = listen(&document, "DOMContentLoaded", &EventOptions::once(), move |_| {
                if let Some(runtime) = weak.upgrade() {
                    if let Err(e) = runtime.start() {
                        log_warn!(LogComponent::Infrastructure("Dom"), "⚠️ start failed: {}", e);
                    }
                }
            });
            *runtime.ready_listener.borrow_mut() = Some(listener);
        } else {
            runtime.start()?;
        }
        Ok(runtime)
    }

    fn start(self: &Rc<Self>) -> AppResult<()> {
        let body = document()?
            .body()
            .ok_or_else(|| AppError::Browser("Document has no body".to_string()))?;
        let mut notifier = MutationNotifier::new(body.into());
        let weak = Rc::downgrade(self);
        notifier.subscribe(Box::new(move || {
            if let Some(runtime) = weak.upgrade() {
                runtime.scan();
            }
        }))?;
        *self.notifier.borrow_mut() = Some(notifier);

        let report = self.scan();
        log_info!(
            LogComponent::Infrastructure("Dom"),
            "🚀 window/level installed: {} attached, {} pending",
            report.attached,
            report.pending
        );
        Ok(())
    }

    /// One discovery pass. Schedules a delayed retry while slots are pending.
    pub fn scan(self: &Rc<Self>) -> ScanReport {
        let report = {
            let (Ok(mut discovery), Ok(mut attacher)) =
                (self.discovery.try_borrow_mut(), self.attacher.try_borrow_mut())
            else {
                log_debug!(LogComponent::Infrastructure("Dom"), "scan already running");
                return ScanReport::default();
            };
            attacher.flush_detached();
            discovery.scan(&self.locator, &mut *attacher)
        };
        if report.pending > 0 {
            self.schedule_retry();
        }
        report
    }

    fn schedule_retry(self: &Rc<Self>) {
        if self.retry_scheduled.get() {
            return;
        }
        let mut retry = self.retry.get();
        let delay = retry.next_delay();
        self.retry.set(retry);
        let Some(delay) = delay else {
            log_debug!(LogComponent::Infrastructure("Dom"), "retry budget spent, waiting for mutations");
            return;
        };

        self.retry_scheduled.set(true);
        let weak = Rc::downgrade(self);
        Timeout::new(delay, move || {
            if let Some(runtime) = weak.upgrade() {
                runtime.retry_scheduled.set(false);
                runtime.scan();
            }
        })
        .forget();
    }

    pub fn instance_for(&self, slot: &str) -> Option<InstanceId> {
        self.discovery.try_borrow().ok()?.instance_for(slot)
    }

    pub fn reset_slot(&self, slot: &str) -> Option<DisplayRange> {
        let id = self.instance_for(slot)?;
        self.coordinator.try_borrow_mut().ok()?.reset(id)
    }

    pub fn display_range(&self, slot: &str) -> Option<DisplayRange> {
        let id = self.instance_for(slot)?;
        self.coordinator.try_borrow().ok()?.display_range(id)
    }

    pub fn listener_count(&self, slot: &str) -> usize {
        let Some(id) = self.instance_for(slot) else {
            return 0;
        };
        self.attacher.try_borrow().map_or(0, |attacher| attacher.listener_count(id))
    }
}
