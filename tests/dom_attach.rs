#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{HtmlElement, MouseEvent, MouseEventInit, PointerEvent, PointerEventInit};

use window_level_wasm::application::{ChartSurface, RendererAdapter, WindowLevelCoordinator};
use window_level_wasm::config::{DiscoveryConfig, WindowLevelConfig};
use window_level_wasm::domain::discovery::{DiscoveryLoop, ScanReport};
use window_level_wasm::domain::errors::AppResult;
use window_level_wasm::domain::gesture::Cursor;
use window_level_wasm::domain::window::DisplayRange;
use window_level_wasm::event_utils::{listen, EventOptions};
use window_level_wasm::infrastructure::dom::{self, DomAttacher, DomLocator, DomRuntime};

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Default)]
struct RecordingSurface {
    ranges: RefCell<Vec<DisplayRange>>,
}

impl RendererAdapter for RecordingSurface {
    type Target = HtmlElement;

    fn apply_range(&self, _target: &HtmlElement, range: DisplayRange) -> AppResult<()> {
        self.ranges.borrow_mut().push(range);
        Ok(())
    }
}

impl ChartSurface for RecordingSurface {
    type Grid = Vec<Vec<f64>>;

    fn read_grid(&self, _target: &HtmlElement) -> Option<Self::Grid> {
        Some(vec![(0..=100).map(f64::from).collect()])
    }

    fn set_cursor(&self, target: &HtmlElement, cursor: Cursor) {
        dom::set_cursor(target, cursor);
    }

    fn capture_pointer(&self, _target: &HtmlElement, _pointer_id: i32) -> AppResult<()> {
        Ok(())
    }
}

type Coordinator = Rc<RefCell<WindowLevelCoordinator<RecordingSurface>>>;

fn mount(slot: &str) -> HtmlElement {
    let document = dom::document().expect("document");
    let outer = document.create_element("div").expect("div");
    outer.set_id(slot);
    let body = document.body().expect("body");
    body.append_child(&outer).expect("append slot");
    render_plot(&outer.unchecked_into::<HtmlElement>())
}

fn render_plot(slot: &HtmlElement) -> HtmlElement {
    let document = dom::document().expect("document");
    let plot = document.create_element("div").expect("div");
    plot.set_class_name("js-plotly-plot");
    slot.replace_children_with_node_1(&plot);
    plot.unchecked_into()
}

fn setup(slot: &str) -> (Coordinator, DiscoveryLoop<HtmlElement>, DomLocator, DomAttacher<RecordingSurface>) {
    let config = WindowLevelConfig::default();
    let coordinator = Rc::new(RefCell::new(WindowLevelCoordinator::new(RecordingSurface::default(), &config)));
    let locator = DomLocator::new(dom::document().expect("document"), ".js-plotly-plot");
    let attacher = DomAttacher::new(Rc::clone(&coordinator));
    (coordinator, DiscoveryLoop::new(vec![slot.to_string()]), locator, attacher)
}

fn double_click(target: &HtmlElement) {
    let init = MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = MouseEvent::new_with_mouse_event_init_dict("dblclick", &init).expect("dblclick");
    target.dispatch_event(&event).expect("dispatch");
}

fn pointer(target: &HtmlElement, kind: &str, x: i32, y: i32) {
    let init = PointerEventInit::new();
    init.set_pointer_id(1);
    init.set_pointer_type("mouse");
    init.set_client_x(x);
    init.set_client_y(y);
    let event = PointerEvent::new_with_event_init_dict(kind, &init).expect("pointer event");
    target.dispatch_event(&event).expect("dispatch");
}

#[wasm_bindgen_test]
fn repeated_scans_bind_listeners_once() {
    let slot = "wl-test-once";
    let plot = mount(slot);
    let (coordinator, mut discovery, locator, mut attacher) = setup(slot);

    discovery.scan(&locator, &mut attacher);
    discovery.scan(&locator, &mut attacher);
    let id = discovery.instance_for(slot).expect("attached");
    assert_eq!(attacher.listener_count(id), 6);

    double_click(&plot);
    let surface_ranges = coordinator.borrow().surface().ranges.borrow().clone();
    assert_eq!(surface_ranges, vec![DisplayRange { zmin: 2.0, zmax: 98.0 }]);
    assert_eq!(plot.style().get_property_value("cursor").ok().as_deref(), Some("grab"));
    assert_eq!(plot.style().get_property_value("touch-action").ok().as_deref(), Some("none"));
}

#[wasm_bindgen_test]
fn pointer_drag_updates_the_window() {
    let slot = "wl-test-drag";
    let plot = mount(slot);
    let (coordinator, mut discovery, locator, mut attacher) = setup(slot);
    discovery.scan(&locator, &mut attacher);
    let id = discovery.instance_for(slot).expect("attached");

    pointer(&plot, "pointerdown", 10, 10);
    assert_eq!(plot.style().get_property_value("cursor").ok().as_deref(), Some("grabbing"));
    pointer(&plot, "pointermove", 30, 10);
    pointer(&plot, "pointerup", 30, 10);

    let range = coordinator.borrow().display_range(id).expect("range after drag");
    assert!(range.zmax - range.zmin > 96.0);
    assert_eq!(coordinator.borrow().surface().ranges.borrow().len(), 1);
}

#[wasm_bindgen_test]
fn re_rendered_plot_gets_fresh_listeners() {
    let slot = "wl-test-rerender";
    let first = mount(slot);
    let (coordinator, mut discovery, locator, mut attacher) = setup(slot);
    discovery.scan(&locator, &mut attacher);
    let old = discovery.instance_for(slot).expect("attached");

    let outer: HtmlElement = dom::document()
        .expect("document")
        .get_element_by_id(slot)
        .expect("slot")
        .unchecked_into();
    let second = render_plot(&outer);
    let report = discovery.scan(&locator, &mut attacher);
    let new = discovery.instance_for(slot).expect("re-attached");

    assert_eq!(report.replaced, 1);
    assert_ne!(old, new);
    assert_eq!(attacher.listener_count(old), 0);
    assert_eq!(attacher.listener_count(new), 6);

    // the detached element no longer drives the coordinator
    double_click(&first);
    assert!(coordinator.borrow().surface().ranges.borrow().is_empty());
    double_click(&second);
    assert_eq!(coordinator.borrow().surface().ranges.borrow().len(), 1);
}

#[wasm_bindgen_test]
fn busy_coordinator_defers_attach_and_release() {
    let slot = "wl-test-busy";
    mount(slot);
    let (coordinator, mut discovery, locator, mut attacher) = setup(slot);

    {
        let _busy = coordinator.borrow_mut();
        let report = discovery.scan(&locator, &mut attacher);
        assert_eq!(report, ScanReport { pending: 1, ..ScanReport::default() });
    }
    discovery.scan(&locator, &mut attacher);
    let old = discovery.instance_for(slot).expect("attached once free");
    assert_eq!(attacher.listener_count(old), 6);

    let outer: HtmlElement = dom::document()
        .expect("document")
        .get_element_by_id(slot)
        .expect("slot")
        .unchecked_into();
    render_plot(&outer);
    {
        let _busy = coordinator.borrow_mut();
        discovery.scan(&locator, &mut attacher);
        assert_eq!(discovery.instance_for(slot), None);
        assert_eq!(attacher.listener_count(old), 0);
        assert_eq!(attacher.stale_count(), 1);
    }

    discovery.scan(&locator, &mut attacher);
    let new = discovery.instance_for(slot).expect("re-attached once free");
    assert_eq!(attacher.stale_count(), 0);
    assert_eq!(coordinator.borrow().instances(), vec![new]);
}

#[wasm_bindgen_test]
fn runtime_installs_into_a_loaded_document() {
    let slot = "wl-test-runtime";
    mount(slot);
    let config = WindowLevelConfig {
        discovery: DiscoveryConfig { slots: vec![slot.to_string()], ..DiscoveryConfig::default() },
        ..WindowLevelConfig::default()
    };

    let runtime = DomRuntime::install(RecordingSurface::default(), &config).expect("install");
    assert!(runtime.instance_for(slot).is_some());
    assert_eq!(runtime.listener_count(slot), 6);
    assert_eq!(runtime.reset_slot(slot), Some(DisplayRange { zmin: 2.0, zmax: 98.0 }));
}

#[wasm_bindgen_test]
fn once_listener_fires_a_single_time() {
    let target = mount("wl-test-once-listener");
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let _listener = listen(&target, "dblclick", &EventOptions::once(), move |_| counter.set(counter.get() + 1));

    double_click(&target);
    double_click(&target);
    assert_eq!(hits.get(), 1);
}
