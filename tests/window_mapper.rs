use quickcheck_macros::quickcheck;
use window_level_wasm::config::{GestureConfig, WidthLimitsConfig};
use window_level_wasm::domain::sampling::{BaseRange, DenseGrid, Sampler};
use window_level_wasm::domain::window::{DisplayRange, DragDelta, WindowMapper, WindowState};
use window_level_wasm::infrastructure::plotly::RestyleUpdate;

fn state(min: f64, max: f64) -> WindowState {
    WindowState::new(BaseRange::from_percentiles(min, max), &WidthLimitsConfig::default())
}

#[test]
fn starts_at_base_values() {
    let st = state(200.0, 1200.0);
    assert_eq!(st.center(), 700.0);
    assert_eq!(st.width(), 1000.0);
    assert_eq!(st.min_width(), 0.5);
    assert_eq!(st.max_width(), 50_000.0);
    assert!(st.is_at_base());
    assert_eq!(st.display_range(), DisplayRange { zmin: 200.0, zmax: 1200.0 });
}

#[test]
fn right_drag_widens_window() {
    let mut st = state(0.0, 100.0);
    st.apply_drag(&WindowMapper::default(), DragDelta::new(10.0, 0.0));
    assert!(st.width() > 100.0);
    assert_eq!(st.center(), 50.0);
}

#[test]
fn left_drag_narrows_window() {
    let mut st = state(0.0, 100.0);
    st.apply_drag(&WindowMapper::default(), DragDelta::new(-10.0, 0.0));
    assert!(st.width() < 100.0);
}

#[test]
fn upward_drag_raises_center() {
    let mut st = state(0.0, 100.0);
    st.apply_drag(&WindowMapper::default(), DragDelta::new(0.0, -10.0));
    assert!(st.center() > 50.0);
    assert_eq!(st.width(), 100.0);
    // 10 px * width 100 * 0.003
    assert!((st.center() - 53.0).abs() < 1e-9);
}

#[test]
fn brightness_uses_updated_width() {
    let mapper = WindowMapper::default();
    let mut st = state(0.0, 100.0);
    st.apply_drag(&mapper, DragDelta::new(20.0, -10.0));
    let width = 100.0 * (20.0 * 0.005_f64).exp();
    assert!((st.width() - width).abs() < 1e-9);
    assert!((st.center() - (50.0 + 10.0 * width * 0.003)).abs() < 1e-9);
}

#[test]
fn width_clamps_at_max() {
    let mut st = state(0.0, 1.0);
    st.apply_drag(&WindowMapper::default(), DragDelta::new(10_000.0, 0.0));
    assert_eq!(st.width(), st.max_width());
    assert_eq!(st.width(), 50.0);
}

#[test]
fn width_clamps_at_min() {
    let mut st = state(0.0, 1.0);
    st.apply_drag(&WindowMapper::default(), DragDelta::new(-10_000.0, 0.0));
    assert_eq!(st.width(), st.min_width());
    assert!(st.width() > 0.0);
}

#[test]
fn non_finite_delta_is_ignored() {
    let mut st = state(0.0, 10.0);
    let before = st.clone();
    st.apply_drag(&WindowMapper::default(), DragDelta::new(f64::NAN, 1.0));
    st.apply_drag(&WindowMapper::default(), DragDelta::new(0.0, f64::INFINITY));
    assert_eq!(st, before);
}

#[test]
fn display_range_may_leave_data_range() {
    let mut st = state(0.0, 10.0);
    let range = st.apply_drag(&WindowMapper::default(), DragDelta::new(200.0, 0.0));
    assert!(range.zmin < 0.0);
    assert!(range.zmax > 10.0);
    assert!((range.zmax - range.zmin - st.width()).abs() < 1e-9);
}

#[test]
fn reset_restores_base_exactly_and_is_idempotent() {
    let mapper = WindowMapper::default();
    let mut st = state(-3.0, 17.0);
    for (dx, dy) in [(13.0, -4.0), (-250.0, 30.0), (7.5, 2.5)] {
        st.apply_drag(&mapper, DragDelta::new(dx, dy));
    }
    assert!(!st.is_at_base());

    let first = st.reset();
    assert_eq!((st.center(), st.width()), (st.base_center(), st.base_width()));
    let after_once = st.clone();
    let second = st.reset();
    assert_eq!(first, second);
    assert_eq!(st, after_once);
}

#[test]
fn custom_sensitivity_is_respected() {
    let mapper = WindowMapper::new(&GestureConfig { contrast_sensitivity: 0.01, ..GestureConfig::default() });
    let mut st = state(0.0, 100.0);
    st.apply_drag(&mapper, DragDelta::new(100.0, 0.0));
    assert!((st.width() - 100.0 * 1.0_f64.exp()).abs() < 1e-9);
}

#[quickcheck]
fn width_stays_within_bounds(deltas: Vec<(i16, i16)>, lo: i16, span: u16) -> bool {
    let mapper = WindowMapper::default();
    let min = lo as f64;
    let mut st = state(min, min + span as f64 + 1.0);
    deltas.into_iter().all(|(dx, dy)| {
        st.apply_drag(&mapper, DragDelta::new(dx as f64, dy as f64));
        st.min_width() <= st.width() && st.width() <= st.max_width()
    })
}

#[quickcheck]
fn reset_after_any_drags_returns_to_base(deltas: Vec<(i16, i16)>) -> bool {
    let mapper = WindowMapper::default();
    let mut st = state(10.0, 250.0);
    for (dx, dy) in deltas {
        st.apply_drag(&mapper, DragDelta::new(dx as f64, dy as f64));
    }
    st.reset();
    st.is_at_base()
}

#[test]
fn overflowing_max_width_falls_back_to_unit_range() {
    let grid = DenseGrid::from_fn(10, 10, |r, c| (r * 10 + c) as f64 * 1e305);
    let base = Sampler::default().robust_range(&grid);
    assert!(base.width().is_finite());

    let mut st = WindowState::new(base, &WidthLimitsConfig::default());
    assert_eq!(st.base(), BaseRange::default());
    assert!(st.max_width().is_finite());

    let range = st.apply_drag(&WindowMapper::default(), DragDelta::new(1000.0, 0.0));
    assert_eq!(st.width(), st.max_width());
    assert!(st.center().is_finite());
    let json = RestyleUpdate::from(range).to_json().expect("serializable");
    assert!(!json.contains("null"), "{json}");
}

#[test]
fn underflowing_min_width_falls_back_to_unit_range() {
    let st = WindowState::new(BaseRange::from_percentiles(0.0, 5e-324), &WidthLimitsConfig::default());
    assert!(st.min_width() > 0.0);
    assert_eq!((st.center(), st.width()), (0.5, 1.0));
}

#[test]
fn unrepresentable_center_falls_back_to_unit_range() {
    let st = WindowState::new(BaseRange::from_percentiles(1.0e308, 1.7e308), &WidthLimitsConfig::default());
    assert_eq!(st.base(), BaseRange::default());
}

#[test]
fn brightness_stops_before_leaving_f64() {
    let mapper = WindowMapper::default();
    let mut st = state(0.0, 1e306);
    st.apply_drag(&mapper, DragDelta::new(10_000.0, 0.0));
    assert_eq!(st.width(), st.max_width());

    for _ in 0..5 {
        let range = st.apply_drag(&mapper, DragDelta::new(0.0, -1000.0));
        assert!(range.zmin.is_finite() && range.zmax.is_finite());
    }
    assert!(st.center() > 1e308);
    assert_eq!(st.width(), st.max_width());
}
