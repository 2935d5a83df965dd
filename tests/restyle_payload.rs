use insta::assert_json_snapshot;
use window_level_wasm::config::WidthLimitsConfig;
use window_level_wasm::domain::sampling::BaseRange;
use window_level_wasm::domain::window::{DisplayRange, WindowState};
use window_level_wasm::infrastructure::plotly::RestyleUpdate;

#[test]
fn restyle_touches_only_first_trace_range() {
    let update = RestyleUpdate::from(DisplayRange { zmin: 0.5, zmax: 1.5 });
    assert_json_snapshot!(update, @r###"
    {
      "zmin": [
        0.5
      ],
      "zmax": [
        1.5
      ]
    }
    "###);
}

#[test]
fn base_window_serializes_as_data_range() {
    let state = WindowState::new(BaseRange::from_percentiles(-2.0, 6.0), &WidthLimitsConfig::default());
    let json = RestyleUpdate::from(state.display_range()).to_json().expect("serializable");
    assert_eq!(json, r#"{"zmin":[-2.0],"zmax":[6.0]}"#);
}
