//! Plotly-backed chart surface.
//!
//! Reads `gd.data[0].z` for sampling and pushes display ranges through
//! `Plotly.restyle`, which only touches `zmin`/`zmax` of the trace.

use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;

use crate::application::ports::{ChartSurface, RendererAdapter};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::gesture::Cursor;
use crate::domain::sampling::IntensityGrid;
use crate::domain::window::DisplayRange;
use crate::infrastructure::dom;

/// `{zmin: [..], zmax: [..]}` update object for `Plotly.restyle`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RestyleUpdate {
    pub zmin: [f64; 1],
    pub zmax: [f64; 1],
}

impl From<DisplayRange> for RestyleUpdate {
    fn from(range: DisplayRange) -> Self {
        Self { zmin: [range.zmin], zmax: [range.zmax] }
    }
}

impl RestyleUpdate {
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self).map_err(|e| AppError::Rendering(e.to_string()))
    }

    pub fn to_js(&self) -> AppResult<JsValue> {
        js_sys::JSON::parse(&self.to_json()?).map_err(|e| AppError::rendering("restyle payload", &e))
    }
}

/// Row view over a JavaScript `z` array. Rows may be plain arrays or typed
/// arrays; anything else reads as a missing row.
pub struct JsGrid {
    rows: Vec<JsValue>,
    cols: usize,
}

impl JsGrid {
    pub fn from_js(z: &JsValue) -> Option<Self> {
        let outer = z.dyn_ref::<Array>()?;
        let rows: Vec<JsValue> = outer.iter().collect();
        let cols = rows.first().map_or(0, row_len);
        Some(Self { rows, cols })
    }
}

fn row_len(row: &JsValue) -> usize {
    if !row.is_object() {
        return 0;
    }
    Reflect::get(row, &JsValue::from_str("length"))
        .ok()
        .and_then(|len| len.as_f64())
        .map_or(0, |len| len as usize)
}

impl IntensityGrid for JsGrid {
    fn rows(&self) -> usize {
        self.rows.len()
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn value(&self, row: usize, col: usize) -> Option<f64> {
        let row = self.rows.get(row)?;
        if !row.is_object() || col >= row_len(row) {
            return None;
        }
        Reflect::get_u32(row, col as u32).ok()?.as_f64()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlotlySurface {
    trace_index: u32,
}

impl PlotlySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn plotly() -> AppResult<JsValue> {
        let plotly = Reflect::get(&js_sys::global(), &JsValue::from_str("Plotly"))
            .map_err(|e| AppError::rendering("Plotly lookup", &e))?;
        if plotly.is_undefined() || plotly.is_null() {
            return Err(AppError::Rendering("Plotly is not loaded".to_string()));
        }
        Ok(plotly)
    }
}

impl RendererAdapter for PlotlySurface {
    type Target = HtmlElement;

    fn apply_range(&self, target: &HtmlElement, range: DisplayRange) -> AppResult<()> {
        let plotly = Self::plotly()?;
        let restyle: Function = Reflect::get(&plotly, &JsValue::from_str("restyle"))
            .map_err(|e| AppError::rendering("Plotly.restyle lookup", &e))?
            .dyn_into()
            .map_err(|v| AppError::rendering("Plotly.restyle is not a function", &v))?;

        let update = RestyleUpdate::from(range).to_js()?;
        let traces = Array::of1(&JsValue::from(self.trace_index));
        restyle
            .call3(&plotly, target.as_ref(), &update, &traces)
            .map_err(|e| AppError::rendering("Plotly.restyle", &e))?;
        Ok(())
    }
}

impl ChartSurface for PlotlySurface {
    type Grid = JsGrid;

    fn read_grid(&self, target: &HtmlElement) -> Option<JsGrid> {
        let data = Reflect::get(target.as_ref(), &JsValue::from_str("data")).ok()?;
        if !data.is_object() {
            return None;
        }
        let trace = Reflect::get_u32(&data, self.trace_index).ok()?;
        if !trace.is_object() {
            return None;
        }
        let z = Reflect::get(&trace, &JsValue::from_str("z")).ok()?;
        JsGrid::from_js(&z)
    }

    fn set_cursor(&self, target: &HtmlElement, cursor: Cursor) {
        dom::set_cursor(target, cursor);
    }

    fn capture_pointer(&self, target: &HtmlElement, pointer_id: i32) -> AppResult<()> {
        dom::capture_pointer(target, pointer_id)
    }
}
