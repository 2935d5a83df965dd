use std::cell::RefCell;
use std::rc::Rc;

use crate::config::WindowLevelConfig;
use crate::domain::errors::AppResult;
use crate::infrastructure::dom::DomRuntime;
use crate::infrastructure::plotly::PlotlySurface;

pub type PlotlyRuntime = DomRuntime<PlotlySurface>;

thread_local! {
    static RUNTIME: RefCell<Option<Rc<PlotlyRuntime>>> = RefCell::new(None);
}

pub fn is_installed() -> bool {
    RUNTIME.with(|cell| cell.borrow().is_some())
}

/// Installs the Plotly runtime once per page. Returns `false` when one is
/// already running.
pub fn install_runtime(config: &WindowLevelConfig) -> AppResult<bool> {
    if is_installed() {
        return Ok(false);
    }
    let runtime = DomRuntime::install(PlotlySurface::new(), config)?;
    RUNTIME.with(|cell| *cell.borrow_mut() = Some(runtime));
    Ok(true)
}

/// Runs `f` against the installed runtime without holding the slot borrowed.
pub fn with_runtime<R>(f: impl FnOnce(&Rc<PlotlyRuntime>) -> R) -> Option<R> {
    let runtime = RUNTIME.with(|cell| cell.borrow().clone())?;
    Some(f(&runtime))
}
