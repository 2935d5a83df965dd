use crate::domain::errors::AppResult;
use crate::domain::gesture::Cursor;
use crate::domain::sampling::IntensityGrid;
use crate::domain::window::DisplayRange;

/// Write-only access to a chart's display mapping.
///
/// Implementations must only restyle the first trace's value range, never
/// reprocess the data itself.
pub trait RendererAdapter {
    type Target;

    fn apply_range(&self, target: &Self::Target, range: DisplayRange) -> AppResult<()>;
}

/// Everything the coordinator needs from the rendering side of one chart.
pub trait ChartSurface: RendererAdapter {
    type Grid: IntensityGrid;

    /// The chart's first data series, or `None` when it has no grid yet.
    fn read_grid(&self, target: &Self::Target) -> Option<Self::Grid>;

    fn set_cursor(&self, target: &Self::Target, cursor: Cursor);

    /// Keep delivering `pointer_id` events to `target` until release.
    fn capture_pointer(&self, target: &Self::Target, pointer_id: i32) -> AppResult<()>;
}
