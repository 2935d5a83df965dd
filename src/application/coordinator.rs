use crate::application::ports::ChartSurface;
use crate::config::{GestureConfig, WidthLimitsConfig, WindowLevelConfig};
use crate::domain::{
    discovery::Attacher,
    gesture::{Cursor, GestureController, GestureEffect, GestureInput},
    logging::LogComponent,
    registry::{InstanceId, InstanceRecord, WindowRegistry},
    sampling::{BaseRange, Sampler},
    window::{DisplayRange, WindowMapper, WindowState},
};
use crate::{log_debug, log_warn};

/// Wires gesture handling, window state and the chart surface together for
/// every attached instance.
pub struct WindowLevelCoordinator<S: ChartSurface> {
    surface: S,
    sampler: Sampler,
    mapper: WindowMapper,
    limits: WidthLimitsConfig,
    gesture: GestureConfig,
    registry: WindowRegistry<S::Target>,
}

impl<S: ChartSurface> WindowLevelCoordinator<S> {
    pub fn new(surface: S, config: &WindowLevelConfig) -> Self {
        Self {
            surface,
            sampler: Sampler::new(&config.sampling),
            mapper: WindowMapper::new(&config.gesture),
            limits: config.limits,
            gesture: config.gesture.clone(),
            registry: WindowRegistry::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Registers `target` under `id`; a second call for the same id is a no-op.
    pub fn attach(&mut self, id: InstanceId, target: S::Target) -> bool {
        let inserted = self.registry.insert(id, target, GestureController::new(&self.gesture));
        if inserted {
            if let Some(record) = self.registry.get(id) {
                self.surface.set_cursor(&record.target, Cursor::Grab);
            }
        } else {
            log_debug!(LogComponent::Application("Coordinator"), "{} already attached", id);
        }
        inserted
    }

    pub fn detach(&mut self, id: InstanceId) -> bool {
        self.registry.remove(id).is_some()
    }

    pub fn is_attached(&self, id: InstanceId) -> bool {
        self.registry.contains(id)
    }

    pub fn instances(&self) -> Vec<InstanceId> {
        self.registry.ids()
    }

    pub fn window(&self, id: InstanceId) -> Option<&WindowState> {
        self.registry.get(id)?.window.as_ref()
    }

    pub fn display_range(&self, id: InstanceId) -> Option<DisplayRange> {
        self.window(id).map(WindowState::display_range)
    }

    /// Runs one pointer input through the instance's state machine and
    /// performs the resulting effect. Unknown instances are ignored.
    pub fn handle_input(&mut self, id: InstanceId, input: GestureInput) -> GestureEffect {
        let Some(record) = self.registry.get_mut(id) else {
            return GestureEffect::Ignored;
        };
        let effect = record.gesture.handle(input);

        match effect {
            GestureEffect::Ignored => {}
            GestureEffect::DragStarted { pointer_id } => {
                ensure_window(&self.surface, &self.sampler, &self.limits, record);
                if let Err(e) = self.surface.capture_pointer(&record.target, pointer_id) {
                    log_warn!(LogComponent::Application("Coordinator"), "⚠️ {}: {}", id, e);
                }
                self.surface.set_cursor(&record.target, Cursor::Grabbing);
            }
            GestureEffect::Dragged(delta) => {
                let window = ensure_window(&self.surface, &self.sampler, &self.limits, record);
                let range = window.apply_drag(&self.mapper, delta);
                push_range(&self.surface, id, &record.target, range);
            }
            GestureEffect::DragEnded { double_tap } => {
                self.surface.set_cursor(&record.target, Cursor::Grab);
                if double_tap {
                    reset_record(&self.surface, &self.sampler, &self.limits, id, record);
                }
            }
            GestureEffect::Reset => {
                reset_record(&self.surface, &self.sampler, &self.limits, id, record);
            }
        }
        effect
    }

    /// Restores the data-derived window and re-applies it. Returns the applied
    /// range, or `None` for an unknown instance.
    pub fn reset(&mut self, id: InstanceId) -> Option<DisplayRange> {
        let record = self.registry.get_mut(id)?;
        Some(reset_record(&self.surface, &self.sampler, &self.limits, id, record))
    }

    pub fn reset_all(&mut self) -> usize {
        let ids = self.registry.ids();
        ids.into_iter().filter(|id| self.reset(*id).is_some()).count()
    }
}

/// Every attach decision from discovery lands in the registry.
impl<S> Attacher<S::Target> for WindowLevelCoordinator<S>
where
    S: ChartSurface,
    S::Target: Clone,
{
    fn attach(&mut self, id: InstanceId, handle: &S::Target) -> bool {
        WindowLevelCoordinator::attach(self, id, handle.clone());
        true
    }

    fn detach(&mut self, id: InstanceId) {
        WindowLevelCoordinator::detach(self, id);
    }
}

fn ensure_window<'a, S: ChartSurface>(
    surface: &S,
    sampler: &Sampler,
    limits: &WidthLimitsConfig,
    record: &'a mut InstanceRecord<S::Target>,
) -> &'a mut WindowState {
    let target = &record.target;
    record.window.get_or_insert_with(|| {
        let base = match surface.read_grid(target) {
            Some(grid) => sampler.robust_range(&grid),
            None => {
                log_debug!(LogComponent::Application("Coordinator"), "no grid, using default range");
                BaseRange::default()
            }
        };
        WindowState::new(base, limits)
    })
}

fn reset_record<S: ChartSurface>(
    surface: &S,
    sampler: &Sampler,
    limits: &WidthLimitsConfig,
    id: InstanceId,
    record: &mut InstanceRecord<S::Target>,
) -> DisplayRange {
    let range = ensure_window(surface, sampler, limits, record).reset();
    push_range(surface, id, &record.target, range);
    range
}

fn push_range<S: ChartSurface>(surface: &S, id: InstanceId, target: &S::Target, range: DisplayRange) {
    if let Err(e) = surface.apply_range(target, range) {
        log_warn!(LogComponent::Application("Coordinator"), "⚠️ {} range not applied: {}", id, e);
    }
}
