//! Idempotent discovery of visualization instances.
//!
//! The charting library may render late and may replace its elements at any
//! time, so the loop is re-run on every "something may have appeared"
//! notification. The attached map it owns guarantees at most one attachment
//! per rendered element.

use crate::config::DiscoveryConfig;
use crate::domain::errors::AppResult;
use crate::domain::logging::LogComponent;
use crate::domain::registry::InstanceId;
use crate::{log_debug, log_info};

/// Finds the renderable element currently sitting in a slot.
pub trait InstanceLocator {
    type Handle: Clone;

    fn locate(&self, slot: &str) -> Option<Self::Handle>;

    /// Whether two handles refer to the same rendered element.
    fn same_instance(&self, a: &Self::Handle, b: &Self::Handle) -> bool;
}

/// Receives attach/detach decisions made by the loop.
pub trait Attacher<H> {
    /// Returns `false` when nothing was bound; the slot then stays pending
    /// and is offered again on the next scan under the same id.
    fn attach(&mut self, id: InstanceId, handle: &H) -> bool;

    /// Must eventually release everything bound for `id`, even if that has
    /// to wait past this call.
    fn detach(&mut self, id: InstanceId);
}

/// Source of "an instance may have appeared" notifications: DOM mutation
/// observers, timers, or explicit calls from the rendering side.
pub trait InstanceNotifier {
    fn subscribe(&mut self, on_change: Box<dyn FnMut()>) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanReport {
    pub attached: usize,
    pub replaced: usize,
    pub detached: usize,
    pub pending: usize,
}

impl ScanReport {
    pub fn changed(&self) -> bool {
        self.attached + self.replaced + self.detached > 0
    }
}

#[derive(Debug, Clone)]
struct Attachment<H> {
    id: InstanceId,
    handle: H,
}

#[derive(Debug, Clone)]
pub struct DiscoveryLoop<H> {
    slots: Vec<String>,
    attached: Vec<Option<Attachment<H>>>,
    generations: Vec<u32>,
}

impl<H: Clone> DiscoveryLoop<H> {
    pub fn new(slots: Vec<String>) -> Self {
        let n = slots.len();
        Self { slots, attached: vec![None; n], generations: vec![0; n] }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.slots.clone())
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Current instance in the named slot.
    pub fn instance_for(&self, slot: &str) -> Option<InstanceId> {
        let index = self.slots.iter().position(|s| s == slot)?;
        self.attached[index].as_ref().map(|a| a.id)
    }

    pub fn attached_ids(&self) -> Vec<InstanceId> {
        self.attached.iter().flatten().map(|a| a.id).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.attached.iter().all(Option::is_some)
    }

    /// Visit every slot once, attaching new elements, replacing re-rendered
    /// ones and detaching vanished ones.
    pub fn scan<L, A>(&mut self, locator: &L, attacher: &mut A) -> ScanReport
    where
        L: InstanceLocator<Handle = H>,
        A: Attacher<H>,
    {
        let mut report = ScanReport::default();
        for index in 0..self.slots.len() {
            let found = locator.locate(&self.slots[index]);
            let current = self.attached[index].take();

            match (current, found) {
                (Some(existing), Some(handle)) if locator.same_instance(&existing.handle, &handle) => {
                    self.attached[index] = Some(existing);
                }
                (Some(existing), Some(handle)) => {
                    attacher.detach(existing.id);
                    match self.try_attach(index, handle, attacher) {
                        Some(id) => {
                            log_info!(
                                LogComponent::Domain("Discovery"),
                                "🔁 {} re-rendered, {} replaced by {}",
                                self.slots[index],
                                existing.id,
                                id
                            );
                            report.replaced += 1;
                        }
                        None => {
                            report.detached += 1;
                            report.pending += 1;
                        }
                    }
                }
                (Some(existing), None) => {
                    log_debug!(
                        LogComponent::Domain("Discovery"),
                        "{} vanished from {}",
                        existing.id,
                        self.slots[index]
                    );
                    attacher.detach(existing.id);
                    report.detached += 1;
                    report.pending += 1;
                }
                (None, Some(handle)) => match self.try_attach(index, handle, attacher) {
                    Some(id) => {
                        log_info!(
                            LogComponent::Domain("Discovery"),
                            "✅ attached {} as {}",
                            self.slots[index],
                            id
                        );
                        report.attached += 1;
                    }
                    None => report.pending += 1,
                },
                (None, None) => report.pending += 1,
            }
        }
        report
    }

    /// Records the attachment and consumes a generation only when the
    /// attacher accepted it.
    fn try_attach<A: Attacher<H>>(&mut self, index: usize, handle: H, attacher: &mut A) -> Option<InstanceId> {
        let id = InstanceId::new(index, self.generations[index]);
        if !attacher.attach(id, &handle) {
            log_debug!(LogComponent::Domain("Discovery"), "{} refused, {} stays pending", id, self.slots[index]);
            return None;
        }
        self.generations[index] += 1;
        self.attached[index] = Some(Attachment { id, handle });
        Some(id)
    }
}

/// Bounded, fixed-delay retry budget for slots that are not rendered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    remaining: u32,
    interval_ms: u32,
}

impl RetrySchedule {
    pub fn new(retries: u32, interval_ms: u32) -> Self {
        Self { remaining: retries, interval_ms }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.retries, config.interval_ms)
    }

    /// Delay before the next retry, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.interval_ms)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}
