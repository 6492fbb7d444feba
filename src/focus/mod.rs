//! Winning focus back after the remote session patches the page.

/// Id of a scheduled one-shot task.
pub type TaskId = i32;

/// Runs a task on a later turn, typically the next animation frame. The host
/// calls back into the widget with the returned id when the task fires.
pub trait Scheduler {
    fn schedule(&self) -> Option<TaskId>;
    fn cancel(&self, id: TaskId);
}

/// Single-slot deferred task: at most one request is pending, and a new
/// request replaces the old one.
#[derive(Debug, Default)]
pub struct DeferredSlot {
    pending: Option<TaskId>,
}

impl DeferredSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<TaskId> {
        self.pending
    }

    pub fn request<T: Scheduler>(&mut self, scheduler: &T) -> Option<TaskId> {
        if let Some(old) = self.pending.take() {
            scheduler.cancel(old);
        }
        self.pending = scheduler.schedule();
        self.pending
    }

    /// Claim `id` as it fires. Stale or cancelled ids return false.
    pub fn take(&mut self, id: TaskId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel<T: Scheduler>(&mut self, scheduler: &T) {
        if let Some(old) = self.pending.take() {
            scheduler.cancel(old);
        }
    }
}

/// Schedules a refocus-and-restore while suggestion UI is on screen.
#[derive(Debug, Default)]
pub struct FocusGuardian {
    slot: DeferredSlot,
}

impl FocusGuardian {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<TaskId> {
        self.slot.pending()
    }

    /// Request a deferred refocus if the guard is active and focus or the
    /// selection has been lost.
    pub fn check<T: Scheduler>(
        &mut self,
        scheduler: &T,
        active: bool,
        focused: bool,
        selection_inside: bool,
    ) -> Option<TaskId> {
        if !active || (focused && selection_inside) {
            return None;
        }
        self.slot.request(scheduler)
    }

    /// Whether the firing task `id` should refocus.
    pub fn fire(&mut self, id: TaskId) -> bool {
        self.slot.take(id)
    }

    pub fn cancel<T: Scheduler>(&mut self, scheduler: &T) {
        self.slot.cancel(scheduler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualScheduler;

    #[test]
    fn test_slot_coalesces_requests() {
        let sched = ManualScheduler::new();
        let mut slot = DeferredSlot::new();
        let a = slot.request(&sched).expect("scheduled");
        let b = slot.request(&sched).expect("scheduled");
        assert_ne!(a, b);
        assert_eq!(sched.cancelled(), vec![a]);
        assert_eq!(sched.live(), vec![b]);

        assert!(!slot.take(a));
        assert!(slot.take(b));
        assert!(!slot.take(b));
    }

    #[test]
    fn test_slot_cancel() {
        let sched = ManualScheduler::new();
        let mut slot = DeferredSlot::new();
        let a = slot.request(&sched).expect("scheduled");
        slot.cancel(&sched);
        assert_eq!(slot.pending(), None);
        assert_eq!(sched.cancelled(), vec![a]);
        assert!(!slot.take(a));
    }

    #[test]
    fn test_guardian_only_acts_when_active_and_lost() {
        let sched = ManualScheduler::new();
        let mut g = FocusGuardian::new();
        assert_eq!(g.check(&sched, false, false, false), None);
        assert_eq!(g.check(&sched, true, true, true), None);
        assert!(g.check(&sched, true, false, true).is_some());
        assert!(g.check(&sched, true, true, false).is_some());
        assert_eq!(sched.live().len(), 1);
    }
}
