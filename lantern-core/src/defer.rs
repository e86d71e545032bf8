//! Defer queue
//!
//! Handle-keyed destruction actions with an N-frame delay. GPU `free` entry
//! points enqueue here instead of destroying directly, so commands recorded
//! earlier in the frame still resolve their handles when they reach the
//! driver; the queue is drained once per frame after command execution.

use crate::handle::Handle;

/// Action invoked against a context of type `C` when its delay expires.
pub type HandleAction<C> = fn(&mut C, Handle);

pub struct DeferAction<C> {
    pub frames_left: u32,
    pub handle: Handle,
    pub invoke: HandleAction<C>,
}

impl<C> Clone for DeferAction<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for DeferAction<C> {}

/// Queue of pending destruction actions.
///
/// The owner extracts due actions with [`DeferQueue::due`] and invokes them
/// itself; extraction and invocation are split so the context the actions
/// mutate can be the structure that owns the queue.
pub struct DeferQueue<C> {
    actions: Vec<DeferAction<C>>,
}

impl<C> DeferQueue<C> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn push(&mut self, frames_left: u32, handle: Handle, invoke: HandleAction<C>) {
        if handle.is_none() {
            return;
        }
        self.actions.push(DeferAction {
            frames_left,
            handle,
            invoke,
        });
    }

    /// Advances one frame: actions still waiting have `frames_left`
    /// decremented and stay queued; expired actions are removed and
    /// returned for invocation.
    pub fn due(&mut self) -> Vec<DeferAction<C>> {
        let mut due = Vec::new();
        self.actions.retain_mut(|action| {
            if action.frames_left > 0 {
                action.frames_left -= 1;
                true
            } else {
                due.push(*action);
                false
            }
        });
        due
    }

    /// Empties the queue regardless of remaining delays; used on shutdown.
    pub fn drain_all(&mut self) -> Vec<DeferAction<C>> {
        core::mem::take(&mut self.actions)
    }
}

impl<C> Default for DeferQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(count: &mut u32, _handle: Handle) {
        *count += 1;
    }

    #[test]
    fn actions_wait_their_frame_count() {
        let mut queue: DeferQueue<u32> = DeferQueue::new();
        let mut count = 0u32;
        queue.push(1, Handle::new(1, 0), mark);

        // Frame one: the delay decrements, nothing runs.
        for action in queue.due() {
            (action.invoke)(&mut count, action.handle);
        }
        assert_eq!(count, 0);
        assert_eq!(queue.len(), 1);

        // Frame two: the action is due.
        for action in queue.due() {
            (action.invoke)(&mut count, action.handle);
        }
        assert_eq!(count, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn zero_delay_runs_on_first_tick() {
        let mut queue: DeferQueue<u32> = DeferQueue::new();
        let mut count = 0u32;
        queue.push(0, Handle::new(1, 0), mark);
        for action in queue.due() {
            (action.invoke)(&mut count, action.handle);
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn null_handles_are_rejected() {
        let mut queue: DeferQueue<u32> = DeferQueue::new();
        queue.push(1, Handle::NONE, mark);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_all_ignores_delays() {
        let mut queue: DeferQueue<u32> = DeferQueue::new();
        let mut count = 0u32;
        queue.push(5, Handle::new(1, 0), mark);
        queue.push(9, Handle::new(2, 0), mark);
        for action in queue.drain_all() {
            (action.invoke)(&mut count, action.handle);
        }
        assert_eq!(count, 2);
        assert!(queue.is_empty());
    }
}
