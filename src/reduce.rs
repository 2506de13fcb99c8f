use std::rc::Rc;

use crate::{sinks::Sinks, Action, ReplayCell};

#[cfg(test)]
mod tests;

/// One state transition, reported to the transition hook.
///
/// `old` and `action` are `None` only for the synthetic record fired once
/// when a store is built. `old` and `new` are the same `Rc` when the reducer
/// returned its input unchanged.
pub struct Transition<S, P> {
    pub old: Option<Rc<S>>,
    pub new: Rc<S>,
    pub action: Option<Rc<Action<P>>>,
}
impl<S: std::fmt::Debug, P: std::fmt::Debug> std::fmt::Debug for Transition<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("old", &self.old)
            .field("new", &self.new)
            .field("action", &self.action)
            .finish()
    }
}

pub(crate) type Reducer<S, P> = Rc<dyn Fn(&Rc<S>, &Action<P>) -> Rc<S>>;
pub(crate) type TransitionHook<S, P> = Rc<dyn Fn(&Transition<S, P>)>;

/// Applies the reducer to one incoming action stream.
///
/// The stage reads the cell but never writes it; `out` is the call site's
/// write policy. Both the always-on and the demand-driven pipeline run their
/// own instance against the same cell, so every read here must be fresh:
/// a write from the other pipeline may have advanced the cell between any
/// two steps.
pub(crate) struct ReduceStage<S: 'static, P: 'static> {
    cell: ReplayCell<S>,
    reducer: Reducer<S, P>,
    applied: Sinks<Rc<Action<P>>>,
    hook: Option<TransitionHook<S, P>>,
    out: Box<dyn Fn(Rc<S>)>,
}

impl<S: 'static, P: 'static> ReduceStage<S, P> {
    pub fn new(
        cell: ReplayCell<S>,
        reducer: Reducer<S, P>,
        applied: Sinks<Rc<Action<P>>>,
        hook: Option<TransitionHook<S, P>>,
        out: impl Fn(Rc<S>) + 'static,
    ) -> Self {
        Self {
            cell,
            reducer,
            applied,
            hook,
            out: Box::new(out),
        }
    }

    /// Processes one action in full: applied-actions emission, reduction
    /// against the cell's current value, transition record, and forwarding
    /// of the result unless it is already the cell's current value.
    pub fn process(&self, action: Rc<Action<P>>) {
        self.applied.emit(action.clone());
        let old = self.cell.read();
        let new = (self.reducer)(&old, &action);
        if let Some(hook) = &self.hook {
            hook(&Transition {
                old: Some(old),
                new: new.clone(),
                action: Some(action),
            });
        }
        // Re-read at filter time: drops reducer no-ops and results made
        // stale by a concurrent write from the other pipeline.
        if !Rc::ptr_eq(&new, &self.cell.read()) {
            (self.out)(new);
        }
    }
}
