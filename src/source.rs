use std::{
    cell::{Cell, RefCell},
    error::Error,
    rc::Rc,
};

use derive_ex::derive_ex;

use crate::{sinks::Sinks, Action, DynObserver, Observer, Subscription};

#[cfg(test)]
mod tests;

/// An event delivered by an [`ActionSource`] to its subscriber.
#[derive_ex(Clone, bound())]
pub enum SourceEvent<P> {
    Next(Rc<Action<P>>),
    Error(Rc<dyn Error>),
    Complete,
}
impl<P: std::fmt::Debug> std::fmt::Debug for SourceEvent<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceEvent::Next(action) => f.debug_tuple("Next").field(action).finish(),
            SourceEvent::Error(e) => f.debug_tuple("Error").field(e).finish(),
            SourceEvent::Complete => f.write_str("Complete"),
        }
    }
}

/// A producer stream of actions.
///
/// Sources are borrowed, never owned: the engine only holds the
/// [`Subscription`] returned here and drops it to detach. A source may error
/// or complete at any time; the engine isolates either per source, so a
/// misbehaving producer silences only its own branch. Sources registered as
/// cold must tolerate being subscribed and unsubscribed repeatedly.
pub trait ActionSource<P: 'static>: 'static {
    fn subscribe(&self, observer: DynObserver<SourceEvent<P>>) -> Subscription;
}

/// A push-style action source.
///
/// The standard way to hand the engine a producer: keep one end, register
/// the other as a hot or cold source, and push actions into it. Multicasts
/// to every current subscriber. After [`error`](Self::error) or
/// [`complete`](Self::complete) the feed is terminal: later pushes are
/// dropped and later subscribers observe `Complete` immediately.
#[derive_ex(Clone, bound())]
pub struct Feed<P: 'static>(Rc<FeedNode<P>>);

struct FeedNode<P: 'static> {
    sinks: Sinks<SourceEvent<P>>,
    terminal: RefCell<Option<SourceEvent<P>>>,
}

impl<P: 'static> Feed<P> {
    pub fn new() -> Self {
        Self(Rc::new(FeedNode {
            sinks: Sinks::new(),
            terminal: RefCell::new(None),
        }))
    }

    pub fn next(&self, action: Action<P>) {
        self.next_rc(Rc::new(action));
    }
    pub fn next_rc(&self, action: Rc<Action<P>>) {
        if self.0.terminal.borrow().is_none() {
            self.0.sinks.emit(SourceEvent::Next(action));
        }
    }
    pub fn error(&self, error: Rc<dyn Error>) {
        self.terminate(SourceEvent::Error(error));
    }
    pub fn complete(&self) {
        self.terminate(SourceEvent::Complete);
    }

    fn terminate(&self, event: SourceEvent<P>) {
        {
            let mut terminal = self.0.terminal.borrow_mut();
            if terminal.is_some() {
                return;
            }
            *terminal = Some(event.clone());
        }
        self.0.sinks.emit(event);
    }
}
impl<P: 'static> Default for Feed<P> {
    fn default() -> Self {
        Self::new()
    }
}
impl<P: 'static> ActionSource<P> for Feed<P> {
    fn subscribe(&self, mut observer: DynObserver<SourceEvent<P>>) -> Subscription {
        let terminal = self.0.terminal.borrow().clone();
        if let Some(terminal) = terminal {
            observer.next(terminal);
            return Subscription::empty();
        }
        self.0.sinks.subscribe(observer)
    }
}

/// Subscribes to `source` with per-branch fault isolation.
///
/// `Next` actions are forwarded to `on_action`; `Error` and `Complete`
/// silence the branch permanently. Nothing propagates past the returned
/// subscription, so a merge over several isolated sources outlives any one
/// of them.
pub(crate) fn subscribe_isolated<P: 'static>(
    source: &dyn ActionSource<P>,
    mut on_action: impl FnMut(Rc<Action<P>>) + 'static,
) -> Subscription {
    let done = Cell::new(false);
    source.subscribe(
        (move |event: SourceEvent<P>| {
            if done.get() {
                return;
            }
            match event {
                SourceEvent::Next(action) => on_action(action),
                SourceEvent::Error(_) | SourceEvent::Complete => done.set(true),
            }
        })
        .into_dyn(),
    )
}
