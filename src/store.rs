use std::{cell::RefCell, mem::take, rc::Rc};

use derive_ex::derive_ex;

use crate::{
    reduce::{ReduceStage, Reducer, TransitionHook},
    sinks::Sinks,
    source::subscribe_isolated,
    Action, ActionSource, Observer, ReplayCell, Subscription, Transition,
};


/// The state propagation engine.
///
/// One store owns one [`ReplayCell`] and two reduction pipelines feeding it:
/// an always-on pipeline processing [`dispatch`](Self::dispatch)ed actions
/// and every hot source, and a demand-driven pipeline processing cold
/// sources only while at least one state observer is attached.
///
/// The store is single-threaded; all processing happens synchronously
/// inside whichever call delivers an action. A panicking reducer propagates
/// out of that call and is never caught.
#[derive_ex(Clone, bound())]
pub struct Store<S: 'static, P: 'static>(Rc<StoreNode<S, P>>);

struct StoreNode<S: 'static, P: 'static> {
    cell: ReplayCell<S>,
    hot_stage: Rc<ReduceStage<S, P>>,
    cold_stage: Rc<ReduceStage<S, P>>,
    applied: Sinks<Rc<Action<P>>>,
    cold_sources: Vec<Rc<dyn ActionSource<P>>>,
    cold_link: RefCell<ColdLink>,
    // Hot sources stay attached for the store's lifetime.
    _hot_link: Vec<Subscription>,
}

#[derive(Default)]
struct ColdLink {
    observers: usize,
    connection: Vec<Subscription>,
}

impl<S: 'static, P: 'static> Store<S, P> {
    /// Creates a store with no sources and no transition hook.
    pub fn new(
        initial: impl Into<Rc<S>>,
        reducer: impl Fn(&Rc<S>, &Action<P>) -> Rc<S> + 'static,
    ) -> Self {
        Self::builder(initial, reducer).build()
    }

    pub fn builder(
        initial: impl Into<Rc<S>>,
        reducer: impl Fn(&Rc<S>, &Action<P>) -> Rc<S> + 'static,
    ) -> StoreBuilder<S, P> {
        StoreBuilder {
            initial: initial.into(),
            reducer: Rc::new(reducer),
            hot: Vec::new(),
            cold: Vec::new(),
            hook: None,
        }
    }

    /// Pushes an action into the always-on pipeline.
    ///
    /// Always succeeds; the action is fully processed before this returns.
    pub fn dispatch(&self, action: Action<P>) {
        self.dispatch_rc(Rc::new(action));
    }
    pub fn dispatch_rc(&self, action: Rc<Action<P>>) {
        self.0.hot_stage.process(action);
    }

    /// Gets the current state.
    pub fn read(&self) -> Rc<S> {
        self.0.cell.read()
    }

    /// Registers a state observer.
    ///
    /// The observer immediately receives the current state, then every
    /// subsequent state produced by either pipeline. If this is the first
    /// state observer, every cold source is connected before this returns;
    /// when the last state observer unsubscribes, cold sources are
    /// disconnected immediately. The current state survives such gaps.
    pub fn subscribe(&self, observer: impl Observer<Rc<S>>) -> Subscription {
        let replay = self.0.cell.subscribe(observer);
        self.0.retain_cold();
        let node = Rc::downgrade(&self.0);
        Subscription::from_fn(move || {
            drop(replay);
            if let Some(node) = node.upgrade() {
                node.release_cold();
            }
        })
    }

    /// Registers an observer of a projection of state.
    ///
    /// Consecutive projected values that are the same `Rc` are suppressed;
    /// equal contents in a fresh allocation are not. Counts as a state
    /// observer for cold source activation.
    pub fn select<U: 'static>(
        &self,
        projection: impl Fn(&S) -> Rc<U> + 'static,
        mut observer: impl Observer<Rc<U>>,
    ) -> Subscription {
        let mut last: Option<Rc<U>> = None;
        self.subscribe(move |state: Rc<S>| {
            let value = projection(&state);
            if let Some(last) = &last {
                if Rc::ptr_eq(last, &value) {
                    return;
                }
            }
            last = Some(value.clone());
            observer.next(value);
        })
    }

    /// Registers an observer of every action processed by either pipeline,
    /// in processing order, whether or not it changed state. No replay.
    pub fn subscribe_actions(&self, observer: impl Observer<Rc<Action<P>>>) -> Subscription {
        self.0.applied.subscribe(observer)
    }
}

impl<S: 'static, P: 'static> StoreNode<S, P> {
    fn retain_cold(&self) {
        let is_first = {
            let mut link = self.cold_link.borrow_mut();
            link.observers += 1;
            link.observers == 1
        };
        if is_first {
            // Subscribing may deliver actions synchronously, so the borrow
            // is not held across it.
            let connection: Vec<Subscription> = self
                .cold_sources
                .iter()
                .map(|source| {
                    let stage = self.cold_stage.clone();
                    subscribe_isolated(&**source, move |action| stage.process(action))
                })
                .collect();
            self.cold_link.borrow_mut().connection = connection;
        }
    }

    fn release_cold(&self) {
        let connection = {
            let mut link = self.cold_link.borrow_mut();
            link.observers -= 1;
            if link.observers == 0 {
                take(&mut link.connection)
            } else {
                Vec::new()
            }
        };
        drop(connection);
    }
}

pub struct StoreBuilder<S: 'static, P: 'static> {
    initial: Rc<S>,
    reducer: Reducer<S, P>,
    hot: Vec<Rc<dyn ActionSource<P>>>,
    cold: Vec<Rc<dyn ActionSource<P>>>,
    hook: Option<TransitionHook<S, P>>,
}

impl<S: 'static, P: 'static> StoreBuilder<S, P> {
    /// Adds a source connected for the store's entire lifetime.
    pub fn hot_source(mut self, source: impl ActionSource<P>) -> Self {
        self.hot.push(Rc::new(source));
        self
    }

    /// Adds a source connected only while at least one state observer is
    /// attached.
    pub fn cold_source(mut self, source: impl ActionSource<P>) -> Self {
        self.cold.push(Rc::new(source));
        self
    }

    /// Sets a hook invoked once per processed action, changed or not, plus
    /// once at build time with the synthetic initial transition.
    pub fn on_transition(mut self, hook: impl Fn(&Transition<S, P>) + 'static) -> Self {
        self.hook = Some(Rc::new(hook));
        self
    }

    pub fn build(self) -> Store<S, P> {
        let cell = ReplayCell::new(self.initial.clone());
        let applied = Sinks::new();
        let hot_stage = Rc::new(ReduceStage::new(
            cell.clone(),
            self.reducer.clone(),
            applied.clone(),
            self.hook.clone(),
            {
                let cell = cell.clone();
                move |state| cell.write(state)
            },
        ));
        let cold_stage = Rc::new(ReduceStage::new(
            cell.clone(),
            self.reducer,
            applied.clone(),
            self.hook.clone(),
            {
                let cell = cell.clone();
                move |state| cell.write(state)
            },
        ));
        if let Some(hook) = &self.hook {
            hook(&Transition {
                old: None,
                new: self.initial,
                action: None,
            });
        }
        let hot_link = self
            .hot
            .iter()
            .map(|source| {
                let stage = hot_stage.clone();
                subscribe_isolated(&**source, move |action| stage.process(action))
            })
            .collect();
        Store(Rc::new(StoreNode {
            cell,
            hot_stage,
            cold_stage,
            applied,
            cold_sources: self.cold,
            cold_link: RefCell::new(ColdLink::default()),
            _hot_link: hot_link,
        }))
    }
}
