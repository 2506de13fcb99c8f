use std::{
    cell::RefCell,
    collections::VecDeque,
    mem::take,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use futures::Stream;

use crate::{Action, Store, Subscription};


#[derive(Default)]
enum ValueState<T> {
    #[default]
    None,
    Pending(Waker),
    Ready(T),
}

/// Latest-value [`Stream`] over a store's state.
///
/// Holds a state subscription (and therefore a cold source connection) for
/// its whole lifetime. States emitted between polls coalesce to the most
/// recent one; the first poll yields the state current at creation unless
/// it was already superseded.
pub struct StateStream<S: 'static> {
    node: Rc<StateStreamNode<S>>,
    _sub: Subscription,
}
struct StateStreamNode<S> {
    state: RefCell<ValueState<Rc<S>>>,
}

impl<S: 'static> Stream for StateStream<S> {
    type Item = Rc<S>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut state = self.node.state.borrow_mut();
        match take(&mut *state) {
            ValueState::None | ValueState::Pending(_) => {
                *state = ValueState::Pending(cx.waker().clone());
                Poll::Pending
            }
            ValueState::Ready(value) => Poll::Ready(Some(value)),
        }
    }
}

/// Queued [`Stream`] over every action processed by either pipeline.
///
/// Unlike [`StateStream`], nothing coalesces: actions buffer in order until
/// polled.
pub struct ActionStream<P: 'static> {
    node: Rc<ActionStreamNode<P>>,
    _sub: Subscription,
}
struct ActionStreamNode<P: 'static> {
    queue: RefCell<VecDeque<Rc<Action<P>>>>,
    waker: RefCell<Option<Waker>>,
}

impl<P: 'static> Stream for ActionStream<P> {
    type Item = Rc<Action<P>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(action) = self.node.queue.borrow_mut().pop_front() {
            return Poll::Ready(Some(action));
        }
        *self.node.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<S: 'static, P: 'static> Store<S, P> {
    pub fn state_stream(&self) -> StateStream<S> {
        let node = Rc::new(StateStreamNode {
            state: RefCell::new(ValueState::None),
        });
        let sub = {
            let node = node.clone();
            self.subscribe(move |value: Rc<S>| {
                let waker = {
                    let mut state = node.state.borrow_mut();
                    match take(&mut *state) {
                        ValueState::Pending(waker) => {
                            *state = ValueState::Ready(value);
                            Some(waker)
                        }
                        _ => {
                            *state = ValueState::Ready(value);
                            None
                        }
                    }
                };
                if let Some(waker) = waker {
                    waker.wake();
                }
            })
        };
        StateStream { node, _sub: sub }
    }

    pub fn actions_stream(&self) -> ActionStream<P> {
        let node = Rc::new(ActionStreamNode {
            queue: RefCell::new(VecDeque::new()),
            waker: RefCell::new(None),
        });
        let sub = {
            let node = node.clone();
            self.subscribe_actions(move |action: Rc<Action<P>>| {
                node.queue.borrow_mut().push_back(action);
                if let Some(waker) = node.waker.borrow_mut().take() {
                    waker.wake();
                }
            })
        };
        ActionStream { node, _sub: sub }
    }
}
