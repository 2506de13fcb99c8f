use std::{cell::RefCell, rc::Rc};

use derive_ex::derive_ex;
use serde::Serialize;

use crate::{sinks::Sinks, Observer, Subscription};


/// The single holder of current state.
///
/// The cell always holds exactly one value. Writing with zero observers
/// still updates the slot, so a value produced while nobody watched is what
/// a later subscriber receives first.
#[derive_ex(Clone, bound())]
pub struct ReplayCell<T: 'static>(Rc<ReplayCellNode<T>>);

struct ReplayCellNode<T> {
    value: RefCell<Rc<T>>,
    sinks: Sinks<Rc<T>>,
}

impl<T: 'static> ReplayCell<T> {
    pub fn new(value: impl Into<Rc<T>>) -> Self {
        Self(Rc::new(ReplayCellNode {
            value: RefCell::new(value.into()),
            sinks: Sinks::new(),
        }))
    }

    /// Gets the held value.
    pub fn read(&self) -> Rc<T> {
        self.0.value.borrow().clone()
    }

    /// Replaces the held value and notifies all current observers of it.
    pub fn write(&self, value: Rc<T>) {
        *self.0.value.borrow_mut() = value.clone();
        self.0.sinks.emit(value);
    }

    /// Registers an observer.
    ///
    /// The observer receives the held value immediately, then every
    /// subsequent [`write`](Self::write) until the subscription is dropped.
    pub fn subscribe(&self, mut observer: impl Observer<Rc<T>>) -> Subscription {
        observer.next(self.read());
        self.0.sinks.subscribe(observer)
    }
}
impl<T: std::fmt::Debug> std::fmt::Debug for ReplayCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => std::fmt::Debug::fmt(&**value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<T> Serialize for ReplayCell<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_borrow() {
            Ok(value) => T::serialize(&**value, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
