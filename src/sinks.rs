use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use slabmap::SlabMap;

use crate::{Observer, Subscription};

/// Multicast registry of observers.
///
/// `emit` snapshots the registry before invoking anyone, so an observer may
/// subscribe, unsubscribe or trigger further emissions from inside its
/// callback without invalidating the iteration.
pub(crate) struct Sinks<T>(Rc<RefCell<SlabMap<Rc<RefCell<dyn Observer<T>>>>>>);

impl<T: Clone + 'static> Sinks<T> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(SlabMap::new())))
    }

    pub fn subscribe(&self, observer: impl Observer<T>) -> Subscription {
        let entry: Rc<RefCell<dyn Observer<T>>> = Rc::new(RefCell::new(observer));
        let key = self.0.borrow_mut().insert(entry);
        let map = Rc::downgrade(&self.0);
        Subscription::from_fn(move || Self::remove(&map, key))
    }

    pub fn emit(&self, value: T) {
        let snapshot: Vec<Rc<RefCell<dyn Observer<T>>>> =
            self.0.borrow().values().cloned().collect();
        for observer in snapshot {
            observer.borrow_mut().next(value.clone());
        }
    }

    fn remove(map: &Weak<RefCell<SlabMap<Rc<RefCell<dyn Observer<T>>>>>>, key: usize) {
        if let Some(map) = map.upgrade() {
            map.borrow_mut().remove(key);
        }
    }
}
impl<T> Clone for Sinks<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
