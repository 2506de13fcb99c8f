use std::{error::Error, rc::Rc};

use assert_call::{call, CallRecorder};

use super::subscribe_isolated;
use crate::{Action, ActionSource, DynObserver, Feed, Observer, SourceEvent, Subscription};

fn test_error() -> Rc<dyn Error> {
    Rc::new(std::fmt::Error)
}

fn recording_observer(tag: &'static str) -> DynObserver<SourceEvent<i32>> {
    (move |event: SourceEvent<i32>| match event {
        SourceEvent::Next(a) => call!("{tag} next {}", a.payload),
        SourceEvent::Error(_) => call!("{tag} error"),
        SourceEvent::Complete => call!("{tag} complete"),
    })
    .into_dyn()
}

#[test]
fn feed_multicasts_to_all_subscribers() {
    let mut cr = CallRecorder::new();
    let feed = Feed::new();
    let _a = feed.subscribe(recording_observer("a"));
    let _b = feed.subscribe(recording_observer("b"));

    feed.next(Action::new("n", 1));
    cr.verify(["a next 1", "b next 1"]);
}

#[test]
fn feed_unsubscribe_stops_delivery() {
    let mut cr = CallRecorder::new();
    let feed = Feed::new();
    let s = feed.subscribe(recording_observer("a"));
    feed.next(Action::new("n", 1));
    cr.verify("a next 1");

    drop(s);
    feed.next(Action::new("n", 2));
    cr.verify(());
}

#[test]
fn feed_is_terminal_after_complete() {
    let mut cr = CallRecorder::new();
    let feed = Feed::new();
    let _a = feed.subscribe(recording_observer("a"));

    feed.complete();
    cr.verify("a complete");

    feed.next(Action::new("n", 1));
    feed.complete();
    feed.error(test_error());
    cr.verify(());
}

#[test]
fn feed_is_terminal_after_error() {
    let mut cr = CallRecorder::new();
    let feed = Feed::new();
    let _a = feed.subscribe(recording_observer("a"));

    feed.error(test_error());
    cr.verify("a error");

    feed.next(Action::new("n", 1));
    cr.verify(());
}

#[test]
fn subscribe_after_terminal_observes_the_terminal_event() {
    let mut cr = CallRecorder::new();
    let feed = Feed::new();
    feed.complete();

    let _a = feed.subscribe(recording_observer("a"));
    cr.verify("a complete");
}

/// Replays a fixed event sequence to every subscriber.
struct Burst(Vec<SourceEvent<i32>>);
impl ActionSource<i32> for Burst {
    fn subscribe(&self, mut observer: DynObserver<SourceEvent<i32>>) -> Subscription {
        for event in &self.0 {
            observer.next(event.clone());
        }
        Subscription::empty()
    }
}

fn next(payload: i32) -> SourceEvent<i32> {
    SourceEvent::Next(Rc::new(Action::new("n", payload)))
}

#[test]
fn isolated_forwards_actions() {
    let mut cr = CallRecorder::new();
    let source = Burst(vec![next(1), next(2)]);
    let _s = subscribe_isolated(&source, |a| call!("{}", a.payload));
    cr.verify(["1", "2"]);
}

#[test]
fn isolated_silences_the_branch_after_error() {
    let mut cr = CallRecorder::new();
    let source = Burst(vec![next(1), SourceEvent::Error(test_error()), next(2)]);
    let _s = subscribe_isolated(&source, |a| call!("{}", a.payload));
    cr.verify("1");
}

#[test]
fn isolated_silences_the_branch_after_complete() {
    let mut cr = CallRecorder::new();
    let source = Burst(vec![SourceEvent::Complete, next(1)]);
    let _s = subscribe_isolated(&source, |a| call!("{}", a.payload));
    cr.verify(());
}
