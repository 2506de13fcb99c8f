use std::rc::Rc;

use assert_call::{call, CallRecorder};

use super::{ReduceStage, TransitionHook};
use crate::{sinks::Sinks, Action, ReplayCell, Subscription};

fn add(payload: i64) -> Rc<Action<i64>> {
    Rc::new(Action::new("add", payload))
}

fn adder(cell: &ReplayCell<i64>, hook: Option<TransitionHook<i64, i64>>) -> (ReduceStage<i64, i64>, Subscription) {
    let applied = Sinks::new();
    let s = applied.subscribe(|a: Rc<Action<i64>>| call!("applied {}", a.payload));
    let stage = ReduceStage::new(
        cell.clone(),
        Rc::new(|s: &Rc<i64>, a: &Action<i64>| {
            if a.payload == 0 {
                s.clone()
            } else {
                Rc::new(**s + a.payload)
            }
        }),
        applied,
        hook,
        {
            let cell = cell.clone();
            move |state| {
                call!("out {state}");
                cell.write(state);
            }
        },
    );
    (stage, s)
}

#[test]
fn changed_state_is_forwarded() {
    let mut cr = CallRecorder::new();
    let cell = ReplayCell::new(0);
    let (stage, _s) = adder(&cell, None);

    stage.process(add(1));
    cr.verify(["applied 1", "out 1"]);
    assert_eq!(*cell.read(), 1);

    stage.process(add(2));
    cr.verify(["applied 2", "out 3"]);
    assert_eq!(*cell.read(), 3);
}

#[test]
fn identity_result_is_not_forwarded() {
    let mut cr = CallRecorder::new();
    let cell = ReplayCell::new(5);
    let (stage, _s) = adder(&cell, None);

    stage.process(add(0));
    cr.verify("applied 0");
    assert_eq!(*cell.read(), 5);
}

#[test]
fn hook_runs_for_every_action() {
    let mut cr = CallRecorder::new();
    let cell = ReplayCell::new(0);
    let hook: TransitionHook<i64, i64> = Rc::new(|t| {
        call!(
            "hook {:?}->{} by {:?}",
            t.old.as_deref(),
            t.new,
            t.action.as_ref().map(|a| a.payload)
        )
    });
    let (stage, _s) = adder(&cell, Some(hook));

    stage.process(add(1));
    cr.verify(["applied 1", "hook Some(0)->1 by Some(1)", "out 1"]);

    stage.process(add(0));
    cr.verify(["applied 0", "hook Some(1)->1 by Some(0)"]);
}

#[test]
fn result_already_current_at_filter_time_is_dropped() {
    let mut cr = CallRecorder::new();
    let cell = ReplayCell::new(0);
    // The hook stands in for the other pipeline advancing the cell between
    // reduction and the output filter.
    let hook: TransitionHook<i64, i64> = {
        let cell = cell.clone();
        Rc::new(move |t| cell.write(t.new.clone()))
    };
    let (stage, _s) = adder(&cell, Some(hook));

    stage.process(add(1));
    cr.verify("applied 1");
    assert_eq!(*cell.read(), 1);
}

#[test]
fn old_state_is_read_fresh_per_action() {
    let mut cr = CallRecorder::new();
    let cell = ReplayCell::new(0);
    let hook: TransitionHook<i64, i64> =
        Rc::new(|t| call!("hook {:?}->{}", t.old.as_deref(), t.new));
    let (stage, _s) = adder(&cell, Some(hook));

    stage.process(add(1));
    // A write from elsewhere; the next transition's `old` must observe it.
    cell.write(Rc::new(10));
    stage.process(add(1));
    cr.verify([
        "applied 1",
        "hook Some(0)->1",
        "out 1",
        "applied 1",
        "hook Some(10)->11",
        "out 11",
    ]);
}
