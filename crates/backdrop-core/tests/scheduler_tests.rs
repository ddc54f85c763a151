// Host-side tests for the frame clock and priority-ordered callbacks.

use std::cell::RefCell;
use std::rc::Rc;

use backdrop_core::{priority, FrameClock, FrameScheduler, FrameTime, FRAME_DT_MAX, FRAME_DT_MIN};

fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnMut(&FrameTime)>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = Rc::clone(&log);
    let make = move |name: &'static str| -> Box<dyn FnMut(&FrameTime)> {
        let l = Rc::clone(&l);
        Box::new(move |_: &FrameTime| l.borrow_mut().push(name))
    };
    (log, make)
}

#[test]
fn lower_priority_runs_first() {
    let (log, make) = recorder();
    let mut s = FrameScheduler::new();
    s.register("render", priority::RENDER, make("render"));
    s.register("hit", priority::HIT_TEST, make("hit"));
    s.register("lights", priority::LIGHT_ANIMATION, make("lights"));
    s.register("pointer", priority::POINTER_CORRECTION, make("pointer"));
    s.run(&FrameTime::at(0.0, 0));
    assert_eq!(*log.borrow(), vec!["pointer", "lights", "hit", "render"]);
}

#[test]
fn equal_priorities_keep_registration_order() {
    let (log, make) = recorder();
    let mut s = FrameScheduler::new();
    s.register("a", 5, make("a"));
    s.register("b", 5, make("b"));
    s.register("early", -1, make("early"));
    s.register("c", 5, make("c"));
    assert_eq!(s.labels(), vec!["early", "a", "b", "c"]);
    s.run(&FrameTime::at(0.0, 0));
    assert_eq!(*log.borrow(), vec!["early", "a", "b", "c"]);
}

#[test]
fn unregister_removes_only_that_callback() {
    let (log, make) = recorder();
    let mut s = FrameScheduler::new();
    let a = s.register("a", 0, make("a"));
    s.register("b", 0, make("b"));
    assert!(s.unregister(a));
    assert!(!s.unregister(a));
    assert_eq!(s.len(), 1);
    s.run(&FrameTime::at(0.0, 0));
    assert_eq!(*log.borrow(), vec!["b"]);
}

#[test]
fn callbacks_see_frame_time() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut s = FrameScheduler::new();
    let log = Rc::clone(&seen);
    s.register("t", 0, move |t| log.borrow_mut().push((t.elapsed, t.frame_index)));
    let mut clock = FrameClock::new();
    s.run(&clock.advance(0.1));
    s.run(&clock.advance(0.1));
    let seen = seen.borrow();
    assert_eq!(seen[0].1, 0);
    assert_eq!(seen[1].1, 1);
    assert!((seen[1].0 - 0.2).abs() < 1e-6);
}

#[test]
fn clock_clamps_delta() {
    let mut clock = FrameClock::new();
    assert_eq!(clock.advance(10.0).dt, FRAME_DT_MAX);
    assert_eq!(clock.advance(-1.0).dt, FRAME_DT_MIN);
    let t = clock.tick();
    assert!(t.dt >= FRAME_DT_MIN && t.dt <= FRAME_DT_MAX);
    assert_eq!(t.frame_index, 2);
}
