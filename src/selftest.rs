//! src/selftest.rs
//!
//! The built-in suite the binary runs: one case per harness feature, all of
//! which are expected to pass on a correct harness.

use crate::{
    assert::{assert_array_equals, assert_equals, assert_rejects, assert_true},
    domain::CaseOptions,
    error::Result,
    registry::{CaseBody, HarnessContext},
};
use std::{cell::RefCell, rc::Rc, time::Duration};

pub fn suite() -> Result<HarnessContext> {
    let mut harness = HarnessContext::new();

    harness.register_synchronous("synchronous body passes on return", |_| {
        assert_equals(4, 2 + 2, "arithmetic")
    })?;

    harness.register_callback_async("step_timeout settles a callback case", |t| {
        let finish = t.clone();
        t.step_timeout(
            move || {
                finish.done();
                Ok(())
            },
            5,
        );
        Ok(())
    })?;

    harness.register_callback_async("step_func_done wraps a continuation", |t| {
        let mut on_message = t.step_func_done(|payload: String| assert_equals("ping", payload, "payload"));
        tokio::task::spawn_local(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            on_message("ping".to_string());
        });
        Ok(())
    })?;

    harness.register_promise_based("promise body awaits timers", |_| async {
        let started = tokio::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_true(started.elapsed() >= Duration::from_millis(5), "timer elapsed")
    })?;

    harness.register_promise_based("rejections are observable", |_| async {
        let reason = assert_rejects(async { Err::<(), _>("denied") }, "permission request").await?;
        assert_equals("denied", reason, "rejection reason")
    })?;

    let order = Rc::new(RefCell::new(Vec::new()));
    let observed = order.clone();
    harness.register(
        "cleanups run in registration order",
        CaseOptions::default().with_metadata("area", "cleanup"),
        CaseBody::synchronous(move |ctx| {
            for step in 1..=3 {
                let order = order.clone();
                ctx.add_cleanup(move || order.borrow_mut().push(step))?;
            }
            Ok(())
        }),
    )?;
    harness.register_synchronous("previous case cleaned up in order", move |_| {
        assert_array_equals(&[1, 2, 3], &observed.borrow(), "cleanup order")
    })?;

    Ok(harness)
}
