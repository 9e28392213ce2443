//! Generator suspension engine.
//!
//! Rust has no stackful coroutines and the `Rc`-based [`Value`] model is not
//! `Send`, so re-entering a suspended function body at an arbitrary `yield`
//! point cannot be modeled by plain recursive evaluation. This engine hosts
//! each generator body on a dedicated OS thread blocked on a rendezvous
//! channel pair: the thread runs the body with an ordinary recursive
//! tree-walk, and a `yield` expression suspends that *native* call stack by
//! blocking on a channel receive, which is exactly what a real stackful
//! coroutine would do. The async walker (`Interpreter::resolve_awaited`)
//! shares the same tree-walking code path and treats each `await` as a
//! synchronous adoption of a thenable's settled value.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use crate::error::Error;
use crate::runtime::value::Value;
use crate::Result;

enum Request {
    Next(Value),
    Throw(Value),
    Return(Value),
}

enum Reply {
    Yielded(Value),
    Done(Value),
    Thrown(Error),
}

/// At any instant exactly one side is running and the other is blocked in
/// `recv()`; the two never execute concurrently. That strict hand-off is what
/// makes it sound to move `Rc`-based sandbox values across the channel even
/// though neither side is really thread-safe on its own — the compiler can't
/// see the invariant, so this wrapper asserts it by hand.
pub(crate) struct AssertSend<T>(T);
unsafe impl<T> Send for AssertSend<T> {}

/// Wraps non-`Send` captured state (sandbox values, `Environment`, `Rc`s) so
/// it can cross into a generator thread's spawn closure. Sound only because
/// [`GeneratorHandle::spawn`]'s own hand-off discipline guarantees the
/// wrapped value is touched by exactly one thread at a time.
pub(crate) fn pack_for_thread<T>(value: T) -> AssertSend<T> {
    AssertSend(value)
}

pub(crate) fn unpack_for_thread<T>(wrapped: AssertSend<T>) -> T {
    wrapped.0
}

/// Given to the body closure running on the generator's thread; `yield`
/// evaluation calls [`YieldPort::suspend`] to hand control back to the
/// consumer and block until resumed.
pub struct YieldPort {
    to_consumer: Sender<AssertSend<Reply>>,
    from_consumer: Receiver<AssertSend<Request>>,
}

pub enum YieldOutcome {
    /// `next(input)` was called; the yield expression evaluates to `input`.
    Resume(Value),
    /// `throw(err)` was called; the yield expression must raise `err`.
    Throw(Value),
    /// `return(value)` was called; the body must complete immediately as if
    /// `return value;` executed at this point (finally blocks still run).
    Return(Value),
}

impl YieldPort {
    pub fn suspend(&self, value: Value) -> YieldOutcome {
        if self.to_consumer.send(AssertSend(Reply::Yielded(value))).is_err() {
            return YieldOutcome::Return(Value::Undefined);
        }
        match self.from_consumer.recv() {
            Ok(AssertSend(Request::Next(v))) => YieldOutcome::Resume(v),
            Ok(AssertSend(Request::Throw(e))) => YieldOutcome::Throw(e),
            Ok(AssertSend(Request::Return(v))) => YieldOutcome::Return(v),
            Err(_) => YieldOutcome::Return(Value::Undefined),
        }
    }
}

struct Shared {
    to_body: Sender<AssertSend<Request>>,
    from_body: Receiver<AssertSend<Reply>>,
    done: Cell<bool>,
    started: Cell<bool>,
    _thread: Option<JoinHandle<()>>,
}

/// A handle to a suspended generator execution.
/// Cheap to clone; every clone refers to the same underlying thread and
/// channel pair.
#[derive(Clone)]
pub struct GeneratorHandle(Rc<Shared>);

impl GeneratorHandle {
    pub fn ptr_eq(&self, other: &GeneratorHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Spawns the thread but does not run any body code yet — the body only
    /// starts executing on the first `next()` call.
    pub fn spawn<F>(body: F) -> GeneratorHandle
    where
        F: FnOnce(YieldPort) -> Result<Value> + Send + 'static,
    {
        let (to_body_tx, to_body_rx) = mpsc::channel::<AssertSend<Request>>();
        let (from_body_tx, from_body_rx) = mpsc::channel::<AssertSend<Reply>>();

        let reply_tx_for_body = from_body_tx.clone();
        let thread = std::thread::Builder::new()
            .name("sandbox-generator".into())
            .spawn(move || {
                let first = to_body_rx.recv();
                let reply = match first {
                    Ok(AssertSend(Request::Next(_))) => {
                        let port = YieldPort { to_consumer: reply_tx_for_body.clone(), from_consumer: to_body_rx };
                        match body(port) {
                            Ok(v) => Reply::Done(v),
                            Err(Error::GeneratorEarlyReturn(v)) => Reply::Done(v),
                            Err(e) => Reply::Thrown(e),
                        }
                    }
                    Ok(AssertSend(Request::Return(v))) => Reply::Done(v),
                    Ok(AssertSend(Request::Throw(e))) => Reply::Thrown(Error::Thrown(e)),
                    Err(_) => return,
                };
                let _ = reply_tx_for_body.send(AssertSend(reply));
            })
            .expect("failed to spawn generator thread");

        GeneratorHandle(Rc::new(Shared {
            to_body: to_body_tx,
            from_body: from_body_rx,
            done: Cell::new(false),
            started: Cell::new(false),
            _thread: Some(thread),
        }))
    }

    fn exchange(&self, req: Request) -> Result<(Value, bool)> {
        if self.0.done.get() {
            return Ok((Value::Undefined, true));
        }
        self.0.started.set(true);
        tracing::trace!(target: "generator", "resuming generator");
        if self.0.to_body.send(AssertSend(req)).is_err() {
            self.0.done.set(true);
            return Ok((Value::Undefined, true));
        }
        match self.0.from_body.recv() {
            Ok(AssertSend(Reply::Yielded(v))) => {
                tracing::trace!(target: "generator", "generator yielded");
                Ok((v, false))
            }
            Ok(AssertSend(Reply::Done(v))) => {
                tracing::trace!(target: "generator", "generator completed");
                self.0.done.set(true);
                Ok((v, true))
            }
            Ok(AssertSend(Reply::Thrown(e))) => {
                tracing::trace!(target: "generator", "generator thread threw");
                self.0.done.set(true);
                Err(e)
            }
            Err(_) => {
                self.0.done.set(true);
                Err(Error::InternalError("generator thread terminated unexpectedly".to_string()))
            }
        }
    }

    /// `next(input?) -> { value, done }`.
    pub fn next(&self, input: Value) -> Result<(Value, bool)> {
        self.exchange(Request::Next(input))
    }

    /// `return(value) -> { value, done: true }`; terminates the generator.
    pub fn return_(&self, value: Value) -> Result<(Value, bool)> {
        if self.0.done.get() || !self.0.started.get() {
            self.0.done.set(true);
            return Ok((value, true));
        }
        self.exchange(Request::Return(value))
    }

    /// `throw(err)`: injects an error at the suspended `yield` point. If the
    /// generator never started or has already finished, the error propagates
    /// to the caller directly, matching `throw err` at the call site.
    pub fn throw(&self, err: Value) -> Result<(Value, bool)> {
        if self.0.done.get() || !self.0.started.get() {
            self.0.done.set(true);
            return Err(Error::Thrown(err));
        }
        self.exchange(Request::Throw(err))
    }

    pub fn is_done(&self) -> bool {
        self.0.done.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_then_completes() {
        let gen = GeneratorHandle::spawn(|port| {
            match port.suspend(Value::Number(1.0)) {
                YieldOutcome::Resume(_) => {}
                YieldOutcome::Throw(e) => return Err(Error::Thrown(e)),
                YieldOutcome::Return(v) => return Err(Error::GeneratorEarlyReturn(v)),
            }
            Ok(Value::Number(2.0))
        });

        let (v1, done1) = gen.next(Value::Undefined).unwrap();
        assert_eq!(v1, Value::Number(1.0));
        assert!(!done1);

        let (v2, done2) = gen.next(Value::Undefined).unwrap();
        assert_eq!(v2, Value::Number(2.0));
        assert!(done2);

        let (v3, done3) = gen.next(Value::Undefined).unwrap();
        assert_eq!(v3, Value::Undefined);
        assert!(done3);
    }

    #[test]
    fn independent_handles_do_not_interfere() {
        let make = || {
            GeneratorHandle::spawn(|port| {
                let mut count = 0.0;
                loop {
                    match port.suspend(Value::Number(count)) {
                        YieldOutcome::Resume(_) => count += 1.0,
                        YieldOutcome::Throw(e) => return Err(Error::Thrown(e)),
                        YieldOutcome::Return(v) => return Err(Error::GeneratorEarlyReturn(v)),
                    }
                    if count > 2.0 {
                        return Ok(Value::Number(count));
                    }
                }
            })
        };
        let a = make();
        let b = make();
        assert_eq!(a.next(Value::Undefined).unwrap().0, Value::Number(0.0));
        assert_eq!(a.next(Value::Undefined).unwrap().0, Value::Number(1.0));
        assert_eq!(b.next(Value::Undefined).unwrap().0, Value::Number(0.0));
    }

    #[test]
    fn external_return_short_circuits() {
        let gen = GeneratorHandle::spawn(|port| {
            match port.suspend(Value::Number(1.0)) {
                YieldOutcome::Resume(_) => Ok(Value::Number(99.0)),
                YieldOutcome::Throw(e) => Err(Error::Thrown(e)),
                YieldOutcome::Return(v) => Err(Error::GeneratorEarlyReturn(v)),
            }
        });
        gen.next(Value::Undefined).unwrap();
        let (v, done) = gen.return_(Value::Number(7.0)).unwrap();
        assert_eq!(v, Value::Number(7.0));
        assert!(done);
    }
}
