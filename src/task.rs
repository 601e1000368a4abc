//! Deferred task references and the eager-configuration bridge.
//!
//! The build engine hands out lazily-created task handles: a
//! [`DeferredTask`] holds a factory that runs the first time anything needs
//! the task, and never again. Most engine APIs configure through the handle
//! without forcing it, but some surfaces (native compile/link units among
//! them) only expose an eagerly-materializing reference. [`configure`] is the
//! adapter for those: it forces materialization exactly once, applies the
//! action synchronously at the call site, and adds no further deferral.

use std::sync::Mutex;

struct Inner<T> {
    factory: Option<Box<dyn FnOnce() -> T + Send>>,
    task: Option<T>,
    realizations: usize,
}

/// A task handle whose task is created on first access.
pub struct DeferredTask<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> DeferredTask<T> {
    pub fn new(factory: impl FnOnce() -> T + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                factory: Some(Box::new(factory)),
                task: None,
                realizations: 0,
            }),
        }
    }

    /// Run `f` against the task, materializing it first if needed.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut inner = self.inner.lock().expect("deferred task lock poisoned");
        if inner.task.is_none()
            && let Some(factory) = inner.factory.take()
        {
            inner.task = Some(factory());
            inner.realizations += 1;
        }
        match inner.task.as_mut() {
            Some(task) => f(task),
            None => unreachable!("deferred task has neither factory nor task"),
        }
    }

    pub fn is_realized(&self) -> bool {
        self.inner
            .lock()
            .expect("deferred task lock poisoned")
            .task
            .is_some()
    }

    /// How many times the factory has run. At most one, by construction; the
    /// counter exists so that contract stays observable.
    pub fn realize_count(&self) -> usize {
        self.inner
            .lock()
            .expect("deferred task lock poisoned")
            .realizations
    }
}

/// Post-configure a task that is only reachable through a deferred reference.
///
/// The action runs exactly once, synchronously, at the point of this call.
/// This is a deliberate escape hatch for APIs that cannot defer configuration
/// further, not a new laziness mechanism: repeated calls re-run their own
/// actions but never re-materialize the task.
pub fn configure<T, R>(task: &DeferredTask<T>, action: impl FnOnce(&mut T) -> R) -> R {
    task.with(action)
}
