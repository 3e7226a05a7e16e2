//! Scope-keyed periodic refresh.
//!
//! A [`Poller`] runs one tick immediately and then on every interval for the
//! current scope (the filtering model id, the open run id...). Changing the
//! scope disposes the old timer before the new one starts, so at most one
//! timer is ever live per poller.

use std::time::Duration;

use tracing::debug;

/// Disposer for a running timer. Dropping it disposes too.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn dispose(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Source of repeating timers.
pub trait Scheduler {
    /// Call `tick` every `interval` until the returned subscription is disposed.
    fn every(&self, interval: Duration, tick: Box<dyn FnMut()>) -> Subscription;
}

pub struct Poller<K, S> {
    scheduler: S,
    interval: Duration,
    scope: Option<K>,
    subscription: Option<Subscription>,
}

impl<K, S> Poller<K, S>
where
    K: Clone + PartialEq + std::fmt::Debug + 'static,
    S: Scheduler,
{
    pub fn new(scheduler: S, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
            scope: None,
            subscription: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn scope(&self) -> Option<&K> {
        self.scope.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Poll for `scope`. Re-watching the current scope is a no-op.
    pub fn watch(&mut self, scope: K, mut tick: impl FnMut(&K) + 'static) {
        if self.is_active() && self.scope.as_ref() == Some(&scope) {
            return;
        }
        self.stop();
        debug!(?scope, interval_ms = self.interval.as_millis() as u64, "poll scope changed");

        tick(&scope);
        let key = scope.clone();
        let subscription = self
            .scheduler
            .every(self.interval, Box::new(move || tick(&key)));
        self.scope = Some(scope);
        self.subscription = Some(subscription);
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
        self.scope = None;
    }
}

impl<K, S> Drop for Poller<K, S> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Timers advanced by hand.
    #[derive(Clone, Default)]
    struct ManualScheduler {
        timers: Rc<RefCell<Vec<(usize, Box<dyn FnMut()>)>>>,
        next: Rc<RefCell<usize>>,
    }

    impl ManualScheduler {
        fn fire(&self) {
            for (_, tick) in self.timers.borrow_mut().iter_mut() {
                tick();
            }
        }

        fn live(&self) -> usize {
            self.timers.borrow().len()
        }
    }

    impl Scheduler for ManualScheduler {
        fn every(&self, _interval: Duration, tick: Box<dyn FnMut()>) -> Subscription {
            let id = {
                let mut next = self.next.borrow_mut();
                *next += 1;
                *next
            };
            self.timers.borrow_mut().push((id, tick));
            let timers = Rc::clone(&self.timers);
            Subscription::new(move || timers.borrow_mut().retain(|(t, _)| *t != id))
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn() -> Box<dyn FnMut(&String)>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let make = move || {
            let sink = Rc::clone(&sink);
            Box::new(move |scope: &String| sink.borrow_mut().push(scope.clone()))
                as Box<dyn FnMut(&String)>
        };
        (seen, make)
    }

    #[test]
    fn ticks_immediately_then_on_interval() {
        let scheduler = ManualScheduler::default();
        let mut poller = Poller::new(scheduler.clone(), Duration::from_secs(3));
        let (seen, make) = recorder();

        poller.watch("m1".to_string(), make());
        assert_eq!(*seen.borrow(), ["m1"]);
        scheduler.fire();
        scheduler.fire();
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn same_scope_is_noop() {
        let scheduler = ManualScheduler::default();
        let mut poller = Poller::new(scheduler.clone(), Duration::from_secs(3));
        let (seen, make) = recorder();

        poller.watch("m1".to_string(), make());
        poller.watch("m1".to_string(), make());
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(scheduler.live(), 1);
    }

    #[test]
    fn scope_change_replaces_timer() {
        let scheduler = ManualScheduler::default();
        let mut poller = Poller::new(scheduler.clone(), Duration::from_secs(3));
        let (seen, make) = recorder();

        poller.watch("a".to_string(), make());
        poller.watch("b".to_string(), make());
        assert_eq!(scheduler.live(), 1);
        scheduler.fire();
        assert_eq!(*seen.borrow(), ["a", "b", "b"]);
        assert_eq!(poller.scope().map(String::as_str), Some("b"));
    }

    #[test]
    fn stop_and_drop_dispose() {
        let scheduler = ManualScheduler::default();
        let mut poller = Poller::new(scheduler.clone(), Duration::from_secs(3));
        let (_seen, make) = recorder();

        poller.watch("a".to_string(), make());
        poller.stop();
        assert_eq!(scheduler.live(), 0);
        assert!(!poller.is_active());

        poller.watch("a".to_string(), make());
        assert_eq!(scheduler.live(), 1);
        drop(poller);
        assert_eq!(scheduler.live(), 0);
    }

    #[test]
    fn subscription_disposes_once() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let sub = Subscription::new(move || *counter.borrow_mut() += 1);
        sub.dispose();
        assert_eq!(*calls.borrow(), 1);
        drop(Subscription::noop());
    }
}
