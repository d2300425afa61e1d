//! Ordered compensating actions for multi-step operations.
//!
//! Container creation touches the registry, the store and the runtime in
//! sequence. Each step registers the action that undoes it; if a later step
//! fails, executing the rollback walks the registered actions in insertion
//! order and erases every trace of the half-created container. On the success
//! path the rollback is simply dropped without running.

use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An ordered list of compensating actions.
#[derive(Default)]
pub struct Rollback {
    actions: Vec<Box<dyn FnOnce() + Send>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Rollback {
    /// Creates an empty rollback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a compensating action.
    ///
    /// Actions must be best-effort: failures inside an action should be logged
    /// by the action itself so the remaining actions still get to run.
    pub fn add(&mut self, action: impl FnOnce() + Send + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Runs every registered action in insertion order, consuming the rollback.
    pub fn execute(mut self) {
        for action in self.actions.drain(..) {
            action();
        }
    }

    /// Returns the number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if no actions have been registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Debug for Rollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rollback")
            .field("actions", &self.actions.len())
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_rollback_executes_actions_in_insertion_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut rollback = Rollback::new();

        for i in 0..3 {
            let order = Arc::clone(&order);
            rollback.add(move || order.lock().unwrap().push(i));
        }

        assert_eq!(rollback.len(), 3);
        rollback.execute();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_rollback_dropped_without_execute_runs_nothing() {
        let ran = Arc::new(Mutex::new(false));
        {
            let mut rollback = Rollback::new();
            let ran = Arc::clone(&ran);
            rollback.add(move || *ran.lock().unwrap() = true);
        }

        assert!(!*ran.lock().unwrap());
    }

    #[test]
    fn test_rollback_empty() {
        let rollback = Rollback::new();
        assert!(rollback.is_empty());
        rollback.execute();
    }
}
