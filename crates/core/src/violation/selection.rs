use std::fmt;
use std::sync::Arc;

/// Host facility that toggles text selection for the whole session surface.
pub trait SelectionControl: Send + Sync {
    fn set_selection_enabled(&self, enabled: bool);
}

/// Text selection stays disabled while this lock is held.
///
/// Released explicitly with `release`, or on drop if the holder never got
/// that far.
pub struct SelectionLock {
    control: Arc<dyn SelectionControl>,
    released: bool,
}

impl SelectionLock {
    #[must_use]
    pub fn acquire(control: Arc<dyn SelectionControl>) -> Self {
        control.set_selection_enabled(false);
        Self {
            control,
            released: false,
        }
    }

    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if !self.released {
            self.released = true;
            self.control.set_selection_enabled(true);
        }
    }
}

impl Drop for SelectionLock {
    fn drop(&mut self) {
        self.restore();
    }
}

impl fmt::Debug for SelectionLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionLock")
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<bool>>,
    }

    impl SelectionControl for Recorder {
        fn set_selection_enabled(&self, enabled: bool) {
            self.calls.lock().unwrap().push(enabled);
        }
    }

    #[test]
    fn release_restores_selection_once() {
        let recorder = Arc::new(Recorder::default());
        let lock = SelectionLock::acquire(recorder.clone());
        lock.release();
        assert_eq!(*recorder.calls.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn drop_restores_selection() {
        let recorder = Arc::new(Recorder::default());
        {
            let _lock = SelectionLock::acquire(recorder.clone());
            assert_eq!(*recorder.calls.lock().unwrap(), vec![false]);
        }
        assert_eq!(*recorder.calls.lock().unwrap(), vec![false, true]);
    }
}
