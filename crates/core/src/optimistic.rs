//! Optimistic local mutation with rollback.
//!
//! A change is applied to local state first, the remote commit is attempted,
//! and on rejection the inverse is applied by restoring the snapshot:
//!
//! ```
//! use tdl_core::optimistic::Pending;
//!
//! let mut checked = false;
//! let pending = Pending::apply(&mut checked, |state| *state = true);
//! assert!(checked);
//! // the server said no
//! pending.rollback(&mut checked);
//! assert!(!checked);
//! ```

#[must_use = "a pending change must be committed or rolled back"]
#[derive(Debug)]
pub struct Pending<S: Clone> {
    before: S,
}

impl<S: Clone> Pending<S> {
    /// Snapshot `state`, then mutate it in place.
    pub fn apply<F>(state: &mut S, change: F) -> Self
    where
        F: FnOnce(&mut S),
    {
        let before = state.clone();
        change(state);
        Self { before }
    }

    pub fn before(&self) -> &S {
        &self.before
    }

    /// The remote side accepted the change; keep it.
    pub fn commit(self) {}

    /// The remote side rejected the change; restore the snapshot.
    pub fn rollback(self, state: &mut S) {
        *state = self.before;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_keeps_the_change() {
        let mut title = String::from("draft");
        let pending = Pending::apply(&mut title, |t| t.push_str(" v2"));
        assert_eq!(pending.before(), "draft");
        pending.commit();
        assert_eq!(title, "draft v2");
    }

    #[test]
    fn rollback_restores_every_field() {
        let mut state = (true, 3u8);
        let pending = Pending::apply(&mut state, |s| {
            s.0 = false;
            s.1 = 9;
        });
        pending.rollback(&mut state);
        assert_eq!(state, (true, 3));
    }
}
