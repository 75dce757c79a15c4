// Wed Oct 14 2026 - Alex

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Initializing,
    Valid,
    Invalid,
}

/// One-shot initialization guard.
///
/// Misuse (a second `begin`, or reading data that is not `Valid`) is a bug in
/// the caller and panics rather than returning an error.
#[derive(Debug)]
pub struct InitializationState {
    state: State,
}

impl Default for InitializationState {
    fn default() -> Self {
        Self::new()
    }
}

impl InitializationState {
    pub fn new() -> Self {
        Self {
            state: State::Uninitialized,
        }
    }

    pub fn begin(&mut self) {
        assert_eq!(
            self.state,
            State::Uninitialized,
            "initialize called more than once"
        );
        self.state = State::Initializing;
    }

    pub fn set_valid(&mut self) {
        assert_eq!(self.state, State::Initializing);
        self.state = State::Valid;
    }

    pub fn set_invalid(&mut self) {
        assert_eq!(self.state, State::Initializing);
        self.state = State::Invalid;
    }

    pub fn is_valid(&self) -> bool {
        self.state == State::Valid
    }

    #[track_caller]
    pub fn assert_valid(&self) {
        assert!(
            self.state == State::Valid,
            "snapshot accessed in state {:?}",
            self.state
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut state = InitializationState::new();
        assert!(!state.is_valid());
        state.begin();
        state.set_valid();
        state.assert_valid();
    }

    #[test]
    #[should_panic(expected = "initialize called more than once")]
    fn test_double_begin_panics() {
        let mut state = InitializationState::new();
        state.begin();
        state.set_invalid();
        state.begin();
    }

    #[test]
    #[should_panic(expected = "snapshot accessed in state Invalid")]
    fn test_invalid_access_panics() {
        let mut state = InitializationState::new();
        state.begin();
        state.set_invalid();
        state.assert_valid();
    }
}
