//! Worker lifecycle tracking.

/// Lifecycle events delivered by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Populate the current store with the shell.
    Install,
    /// Evict stale stores and claim clients.
    Activate,
    /// Resolve an intercepted request.
    Fetch,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Activate => write!(f, "activate"),
            Self::Fetch => write!(f, "fetch"),
        }
    }
}

/// State of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Created, install not yet started.
    #[default]
    Parsed,
    /// Shell preload in progress.
    Installing,
    /// Shell cached, waiting for activation.
    Installed,
    /// Reconciliation in progress.
    Activating,
    /// Handling fetch events.
    Activated,
    /// Install failed or the worker was replaced.
    Redundant,
}

impl WorkerState {
    /// Check whether an event may be delivered in this state.
    pub fn accepts(&self, event: LifecycleEvent) -> bool {
        matches!(
            (self, event),
            (Self::Parsed, LifecycleEvent::Install)
                | (Self::Installed, LifecycleEvent::Activate)
                | (Self::Activated, LifecycleEvent::Fetch)
        )
    }

    /// Check if fetch events are handled.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, Self::Activated)
    }

    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redundant)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", s)
    }
}

/// Observer trait for lifecycle transitions.
pub trait LifecycleObserver: Send + Sync {
    /// Called after the worker moved from one state to another.
    fn on_transition(&self, from: WorkerState, to: WorkerState);
}
