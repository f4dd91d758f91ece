//! Per-toplevel attribute batching.
//!
//! Attribute events land in a pending buffer. A `done` event copies the
//! pending buffer into the committed one, which is the only buffer the host
//! ever sees. A `closed` event ends the handle from any phase.

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;

use crate::id::ToplevelId;

bitflags! {
    /// State of a toplevel as reported by the compositor
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateFlags: u8 {
        const MAXIMIZED = 1;
        const MINIMIZED = 1 << 1;
        const ACTIVATED = 1 << 2;
        const FULLSCREEN = 1 << 3;
    }
}

impl StateFlags {
    /// Names of the set flags, in declaration order
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl fmt::Display for StateFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("|"))
    }
}

/// Opaque reference to an output, only used to correlate enter and leave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u32);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ToplevelAttributes {
    pub title: String,
    pub app_id: String,
    pub outputs: BTreeSet<OutputId>,
    pub states: StateFlags,
}

/// The committed view of a toplevel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToplevelSnapshot {
    pub id: ToplevelId,
    pub title: String,
    pub app_id: String,
    pub outputs: BTreeSet<OutputId>,
    pub states: StateFlags,
}

impl ToplevelSnapshot {
    fn new(id: ToplevelId, attributes: &ToplevelAttributes) -> Self {
        Self {
            id,
            title: attributes.title.clone(),
            app_id: attributes.app_id.clone(),
            outputs: attributes.outputs.clone(),
            states: attributes.states,
        }
    }

    /// Title, or app id for windows without one
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.app_id
        } else {
            &self.title
        }
    }

    pub fn is_activated(&self) -> bool {
        self.states.contains(StateFlags::ACTIVATED)
    }

    pub fn is_minimized(&self) -> bool {
        self.states.contains(StateFlags::MINIMIZED)
    }
}

/// One event on a toplevel handle, decoded from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleEvent {
    Title(String),
    AppId(String),
    OutputEnter(OutputId),
    OutputLeave(OutputId),
    State(StateFlags),
    Done,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePhase {
    /// Announced, nothing committed yet
    Pending,
    Committed,
    /// Held only between `closed` and the handle's removal from the tracker,
    /// so [`crate::ToplevelTracker::phase`] reports `None` rather than this.
    Closed,
}

/// What applying an event did to the handle
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Updated,
    Committed(ToplevelSnapshot),
    Closed,
    /// Event arrived after `closed`
    Ignored,
}

/// A toplevel and the protocol object used to send it requests
#[derive(Debug)]
pub(crate) struct ToplevelHandle<P> {
    pub proxy: P,
    phase: HandlePhase,
    pending: ToplevelAttributes,
    committed: Option<ToplevelSnapshot>,
}

impl<P> ToplevelHandle<P> {
    pub fn new(proxy: P) -> Self {
        Self {
            proxy,
            phase: HandlePhase::Pending,
            pending: ToplevelAttributes::default(),
            committed: None,
        }
    }

    pub fn phase(&self) -> HandlePhase {
        self.phase
    }

    pub fn committed(&self) -> Option<&ToplevelSnapshot> {
        self.committed.as_ref()
    }

    pub fn has_pending_output(&self, output: OutputId) -> bool {
        self.pending.outputs.contains(&output)
    }

    pub fn apply(&mut self, id: ToplevelId, event: HandleEvent) -> Transition {
        if self.phase == HandlePhase::Closed {
            return Transition::Ignored;
        }
        match event {
            HandleEvent::Title(title) => self.pending.title = title,
            HandleEvent::AppId(app_id) => self.pending.app_id = app_id,
            HandleEvent::OutputEnter(output) => {
                self.pending.outputs.insert(output);
            }
            HandleEvent::OutputLeave(output) => {
                self.pending.outputs.remove(&output);
            }
            HandleEvent::State(states) => self.pending.states = states,
            HandleEvent::Done => {
                let snapshot = ToplevelSnapshot::new(id, &self.pending);
                self.committed = Some(snapshot.clone());
                self.phase = HandlePhase::Committed;
                return Transition::Committed(snapshot);
            }
            HandleEvent::Closed => {
                self.phase = HandlePhase::Closed;
                return Transition::Closed;
            }
        }
        Transition::Updated
    }
}
