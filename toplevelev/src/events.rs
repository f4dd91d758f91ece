use crate::id::ToplevelId;
use crate::toplevel::{OutputId, StateFlags, ToplevelSnapshot};

/// Events delivered to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToplevelEvent {
    /// A new toplevel was announced; nothing is committed for it yet
    Created(ToplevelId),
    TitleChanged(ToplevelId, String),
    AppIdChanged(ToplevelId, String),
    OutputEntered(ToplevelId, OutputId),
    OutputLeft(ToplevelId, OutputId),
    StateChanged(ToplevelId, StateFlags),
    /// A `done` event applied the pending attributes
    Committed(ToplevelSnapshot),
    /// The toplevel is gone; its id is retired
    Closed(ToplevelId),
    /// The manager will not announce new toplevels anymore
    Finished,
    /// A command named an id that is closed or never existed
    UnknownToplevel(ToplevelCommand),
}

/// Commands the host can issue against a toplevel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToplevelCommand {
    /// Focus the window, needs a seat
    Activate(ToplevelId),
    /// Ask the window to close, the client may refuse
    Close(ToplevelId),
    /// Minimize
    Hide(ToplevelId),
    /// Unminimize
    Show(ToplevelId),
}

impl ToplevelCommand {
    pub fn id(&self) -> ToplevelId {
        match *self {
            ToplevelCommand::Activate(id)
            | ToplevelCommand::Close(id)
            | ToplevelCommand::Hide(id)
            | ToplevelCommand::Show(id) => id,
        }
    }
}

/// Receiver of [`ToplevelEvent`]s
///
/// Called from inside dispatch, so implementations must return quickly.
pub trait ToplevelHandler {
    fn toplevel_event(&mut self, event: ToplevelEvent);
}

impl<F> ToplevelHandler for F
where
    F: FnMut(ToplevelEvent),
{
    fn toplevel_event(&mut self, event: ToplevelEvent) {
        self(event)
    }
}
