//! Bookkeeping of every open toplevel.
//!
//! The tracker owns the arena of handles, feeds decoded handle events through
//! each handle's state machine and reports the results to a [`ToplevelHandler`].
//! It knows nothing about the wire, so the protocol object type `P` is generic.

use std::collections::HashSet;

use crate::events::{ToplevelEvent, ToplevelHandler};
use crate::id::{Arena, ToplevelId};
use crate::toplevel::{
    HandleEvent, HandlePhase, OutputId, ToplevelHandle, ToplevelSnapshot, Transition,
};

#[derive(Debug)]
pub struct ToplevelTracker<P> {
    handles: Arena<ToplevelHandle<P>>,
    finished: bool,
    remembered: Option<ToplevelId>,
    ignored_app_ids: HashSet<String>,
}

impl<P> Default for ToplevelTracker<P> {
    fn default() -> Self {
        Self {
            handles: Arena::default(),
            finished: false,
            remembered: None,
            ignored_app_ids: HashSet::new(),
        }
    }
}

impl<P> ToplevelTracker<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_ignored_app_ids(&mut self, app_ids: HashSet<String>) {
        self.ignored_app_ids = app_ids;
    }

    /// Start tracking a freshly announced handle
    pub(crate) fn announce<H: ToplevelHandler>(&mut self, proxy: P, handler: &mut H) -> ToplevelId {
        if self.finished {
            log::warn!("toplevel announced after the manager finished");
        }
        let id = self.handles.insert(ToplevelHandle::new(proxy));
        log::debug!("new toplevel {id}");
        handler.toplevel_event(ToplevelEvent::Created(id));
        id
    }

    /// Feed one handle event through the state machine
    ///
    /// Returns the protocol object once the handle is closed, so the caller
    /// can destroy it.
    pub(crate) fn handle_event<H: ToplevelHandler>(
        &mut self,
        id: ToplevelId,
        event: HandleEvent,
        handler: &mut H,
    ) -> Option<P> {
        let Some(handle) = self.handles.get_mut(id) else {
            log::warn!("event {event:?} for unknown toplevel {id}, ignoring");
            return None;
        };
        let outbound = match &event {
            HandleEvent::Title(title) => Some(ToplevelEvent::TitleChanged(id, title.clone())),
            HandleEvent::AppId(app_id) => Some(ToplevelEvent::AppIdChanged(id, app_id.clone())),
            HandleEvent::OutputEnter(output) => Some(ToplevelEvent::OutputEntered(id, *output)),
            HandleEvent::OutputLeave(output) => Some(ToplevelEvent::OutputLeft(id, *output)),
            HandleEvent::State(states) => Some(ToplevelEvent::StateChanged(id, *states)),
            HandleEvent::Done | HandleEvent::Closed => None,
        };
        match handle.apply(id, event) {
            Transition::Updated => {
                if let Some(outbound) = outbound {
                    handler.toplevel_event(outbound);
                }
                None
            }
            Transition::Committed(snapshot) => {
                log::trace!(
                    "toplevel {id}: done, title={}, app_id={}, states={}",
                    snapshot.title,
                    snapshot.app_id,
                    snapshot.states
                );
                handler.toplevel_event(ToplevelEvent::Committed(snapshot));
                None
            }
            Transition::Closed => {
                log::debug!("toplevel {id} closed");
                let handle = self.handles.remove(id)?;
                if self.remembered == Some(id) {
                    self.remembered = None;
                }
                handler.toplevel_event(ToplevelEvent::Closed(id));
                Some(handle.proxy)
            }
            Transition::Ignored => {
                log::warn!("toplevel {id} received an event after closing");
                None
            }
        }
    }

    /// Drop an output whose global went away from every handle still on it
    ///
    /// Runs as an `output_leave` for each of them; the change shows in the
    /// next committed snapshot.
    pub(crate) fn forget_output<H: ToplevelHandler>(
        &mut self,
        output: OutputId,
        handler: &mut H,
    ) {
        let affected: Vec<ToplevelId> = self
            .handles
            .iter()
            .filter(|(_, handle)| handle.has_pending_output(output))
            .map(|(id, _)| id)
            .collect();
        for id in affected {
            log::debug!("toplevel {id} left removed output {output}");
            self.handle_event(id, HandleEvent::OutputLeave(output), handler);
        }
    }

    pub(crate) fn finish<H: ToplevelHandler>(&mut self, handler: &mut H) {
        if self.finished {
            log::warn!("manager finished twice");
            return;
        }
        log::debug!("toplevel manager finished, {} toplevels open", self.len());
        self.finished = true;
        handler.toplevel_event(ToplevelEvent::Finished);
    }

    /// No new toplevels will be announced
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of open toplevels, committed or not
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ToplevelId) -> bool {
        self.handles.get(id).is_some()
    }

    /// Phase of an open toplevel; closed ones are already gone and give `None`
    pub fn phase(&self, id: ToplevelId) -> Option<HandlePhase> {
        self.handles.get(id).map(ToplevelHandle::phase)
    }

    pub(crate) fn proxy(&self, id: ToplevelId) -> Option<&P> {
        self.handles.get(id).map(|handle| &handle.proxy)
    }

    /// Last committed snapshot of an open toplevel
    pub fn get(&self, id: ToplevelId) -> Option<&ToplevelSnapshot> {
        self.handles.get(id)?.committed()
    }

    /// All toplevels that committed at least once
    pub fn toplevels(&self) -> impl Iterator<Item = &ToplevelSnapshot> {
        self.handles.iter().filter_map(|(_, handle)| handle.committed())
    }

    /// Committed toplevels whose app id is not ignored
    pub fn visible(&self) -> impl Iterator<Item = &ToplevelSnapshot> {
        self.toplevels()
            .filter(|snapshot| !self.ignored_app_ids.contains(&snapshot.app_id))
    }

    /// The toplevel currently holding focus
    pub fn active(&self) -> Option<&ToplevelSnapshot> {
        self.toplevels().find(|snapshot| snapshot.is_activated())
    }

    pub fn find_by_title(&self, title: &str) -> Option<&ToplevelSnapshot> {
        self.toplevels().find(|snapshot| snapshot.title == title)
    }

    /// Store the active toplevel so it can be refocused later
    pub fn remember_active(&mut self) -> Option<ToplevelId> {
        let active = self.active().map(|snapshot| snapshot.id);
        if active.is_some() {
            self.remembered = active;
        }
        active
    }

    /// The remembered toplevel, if it is still open
    pub fn remembered(&self) -> Option<ToplevelId> {
        self.remembered.filter(|id| self.contains(*id))
    }
}
