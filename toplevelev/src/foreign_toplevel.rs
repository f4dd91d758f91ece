//! zwlr_foreign_toplevel_management_unstable_v1 client glue
//!
//! Decodes manager and handle events into [`HandleEvent`]s and hands them to
//! the state through [`ForeignToplevelState`]. The listener of a new handle is
//! its object data, which is installed in `event_created_child` before the
//! handle's first event can be dispatched.

use std::sync::OnceLock;

use wayland_client::{Connection, Dispatch, Proxy, QueueHandle};
use wayland_protocols_wlr::foreign_toplevel::v1::client::{
    zwlr_foreign_toplevel_handle_v1::{self, ZwlrForeignToplevelHandleV1},
    zwlr_foreign_toplevel_manager_v1::{self, ZwlrForeignToplevelManagerV1},
};

use crate::id::ToplevelId;
use crate::toplevel::{HandleEvent, OutputId, StateFlags};

/// User data for the manager
#[derive(Debug, Clone, Default)]
pub struct ForeignToplevelManagerData;

/// User data for toplevel handles, set once the handle is tracked
#[derive(Debug, Default)]
pub struct ToplevelHandleUserData {
    id: OnceLock<ToplevelId>,
}

impl ToplevelHandleUserData {
    pub fn id(&self) -> Option<ToplevelId> {
        self.id.get().copied()
    }
}

/// Access the dispatch glue needs on the state
pub trait ForeignToplevelState {
    /// Start tracking a new handle
    fn toplevel_created(&mut self, handle: ZwlrForeignToplevelHandleV1) -> ToplevelId;

    /// Apply one event; returns the handle once it is closed
    fn toplevel_handle_event(
        &mut self,
        id: ToplevelId,
        event: HandleEvent,
    ) -> Option<ZwlrForeignToplevelHandleV1>;

    fn toplevel_manager_finished(&mut self);
}

/// Decode the `state` array of a handle
///
/// The array holds native-endian u32 values; unknown values are skipped.
pub fn decode_states(raw: &[u8]) -> StateFlags {
    use zwlr_foreign_toplevel_handle_v1::State;

    raw.chunks_exact(4)
        .filter_map(|chunk| <[u8; 4]>::try_from(chunk).ok())
        .map(u32::from_ne_bytes)
        .fold(StateFlags::empty(), |flags, value| {
            match State::try_from(value) {
                Ok(State::Maximized) => flags | StateFlags::MAXIMIZED,
                Ok(State::Minimized) => flags | StateFlags::MINIMIZED,
                Ok(State::Activated) => flags | StateFlags::ACTIVATED,
                Ok(State::Fullscreen) => flags | StateFlags::FULLSCREEN,
                _ => {
                    log::trace!("unknown toplevel state value {value}");
                    flags
                }
            }
        })
}

/// Blanket implementation for foreign toplevel manager dispatch
impl<D> Dispatch<ZwlrForeignToplevelManagerV1, ForeignToplevelManagerData, D> for ()
where
    D: Dispatch<ZwlrForeignToplevelManagerV1, ForeignToplevelManagerData>
        + Dispatch<ZwlrForeignToplevelHandleV1, ToplevelHandleUserData>
        + ForeignToplevelState
        + 'static,
{
    fn event(
        state: &mut D,
        _proxy: &ZwlrForeignToplevelManagerV1,
        event: zwlr_foreign_toplevel_manager_v1::Event,
        _data: &ForeignToplevelManagerData,
        _conn: &Connection,
        _qhandle: &QueueHandle<D>,
    ) {
        match event {
            zwlr_foreign_toplevel_manager_v1::Event::Toplevel { toplevel } => {
                log::trace!(
                    "zwlr_foreign_toplevel: new toplevel handle {}",
                    toplevel.id().protocol_id()
                );
                let Some(data) = toplevel.data::<ToplevelHandleUserData>() else {
                    log::warn!("toplevel handle without user data, ignoring");
                    return;
                };
                let data_slot = &data.id;
                let id = state.toplevel_created(toplevel.clone());
                if data_slot.set(id).is_err() {
                    log::warn!("toplevel handle announced twice, keeping the first id");
                }
            }
            zwlr_foreign_toplevel_manager_v1::Event::Finished => {
                state.toplevel_manager_finished();
            }
            _ => {}
        }
    }

    fn event_created_child(
        opcode: u16,
        qhandle: &QueueHandle<D>,
    ) -> std::sync::Arc<dyn wayland_client::backend::ObjectData> {
        match opcode {
            zwlr_foreign_toplevel_manager_v1::EVT_TOPLEVEL_OPCODE => qhandle
                .make_data::<ZwlrForeignToplevelHandleV1, _>(ToplevelHandleUserData::default()),
            _ => panic!("Unknown opcode in event_created_child: {}", opcode),
        }
    }
}

/// Blanket implementation for toplevel handle dispatch
impl<D> Dispatch<ZwlrForeignToplevelHandleV1, ToplevelHandleUserData, D> for ()
where
    D: Dispatch<ZwlrForeignToplevelHandleV1, ToplevelHandleUserData> + ForeignToplevelState,
{
    fn event(
        state: &mut D,
        proxy: &ZwlrForeignToplevelHandleV1,
        event: zwlr_foreign_toplevel_handle_v1::Event,
        data: &ToplevelHandleUserData,
        _conn: &Connection,
        _qhandle: &QueueHandle<D>,
    ) {
        let Some(id) = data.id() else {
            log::warn!(
                "event on untracked toplevel handle {}",
                proxy.id().protocol_id()
            );
            return;
        };

        let event = match event {
            zwlr_foreign_toplevel_handle_v1::Event::Title { title } => HandleEvent::Title(title),
            zwlr_foreign_toplevel_handle_v1::Event::AppId { app_id } => {
                HandleEvent::AppId(app_id)
            }
            zwlr_foreign_toplevel_handle_v1::Event::OutputEnter { output } => {
                HandleEvent::OutputEnter(OutputId(output.id().protocol_id()))
            }
            zwlr_foreign_toplevel_handle_v1::Event::OutputLeave { output } => {
                HandleEvent::OutputLeave(OutputId(output.id().protocol_id()))
            }
            zwlr_foreign_toplevel_handle_v1::Event::State { state: raw } => {
                HandleEvent::State(decode_states(&raw))
            }
            zwlr_foreign_toplevel_handle_v1::Event::Done => HandleEvent::Done,
            zwlr_foreign_toplevel_handle_v1::Event::Closed => HandleEvent::Closed,
            // parent relationships are not tracked
            _ => return,
        };

        if let Some(handle) = state.toplevel_handle_event(id, event) {
            handle.destroy();
        }
    }
}
