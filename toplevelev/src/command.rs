//! Translation of host commands into foreign toplevel requests.

use wayland_client::protocol::wl_seat::WlSeat;
use wayland_protocols_wlr::foreign_toplevel::v1::client::zwlr_foreign_toplevel_handle_v1::ZwlrForeignToplevelHandleV1;

use crate::events::ToplevelCommand;
use crate::tracker::ToplevelTracker;

/// Requests a toplevel handle can send to the compositor
pub trait ToplevelRequests {
    type Seat;

    fn activate(&self, seat: &Self::Seat);
    fn close(&self);
    fn set_minimized(&self);
    fn unset_minimized(&self);
}

impl ToplevelRequests for ZwlrForeignToplevelHandleV1 {
    type Seat = WlSeat;

    fn activate(&self, seat: &WlSeat) {
        ZwlrForeignToplevelHandleV1::activate(self, seat);
    }

    fn close(&self) {
        ZwlrForeignToplevelHandleV1::close(self);
    }

    fn set_minimized(&self) {
        ZwlrForeignToplevelHandleV1::set_minimized(self);
    }

    fn unset_minimized(&self) {
        ZwlrForeignToplevelHandleV1::unset_minimized(self);
    }
}

/// Result of a command, none of these are errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The request was queued and needs a flush
    Sent,
    /// Activation without a bound seat, nothing was sent
    NoSeat,
    /// The id is closed or never existed, nothing was sent
    UnknownToplevel,
}

/// Issue the request for `command` on the handle it names
pub(crate) fn execute_command<P: ToplevelRequests>(
    tracker: &ToplevelTracker<P>,
    command: ToplevelCommand,
    seat: Option<&P::Seat>,
) -> CommandOutcome {
    let id = command.id();
    let Some(handle) = tracker.proxy(id) else {
        log::warn!("toplevel {id} not found for {command:?}");
        return CommandOutcome::UnknownToplevel;
    };

    log::info!("execute_command: {command:?}");
    match command {
        ToplevelCommand::Activate(_) => {
            let Some(seat) = seat else {
                log::debug!("cannot activate toplevel {id} without a seat");
                return CommandOutcome::NoSeat;
            };
            handle.activate(seat);
        }
        ToplevelCommand::Close(_) => handle.close(),
        ToplevelCommand::Hide(_) => handle.set_minimized(),
        ToplevelCommand::Show(_) => handle.unset_minimized(),
    }
    CommandOutcome::Sent
}
