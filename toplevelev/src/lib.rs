//! # Track and control other clients' windows on wlroots compositors
//!
//! `toplevelev` speaks `zwlr_foreign_toplevel_management_unstable_v1`: it binds
//! the manager and the seat, batches every window's attribute events until the
//! compositor's `done`, and delivers the result as [`ToplevelEvent`]s. Windows
//! are addressed by [`ToplevelId`], which never resolves to another window once
//! its window has closed.
//!
//! ```rust, no_run
//! use toplevelev::{ToplevelEvent, ToplevelProxy};
//!
//! fn main() -> Result<(), toplevelev::ToplevelError> {
//!     let mut proxy = ToplevelProxy::builder()
//!         .with_outputs(true)
//!         .build(|event: ToplevelEvent| match event {
//!             ToplevelEvent::Committed(snapshot) => {
//!                 println!("{}: {} [{}]", snapshot.id, snapshot.display_name(), snapshot.states)
//!             }
//!             ToplevelEvent::Closed(id) => println!("{id} closed"),
//!             _ => {}
//!         })?;
//!
//!     proxy.roundtrip()?;
//!     proxy.activate_by_title("Editor");
//!     proxy.run()
//! }
//! ```
//!
//! Commands from other threads go through [`ToplevelEventLoop::command_sender`].

pub mod command;
mod event_loop;
mod events;
pub mod foreign_toplevel;
pub mod id;
mod proxy;
mod registry;
pub mod toplevel;
pub mod tracker;

pub use command::{CommandOutcome, ToplevelRequests};
pub use event_loop::ToplevelEventLoop;
pub use events::{ToplevelCommand, ToplevelEvent, ToplevelHandler};
pub use id::ToplevelId;
pub use proxy::{ToplevelProxy, ToplevelProxyBuilder, ToplevelState};
pub use toplevel::{HandlePhase, OutputId, StateFlags, ToplevelSnapshot};
pub use tracker::ToplevelTracker;

use wayland_backend::client::WaylandError;
use wayland_client::{ConnectError, DispatchError};

#[derive(Debug, thiserror::Error)]
pub enum ToplevelError {
    #[error("connect error")]
    ConnectError(#[from] ConnectError),
    #[error("Error during queue")]
    DispatchError(#[from] DispatchError),
    #[error("connection error")]
    WaylandError(#[from] WaylandError),
    #[error("Event Loop Error")]
    EventLoopError(#[from] calloop::Error),
}

pub mod reexport {
    pub use calloop;
    pub mod wayland_client {
        pub use wayland_client::{
            Connection,
            protocol::{wl_output::WlOutput, wl_seat::WlSeat},
        };
    }
    pub mod zwlr_foreign_toplevel_handle_v1 {
        pub use wayland_protocols_wlr::foreign_toplevel::v1::client::zwlr_foreign_toplevel_handle_v1::ZwlrForeignToplevelHandleV1;
    }
}
