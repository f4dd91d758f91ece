use std::collections::HashSet;

use wayland_client::{
    Connection, Dispatch, EventQueue, QueueHandle, delegate_noop,
    protocol::{wl_output::WlOutput, wl_seat::WlSeat},
};
use wayland_protocols_wlr::foreign_toplevel::v1::client::{
    zwlr_foreign_toplevel_handle_v1::{self, ZwlrForeignToplevelHandleV1},
    zwlr_foreign_toplevel_manager_v1::{self, ZwlrForeignToplevelManagerV1},
};

use crate::ToplevelError;
use crate::command::{CommandOutcome, execute_command};
use crate::events::{ToplevelCommand, ToplevelEvent, ToplevelHandler};
use crate::foreign_toplevel::{
    ForeignToplevelManagerData, ForeignToplevelState, ToplevelHandleUserData,
};
use crate::id::ToplevelId;
use crate::toplevel::HandleEvent;
use crate::tracker::ToplevelTracker;

/// Everything the event queue dispatches into
///
/// Holds the bound globals, the tracked toplevels and the host's handler.
#[derive(Debug)]
pub struct ToplevelState<H> {
    connection: Connection,
    pub(crate) tracker: ToplevelTracker<ZwlrForeignToplevelHandleV1>,
    pub(crate) handler: H,
    /// Bound globals, keyed by registry name
    pub(crate) seat: Option<(u32, WlSeat)>,
    pub(crate) manager: Option<(u32, ZwlrForeignToplevelManagerV1)>,
    pub(crate) outputs: Vec<(u32, WlOutput)>,
    pub(crate) bind_outputs: bool,
}

impl<H: ToplevelHandler> ToplevelState<H> {
    pub fn tracker(&self) -> &ToplevelTracker<ZwlrForeignToplevelHandleV1> {
        &self.tracker
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Without a seat, activation requests are dropped
    pub fn has_seat(&self) -> bool {
        self.seat.is_some()
    }

    pub fn has_manager(&self) -> bool {
        self.manager.is_some()
    }

    /// Send the request for `command` and flush it
    pub fn execute(&mut self, command: ToplevelCommand) -> CommandOutcome {
        let seat = self.seat.as_ref().map(|(_, seat)| seat);
        let outcome = execute_command(&self.tracker, command, seat);
        match outcome {
            CommandOutcome::Sent => self.flush(),
            CommandOutcome::UnknownToplevel => self
                .handler
                .toplevel_event(ToplevelEvent::UnknownToplevel(command)),
            CommandOutcome::NoSeat => {}
        }
        outcome
    }

    /// Activate the first committed toplevel with this exact title
    pub fn activate_by_title(&mut self, title: &str) -> bool {
        let Some(id) = self.tracker.find_by_title(title).map(|snapshot| snapshot.id) else {
            log::debug!("no toplevel titled {title:?}");
            return false;
        };
        self.execute(ToplevelCommand::Activate(id)) == CommandOutcome::Sent
    }

    pub fn remember_active(&mut self) -> Option<ToplevelId> {
        self.tracker.remember_active()
    }

    /// Activate the toplevel stored by [`Self::remember_active`]
    pub fn activate_remembered(&mut self) -> bool {
        match self.tracker.remembered() {
            Some(id) => self.execute(ToplevelCommand::Activate(id)) == CommandOutcome::Sent,
            None => false,
        }
    }

    /// Ask the compositor to stop sending toplevel events
    ///
    /// The compositor answers with `finished`.
    pub fn stop(&mut self) {
        let Some((_, manager)) = &self.manager else {
            return;
        };
        if self.tracker.is_finished() {
            return;
        }
        manager.stop();
        self.flush();
    }

    fn flush(&self) {
        if let Err(err) = self.connection.flush() {
            log::warn!("failed to flush the wayland connection: {err}");
        }
    }
}

impl<H: ToplevelHandler> ForeignToplevelState for ToplevelState<H> {
    fn toplevel_created(&mut self, handle: ZwlrForeignToplevelHandleV1) -> ToplevelId {
        self.tracker.announce(handle, &mut self.handler)
    }

    fn toplevel_handle_event(
        &mut self,
        id: ToplevelId,
        event: HandleEvent,
    ) -> Option<ZwlrForeignToplevelHandleV1> {
        self.tracker.handle_event(id, event, &mut self.handler)
    }

    fn toplevel_manager_finished(&mut self) {
        self.tracker.finish(&mut self.handler);
    }
}

// Foreign toplevel manager dispatch
impl<H: ToplevelHandler + 'static>
    Dispatch<ZwlrForeignToplevelManagerV1, ForeignToplevelManagerData> for ToplevelState<H>
{
    fn event(
        state: &mut Self,
        proxy: &ZwlrForeignToplevelManagerV1,
        event: zwlr_foreign_toplevel_manager_v1::Event,
        data: &ForeignToplevelManagerData,
        conn: &Connection,
        qhandle: &QueueHandle<Self>,
    ) {
        <() as Dispatch<ZwlrForeignToplevelManagerV1, ForeignToplevelManagerData, Self>>::event(
            state, proxy, event, data, conn, qhandle,
        )
    }

    fn event_created_child(
        opcode: u16,
        qhandle: &QueueHandle<Self>,
    ) -> std::sync::Arc<dyn wayland_client::backend::ObjectData> {
        <() as Dispatch<ZwlrForeignToplevelManagerV1, ForeignToplevelManagerData, Self>>::event_created_child(
            opcode, qhandle,
        )
    }
}

// Foreign toplevel handle dispatch
impl<H: ToplevelHandler + 'static> Dispatch<ZwlrForeignToplevelHandleV1, ToplevelHandleUserData>
    for ToplevelState<H>
{
    fn event(
        state: &mut Self,
        proxy: &ZwlrForeignToplevelHandleV1,
        event: zwlr_foreign_toplevel_handle_v1::Event,
        data: &ToplevelHandleUserData,
        conn: &Connection,
        qhandle: &QueueHandle<Self>,
    ) {
        <() as Dispatch<ZwlrForeignToplevelHandleV1, ToplevelHandleUserData, Self>>::event(
            state, proxy, event, data, conn, qhandle,
        )
    }
}

delegate_noop!(@<H> ToplevelState<H>: ignore WlSeat);
delegate_noop!(@<H> ToplevelState<H>: ignore WlOutput);

/// Settings for [`ToplevelProxy`]
#[derive(Debug, Default)]
pub struct ToplevelProxyBuilder {
    connection: Option<Connection>,
    bind_outputs: bool,
    ignored_app_ids: HashSet<String>,
}

impl ToplevelProxyBuilder {
    /// Reuse an existing connection instead of `WAYLAND_DISPLAY`
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Bind every wl_output so the compositor reports output enter and leave
    pub fn with_outputs(mut self, enabled: bool) -> Self {
        self.bind_outputs = enabled;
        self
    }

    /// App ids left out of [`ToplevelTracker::visible`]
    pub fn with_ignored_app_ids<I, S>(mut self, app_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_app_ids = app_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Connect, enumerate the globals and bind the seat and the manager
    pub fn build<H: ToplevelHandler + 'static>(
        self,
        handler: H,
    ) -> Result<ToplevelProxy<H>, ToplevelError> {
        let connection = match self.connection {
            Some(connection) => connection,
            None => Connection::connect_to_env()?,
        };

        let mut event_queue = connection.new_event_queue::<ToplevelState<H>>();
        let qh = event_queue.handle();
        let _ = connection.display().get_registry(&qh, ());

        let mut tracker = ToplevelTracker::new();
        tracker.set_ignored_app_ids(self.ignored_app_ids);
        let mut state = ToplevelState {
            connection: connection.clone(),
            tracker,
            handler,
            seat: None,
            manager: None,
            outputs: Vec::new(),
            bind_outputs: self.bind_outputs,
        };

        event_queue.roundtrip(&mut state)?;

        if state.manager.is_none() {
            log::warn!(
                "compositor does not support zwlr_foreign_toplevel_manager_v1, no toplevels will be reported"
            );
        }
        if state.seat.is_none() {
            log::warn!("no wl_seat advertised, activate requests will be dropped");
        }

        Ok(ToplevelProxy {
            connection,
            event_queue,
            state,
        })
    }
}

/// Client proxy for the wlroots foreign toplevel management protocol
///
/// Owns the connection, the event queue and the [`ToplevelState`]. Nothing here
/// is synchronized: drive dispatch and issue commands from one thread, or move
/// to a [`crate::ToplevelEventLoop`] and send commands through its channel.
pub struct ToplevelProxy<H: 'static> {
    pub(crate) connection: Connection,
    pub(crate) event_queue: EventQueue<ToplevelState<H>>,
    pub(crate) state: ToplevelState<H>,
}

impl ToplevelProxy<()> {
    pub fn builder() -> ToplevelProxyBuilder {
        ToplevelProxyBuilder::default()
    }
}

impl<H: ToplevelHandler + 'static> ToplevelProxy<H> {
    /// Connect with default settings
    pub fn connect(handler: H) -> Result<Self, ToplevelError> {
        ToplevelProxyBuilder::default().build(handler)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> &ToplevelState<H> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ToplevelState<H> {
        &mut self.state
    }

    pub fn tracker(&self) -> &ToplevelTracker<ZwlrForeignToplevelHandleV1> {
        self.state.tracker()
    }

    pub fn handler_mut(&mut self) -> &mut H {
        self.state.handler_mut()
    }

    /// Block until the compositor processed every request sent so far
    pub fn roundtrip(&mut self) -> Result<usize, ToplevelError> {
        Ok(self.event_queue.roundtrip(&mut self.state)?)
    }

    pub fn flush(&self) -> Result<(), ToplevelError> {
        Ok(self.connection.flush()?)
    }

    /// Block until at least one event was dispatched
    pub fn blocking_dispatch(&mut self) -> Result<usize, ToplevelError> {
        Ok(self.event_queue.blocking_dispatch(&mut self.state)?)
    }

    /// Dispatch what is already queued, without reading the socket
    pub fn dispatch_pending(&mut self) -> Result<usize, ToplevelError> {
        Ok(self.event_queue.dispatch_pending(&mut self.state)?)
    }

    /// Dispatch until the connection fails
    pub fn run(&mut self) -> Result<(), ToplevelError> {
        loop {
            self.blocking_dispatch()?;
        }
    }

    pub fn execute(&mut self, command: ToplevelCommand) -> CommandOutcome {
        self.state.execute(command)
    }

    pub fn activate(&mut self, id: ToplevelId) -> CommandOutcome {
        self.execute(ToplevelCommand::Activate(id))
    }

    pub fn close(&mut self, id: ToplevelId) -> CommandOutcome {
        self.execute(ToplevelCommand::Close(id))
    }

    /// Minimize
    pub fn hide(&mut self, id: ToplevelId) -> CommandOutcome {
        self.execute(ToplevelCommand::Hide(id))
    }

    /// Unminimize
    pub fn show(&mut self, id: ToplevelId) -> CommandOutcome {
        self.execute(ToplevelCommand::Show(id))
    }

    pub fn activate_by_title(&mut self, title: &str) -> bool {
        self.state.activate_by_title(title)
    }

    pub fn remember_active(&mut self) -> Option<ToplevelId> {
        self.state.remember_active()
    }

    pub fn activate_remembered(&mut self) -> bool {
        self.state.activate_remembered()
    }

    pub fn stop(&mut self) {
        self.state.stop()
    }
}
