//! calloop integration
//!
//! The wayland queue becomes a `WaylandSource` and host commands arrive on a
//! calloop channel, so both are handled on the thread running the loop.

use std::time::Duration;

use calloop::{EventLoop, LoopHandle, LoopSignal, channel};
use calloop_wayland_source::WaylandSource;

use crate::ToplevelError;
use crate::events::{ToplevelCommand, ToplevelHandler};
use crate::proxy::{ToplevelProxy, ToplevelState};

pub struct ToplevelEventLoop<H: 'static> {
    event_loop: EventLoop<'static, ToplevelState<H>>,
    state: ToplevelState<H>,
    commands: channel::Sender<ToplevelCommand>,
}

impl<H: ToplevelHandler + 'static> ToplevelProxy<H> {
    /// Move the proxy into a calloop event loop
    pub fn into_event_loop(self) -> Result<ToplevelEventLoop<H>, ToplevelError> {
        let ToplevelProxy {
            connection,
            event_queue,
            state,
        } = self;

        let event_loop: EventLoop<'static, ToplevelState<H>> = EventLoop::try_new()?;
        WaylandSource::new(connection, event_queue)
            .insert(event_loop.handle())
            .map_err(|err| err.error)?;

        let (commands, receiver) = channel::channel::<ToplevelCommand>();
        event_loop
            .handle()
            .insert_source(receiver, |event, _, state| {
                let channel::Event::Msg(command) = event else {
                    return;
                };
                log::trace!("command from channel: {command:?}");
                state.execute(command);
            })
            .map_err(|err| err.error)?;

        Ok(ToplevelEventLoop {
            event_loop,
            state,
            commands,
        })
    }
}

impl<H: ToplevelHandler + 'static> ToplevelEventLoop<H> {
    /// Sender for commands from any thread
    pub fn command_sender(&self) -> channel::Sender<ToplevelCommand> {
        self.commands.clone()
    }

    /// Handle for inserting more sources sharing the same state
    pub fn handle(&self) -> LoopHandle<'static, ToplevelState<H>> {
        self.event_loop.handle()
    }

    pub fn signal(&self) -> LoopSignal {
        self.event_loop.get_signal()
    }

    pub fn state(&self) -> &ToplevelState<H> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ToplevelState<H> {
        &mut self.state
    }

    /// Process ready sources once, waiting at most `timeout`
    pub fn dispatch(&mut self, timeout: Option<Duration>) -> Result<(), ToplevelError> {
        self.event_loop.dispatch(timeout, &mut self.state)?;
        Ok(())
    }

    /// Run until [`LoopSignal::stop`] is called or a source fails
    pub fn run(&mut self) -> Result<(), ToplevelError> {
        self.event_loop.run(None::<Duration>, &mut self.state, |_| {})?;
        Ok(())
    }
}
