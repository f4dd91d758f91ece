// A compositor on its own thread speaking just enough of wl_seat, wl_output
// and the foreign toplevel protocol for the tests, connected to the proxy
// over a socket pair.

#![allow(dead_code)]

use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use toplevelev::{ToplevelEvent, ToplevelHandler, ToplevelId, ToplevelProxy, ToplevelSnapshot};
use wayland_client::Connection;
use wayland_protocols_wlr::foreign_toplevel::v1::server::{
    zwlr_foreign_toplevel_handle_v1::{self, ZwlrForeignToplevelHandleV1},
    zwlr_foreign_toplevel_manager_v1::{self, ZwlrForeignToplevelManagerV1},
};
use wayland_server::backend::{ClientData, ClientId, DisconnectReason, GlobalId};
use wayland_server::protocol::{
    wl_output::{self, WlOutput},
    wl_seat::{self, WlSeat},
};
use wayland_server::{
    Client, DataInit, Dispatch, Display, DisplayHandle, GlobalDispatch, New, Resource,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Globals the compositor advertises
#[derive(Debug, Clone, Copy)]
pub struct Globals {
    pub seats: usize,
    pub managers: usize,
    pub output: bool,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            seats: 1,
            managers: 1,
            output: false,
        }
    }
}

/// A window the compositor announces, followed by `done`
#[derive(Debug, Clone, Default)]
pub struct Window {
    title: String,
    app_id: String,
    states: Vec<u32>,
    on_output: bool,
}

impl Window {
    pub fn new(title: &str, app_id: &str) -> Self {
        Self {
            title: title.to_owned(),
            app_id: app_id.to_owned(),
            ..Self::default()
        }
    }

    pub fn activated(mut self) -> Self {
        self.states
            .push(zwlr_foreign_toplevel_handle_v1::State::Activated as u32);
        self
    }

    pub fn on_output(mut self) -> Self {
        self.on_output = true;
        self
    }
}

enum Control {
    Announce(Window),
    Done(usize),
    Close(usize),
    RemoveOutput,
}

pub struct TestCompositor {
    control: mpsc::Sender<(Control, mpsc::Sender<()>)>,
    log: Arc<Mutex<Vec<String>>>,
}

impl TestCompositor {
    pub fn spawn(globals: Globals) -> (TestCompositor, UnixStream) {
        let (server_socket, client_socket) = UnixStream::pair().unwrap();
        let (control, commands) = mpsc::channel();
        let log = Arc::new(Mutex::new(Vec::new()));
        let server_log = log.clone();
        thread::spawn(move || serve(globals, server_socket, commands, server_log));
        (TestCompositor { control, log }, client_socket)
    }

    /// Runs `control` on the compositor thread and waits until its events are
    /// written to the socket
    fn send(&self, control: Control) {
        let (ack, acked) = mpsc::channel();
        self.control.send((control, ack)).unwrap();
        acked.recv_timeout(TIMEOUT).unwrap();
    }

    /// Windows are numbered in announcement order, starting at 0
    pub fn announce(&self, window: Window) {
        self.send(Control::Announce(window));
    }

    pub fn done(&self, window: usize) {
        self.send(Control::Done(window));
    }

    pub fn close(&self, window: usize) {
        self.send(Control::Close(window));
    }

    pub fn remove_output(&self) {
        self.send(Control::RemoveOutput);
    }

    /// Requests received, binds excluded
    pub fn requests(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| !entry.starts_with("bind "))
            .cloned()
            .collect()
    }

    pub fn binds(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.starts_with("bind "))
            .cloned()
            .collect()
    }

    /// Waits for `request` without dispatching anything on the client side
    pub fn wait_for(&self, request: &str) -> bool {
        let deadline = Instant::now() + TIMEOUT;
        while Instant::now() < deadline {
            if self.requests().iter().any(|entry| entry == request) {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }
}

/// Starts a compositor and bootstraps a proxy against it
pub fn connect<H: ToplevelHandler + 'static>(
    globals: Globals,
    handler: H,
) -> (TestCompositor, ToplevelProxy<H>) {
    let (compositor, socket) = TestCompositor::spawn(globals);
    let connection = Connection::from_socket(socket).unwrap();
    let mut proxy = ToplevelProxy::builder()
        .with_connection(connection)
        .with_outputs(globals.output)
        .build(handler)
        .unwrap();
    // binds issued while handling the globals reach the compositor
    proxy.roundtrip().unwrap();
    (compositor, proxy)
}

#[derive(Debug, Default)]
pub struct Recorded(pub Vec<ToplevelEvent>);

impl ToplevelHandler for Recorded {
    fn toplevel_event(&mut self, event: ToplevelEvent) {
        self.0.push(event);
    }
}

impl Recorded {
    pub fn commits(&self) -> Vec<&ToplevelSnapshot> {
        self.0
            .iter()
            .filter_map(|event| match event {
                ToplevelEvent::Committed(snapshot) => Some(snapshot),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> Vec<ToplevelId> {
        self.0
            .iter()
            .filter_map(|event| match event {
                ToplevelEvent::Created(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<&ToplevelEvent> {
        self.0.last()
    }
}

struct Compositor {
    log: Arc<Mutex<Vec<String>>>,
    managers: Vec<ZwlrForeignToplevelManagerV1>,
    outputs: Vec<WlOutput>,
    toplevels: Vec<ZwlrForeignToplevelHandleV1>,
    output_global: Option<GlobalId>,
}

impl Compositor {
    fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    fn apply(&mut self, handle: &DisplayHandle, control: Control) {
        match control {
            Control::Announce(window) => {
                let manager = &self.managers[0];
                let client = manager.client().unwrap();
                let toplevel = client
                    .create_resource::<ZwlrForeignToplevelHandleV1, _, Compositor>(
                        handle,
                        manager.version(),
                        (),
                    )
                    .unwrap();
                manager.toplevel(&toplevel);
                toplevel.title(window.title);
                toplevel.app_id(window.app_id);
                toplevel.state(
                    window
                        .states
                        .iter()
                        .flat_map(|state| state.to_ne_bytes())
                        .collect(),
                );
                if window.on_output {
                    for output in &self.outputs {
                        toplevel.output_enter(output);
                    }
                }
                toplevel.done();
                self.toplevels.push(toplevel);
            }
            Control::Done(window) => self.toplevels[window].done(),
            Control::Close(window) => self.toplevels[window].closed(),
            Control::RemoveOutput => {
                if let Some(global) = self.output_global.take() {
                    handle.remove_global::<Compositor>(global);
                }
            }
        }
    }
}

fn serve(
    globals: Globals,
    socket: UnixStream,
    commands: mpsc::Receiver<(Control, mpsc::Sender<()>)>,
    log: Arc<Mutex<Vec<String>>>,
) {
    let mut display = Display::<Compositor>::new().unwrap();
    let mut handle = display.handle();
    for _ in 0..globals.seats {
        handle.create_global::<Compositor, WlSeat, _>(1, ());
    }
    for _ in 0..globals.managers {
        handle.create_global::<Compositor, ZwlrForeignToplevelManagerV1, _>(3, ());
    }
    let output_global = globals
        .output
        .then(|| handle.create_global::<Compositor, WlOutput, _>(3, ()));
    handle.insert_client(socket, Arc::new(TestClientData)).unwrap();

    let mut compositor = Compositor {
        log,
        managers: Vec::new(),
        outputs: Vec::new(),
        toplevels: Vec::new(),
        output_global,
    };

    loop {
        match commands.recv_timeout(Duration::from_millis(2)) {
            Ok((control, ack)) => {
                let _ = display.dispatch_clients(&mut compositor);
                compositor.apply(&handle, control);
                let _ = display.flush_clients();
                let _ = ack.send(());
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
        if display.dispatch_clients(&mut compositor).is_err() {
            return;
        }
        let _ = display.flush_clients();
    }
}

struct TestClientData;

impl ClientData for TestClientData {
    fn initialized(&self, _: ClientId) {}
    fn disconnected(&self, _: ClientId, _: DisconnectReason) {}
}

impl GlobalDispatch<WlSeat, ()> for Compositor {
    fn bind(
        state: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        seat: New<WlSeat>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(seat, ());
        state.record("bind wl_seat");
    }
}

impl Dispatch<WlSeat, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &WlSeat,
        _: wl_seat::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
    }
}

impl GlobalDispatch<WlOutput, ()> for Compositor {
    fn bind(
        state: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        output: New<WlOutput>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let output = data_init.init(output, ());
        state.record("bind wl_output");
        state.outputs.push(output);
    }
}

impl Dispatch<WlOutput, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &WlOutput,
        request: wl_output::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
        if let wl_output::Request::Release = request {
            state.record("release");
        }
    }
}

impl GlobalDispatch<ZwlrForeignToplevelManagerV1, ()> for Compositor {
    fn bind(
        state: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        manager: New<ZwlrForeignToplevelManagerV1>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let manager = data_init.init(manager, ());
        state.record(format!("bind manager v{}", manager.version()));
        state.managers.push(manager);
    }
}

impl Dispatch<ZwlrForeignToplevelManagerV1, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        manager: &ZwlrForeignToplevelManagerV1,
        request: zwlr_foreign_toplevel_manager_v1::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
        if let zwlr_foreign_toplevel_manager_v1::Request::Stop = request {
            state.record("stop");
            manager.finished();
        }
    }
}

impl Dispatch<ZwlrForeignToplevelHandleV1, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &ZwlrForeignToplevelHandleV1,
        request: zwlr_foreign_toplevel_handle_v1::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
        let name = match request {
            zwlr_foreign_toplevel_handle_v1::Request::Activate { .. } => "activate",
            zwlr_foreign_toplevel_handle_v1::Request::Close => "close",
            zwlr_foreign_toplevel_handle_v1::Request::SetMinimized => "set_minimized",
            zwlr_foreign_toplevel_handle_v1::Request::UnsetMinimized => "unset_minimized",
            zwlr_foreign_toplevel_handle_v1::Request::Destroy => "destroy",
            _ => "other",
        };
        state.record(name);
    }
}
