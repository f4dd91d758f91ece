//! Registry listener: binds the seat and the foreign toplevel manager.

use wayland_client::{
    Connection, Dispatch, Proxy, QueueHandle,
    protocol::{wl_output::WlOutput, wl_registry, wl_seat::WlSeat},
};
use wayland_protocols_wlr::foreign_toplevel::v1::client::zwlr_foreign_toplevel_manager_v1::ZwlrForeignToplevelManagerV1;

use crate::events::ToplevelHandler;
use crate::foreign_toplevel::ForeignToplevelManagerData;
use crate::proxy::ToplevelState;
use crate::toplevel::OutputId;

/// Version to bind a global at, never above what the bindings know
fn bind_version<I: Proxy>(advertised: u32) -> u32 {
    let supported = I::interface().version;
    if advertised > supported {
        log::debug!(
            "{} advertised at v{advertised}, binding v{supported}",
            I::interface().name
        );
    }
    advertised.min(supported)
}

impl<H: ToplevelHandler + 'static> Dispatch<wl_registry::WlRegistry, ()> for ToplevelState<H> {
    fn event(
        state: &mut Self,
        proxy: &wl_registry::WlRegistry,
        event: <wl_registry::WlRegistry as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                if interface == WlSeat::interface().name {
                    if let Some((bound, _)) = &state.seat {
                        log::warn!("second wl_seat {name} advertised, keeping {bound}");
                        return;
                    }
                    let version = bind_version::<WlSeat>(version);
                    let seat = proxy.bind::<WlSeat, _, _>(name, version, qh, ());
                    log::info!("bound wl_seat v{version}");
                    state.seat = Some((name, seat));
                } else if interface == ZwlrForeignToplevelManagerV1::interface().name {
                    if let Some((bound, _)) = &state.manager {
                        log::warn!(
                            "second zwlr_foreign_toplevel_manager_v1 {name} advertised, keeping {bound}"
                        );
                        return;
                    }
                    let version = bind_version::<ZwlrForeignToplevelManagerV1>(version);
                    let manager = proxy.bind::<ZwlrForeignToplevelManagerV1, _, _>(
                        name,
                        version,
                        qh,
                        ForeignToplevelManagerData,
                    );
                    log::info!("bound zwlr_foreign_toplevel_manager_v1 v{version}");
                    state.manager = Some((name, manager));
                } else if state.bind_outputs && interface == WlOutput::interface().name {
                    let version = bind_version::<WlOutput>(version);
                    let output = proxy.bind::<WlOutput, _, _>(name, version, qh, ());
                    log::debug!("bound wl_output {name} as {}", output.id().protocol_id());
                    state.outputs.push((name, output));
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                if let Some(position) = state.outputs.iter().position(|(n, _)| *n == name) {
                    let (_, output) = state.outputs.swap_remove(position);
                    let output_id = OutputId(output.id().protocol_id());
                    state.tracker.forget_output(output_id, &mut state.handler);
                    if output.version() >= 3 {
                        output.release();
                    }
                    log::debug!("wl_output {name} removed");
                } else if state.seat.as_ref().is_some_and(|(n, _)| *n == name)
                    || state.manager.as_ref().is_some_and(|(n, _)| *n == name)
                {
                    // Seat and manager are treated as stable for the connection's lifetime.
                    log::warn!("bound global {name} removed by the compositor, not rebinding");
                } else {
                    log::trace!("global {name} removed");
                }
            }
            _ => {}
        }
    }
}
