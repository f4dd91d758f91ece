use std::io::BufRead;

use toplevelev::reexport::calloop::channel;
use toplevelev::{ToplevelCommand, ToplevelEvent, ToplevelId, ToplevelProxy};
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Request {
    Command(ToplevelCommand),
    Focus(String),
    List,
    Remember,
    Restore,
    Quit,
}

fn parse_request(line: &str) -> Result<Request, String> {
    let line = line.trim();
    let (verb, arg) = line
        .split_once(char::is_whitespace)
        .map(|(verb, arg)| (verb, arg.trim()))
        .unwrap_or((line, ""));
    match verb {
        "list" => Ok(Request::List),
        "remember" => Ok(Request::Remember),
        "restore" => Ok(Request::Restore),
        "quit" => Ok(Request::Quit),
        "focus" if !arg.is_empty() => Ok(Request::Focus(arg.to_owned())),
        "activate" | "close" | "hide" | "show" => {
            let raw: u64 = arg
                .parse()
                .map_err(|_| format!("{verb} expects a toplevel id, got {arg:?}"))?;
            let id = ToplevelId::from_raw(raw);
            let command = match verb {
                "activate" => ToplevelCommand::Activate(id),
                "close" => ToplevelCommand::Close(id),
                "hide" => ToplevelCommand::Hide(id),
                _ => ToplevelCommand::Show(id),
            };
            Ok(Request::Command(command))
        }
        _ => Err(format!("unknown command {line:?}")),
    }
}

fn log_event(event: ToplevelEvent) {
    match event {
        ToplevelEvent::Committed(snapshot) => tracing::info!(
            "{} {:?} app_id={:?} outputs={:?} states=[{}]",
            snapshot.id,
            snapshot.title,
            snapshot.app_id,
            snapshot.outputs,
            snapshot.states
        ),
        ToplevelEvent::Closed(id) => tracing::info!("{id} closed"),
        ToplevelEvent::Finished => tracing::info!("manager finished"),
        ToplevelEvent::UnknownToplevel(command) => {
            tracing::warn!("no open toplevel for {command:?}")
        }
        other => tracing::debug!("{other:?}"),
    }
}

fn main() -> Result<(), toplevelev::ToplevelError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let proxy = ToplevelProxy::builder()
        .with_outputs(true)
        .build(log_event)?;
    let mut event_loop = proxy.into_event_loop()?;
    let signal = event_loop.signal();

    let (sender, receiver) = channel::channel::<Request>();
    event_loop
        .handle()
        .insert_source(receiver, move |event, _, state| {
            let request = match event {
                channel::Event::Msg(request) => request,
                channel::Event::Closed => {
                    signal.stop();
                    return;
                }
            };
            match request {
                Request::Command(command) => {
                    let outcome = state.execute(command);
                    tracing::info!("{command:?}: {outcome:?}");
                }
                Request::Focus(title) => {
                    if !state.activate_by_title(&title) {
                        tracing::warn!("no window titled {title:?}");
                    }
                }
                Request::List => {
                    for snapshot in state.tracker().visible() {
                        println!(
                            "{}\t{}\t{}\t{}",
                            snapshot.id,
                            snapshot.app_id,
                            snapshot.display_name(),
                            snapshot.states
                        );
                    }
                }
                Request::Remember => match state.remember_active() {
                    Some(id) => tracing::info!("remembered {id}"),
                    None => tracing::info!("no active window"),
                },
                Request::Restore => {
                    if !state.activate_remembered() {
                        tracing::info!("nothing to restore");
                    }
                }
                Request::Quit => signal.stop(),
            }
        })
        .map_err(|err| err.error)?;

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_request(&line) {
                Ok(request) => {
                    if sender.send(request).is_err() {
                        break;
                    }
                }
                Err(err) => eprintln!("{err}"),
            }
        }
    });

    event_loop.run()
}
