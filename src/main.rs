//! devprof binary entry point
//!
//! Parses arguments, wires up logging, storage, and the platform providers,
//! then dispatches to the command implementations.

use anyhow::Result;
use clap::Parser;

use devprof::cli::{Args, Command, NicknameTarget};
use devprof::store::Storage;
use devprof::{commands, logging, provider, State};

fn main() -> Result<()> {
    let args = Args::parse();

    let storage = Storage::open_default()?;

    // The guard flushes buffered file-log lines on drop; keep it alive for
    // the whole run.
    let _log_guard = if args.log_file {
        Some(logging::init_with_file(args.verbose, storage.dir())?)
    } else {
        logging::init(args.verbose);
        None
    };

    let mut state = State::new(
        provider::monitor_provider(args.tools_dir.clone()),
        provider::audio_provider(args.tools_dir),
        storage,
    );
    state.startup();

    match args.command {
        None => commands::status(&state),

        Some(Command::ListMonitors { json }) => commands::list_monitors(&state, json),
        Some(Command::ListAudio { all, json }) => commands::list_audio(&state, all, json),
        Some(Command::Profiles { json }) => commands::profiles(&state, json),

        Some(Command::Save { name, audio }) => commands::save(&mut state, &name, &audio),
        Some(Command::Apply { name }) => commands::apply(&mut state, &name),
        Some(Command::Delete { name }) => commands::delete(&mut state, &name),

        Some(Command::SetPrimary { handle }) => commands::set_primary(&mut state, &handle),
        Some(Command::Activate { handle }) => {
            commands::set_monitor_active(&mut state, &handle, true)
        }
        Some(Command::Deactivate { handle }) => {
            commands::set_monitor_active(&mut state, &handle, false)
        }

        Some(Command::SetDefault { id }) => commands::set_default_audio(&mut state, &id),
        Some(Command::EnableAudio { id }) => commands::set_audio_enabled(&mut state, &id, true),
        Some(Command::DisableAudio { id }) => commands::set_audio_enabled(&mut state, &id, false),

        Some(Command::Nickname(NicknameTarget::Monitor { handle, nickname })) => {
            commands::nickname_monitor(&mut state, &handle, nickname.as_deref())
        }
        Some(Command::Nickname(NicknameTarget::Audio { id, nickname })) => {
            commands::nickname_audio(&mut state, &id, nickname.as_deref())
        }

        Some(Command::Ignore { id }) => commands::ignore(&mut state, &id),
        Some(Command::Unignore { id }) => commands::unignore(&mut state, &id),
    }
}
