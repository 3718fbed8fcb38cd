//! `vani read` — read a text aloud with an interactive transport prompt.

use std::io::{Read, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use vani_voice::{
    PlaybackConfig, PlaybackEvent, PlaybackHandle, PlaybackPort, PlaybackService, PlaybackState,
    VoiceError,
};

use super::{engine_options, wait_for_catalog};
use crate::error::CliError;
use crate::input::{HELP, InteractiveCommand, parse_command};
use crate::presentation::{format_catalog_status, format_progress, format_voice_groups};

/// Arguments for [`execute`].
#[derive(Debug, Clone)]
pub struct ReadArgs {
    /// Path to the text, or `-` for stdin.
    pub source: String,
    pub rate: Option<f32>,
    pub voice: Option<String>,
    pub from: usize,
    /// Read prompt commands from stdin (ignored when the text comes from stdin).
    pub interactive: bool,
    pub ready_after: Option<u32>,
}

pub async fn execute(config: PlaybackConfig, args: ReadArgs) -> Result<(), CliError> {
    let text = read_source(&args.source)?;
    let interactive = args.interactive && args.source != "-";

    let (handle, task) =
        PlaybackService::spawn_simulated(config, engine_options(args.ready_after, false));
    let mut events = handle.subscribe();

    let result = run(&handle, &mut events, text, &args, interactive).await;

    handle.shutdown();
    let _ = task.await;
    result
}

async fn run(
    handle: &PlaybackHandle,
    events: &mut broadcast::Receiver<PlaybackEvent>,
    text: String,
    args: &ReadArgs,
    interactive: bool,
) -> Result<(), CliError> {
    let hint = handle.set_text(text).await?;
    println!("{hint}");

    if let Some(voice) = &args.voice {
        wait_for_catalog(handle, events).await?;
        handle.select_voice(Some(voice.clone())).await?;
    }
    if let Some(rate) = args.rate {
        handle.set_rate(rate).await?;
    }

    handle.play_from(args.from).await?;
    tracing::debug!(from = args.from, interactive, "Playback started");

    if interactive {
        println!("Type a command (h for help).");
        run_prompt(handle, events).await
    } else {
        wait_until_idle(handle, events).await
    }
}

/// Read the whole text from a file or stdin.
pub fn read_source(source: &str) -> Result<String, CliError> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

/// Redraw the progress line in place.
async fn render_progress(handle: &PlaybackHandle) -> Result<(), CliError> {
    let snapshot = handle.snapshot().await?;
    let mut stdout = std::io::stdout();
    write!(stdout, "\r{}", format_progress(&snapshot))?;
    stdout.flush()?;
    Ok(())
}

/// Show progress until the transport returns to idle.
async fn wait_until_idle(
    handle: &PlaybackHandle,
    events: &mut broadcast::Receiver<PlaybackEvent>,
) -> Result<(), CliError> {
    if handle.snapshot().await?.state == PlaybackState::Idle {
        render_progress(handle).await?;
        println!();
        return Ok(());
    }

    let mut failure = None;
    loop {
        match events.recv().await {
            Ok(PlaybackEvent::StateChanged(PlaybackState::Idle)) => {
                render_progress(handle).await?;
                println!();
                // An engine failure is published right after the Idle transition.
                while let Ok(event) = events.try_recv() {
                    note_error(event, &mut failure);
                }
                return failure.map_or(Ok(()), |e| Err(e.into()));
            }
            Ok(PlaybackEvent::Progress(_) | PlaybackEvent::StateChanged(_)) => {
                render_progress(handle).await?;
            }
            Ok(event @ PlaybackEvent::Error(_)) => note_error(event, &mut failure),
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => {
                return Err(VoiceError::ServiceStopped.into());
            }
        }
    }
}

/// Missing voices is only a warning; playback goes on with the engine default.
fn note_error(event: PlaybackEvent, failure: &mut Option<VoiceError>) {
    match event {
        PlaybackEvent::Error(VoiceError::NoVoicesAvailable) => {
            eprintln!("\nwarning: {}", VoiceError::NoVoicesAvailable);
        }
        PlaybackEvent::Error(e) => *failure = Some(e),
        _ => {}
    }
}

/// Interactive loop: stdin commands in, state changes out.
async fn run_prompt(
    handle: &PlaybackHandle,
    events: &mut broadcast::Receiver<PlaybackEvent>,
) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match parse_command(&line) {
                    Ok(InteractiveCommand::Quit) => return Ok(()),
                    Ok(cmd) => match apply(handle, cmd).await {
                        Ok(Some(output)) => println!("{output}"),
                        Ok(None) => {}
                        Err(CliError::Voice(VoiceError::ServiceStopped)) => {
                            return Err(VoiceError::ServiceStopped.into());
                        }
                        Err(e) => eprintln!("{e}"),
                    },
                    Err(e) => eprintln!("{e}"),
                }
            }

            event = events.recv() => match event {
                Ok(PlaybackEvent::StateChanged(state)) => {
                    let snapshot = handle.snapshot().await?;
                    println!("{}", format_progress(&snapshot));
                    if state == PlaybackState::Idle && snapshot.offset == snapshot.total {
                        println!("Finished. `play` to start over, `q` to quit.");
                    }
                }
                Ok(PlaybackEvent::Error(e)) => eprintln!("{e}"),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(VoiceError::ServiceStopped.into());
                }
            },
        }
    }
}

/// Execute one prompt command; returns text to print, if any.
pub async fn apply(
    port: &dyn PlaybackPort,
    cmd: InteractiveCommand,
) -> Result<Option<String>, CliError> {
    match cmd {
        InteractiveCommand::Play => port.play().await?,
        InteractiveCommand::PlayFrom(offset) => port.play_from(offset).await?,
        InteractiveCommand::Pause => port.pause().await?,
        InteractiveCommand::Resume => port.resume().await?,
        InteractiveCommand::Stop => port.stop().await?,
        InteractiveCommand::Back => port.seek_backward().await?,
        InteractiveCommand::Forward => port.seek_forward().await?,
        InteractiveCommand::Faster => port.rate_up().await?,
        InteractiveCommand::Slower => port.rate_down().await?,
        InteractiveCommand::Rate(rate) => port.set_rate(rate).await?,
        InteractiveCommand::Voice(voice) => port.select_voice(voice).await?,
        InteractiveCommand::Voices => {
            let snapshot = port.snapshot().await?;
            let count = snapshot.voice_groups.iter().map(|g| g.voices.len()).sum();
            let mut out = format_catalog_status(snapshot.catalog_status, count);
            out.push('\n');
            out.push_str(&format_voice_groups(
                &snapshot.voice_groups,
                snapshot.selected_voice.as_deref(),
            ));
            return Ok(Some(out.trim_end().to_string()));
        }
        InteractiveCommand::Status => {
            let snapshot = port.snapshot().await?;
            return Ok(Some(format_progress(&snapshot)));
        }
        InteractiveCommand::Help => return Ok(Some(HELP.to_string())),
        InteractiveCommand::Quit => {}
    }
    Ok(None)
}
