//! Interactive prompt commands.
//!
//! One command per line. Single-character shortcuts mirror the transport
//! buttons: `p` pause, `r` resume, `s` stop, `b`/`f` skip, `+`/`-` rate.

use crate::error::CliError;

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractiveCommand {
    Play,
    PlayFrom(usize),
    Pause,
    Resume,
    Stop,
    Back,
    Forward,
    Faster,
    Slower,
    Rate(f32),
    /// `None` selects the engine default voice.
    Voice(Option<String>),
    Voices,
    Status,
    Help,
    Quit,
}

/// Help text listing every prompt command.
pub const HELP: &str = "\
commands:
  play [OFFSET]   start from the beginning (or OFFSET)
  p | pause       pause
  r | resume      resume
  s | stop        stop and rewind
  b | back        skip backward
  f | forward     skip forward
  + | faster      increase rate
  - | slower      decrease rate
  rate X          set rate to X
  voice ID        use voice ID (\"default\" for the engine default)
  voices          list voices
  status          show position
  h | help        this help
  q | quit        exit";

/// Parse one prompt line. Blank lines show the status.
pub fn parse_command(line: &str) -> Result<InteractiveCommand, CliError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(InteractiveCommand::Status);
    };
    let arg = parts.next();

    if parts.next().is_some() {
        return Err(CliError::Arguments(format!("too many arguments: {line}")));
    }

    let cmd = match (head.to_lowercase().as_str(), arg) {
        ("play", None) => InteractiveCommand::Play,
        ("play", Some(offset)) => InteractiveCommand::PlayFrom(
            offset
                .parse()
                .map_err(|_| CliError::Arguments(format!("invalid offset: {offset}")))?,
        ),
        ("p" | "pause", None) => InteractiveCommand::Pause,
        ("r" | "resume", None) => InteractiveCommand::Resume,
        ("s" | "stop", None) => InteractiveCommand::Stop,
        ("b" | "back", None) => InteractiveCommand::Back,
        ("f" | "forward", None) => InteractiveCommand::Forward,
        ("+" | "faster", None) => InteractiveCommand::Faster,
        ("-" | "slower", None) => InteractiveCommand::Slower,
        ("rate", Some(rate)) => InteractiveCommand::Rate(
            rate.parse()
                .map_err(|_| CliError::Arguments(format!("invalid rate: {rate}")))?,
        ),
        ("voice", Some("default")) => InteractiveCommand::Voice(None),
        ("voice", Some(id)) => InteractiveCommand::Voice(Some(id.to_string())),
        ("voices", None) => InteractiveCommand::Voices,
        ("status" | "?", None) => InteractiveCommand::Status,
        ("h" | "help", None) => InteractiveCommand::Help,
        ("q" | "quit" | "exit", None) => InteractiveCommand::Quit,
        _ => return Err(CliError::Arguments(format!("unknown command: {line}"))),
    };
    Ok(cmd)
}
