//! `vani detect` — report the script hint for a text.

use std::io::Read;
use std::path::Path;

use vani_voice::{ScriptHint, detect_script};

use crate::error::CliError;

/// Classify `text`, or the contents of `file`, or stdin.
pub fn execute(text: Option<String>, file: Option<&Path>) -> Result<ScriptHint, CliError> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let hint = detect_script(&text);
    println!("{hint}");
    Ok(hint)
}
