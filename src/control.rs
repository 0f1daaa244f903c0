use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use thiserror::Error;

use crate::spectrum::settings::{float_or_zero, int_or_zero, unsigned_or_zero, FilterMode, SettingsCommand};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Settings(SettingsCommand),
    ToggleOverlay,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ControlParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("unknown filter mode '{0}'")]
    UnknownMode(String),
}

/// Parses one runtime settings line, e.g. `decay 60`, `mode weighted`, `next`.
///
/// Lines are read on a helper thread and queued; the tick loop drains the
/// queue between ticks so each tick sees one consistent configuration.
/// Numeric arguments follow the lenient rule: missing or malformed text
/// reads as 0.
pub fn parse_command(line: &str) -> Result<ControlCommand, ControlParseError> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };

    let settings = match word.to_ascii_lowercase().as_str() {
        "" => return Err(ControlParseError::Empty),
        "amp" | "amp_scalar" => SettingsCommand::AmpScalar(unsigned_or_zero(arg)),
        "decay" => SettingsCommand::Decay(int_or_zero(arg)),
        "range" => SettingsCommand::Range(unsigned_or_zero(arg)),
        "alpha" => SettingsCommand::Alpha(float_or_zero(arg)),
        "mode" => {
            let mode = FilterMode::parse(arg).ok_or_else(|| ControlParseError::UnknownMode(arg.to_string()))?;
            SettingsCommand::Mode(mode)
        }
        "next" | "down" => SettingsCommand::NextMode,
        "prev" | "up" => SettingsCommand::PrevMode,
        "debug" => return Ok(ControlCommand::ToggleOverlay),
        "quit" | "q" | "exit" => return Ok(ControlCommand::Quit),
        _ => return Err(ControlParseError::Unknown(word.to_string())),
    };
    Ok(ControlCommand::Settings(settings))
}

/// Parses lines until the reader ends or the receiving side hangs up.
pub fn forward_commands<R: BufRead>(reader: R, tx: &Sender<ControlCommand>) {
    for line in reader.lines() {
        let Ok(line) = line else { break };
        match parse_command(&line) {
            Ok(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            Err(ControlParseError::Empty) => {}
            Err(err) => log::warn!("Ignoring control input: {}", err),
        }
    }
}

pub fn spawn_stdin_reader() -> Receiver<ControlCommand> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("auvi-control".into())
        .spawn(move || forward_commands(io::stdin().lock(), &tx));
    if let Err(err) = spawned {
        log::warn!("Runtime settings disabled, could not start reader: {}", err);
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_numeric_settings() {
        assert_eq!(
            parse_command("decay 60"),
            Ok(ControlCommand::Settings(SettingsCommand::Decay(60)))
        );
        assert_eq!(
            parse_command("  alpha   0.5 "),
            Ok(ControlCommand::Settings(SettingsCommand::Alpha(0.5)))
        );
        assert_eq!(
            parse_command("AMP 2500"),
            Ok(ControlCommand::Settings(SettingsCommand::AmpScalar(2500)))
        );
    }

    #[test]
    fn malformed_values_read_as_zero() {
        assert_eq!(
            parse_command("range eight"),
            Ok(ControlCommand::Settings(SettingsCommand::Range(0)))
        );
        assert_eq!(
            parse_command("amp"),
            Ok(ControlCommand::Settings(SettingsCommand::AmpScalar(0)))
        );
        assert_eq!(
            parse_command("range -4"),
            Ok(ControlCommand::Settings(SettingsCommand::Range(0)))
        );
    }

    #[test]
    fn parses_modes_and_cycling() {
        assert_eq!(
            parse_command("mode exponential"),
            Ok(ControlCommand::Settings(SettingsCommand::Mode(FilterMode::ExponentialFilter)))
        );
        assert_eq!(
            parse_command("mode 1"),
            Ok(ControlCommand::Settings(SettingsCommand::Mode(FilterMode::Block)))
        );
        assert_eq!(parse_command("next"), Ok(ControlCommand::Settings(SettingsCommand::NextMode)));
        assert_eq!(parse_command("up"), Ok(ControlCommand::Settings(SettingsCommand::PrevMode)));
        assert_eq!(
            parse_command("mode median"),
            Err(ControlParseError::UnknownMode("median".into()))
        );
    }

    #[test]
    fn rejects_unknown_and_blank_lines() {
        assert_eq!(parse_command("   "), Err(ControlParseError::Empty));
        assert_eq!(parse_command("louder"), Err(ControlParseError::Unknown("louder".into())));
        assert_eq!(parse_command("debug"), Ok(ControlCommand::ToggleOverlay));
        assert_eq!(parse_command("q"), Ok(ControlCommand::Quit));
    }

    #[test]
    fn forwards_valid_lines_in_order() {
        let input = Cursor::new("decay 50\n\nbogus\nmode box\nquit\n");
        let (tx, rx) = mpsc::channel();
        forward_commands(input, &tx);
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                ControlCommand::Settings(SettingsCommand::Decay(50)),
                ControlCommand::Settings(SettingsCommand::Mode(FilterMode::BoxFilter)),
                ControlCommand::Quit,
            ]
        );
    }
}
