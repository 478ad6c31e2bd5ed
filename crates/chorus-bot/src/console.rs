//! Operator console.
//!
//! A stdin REPL over an explicit command table: a fixed set of string keys
//! mapped to typed setters, parsed by matching on the uppercased first
//! token. Errors are printed and the loop continues; nothing here can
//! crash the session.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::bot::Chatter;
use crate::error::Result;

/// One parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `CON` - connect to chat.
    Connect,
    /// `DISC` - disconnect from chat.
    Disconnect,
    /// `EXIT` - disconnect and close the console.
    Exit,
    /// `INFO` - list current settings.
    Info,
    /// `HELP` - list commands.
    Help,
    /// `MSG <text>` - send a chat message.
    Message(String),
    /// `HS <n>` - window capacity (clears the window).
    WindowCapacity(usize),
    /// `WC <n>` - minimum distinct-author count for an alert.
    MinRepeatCount(usize),
    /// `TH <pct>` - convergence alert threshold percent.
    Threshold(f64),
    /// `MIND <secs>` - minimum randomized pre-send delay.
    MinDelay(u64),
    /// `MAXD <secs>` - maximum randomized pre-send delay.
    MaxDelay(u64),
    /// `INT <secs>` - minimum interval between automated replies.
    MinInterval(u64),
    /// `MAXR <n>` - maximum identical replies in a row.
    MaxIdentical(u32),
    /// `NPC ON|OFF` - automated replies toggle.
    Npc(bool),
}

impl Command {
    /// Parse one non-empty console line. Command names are
    /// case-insensitive; arguments are validated here so setters only ever
    /// see sane values.
    pub fn parse(input: &str) -> std::result::Result<Self, String> {
        let mut parts = parts_of(input);
        let name = parts
            .next()
            .ok_or_else(|| "empty command".to_string())?
            .to_uppercase();

        match name.as_str() {
            "CON" => Ok(Self::Connect),
            "DISC" => Ok(Self::Disconnect),
            "EXIT" => Ok(Self::Exit),
            "INFO" => Ok(Self::Info),
            "HELP" => Ok(Self::Help),
            "MSG" => {
                let text = parts.collect::<Vec<_>>().join(" ");
                if text.is_empty() {
                    Err("You forgot to give the message!".to_string())
                } else {
                    Ok(Self::Message(text))
                }
            }
            "HS" => Ok(Self::WindowCapacity(parse_count(parts.next())? as usize)),
            "WC" => Ok(Self::MinRepeatCount(parse_count(parts.next())? as usize)),
            "TH" => Ok(Self::Threshold(parse_percent(parts.next())?)),
            "MIND" => Ok(Self::MinDelay(parse_count(parts.next())?)),
            "MAXD" => Ok(Self::MaxDelay(parse_count(parts.next())?)),
            "INT" => Ok(Self::MinInterval(parse_count(parts.next())?)),
            "MAXR" => Ok(Self::MaxIdentical(parse_count(parts.next())? as u32)),
            "NPC" => match parts.next().map(str::to_uppercase).as_deref() {
                Some("ON") => Ok(Self::Npc(true)),
                Some("OFF") => Ok(Self::Npc(false)),
                _ => Err("Expected ON or OFF!".to_string()),
            },
            other => Err(format!("Didn't find any command named '{other}'!")),
        }
    }
}

fn parts_of(input: &str) -> impl Iterator<Item = &str> {
    input.split_whitespace()
}

fn parse_count(arg: Option<&str>) -> std::result::Result<u64, String> {
    let arg = arg.ok_or_else(|| "You forgot to give the value!".to_string())?;
    let value: u64 = arg
        .parse()
        .map_err(|_| format!("Given argument '{arg}' isn't a number!"))?;
    if value < 1 {
        return Err(format!("Given value '{value}' is invalid!"));
    }
    Ok(value)
}

fn parse_percent(arg: Option<&str>) -> std::result::Result<f64, String> {
    let arg = arg.ok_or_else(|| "You forgot to give the value!".to_string())?;
    let value: f64 = arg
        .parse()
        .map_err(|_| format!("Given argument '{arg}' isn't a number!"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("Given value '{value}' is invalid!"));
    }
    Ok(value)
}

enum Flow {
    Continue,
    Exit,
}

/// Run the console until `EXIT` or end of input.
pub async fn run(chatter: &Chatter) -> Result<()> {
    println!("Welcome to the chorus console. 'EXIT' to close, 'HELP' for the command list.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match Command::parse(input) {
            Ok(command) => {
                if let Flow::Exit = execute(chatter, command).await {
                    break;
                }
            }
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}

async fn execute(chatter: &Chatter, command: Command) -> Flow {
    match command {
        Command::Connect => report(chatter.session().open().await, "Connected"),
        Command::Disconnect => report(chatter.session().close().await, "Disconnected"),
        Command::Exit => {
            let _ = chatter.session().close().await;
            println!("Bye!");
            return Flow::Exit;
        }
        Command::Info => print_info(chatter).await,
        Command::Help => print_help(),
        Command::Message(text) => report(chatter.session().send_chat(&text).await, "Sent"),
        Command::WindowCapacity(capacity) => {
            let result = chatter.tracker().lock().await.set_window_capacity(capacity);
            report(result.map_err(Into::into), &format!("History size set to [{capacity}]"));
        }
        Command::MinRepeatCount(count) => {
            chatter.tracker().lock().await.set_min_repeat_count(count);
            println!("Minimum repeat count set to [{count}]");
        }
        Command::Threshold(percent) => {
            let result = chatter.tracker().lock().await.set_threshold(percent);
            report(result.map_err(Into::into), &format!("Threshold set to [{percent}]"));
        }
        Command::MinDelay(secs) => {
            chatter.responder().lock().await.min_delay = Duration::from_secs(secs);
            println!("Minimum delay set to [{secs}s]");
        }
        Command::MaxDelay(secs) => {
            chatter.responder().lock().await.max_delay = Duration::from_secs(secs);
            println!("Maximum delay set to [{secs}s]");
        }
        Command::MinInterval(secs) => {
            chatter
                .throttle()
                .lock()
                .await
                .set_min_interval(Duration::from_secs(secs));
            println!("Minimum send interval set to [{secs}s]");
        }
        Command::MaxIdentical(max) => {
            chatter.throttle().lock().await.set_max_identical(max);
            println!("Maximum identical replies set to [{max}]");
        }
        Command::Npc(on) => {
            chatter.responder().lock().await.enabled = on;
            println!("NPC responses {}", if on { "ON" } else { "OFF" });
        }
    }
    Flow::Continue
}

fn report(result: Result<()>, ok: &str) {
    match result {
        Ok(()) => println!("{ok}"),
        Err(e) => println!("Error: {e}"),
    }
}

async fn print_info(chatter: &Chatter) {
    let (capacity, resident, threshold, min_repeat) = {
        let tracker = chatter.tracker().lock().await;
        (
            tracker.window_capacity(),
            tracker.window_len(),
            tracker.threshold_percent(),
            tracker.min_repeat_count(),
        )
    };
    let (max_identical, min_interval) = {
        let throttle = chatter.throttle().lock().await;
        (throttle.max_identical(), throttle.min_interval())
    };
    let responder = chatter.responder().lock().await.clone();
    let state = chatter.session().state().await;

    println!("========== Chatter settings ==========");
    println!("Session state: {state}");
    println!("History size: {capacity} ({resident} resident)");
    println!("Threshold: {threshold}%");
    println!("Minimum repeat count: {min_repeat}");
    println!("Minimum delay: {:?}", responder.min_delay);
    println!("Maximum delay: {:?}", responder.max_delay);
    println!("Minimum send interval: {min_interval:?}");
    println!("Maximum identical replies: {max_identical}");
    println!("NPC responses: {}", if responder.enabled { "ON" } else { "OFF" });
    println!("======================================");
}

fn print_help() {
    println!("========== Available commands ==========");
    println!("CON   - connect to chat");
    println!("DISC  - disconnect from chat");
    println!("MSG   - send a message to chat");
    println!("INFO  - list current settings");
    println!("HS    - set history size (clears the window)");
    println!("WC    - set how many chatters have to repeat a word to alert");
    println!("TH    - set the convergence threshold percent");
    println!("MIND  - set the minimum delay before an automated reply");
    println!("MAXD  - set the maximum delay before an automated reply");
    println!("INT   - set the minimum interval between automated replies");
    println!("MAXR  - set the maximum identical replies in a row");
    println!("NPC   - turn automated replies ON or OFF");
    println!("EXIT  - close the chatter");
    println!("HELP  - this list");
    println!("========================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_are_case_insensitive() {
        assert_eq!(Command::parse("con").unwrap(), Command::Connect);
        assert_eq!(Command::parse("Exit").unwrap(), Command::Exit);
    }

    #[test]
    fn message_joins_its_arguments() {
        assert_eq!(
            Command::parse("MSG hello there chat").unwrap(),
            Command::Message("hello there chat".to_string())
        );
        assert!(Command::parse("MSG").is_err());
    }

    #[test]
    fn numeric_arguments_are_validated() {
        assert_eq!(Command::parse("HS 10").unwrap(), Command::WindowCapacity(10));
        assert_eq!(Command::parse("WC 4").unwrap(), Command::MinRepeatCount(4));
        assert_eq!(Command::parse("TH 82.5").unwrap(), Command::Threshold(82.5));

        assert!(Command::parse("HS").is_err());
        assert!(Command::parse("HS zero").is_err());
        assert!(Command::parse("HS 0").is_err());
        assert!(Command::parse("TH -5").is_err());
    }

    #[test]
    fn npc_toggle() {
        assert_eq!(Command::parse("NPC on").unwrap(), Command::Npc(true));
        assert_eq!(Command::parse("NPC OFF").unwrap(), Command::Npc(false));
        assert!(Command::parse("NPC maybe").is_err());
    }

    #[test]
    fn unknown_commands_are_reported() {
        let err = Command::parse("FROB 1").unwrap_err();
        assert!(err.contains("FROB"));
    }
}
