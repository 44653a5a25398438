//! Interactive shell
//!
//! Reads input and runs it to completion (parse, execute, persist) before
//! prompting again. Input is either an inline command such as `SET k v`,
//! or wire frames. Wire frames may be typed on one line with `\r` `\n`
//! `\t` `\\` escapes, or span several lines (piped or pasted input), in
//! which case each line break stands for a CRLF.

use crate::dispatch::Dispatcher;
use crate::protocol::{Command, RespValue, StreamingParser};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

const PROMPT: &str = ">> ";
const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

/// Leading bytes that mark a line as wire input
const FRAME_MARKERS: &[u8] = b"*$+-:!=%~>_#";

/// Run the shell on the process's stdin/stdout until `exit` or EOF
pub async fn run_stdio(dispatcher: &mut Dispatcher) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    run(dispatcher, input, output).await
}

/// Run the shell over arbitrary streams
///
/// Returns an error only when the log can no longer be written or the
/// streams themselves fail.
pub async fn run<R, W>(dispatcher: &mut Dispatcher, mut input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(b"CinderKV\n").await?;
    let mut line = String::new();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        line.clear();
        let n = input
            .read_line(&mut line)
            .await
            .context("failed to read from input")?;
        if n == 0 {
            output.write_all(b"\nGoodbye!\n").await?;
            break;
        }

        let trimmed = line.trim_end_matches(['\n', '\r']);
        match trimmed.trim() {
            "" => continue,
            "exit" => break,
            "clear" => {
                output.write_all(CLEAR_SCREEN.as_bytes()).await?;
                continue;
            }
            "help" => {
                output.write_all(help_text(dispatcher).as_bytes()).await?;
                continue;
            }
            _ => {}
        }

        let processed = unescape(trimmed);
        let replies = if is_wire_input(&processed) {
            let frames = read_frames(&mut input, processed).await?;
            debug!("Shell input treated as wire frames");
            dispatcher
                .handle_input(frames.as_bytes())
                .context("failed to persist command")?
        } else {
            execute_inline(dispatcher, &processed)?
        };

        for reply in replies {
            output.write_all(render(&reply).as_bytes()).await?;
            output.write_all(b"\n").await?;
        }
    }

    output.flush().await?;
    Ok(())
}

/// Keep reading lines until `buffer` holds only complete frames
///
/// Each line break read here is put back as a CRLF. Stops early at EOF or
/// at a malformed frame, leaving the error to the dispatcher.
async fn read_frames<R>(input: &mut R, mut buffer: String) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();

    loop {
        if frames_complete(buffer.as_bytes()) {
            return Ok(buffer);
        }

        // The line break that ended the previous line
        buffer.push_str("\r\n");
        if frames_complete(buffer.as_bytes()) {
            return Ok(buffer);
        }

        line.clear();
        let n = input
            .read_line(&mut line)
            .await
            .context("failed to read from input")?;
        if n == 0 {
            return Ok(buffer);
        }
        buffer.push_str(&unescape(line.trim_end_matches(['\n', '\r'])));
    }
}

/// False while more input could still complete the last frame
fn frames_complete(buffer: &[u8]) -> bool {
    let mut parser = StreamingParser::new(buffer).strict();
    loop {
        match parser.parse_command() {
            Ok(Some(_)) => continue,
            Ok(None) => return true,
            Err(e) => return !e.is_incomplete(),
        }
    }
}

/// Execute a whitespace-separated command
fn execute_inline(dispatcher: &mut Dispatcher, line: &str) -> Result<Vec<RespValue>> {
    match Command::from_parts(line.split_whitespace()) {
        Some(command) => {
            let frame = command.to_wire();
            let reply = dispatcher
                .handle(&command, &frame)
                .context("failed to persist command")?;
            Ok(vec![reply])
        }
        None => Ok(Vec::new()),
    }
}

fn is_wire_input(input: &str) -> bool {
    input
        .as_bytes()
        .first()
        .is_some_and(|b| FRAME_MARKERS.contains(b))
}

/// Turn typed escape sequences into the characters they name
///
/// Unknown escapes are kept as typed.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Human-readable form of a reply
pub fn render(reply: &RespValue) -> String {
    match reply {
        RespValue::SimpleString(s) => s.clone(),
        RespValue::Error(e) => format!("(error) {}", e),
        RespValue::Integer(i) => format!("(integer) {}", i),
        RespValue::BulkString(b) => format!("\"{}\"", String::from_utf8_lossy(b)),
        RespValue::Null => "(nil)".to_string(),
        RespValue::Array(items) if items.is_empty() => "(empty array)".to_string(),
        RespValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}) {}", i + 1, render(item)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn help_text(dispatcher: &Dispatcher) -> String {
    let mut text = String::from("Commands:\n");
    for handler in dispatcher.registry().handlers() {
        text.push_str(&format!("  {:<28} {}\n", handler.syntax(), handler.summary()));
    }
    text.push_str("Shell: help, clear, exit\n");
    text
}
