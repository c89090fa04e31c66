use std::io::BufRead;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::driver::Command;
use crate::model::TradingStyle;

const HELP: &str = "commands: buy <amount> | sell <amount> | asset <id> | style <day|swing> \
                    | refresh | train | quote | balance | help | quit";

/// One line of console input.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(Command),
    Help,
    Blank,
}

/// Parse a console line.
///
/// Trade amounts are passed through as text; the portfolio validates them.
pub fn parse_line(line: &str, assets: &[String]) -> Result<ConsoleInput, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(ConsoleInput::Blank);
    };
    let arg = parts.collect::<Vec<_>>().join(" ");

    let command = match verb.to_ascii_lowercase().as_str() {
        "buy" => Command::Buy(arg),
        "sell" => Command::Sell(arg),
        "asset" | "coin" => {
            if arg.is_empty() {
                return Err("usage: asset <id>".to_string());
            }
            let asset = arg.to_ascii_lowercase();
            if !assets.is_empty() && !assets.contains(&asset) {
                return Err(format!(
                    "unknown asset {asset:?}; choose one of: {}",
                    assets.join(", ")
                ));
            }
            Command::SelectAsset(asset)
        }
        "style" => {
            let style = TradingStyle::from_str(&arg)
                .ok_or_else(|| format!("unknown trading style {arg:?}; use day or swing"))?;
            Command::SetStyle(style)
        }
        "refresh" => Command::Refresh,
        "train" => Command::Train,
        "quote" | "price" => Command::Quote,
        "balance" => Command::Balance,
        "quit" | "exit" => Command::Quit,
        "help" | "?" => return Ok(ConsoleInput::Help),
        other => return Err(format!("unknown command {other:?}; type help")),
    };
    Ok(ConsoleInput::Command(command))
}

/// Forward stdin lines to the driver on a dedicated thread.
///
/// Stdin is read with blocking I/O so the thread is never joined; it ends on
/// EOF, cancellation, or once the driver drops its receiver.
pub fn spawn_reader(
    assets: Vec<String>,
    tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || read_commands(std::io::stdin().lock(), &assets, &tx, &cancel))
}

fn read_commands(
    input: impl BufRead,
    assets: &[String],
    tx: &mpsc::Sender<Command>,
    cancel: &CancellationToken,
) {
    info!("{HELP}");

    for line in input.lines() {
        if cancel.is_cancelled() {
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        };

        match parse_line(&line, assets) {
            Ok(ConsoleInput::Command(command)) => {
                if tx.blocking_send(command).is_err() {
                    break;
                }
            }
            Ok(ConsoleInput::Help) => info!("{HELP}"),
            Ok(ConsoleInput::Blank) => {}
            Err(message) => warn!("{message}"),
        }
    }
    debug!("console reader finished");
}
