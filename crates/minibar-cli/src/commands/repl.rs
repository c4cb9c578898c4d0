//! Interactive bar session.
//!
//! Generic over input and output so sessions can be scripted in tests.
//! Ledger failures are printed and the loop continues; only I/O errors on the
//! terminal itself end the session with an error.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use minibar_ledger::{Ledger, LedgerError, SaleOutcome};
use minibar_report::ReportFormat;

pub const PROMPT: &str = "- Could you tell me the command, please \n(menu/drink/supply/log/exit)? : ";
pub const DRINK_PROMPT: &str = "- What drink do you want ? : ";
pub const SUPPLY_PROMPT: &str = "write 'drink' 'amount' 'price' for supplying: ";

pub const MSG_SOLD: &str = "- a good choice";
pub const MSG_NO_SUCH_DRINK: &str = "there is no such drink.\nanything else?";
pub const MSG_NO_MORE: &str = "- there is no more this drink";
pub const MSG_UNKNOWN: &str = "- unknown command";
pub const MSG_GOODBYE: &str = "- Goodbye";
pub const MSG_SUPPLY_CANCELLED: &str = "- supply cancelled";

enum Command {
    Menu,
    Drink,
    Supply,
    Log,
    Exit,
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "menu" => Command::Menu,
            "drink" => Command::Drink,
            "supply" => Command::Supply,
            "log" => Command::Log,
            "exit" => Command::Exit,
            _ => Command::Unknown,
        }
    }
}

/// Run until `exit` or end of input.
pub async fn run<R: BufRead, W: Write>(
    ledger: &Ledger,
    bar_name: &str,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    write_banner(out, bar_name)?;

    loop {
        let Some(line) = prompt(&mut input, out, PROMPT)? else {
            break;
        };

        match Command::parse(&line) {
            Command::Exit => break,
            Command::Menu => match ledger.list_available().await {
                Ok(entries) => {
                    let text = minibar_report::render_menu(&entries, ReportFormat::Text)?;
                    writeln!(out, "{text}\n")?;
                }
                Err(e) => report_error(out, &e)?,
            },
            Command::Log => match ledger.list_operations().await {
                Ok(ops) => {
                    let text = minibar_report::render_log(&ops, ReportFormat::Text)?;
                    writeln!(out, "{text}\n")?;
                }
                Err(e) => report_error(out, &e)?,
            },
            Command::Drink => {
                let Some(name) = prompt(&mut input, out, DRINK_PROMPT)? else {
                    break;
                };
                match ledger.sell(name.trim()).await {
                    Ok(outcome) => writeln!(out, "drink buy: {}", sale_message(&outcome))?,
                    Err(e) => report_error(out, &e)?,
                }
            }
            Command::Supply => {
                // Re-prompt until the line parses. An empty line or `exit`
                // goes back to the command prompt; end of input ends the session.
                let parsed = loop {
                    let Some(line) = prompt(&mut input, out, SUPPLY_PROMPT)? else {
                        break None;
                    };
                    if matches!(line.trim(), "" | "exit") {
                        break Some(None);
                    }
                    match super::parse_supply_line(&line) {
                        Ok(v) => break Some(Some(v)),
                        Err(e) => writeln!(out, "- {e:#}")?,
                    }
                };
                let Some(parsed) = parsed else {
                    break;
                };
                let Some((name, amount, price)) = parsed else {
                    writeln!(out, "{MSG_SUPPLY_CANCELLED}")?;
                    continue;
                };
                match ledger.supply(&name, amount, price).await {
                    Ok(outcome) => writeln!(out, "supply: {}", outcome.name())?,
                    Err(e) => report_error(out, &e)?,
                }
            }
            Command::Unknown => writeln!(out, "{MSG_UNKNOWN}")?,
        }
    }

    writeln!(out, "{MSG_GOODBYE}")?;
    out.flush().context("flush output failed")?;
    Ok(())
}

pub fn sale_message(outcome: &SaleOutcome) -> &'static str {
    match outcome {
        SaleOutcome::Sold { .. } => MSG_SOLD,
        SaleOutcome::NoSuchDrink { .. } => MSG_NO_SUCH_DRINK,
        SaleOutcome::InsufficientStock { .. } => MSG_NO_MORE,
    }
}

fn write_banner<W: Write>(out: &mut W, bar_name: &str) -> Result<()> {
    writeln!(out, "Welcome to {bar_name} robo-bar!!!")?;
    writeln!(out, "look at the commands:")?;
    writeln!(out, "'menu' - see the menu")?;
    writeln!(out, "'drink' - buy a drink at the bar")?;
    writeln!(out, "'supply' - supply drinks to the bar")?;
    writeln!(out, "'log' - log sales and arrivals")?;
    writeln!(out, "'exit' - leave the bar\n")?;
    Ok(())
}

/// Print `text`, read one line. `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush().context("flush prompt failed")?;

    let mut line = String::new();
    let n = input.read_line(&mut line).context("read input failed")?;
    if n == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn report_error<W: Write>(out: &mut W, e: &LedgerError) -> Result<()> {
    tracing::warn!(error = %e, "command failed");
    writeln!(out, "error: {e}")?;
    Ok(())
}
