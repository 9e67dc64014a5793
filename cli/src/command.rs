//! Interactive mode commands.

use fxwidget_common::{CodeError, CurrencyCode};

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Anything that is not a keyword is amount text.
    Amount(String),
    From(CurrencyCode),
    To(CurrencyCode),
    Swap,
    Search(String),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CodeError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "from" => Command::From(CurrencyCode::parse(rest)?),
            "to" => Command::To(CurrencyCode::parse(rest)?),
            "swap" => Command::Swap,
            "search" => Command::Search(rest.to_string()),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Amount(line.to_string()),
        };
        Ok(command)
    }
}

pub const HELP: &str = "\
Commands:
  <amount>        convert an amount
  from <CODE>     set the source currency
  to <CODE>       set the target currency
  swap            swap source and target
  search <TERM>   list matching currencies
  quit            leave";
