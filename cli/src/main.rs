//! fxwidget
//!
//! Terminal front end for the currency converter.

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxwidget_common::{Currency, CurrencyCode};
use fxwidget_fx::{ConversionDisplay, FxError, Widget, WidgetConfig};

mod command;

use command::{Command, HELP};

/// fxwidget CLI
#[derive(Parser, Debug)]
#[command(name = "fxwidget")]
#[command(about = "Convert amounts between currencies using live exchange rates")]
struct Args {
    /// Override the primary API root
    #[arg(long)]
    base_url: Option<String>,

    /// Override the catalog mirror root
    #[arg(long)]
    fallback_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// List supported currencies
    Currencies {
        /// Only list currencies whose code or name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Convert a single amount
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    /// Read commands line by line from stdin
    Interactive,
}

fn init_logging(config: &WidgetConfig) {
    let json = std::env::var("FXWIDGET_LOG_JSON").map_or(false, |v| v == "1");

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = WidgetConfig::from_env();
    if let Some(url) = args.base_url {
        config.sources.base_url = url;
    }
    if let Some(url) = args.fallback_url {
        config.sources.fallback_url = url;
    }
    if let Some(ms) = args.timeout_ms {
        config.sources.request_timeout = std::time::Duration::from_millis(ms);
    }

    init_logging(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let widget = Widget::from_config(config)?;
    if let Err(e) = widget.initialize().await {
        if let Some(notice) = widget.notice() {
            eprintln!("{}", notice.message);
        }
        return Err(e.into());
    }
    info!(status = %widget.status(), "Ready");

    match args.command {
        Mode::Currencies { search } => {
            print_currencies(&widget.search(search.as_deref().unwrap_or("")));
        }
        Mode::Convert { amount, from, to } => {
            widget.select_from(CurrencyCode::parse(&from)?).await?;
            widget.select_to(CurrencyCode::parse(&to)?).await?;
            if let Some(display) = widget.on_amount_input(&amount).await? {
                print_display(&display);
            }
        }
        Mode::Interactive => run_interactive(&widget).await?,
    }

    Ok(())
}

async fn run_interactive(widget: &Widget) -> anyhow::Result<()> {
    println!("{}", widget.status());
    if let Some(selection) = widget.selection() {
        println!("{} -> {}", selection.from, selection.to);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                None
            }
        };
        let Some(line) = line else { break };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let result = match command {
            Command::Amount(text) => widget.on_amount_input(&text).await,
            Command::From(code) => widget.select_from(code).await,
            Command::To(code) => widget.select_to(code).await,
            Command::Swap => widget.swap().await,
            Command::Search(term) => {
                print_currencies(&widget.search(&term));
                continue;
            }
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        };

        match result {
            Ok(Some(display)) => print_display(&display),
            Ok(None) => {}
            Err(e @ FxError::UnknownCurrency(_)) => println!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn print_display(display: &ConversionDisplay) {
    println!("{}", display.text);
    if !display.rate_text.is_empty() {
        println!("{}", display.rate_text);
    }
}

fn print_currencies(currencies: &[Currency]) {
    if currencies.is_empty() {
        println!("No currencies found");
        return;
    }
    for currency in currencies {
        println!("{:<8} {}", currency.code.as_str(), currency.name);
    }
}
