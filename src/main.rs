//! # invoice-forge CLI
//!
//! ```bash
//! # Write the editable page (template invoice when no data is given)
//! invoice-forge render -o invoice.html
//!
//! # Export a PDF once the edits have settled
//! invoice-forge export --data acme.json --set invoiceTitle=INV-7 --out-dir out
//!
//! # Re-export whenever the data file changes
//! invoice-forge watch --data acme.json --out-dir out
//!
//! # Inspect what a set of style tokens composes to
//! invoice-forge compose "span right bold"
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use invoice_forge::binding::{Change, Edit};
use invoice_forge::config::AppConfig;
use invoice_forge::session::Session;
use invoice_forge::trigger::TriggerState;
use invoice_forge::watch::{load_invoice, WatchLoop};
use invoice_forge::Result;

/// invoice-forge - editable invoice form with PDF export
#[derive(Parser, Debug)]
#[command(name = "invoice-forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Invoice JSON to start from (the starter template when omitted)
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Field assignment such as `clientName=Acme` or `productLines.0.rate=12`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    sets: Vec<String>,

    /// Blank product lines to append before assignments are applied
    #[arg(long, default_value = "0")]
    add_lines: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the interactive HTML page
    Render {
        #[command(flatten)]
        data: DataArgs,

        /// Output file
        #[arg(short, long, default_value = "invoice.html")]
        output: PathBuf,

        /// Render as if the edits had settled, with the download link live
        #[arg(long)]
        settled: bool,
    },
    /// Export the invoice as PDF
    Export {
        #[command(flatten)]
        data: DataArgs,

        /// Directory for the PDF (overrides the config file)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Also dump the page layout as JSON
        #[arg(long, value_name = "FILE")]
        layout_json: Option<PathBuf>,
    },
    /// Re-export whenever the invoice file changes
    Watch {
        /// Invoice JSON to watch
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Directory for the PDFs (overrides the config file)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "200")]
        interval_ms: u64,
    },
    /// Print the style bundle a token list composes to
    Compose {
        /// Space-separated style tokens
        tokens: String,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            data,
            output,
            settled,
        } => {
            let now = Instant::now();
            let mut session = open_session(&config, &data, now)?;
            let at = if settled { now + config.debounce() } else { now };
            std::fs::write(&output, session.render_html(at)?)?;
            println!("Wrote {}", output.display());
        }
        Commands::Export {
            data,
            out_dir,
            layout_json,
        } => {
            let mut session = open_session(&config, &data, Instant::now())?;
            wait_until_ready(&mut session);
            let (download, layout) = session.render_document()?;
            let path = download.save_to(out_dir.as_deref().unwrap_or(config.output_dir.as_path()))?;
            if let Some(layout_path) = layout_json {
                std::fs::write(&layout_path, layout.to_json()?)?;
            }
            println!("Wrote {} ({} page(s))", path.display(), layout.pages.len());
        }
        Commands::Watch {
            data,
            out_dir,
            interval_ms,
        } => {
            let session = Session::from_config(&config, None, Instant::now())?;
            let out_dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
            WatchLoop::new(data, out_dir, session).run(Duration::from_millis(interval_ms));
        }
        Commands::Compose { tokens } => {
            let bundle = config.composer()?.compose(&tokens);
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }
    }
    Ok(())
}

/// Build a session from the data file, then apply line additions and
/// assignments as edits made at `now`.
fn open_session(config: &AppConfig, args: &DataArgs, now: Instant) -> Result<Session> {
    let data = args.data.as_deref().map(load_invoice).transpose()?;
    let mut session = Session::from_config(config, data, now)?;
    for _ in 0..args.add_lines {
        session.apply(Change::AddLine, now)?;
    }
    for assignment in &args.sets {
        session.apply(Edit::parse_assignment(assignment)?.into(), now)?;
    }
    Ok(session)
}

/// Sleep through the debounce window.
fn wait_until_ready(session: &mut Session) {
    while session.poll(Instant::now()) != TriggerState::Ready {
        if let Some(at) = session.trigger().ready_at() {
            std::thread::sleep(at.saturating_duration_since(Instant::now()));
        }
    }
}
