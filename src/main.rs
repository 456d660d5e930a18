// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use care_desk::{
    bundle_site, export, AddOutcome, Command, Config, ContactCollector, DirFetcher, PettyCash,
    SiteFetcher, StatusFlag, TemplateStore, Theme, SITES, SITE_FILES,
};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "care-desk", about = "Petty cash messages and contact cards for care-home staff", version)]
struct Args {
    /// Where settings (theme, templates) are stored.
    #[arg(long, env = "CARE_DESK_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Where exported files are written.
    #[arg(long, env = "CARE_DESK_EXPORT_DIR", global = true)]
    export_dir: Option<PathBuf>,

    /// Keep settings in memory only for this run.
    #[arg(long, global = true)]
    ephemeral: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Interactive terminal UI (default).
    Tui,
    /// Turn a CSV of rows (name,date,status,amount) into the WhatsApp export file.
    Export {
        /// CSV file with a header row.
        #[arg(long)]
        records: PathBuf,
        /// Template slot to use instead of the saved export slot.
        #[arg(long)]
        slot: Option<u8>,
    },
    /// Turn a CSV of contacts (prefix,name,number) into a .vcf file.
    Contacts {
        #[arg(long)]
        from: PathBuf,
    },
    /// Manage message template slots.
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Show or toggle the light/dark preference.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// List the tools on the landing page.
    Sites,
    /// Package the static site into a zip for local use.
    Bundle {
        /// Local folder holding the site files.
        #[arg(long, conflicts_with = "url")]
        dir: Option<PathBuf>,
        /// Page URL the site is served from.
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List slots and mark the export slot.
    List,
    /// Print one slot's text.
    Show { slot: u8 },
    /// Replace a slot's text from a file (or stdin with "-").
    Set { slot: u8, file: PathBuf },
    /// Add a slot seeded with the default message.
    Add,
    /// Delete a slot; remaining slots are renumbered.
    Delete { slot: u8 },
    /// Choose the slot used for export.
    Select { slot: u8 },
}

/// One CSV row for batch export
#[derive(Debug, Deserialize)]
struct RecordRow {
    name: String,
    date: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    amount: String,
}

#[derive(Debug, Deserialize)]
struct ContactRow {
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    number: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::resolve(args.data_dir.clone(), args.export_dir.clone(), args.ephemeral);

    let command = args.command.unwrap_or(Cmd::Tui);
    let log_to_file = matches!(command, Cmd::Tui);
    init_logging(args.verbose, log_to_file.then(|| config.log_path()))?;

    match command {
        Cmd::Tui => run_ui_mode(&config),
        Cmd::Export { records, slot } => run_export(&config, &records, slot),
        Cmd::Contacts { from } => run_contacts(&config, &from),
        Cmd::Template { action } => run_template(&config, action),
        Cmd::Theme { toggle } => run_theme(&config, toggle),
        Cmd::Sites => {
            for site in SITES {
                println!("{}  →  {}", site.name, site.file);
            }
            Ok(())
        }
        Cmd::Bundle { dir, url } => run_bundle(&config, dir, url),
    }
}

fn init_logging(verbose: u8, log_file: Option<PathBuf>) -> Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("care_desk={}", level).parse()?);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn run_export(config: &Config, csv_path: &Path, slot: Option<u8>) -> Result<()> {
    println!("📄 Loading rows from {:?}...", csv_path);
    let mut app = PettyCash::new(config.open_store());
    if let Some(slot) = slot {
        ensure_slot(&app.templates, slot)?;
    }

    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;
    let mut skipped = 0;
    for (line, result) in rdr.deserialize::<RecordRow>().enumerate() {
        let row = result.context("Failed to deserialize row")?;
        let status = StatusFlag::parse(&row.status)
            .with_context(|| format!("Unknown status {:?} on row {}", row.status, line + 2))?;

        app.dispatch(Command::SetInputName(row.name))?;
        app.dispatch(Command::SetInputDate(row.date))?;
        app.dispatch(Command::SetInputStatus(status))?;
        app.dispatch(Command::SetInputAmount(row.amount))?;
        if let Err(e) = app.dispatch(Command::Commit) {
            tracing::warn!(row = line + 2, error = %e, "row skipped");
            skipped += 1;
        }
    }
    println!("✓ Committed {} rows ({} skipped)", app.records.len(), skipped);

    // --slot applies to this run only; the saved export slot is untouched
    let template = match slot {
        Some(slot) => app.templates.get_template(slot).trim(),
        None => app.templates.export_template(),
    };
    let text = export::format_export_bundle(app.records.committed(), template);

    config.ensure_export_dir()?;
    let path = export::write_export(&config.export_dir, &text)?;
    println!("✓ Export written to {}", path.display());
    Ok(())
}

fn run_contacts(config: &Config, csv_path: &Path) -> Result<()> {
    let mut collector = ContactCollector::new();
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    for (line, result) in rdr.deserialize::<ContactRow>().enumerate() {
        let row = result.context("Failed to deserialize contact")?;
        match collector.add_contact(&row.prefix, &row.name, &row.number) {
            Ok(AddOutcome::Ignored) => tracing::debug!(row = line + 2, "blank contact row"),
            Ok(_) => {}
            Err(e) => eprintln!("⚠️  Row {}: {} ({:?})", line + 2, e, row.number),
        }
    }

    if collector.is_empty() {
        println!("No contacts to export.");
        return Ok(());
    }
    let today = chrono::Utc::now().date_naive();
    config.ensure_export_dir()?;
    if let Some(export) = collector
        .export_to(&config.export_dir, today)
        .with_context(|| format!("Failed to write .vcf into {:?}", config.export_dir))?
    {
        println!(
            "✓ {} contacts written to {}",
            export.count,
            config.export_dir.join(&export.file_name).display()
        );
    }
    Ok(())
}

fn run_template(config: &Config, action: TemplateAction) -> Result<()> {
    let mut app = PettyCash::new(config.open_store());
    let templates = &mut app.templates;

    match action {
        TemplateAction::List => {
            for slot in templates.slot_numbers() {
                let marker = if slot == templates.export_slot() { "→" } else { " " };
                let first_line = templates.get_template(slot).lines().next().unwrap_or("");
                println!("{} {}  {}", marker, slot, first_line);
            }
        }
        TemplateAction::Show { slot } => {
            ensure_slot(templates, slot)?;
            println!("{}", templates.get_template(slot));
        }
        TemplateAction::Set { slot, file } => {
            ensure_slot(templates, slot)?;
            let text = if file.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
            } else {
                std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read template file: {:?}", file))?
            };
            templates.set_template(slot, &text);
            println!("✓ Slot {} saved", slot);
        }
        TemplateAction::Add => {
            let slot = templates.add_slot()?;
            println!("✓ Added slot {}", slot);
        }
        TemplateAction::Delete { slot } => {
            ensure_slot(templates, slot)?;
            templates.delete_slot(slot)?;
            println!("✓ Deleted slot {}; slots are now {:?}", slot, templates.slot_numbers());
        }
        TemplateAction::Select { slot } => {
            ensure_slot(templates, slot)?;
            templates.select_export_slot(slot);
            println!("✓ Export uses slot {}", slot);
        }
    }
    Ok(())
}

fn ensure_slot(templates: &TemplateStore, slot: u8) -> Result<()> {
    if !templates.slot_numbers().contains(&slot) {
        bail!("Template slot {} does not exist", slot);
    }
    Ok(())
}

fn run_theme(config: &Config, toggle: bool) -> Result<()> {
    let store = config.open_store();
    let theme = if toggle {
        Theme::toggle(store.as_ref())
    } else {
        Theme::load(store.as_ref())
    };
    println!("{} ({})", theme.as_str(), theme.button_label());
    Ok(())
}

fn run_bundle(config: &Config, dir: Option<PathBuf>, url: Option<String>) -> Result<()> {
    let fetcher: Box<dyn SiteFetcher> = match (dir, url) {
        (Some(dir), _) => Box::new(DirFetcher::new(dir)),
        (None, Some(url)) => http_fetcher(&url)?,
        (None, None) => bail!("Pass --dir or --url"),
    };

    println!("📦 Packaging site...");
    let bundle = bundle_site(fetcher.as_ref(), &SITE_FILES)?;
    for file in &bundle.failed {
        eprintln!("⚠️  Skipped {}", file);
    }
    config.ensure_export_dir()?;
    let path = bundle.write_to(&config.export_dir)?;
    println!("✓ {} files packed into {}", bundle.added.len(), path.display());
    Ok(())
}

#[cfg(feature = "fetch")]
fn http_fetcher(url: &str) -> Result<Box<dyn SiteFetcher>> {
    Ok(Box::new(care_desk::HttpFetcher::new(url)?))
}

#[cfg(not(feature = "fetch"))]
fn http_fetcher(url: &str) -> Result<Box<dyn SiteFetcher>> {
    // Still refuse file: pages with the same message
    care_desk::site::base_url(url)?;
    bail!("Fetching over HTTP needs the `fetch` feature: cargo build --features fetch")
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let store = config.open_store();
    let mut app = ui::App::new(PettyCash::new(store.clone()), store, config.clone());
    ui::run_ui(&mut app)?;
    println!("✅ Closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the batch commands: care-desk export --records rows.csv");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral(dir: &Path) -> Config {
        Config::resolve(Some(dir.to_path_buf()), Some(dir.to_path_buf()), true)
    }

    #[test]
    fn test_template_delete_unknown_slot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ephemeral(dir.path());
        let err = run_template(&config, TemplateAction::Delete { slot: 7 }).unwrap_err();
        assert!(err.to_string().contains("slot 7 does not exist"));
    }

    #[test]
    fn test_contacts_export_writes_vcf() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("contacts.csv");
        std::fs::write(&csv_path, "prefix,name,number\nHHBU,Peter,+85212345678\n,,\n").unwrap();

        let out = dir.path().join("out");
        let config = Config::resolve(Some(dir.path().to_path_buf()), Some(out.clone()), true);
        run_contacts(&config, &csv_path).unwrap();

        let files: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
        assert_eq!(files.len(), 1);
    }
}
