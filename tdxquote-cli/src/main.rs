//! tdxquote CLI — decode, inspect and export vendor quote files.
//!
//! Commands:
//! - `decode`: print decoded quotes from one `.day` / `.lc5` / `.lc1` file
//! - `raw`: print the unpacked fields of each record before any transform
//! - `scan`: list the quote files under a vendor root
//! - `export`: decode one file and write CSV / Parquet / JSON with a sidecar
//! - `batch`: run a TOML batch job (discover, decode, export)

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tdxquote_core::data::{Exchange, Granularity, VendorRoot};
use tdxquote_core::decode::read_file;
use tdxquote_core::{DailyQuote, DailyReader, FileKind, MinuteQuote, MinuteReader, Records};
use tdxquote_runner::{
    decode_batch, export_batch, export_file, BatchConfig, ExportFormat,
};

#[derive(Parser)]
#[command(
    name = "tdxquote",
    about = "tdxquote: decoder for the vendor's fixed-width daily and minute quote files"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print decoded quotes from one file.
    Decode {
        /// Quote file (.day, .lc5 or .lc1).
        path: PathBuf,

        /// Record kind: daily or minute. Defaults to the file extension.
        #[arg(long)]
        kind: Option<FileKind>,

        /// Print at most this many quotes.
        #[arg(long)]
        limit: Option<usize>,

        /// Only quotes on or after this date (YYYY-MM-DD).
        #[arg(long)]
        from: Option<String>,

        /// Only quotes on or before this date (YYYY-MM-DD).
        #[arg(long)]
        to: Option<String>,

        /// Print one JSON object per line.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Warn about malformed records and keep going instead of failing.
        #[arg(long, default_value_t = false)]
        skip_bad_records: bool,
    },
    /// Print the raw field values of each record.
    Raw {
        /// Quote file (.day, .lc5 or .lc1).
        path: PathBuf,

        /// Record kind: daily or minute. Defaults to the file extension.
        #[arg(long)]
        kind: Option<FileKind>,

        /// Print at most this many records.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print typed raw views as JSON lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List quote files under a vendor root.
    Scan {
        /// Vendor root containing <exchange>/<granularity-dir>/.
        #[arg(long, default_value = "vipdoc")]
        root: PathBuf,

        /// Exchanges to scan (sh, sz, bj). Defaults to all.
        #[arg(long)]
        exchange: Vec<Exchange>,

        /// daily, five_minute or one_minute.
        #[arg(long, default_value = "daily")]
        granularity: Granularity,
    },
    /// Decode one file and export it.
    Export {
        /// Quote file (.day, .lc5 or .lc1).
        path: PathBuf,

        /// Record kind: daily or minute. Defaults to the file extension.
        #[arg(long)]
        kind: Option<FileKind>,

        /// csv, parquet or json.
        #[arg(long, default_value = "parquet")]
        format: ExportFormat,

        /// Output directory.
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },
    /// Run a batch job described by a TOML file.
    Batch {
        /// Path to the TOML job file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Decode {
            path,
            kind,
            limit,
            from,
            to,
            json,
            skip_bad_records,
        } => {
            let filter = DateFilter::parse(from.as_deref(), to.as_deref())?;
            run_decode(&path, kind, limit, filter, json, skip_bad_records)
        }
        Commands::Raw {
            path,
            kind,
            limit,
            json,
        } => run_raw(&path, kind, limit, json),
        Commands::Scan {
            root,
            exchange,
            granularity,
        } => run_scan(&root, exchange, granularity),
        Commands::Export {
            path,
            kind,
            format,
            out_dir,
        } => run_export(&path, kind, format, &out_dir),
        Commands::Batch { config } => run_batch(&config),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "tdxquote=debug" } else { "tdxquote=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_kind(path: &Path, kind: Option<FileKind>) -> Result<FileKind> {
    match kind.or_else(|| FileKind::from_path(path)) {
        Some(kind) => Ok(kind),
        None => bail!(
            "cannot infer record kind from '{}'; pass --kind daily or --kind minute",
            path.display()
        ),
    }
}

#[derive(Clone, Copy, Default)]
struct DateFilter {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateFilter {
    fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
        };
        Ok(Self {
            from: from.map(parse).transpose()?,
            to: to.map(parse).transpose()?,
        })
    }

    fn admits(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }
}

/// Field access shared by the two quote types for printing.
trait Printable: serde::Serialize {
    fn date(&self) -> NaiveDate;
    fn line(&self) -> String;
}

impl Printable for DailyQuote {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn line(&self) -> String {
        format!(
            "{}  {:>10} {:>10} {:>10} {:>10} {:>16.0} {:>12}",
            self.date, self.open, self.high, self.low, self.close, self.amount, self.volume
        )
    }
}

impl Printable for MinuteQuote {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn line(&self) -> String {
        format!(
            "{} {}  {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>16.0} {:>12}",
            self.date,
            self.time.format("%H:%M"),
            self.open,
            self.high,
            self.low,
            self.close,
            self.amount,
            self.volume
        )
    }
}

fn run_decode(
    path: &Path,
    kind: Option<FileKind>,
    limit: Option<usize>,
    filter: DateFilter,
    json: bool,
    skip_bad_records: bool,
) -> Result<()> {
    let kind = resolve_kind(path, kind)?;
    let opts = PrintOptions {
        limit,
        filter,
        json,
        skip_bad_records,
    };
    match kind {
        FileKind::Daily => print_quotes(path, DailyReader::new(path).quotes()?, opts),
        FileKind::Minute => print_quotes(path, MinuteReader::new(path).quotes()?, opts),
    }
}

#[derive(Clone, Copy)]
struct PrintOptions {
    limit: Option<usize>,
    filter: DateFilter,
    json: bool,
    skip_bad_records: bool,
}

fn print_quotes<T: Printable>(path: &Path, records: Records<T>, opts: PrintOptions) -> Result<()> {
    let total = records.record_count();
    let mut printed = 0usize;
    let mut skipped = 0usize;

    for item in records {
        if opts.limit.is_some_and(|l| printed >= l) {
            break;
        }
        let quote = match item {
            Ok(quote) => quote,
            Err(err) if opts.skip_bad_records && err.is_record_level() => {
                warn!(path = %path.display(), error = %err, "skipping record");
                skipped += 1;
                continue;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("decoding {}", path.display()));
            }
        };
        if !opts.filter.admits(quote.date()) {
            continue;
        }
        if opts.json {
            println!("{}", serde_json::to_string(&quote)?);
        } else {
            println!("{}", quote.line());
        }
        printed += 1;
    }

    info!(path = %path.display(), records = total, printed, skipped, "decode finished");
    Ok(())
}

fn run_raw(path: &Path, kind: Option<FileKind>, limit: usize, json: bool) -> Result<()> {
    let kind = resolve_kind(path, kind)?;

    if json {
        match kind {
            FileKind::Daily => {
                for raw in DailyReader::new(path).raw()?.take(limit) {
                    println!("{}", serde_json::to_string(&raw?)?);
                }
            }
            FileKind::Minute => {
                for raw in MinuteReader::new(path).raw()?.take(limit) {
                    println!("{}", serde_json::to_string(&raw?)?);
                }
            }
        }
        return Ok(());
    }

    let layout = kind.layout();
    let buf = read_file(path)?;
    let count = layout.record_count(buf.len())?;
    println!("{} layout, {} records of {} bytes", layout.name, count, layout.width());

    let header: Vec<&str> = layout.fields.iter().map(|f| f.name).collect();
    println!("{:>8}  {}", "index", header.join("\t"));
    for (index, record) in layout.strides(&buf).take(limit).enumerate() {
        let values: Vec<String> = record.values().iter().map(|v| v.to_string()).collect();
        println!("{index:>8}  {}", values.join("\t"));
    }
    Ok(())
}

fn run_scan(root: &Path, exchanges: Vec<Exchange>, granularity: Granularity) -> Result<()> {
    let vendor = VendorRoot::new(root);
    let exchanges = if exchanges.is_empty() {
        Exchange::ALL.to_vec()
    } else {
        exchanges
    };

    let mut found = 0usize;
    for exchange in exchanges {
        let dir = vendor.dir_for(exchange, granularity);
        for file in vendor.scan(exchange, granularity)? {
            let records = records_on_disk(&file.path, granularity.kind())?;
            println!("{:<10} {:>8} records  {}", file.symbol(), records, file.path.display());
            found += 1;
        }
        info!(dir = %dir.display(), "scanned");
    }
    println!("{found} file(s)");
    Ok(())
}

/// Whole records in `path` according to its size on disk.
fn records_on_disk(path: &Path, kind: FileKind) -> Result<u64> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("reading metadata of {}", path.display()))?
        .len();
    Ok(len / kind.layout().width() as u64)
}

fn run_export(path: &Path, kind: Option<FileKind>, format: ExportFormat, out_dir: &Path) -> Result<()> {
    let kind = resolve_kind(path, kind)?;
    let meta = export_file(path, kind, out_dir, format)
        .with_context(|| format!("exporting {}", path.display()))?;
    println!(
        "Exported {} {} records to {}",
        meta.record_count,
        meta.kind,
        meta.output.display()
    );
    Ok(())
}

fn run_batch(config_path: &Path) -> Result<()> {
    let config = BatchConfig::from_file(config_path)?;
    let files: Vec<PathBuf> = config
        .resolve_files()
        .with_context(|| format!("scanning {}", config.vendor_root.display()))?
        .into_iter()
        .map(|f| f.path)
        .collect();
    if files.is_empty() {
        bail!("no quote files found under {}", config.vendor_root.display());
    }

    let summary = decode_batch(&files, config.granularity.kind(), config.on_error, config.parallel)?;
    let metas = export_batch(&summary, &config.output.dir, config.output.format)?;

    println!(
        "{} file(s): {} decoded, {} failed, {} record(s) skipped, {} exported to {}",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.skipped_records,
        metas.len(),
        config.output.dir.display()
    );

    if !summary.all_succeeded() {
        for (path, err) in &summary.errors {
            eprintln!("Error for {}: {err}", path.display());
        }
        std::process::exit(1);
    }

    Ok(())
}
