//! xmelt: Convert feed-style XML into CSV rows or JSON records
//!
//! Usage:
//!   # Read from file, CSV to stdout
//!   xmelt feed.xml
//!
//!   # Read from stdin, records as JSON
//!   cat feed.xml | xmelt --format json
//!
//!   # Items below a nested root, semicolon-delimited, written to a file
//!   xmelt catalog.xml --root TitleInfoList --delimiter ';' -o titles.csv
//!
//!   # Flattened records, one per line, arrays joined instead of expanded
//!   xmelt feed.xml --format ndjson --flatten --concat-arrays

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use xmelt::{
    ArrayHandling, ConversionOptions, CsvEncoder, Document, RecordFormat, RecordWriter,
};

/// Highest accepted --max-depth; conversion passes recurse once per level
const MAX_DEPTH_CEILING: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Ndjson,
}

#[derive(Parser, Debug)]
#[command(name = "xmelt")]
#[command(about = "Convert feed-style XML into CSV rows or JSON records", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Output file (use stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// JSON file with conversion options; flags below override it
    #[arg(long)]
    config: Option<String>,

    /// Dotted path to the element holding the items (default: document root)
    #[arg(long)]
    root: Option<String>,

    /// Join repeated elements into one "[a;b]" value instead of expanding rows
    #[arg(long)]
    concat_arrays: bool,

    /// Separator used with --concat-arrays (default: ";")
    #[arg(long)]
    array_separator: Option<String>,

    /// Flatten nested record objects into dotted keys (JSON formats)
    #[arg(long)]
    flatten: bool,

    /// CSV field delimiter (single byte)
    #[arg(long)]
    delimiter: Option<char>,

    /// Omit the CSV header row
    #[arg(long)]
    no_header: bool,

    /// Maximum element nesting depth (default: 512, at most 4096)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Fail instead of producing more than this many CSV rows
    #[arg(long)]
    max_rows: Option<usize>,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let options = build_options(&args)?;
    debug!(?options, "conversion options");

    let xml = read_input(args.input.as_deref())?;
    let doc = Document::parse(&xml, options.max_depth).context("Failed to parse XML")?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {}", path))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    match args.format {
        OutputFormat::Csv => {
            let rows = xmelt::to_rows(&doc, &options).context("Failed to convert XML to rows")?;
            info!(rows = rows.rows.len(), fields = rows.fields.len(), "writing CSV");
            let text = CsvEncoder::new(options.csv.clone())
                .encode(&rows)
                .context("Failed to encode CSV")?;
            if !text.is_empty() {
                writeln!(out, "{}", text).context("Failed to write output")?;
            }
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let records =
                xmelt::to_records(&doc, &options).context("Failed to convert XML to records")?;
            info!(records = records.len(), "writing records");
            let format = if args.format == OutputFormat::Json {
                RecordFormat::Json
            } else {
                RecordFormat::Ndjson
            };
            let mut writer = RecordWriter::new(&mut out, format);
            writer.write_records(&records)?;
            writer.flush()?;
        }
    }

    out.flush().context("Failed to flush output")?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "xmelt=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Options from the optional config file, then overridden by flags
fn build_options(args: &Args) -> Result<ConversionOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open config file: {}", path))?;
            serde_json::from_reader(file)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => ConversionOptions::default(),
    };

    if let Some(root) = &args.root {
        options.root_element = Some(root.clone());
    }
    if args.concat_arrays {
        options.array_handling = ArrayHandling::Concatenate;
    }
    if let Some(sep) = &args.array_separator {
        options.array_separator = sep.clone();
    }
    if args.flatten {
        options.flatten_nested_objects = true;
    }
    if let Some(delimiter) = args.delimiter {
        if !delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character, got '{}'", delimiter);
        }
        options.csv.delimiter = delimiter as u8;
    }
    if args.no_header {
        options.csv.header = false;
    }
    if let Some(depth) = args.max_depth {
        options.max_depth = depth;
    }
    if options.max_depth > MAX_DEPTH_CEILING {
        bail!(
            "Maximum depth must be at most {}, got {}",
            MAX_DEPTH_CEILING,
            options.max_depth
        );
    }
    if let Some(rows) = args.max_rows {
        options.max_rows = Some(rows);
    }

    Ok(options)
}

fn read_input(input: Option<&str>) -> Result<String> {
    let mut content = String::new();
    match input {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path))?
                .read_to_string(&mut content)
                .with_context(|| format!("Failed to read input file: {}", path))?;
        }
        None => {
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
        }
    }
    Ok(content)
}
