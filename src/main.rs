mod debug_report;

use clap::Parser;
use sprengine::{CompileContext, Engine, MemoryRecord, MemoryStore};
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

/// Compile a placeholder string against a throw-away record and print a trace.
#[derive(Parser, Debug)]
#[command(name = "spr", author, version, about)]
struct Args {
    /// Text to compile. Read from stdin when omitted.
    input: Vec<String>,

    /// Record field, as NAME=VALUE (repeatable). Standard names are Title,
    /// UserName, Password, URL and Notes; anything else is a custom field.
    #[arg(long = "field", short = 'f', value_name = "NAME=VALUE")]
    fields: Vec<String>,

    /// Group of the record, as NAME or NAME=PATH.
    #[arg(long)]
    group: Option<String>,

    /// Store location used by {DB_PATH} and friends.
    #[arg(long, default_value = "")]
    location: String,

    /// Value for the {BASE...} placeholders.
    #[arg(long)]
    base: Option<String>,

    /// Encode resolved values as an auto-type sequence.
    #[arg(long)]
    auto_type: bool,

    /// Triple double quotes in resolved values.
    #[arg(long)]
    cmd_quotes: bool,

    /// Replace passwords with asterisks.
    #[arg(long)]
    hide_passwords: bool,

    /// Force ANSI color output.
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long)]
    no_color: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("SPR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let input = match read_input(&args.input) {
        Ok(input) if !input.is_empty() => input,
        Ok(_) => {
            eprintln!("error: no input provided");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("error: failed to read stdin: {err}");
            std::process::exit(1);
        }
    };

    let record = match build_record(&args) {
        Ok(record) => record,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let mut store = MemoryStore::new(args.location.clone());
    let idx = store.add(record);
    let record = store.record(idx);

    let mut ctx = CompileContext::for_record(record, &store)
        .encode_as_auto_type(args.auto_type)
        .encode_quotes_for_command_line(args.cmd_quotes)
        .force_plaintext_passwords(!args.hide_passwords);
    if let Some(base) = args.base.as_deref() {
        ctx = ctx.with_base(base, false);
    }

    let color = if args.color {
        true
    } else if args.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    let result = Engine::new().compile_verbose(&input, &ctx);
    debug_report::print_run(&input, &result, store.is_modified(), color);
}

fn read_input(words: &[String]) -> io::Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

fn build_record(args: &Args) -> Result<MemoryRecord, String> {
    let mut record = MemoryRecord::new();
    for field in &args.fields {
        let (name, value) = field.split_once('=').ok_or_else(|| format!("--field expects NAME=VALUE, got '{field}'"))?;
        if name.is_empty() {
            return Err(format!("--field has an empty name: '{field}'"));
        }
        record = record.field(name, value);
    }
    if let Some(group) = &args.group {
        record = match group.split_once('=') {
            Some((name, path)) => record.in_group(name, path),
            None => record.in_group(group.as_str(), group.as_str()),
        };
    }
    Ok(record)
}
