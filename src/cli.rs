// Command-line front end for oxibufr.
//
// Bulletins and extra table entries are read from JSON (see `crate::io`).
// Every subcommand walks the descriptor program with the shared interpreter.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::backend::DdsValidator;
use crate::bufr::visitor::{DEFAULT_C04_MEANING, MAX_FIELD_BITS};
use crate::bufr::{Bulletin, MemoryVartable, Opcodes, Varcode, Visitor, VisitorOptions};
use crate::io;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// BUFR/CREX descriptor program interpreter.
#[derive(Parser, Debug)]
#[command(
    name = "oxibufr",
    version,
    about = "BUFR/CREX descriptor program interpreter",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,

    /// Extra table B entries (JSON), layered over the built-in table.
    #[arg(short = 't', long, global = true, value_hint = ValueHint::FilePath)]
    table: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check that a bulletin's subsets match its descriptor program.
    Validate(BulletinArgs),
    /// Dump a bulletin's subsets in descriptor program order.
    Print(PrintArgs),
    /// Show the structure of a descriptor program.
    Program(ProgramArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct BulletinArgs {
    /// Bulletin file (JSON).
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Maximum replication nesting depth.
    #[arg(long = "max-nesting", default_value_t = VisitorOptions::default().max_nesting)]
    max_nesting: usize,
}

#[derive(Args, Debug)]
struct PrintArgs {
    #[command(flatten)]
    bulletin: BulletinArgs,

    /// Output file (defaults to stdout).
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ProgramArgs {
    /// Descriptor codes, e.g. `B01001 R01000 B31001 B12101`.
    #[arg(required = true, num_args = 1..)]
    codes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Validate,
    Print,
    Program,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    table_file: Option<PathBuf>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    codes: Vec<String>,
    visitor: VisitorOptions,
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        table_file: cli.table,
        input_file: None,
        output_file: None,
        codes: Vec::new(),
        visitor: VisitorOptions::default(),
    };

    match cli.command {
        Cmd::Validate(args) => {
            opts.command = Command::Validate;
            opts.input_file = Some(args.input);
            opts.visitor.max_nesting = args.max_nesting;
        }
        Cmd::Print(args) => {
            opts.command = Command::Print;
            opts.input_file = Some(args.bulletin.input);
            opts.visitor.max_nesting = args.bulletin.max_nesting;
            opts.output_file = args.output;
        }
        Cmd::Program(args) => {
            opts.command = Command::Program;
            opts.codes = args.codes;
        }
        Cmd::Config => {}
    }
    opts
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("oxibufr".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared loading
// ---------------------------------------------------------------------------

fn load_table(opts: &Options) -> Option<MemoryVartable> {
    match &opts.table_file {
        None => Some(MemoryVartable::builtin()),
        Some(path) => match io::load_table(path) {
            Ok(t) => Some(t),
            Err(e) => {
                eprintln!("oxibufr: table: {}: {e}", path.display());
                None
            }
        },
    }
}

fn load_bulletin(opts: &Options, table: &MemoryVartable) -> Option<Bulletin> {
    let path = opts.input_file.as_deref()?;
    match io::load_bulletin(path, table) {
        Ok(b) => Some(b),
        Err(e) => {
            eprintln!("oxibufr: {}: {e}", path.display());
            None
        }
    }
}

fn print_json(json: &serde_json::Value) {
    match serde_json::to_string_pretty(json) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("oxibufr: json: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Validate command
// ---------------------------------------------------------------------------

fn cmd_validate(opts: &Options) -> i32 {
    let Some(table) = load_table(opts) else {
        return 1;
    };
    let Some(bulletin) = load_bulletin(opts, &table) else {
        return 1;
    };

    let ops = Opcodes::new(&bulletin.datadesc);
    let mut v = Visitor::with_options(&table, DdsValidator::new(&bulletin), opts.visitor);
    let res = v.visit_subsets(bulletin.subsets.len(), &ops);
    let checked = v.backend().checked();

    if let Err(e) = &res {
        eprintln!("oxibufr: validate: {e}");
    } else if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxibufr: validate: {} subsets, {checked} variables checked",
            bulletin.subsets.len()
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "validate",
            "valid": res.is_ok(),
            "subsets": bulletin.subsets.len(),
            "descriptors": bulletin.datadesc.len(),
            "checked": checked,
            "error": res.as_ref().err().map(|e| e.to_string()),
        }));
    }

    i32::from(res.is_err())
}

// ---------------------------------------------------------------------------
// Print command
// ---------------------------------------------------------------------------

fn open_output(path: Option<&Path>, force: bool) -> std::io::Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(std::io::stdout().lock())));
    };
    if path.exists() && !force {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{}: output file exists (use --force)", path.display()),
        ));
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

fn cmd_print(opts: &Options) -> i32 {
    let Some(table) = load_table(opts) else {
        return 1;
    };
    let Some(bulletin) = load_bulletin(opts, &table) else {
        return 1;
    };

    let mut out = match open_output(opts.output_file.as_deref(), opts.force) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("oxibufr: {e}");
            return 1;
        }
    };

    if let Err(e) = bulletin.print_structured_with(&table, &mut out, opts.visitor) {
        eprintln!("oxibufr: print: {e}");
        return 1;
    }
    if let Err(e) = out.flush() {
        eprintln!("oxibufr: write flush error: {e}");
        return 1;
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "print",
            "subsets": bulletin.subsets.len(),
            "descriptors": bulletin.datadesc.len(),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Program command
// ---------------------------------------------------------------------------

fn cmd_program(opts: &Options) -> i32 {
    let codes = match opts
        .codes
        .iter()
        .map(|c| c.parse::<Varcode>())
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("oxibufr: program: {e}");
            return 1;
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = Opcodes::new(&codes).print(&mut out) {
        eprintln!("oxibufr: program: {e}");
        return 1;
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "program",
            "descriptors": codes.len(),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config(opts: &Options) -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("oxibufr version {version} (Rust)");

    let json = cfg!(feature = "json") as u8;
    let builtin = MemoryVartable::builtin().len();
    let max_nesting = VisitorOptions::default().max_nesting;

    eprintln!("JSON={json}");
    eprintln!("MAX_FIELD_BITS={MAX_FIELD_BITS}");
    eprintln!("DEFAULT_C04_MEANING={DEFAULT_C04_MEANING}");
    eprintln!("MAX_NESTING={max_nesting}");
    eprintln!("BUILTIN_TABLE_ENTRIES={builtin}");

    if let Some(path) = &opts.table_file {
        match io::load_table(path) {
            Ok(t) => eprintln!("TABLE_ENTRIES={}", t.len()),
            Err(e) => {
                eprintln!("oxibufr: table: {}: {e}", path.display());
                return 1;
            }
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    // RUST_LOG still wins over -q/-v.
    let default_filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Validate => cmd_validate(&opts),
        Command::Print => cmd_print(&opts),
        Command::Program => cmd_program(&opts),
        Command::Config => cmd_config(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
