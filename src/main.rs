use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use oqr::cli::{self, CliError, CompileOptions, FindOptions, NormalizeOptions};
use oqr::{Config, ScoreMode};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "oqr")]
#[command(about = "oqr - compile and normalize boolean search conditions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log to stderr (RUST_LOG overrides the level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Deepest condition tree accepted (overrides OQR_MAX_DEPTH)
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Arithmetic for AND-combined scores (overrides OQR_ALL_SCORE_MODE)
    #[arg(long, value_enum, global = true)]
    score_mode: Option<AllScoreMode>,
}

#[derive(Clone, Copy, ValueEnum)]
enum AllScoreMode {
    Sum,
    Multiply,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Mongo-style query into an OpenSearch search document
    Compile {
        /// The query as JSON (reads from stdin if not provided)
        query: Option<String>,

        /// Attach a result-count cap
        #[arg(short, long)]
        limit: Option<i64>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the canonical string of a query
    Normalize {
        /// The query as JSON (reads from stdin if not provided)
        input: Option<String>,

        /// Treat the input as a compiled search document
        #[arg(short, long)]
        document: bool,
    },

    /// Run a query against a file of JSON documents
    Find {
        /// The query as JSON
        query: String,

        /// File holding a JSON array or JSON lines (reads from stdin if not provided)
        #[arg(short, long)]
        documents: Option<std::path::PathBuf>,

        /// Attach a result-count cap
        #[arg(short, long)]
        limit: Option<i64>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("oqr=debug")),
            )
            .init();
    }

    let mut config = Config::from_env();
    if let Some(depth) = cli.max_depth {
        config = config.with_max_depth(depth);
    }
    if let Some(mode) = cli.score_mode {
        config = config.with_all_score_mode(match mode {
            AllScoreMode::Sum => ScoreMode::Sum,
            AllScoreMode::Multiply => ScoreMode::Multiply,
        });
    }

    let result = match cli.command {
        Commands::Compile { query, limit, pretty } => read_arg_or_stdin(query).and_then(|query| {
            let output = cli::execute_compile(&CompileOptions { query, limit }, &config)?;
            print_json(&output, pretty)
        }),
        Commands::Normalize { input, document } => read_arg_or_stdin(input).and_then(|input| {
            let canonical = cli::execute_normalize(&NormalizeOptions { input, document }, &config)?;
            println!("{}", canonical);
            Ok(())
        }),
        Commands::Find {
            query,
            documents,
            limit,
            pretty,
        } => run_find(query, documents, limit, pretty, &config),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_arg_or_stdin(arg: Option<String>) -> Result<String, CliError> {
    match arg {
        Some(s) => Ok(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}

fn run_find(
    query: String,
    documents: Option<std::path::PathBuf>,
    limit: Option<i64>,
    pretty: bool,
    config: &Config,
) -> Result<(), CliError> {
    let documents = match documents {
        Some(path) => std::fs::read_to_string(path)?,
        None => read_arg_or_stdin(None)?,
    };
    let options = FindOptions {
        query,
        documents,
        limit,
    };
    let hits = cli::execute_find(&options, config)?;
    print_json(&hits, pretty)
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}
