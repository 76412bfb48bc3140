//! Command-line interface for the `luq` query parser.
//!
//! A thin harness over `luq-parser`: feed query strings to the parser
//! and report the resulting AST or error. No searching happens here.

use std::{
    fs,
    io::{self, Read},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use luq_parser::{DefaultOperator, ParseOptions, parse_with_options, tokenize};

#[derive(Parser)]
#[command(name = "luq")]
#[command(about = "Lucene-style query parser")]
/// Top-level CLI options.
struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    command: Commands,
}

/// Flags controlling parser options, shared by parsing commands.
#[derive(Args)]
struct OptionArgs {
    /// Join adjacent terms with AND instead of OR
    #[arg(long)]
    and: bool,

    /// Maximum nesting depth for groups and NOT chains
    #[arg(long)]
    max_depth: Option<usize>,

    /// Allow words to start with * or ?
    #[arg(long)]
    leading_wildcard: bool,
}

impl OptionArgs {
    /// Builds parser options from the flags.
    fn to_options(&self) -> ParseOptions {
        let mut options = ParseOptions::default().with_leading_wildcard(self.leading_wildcard);
        if self.and {
            options = options.with_default_operator(DefaultOperator::And);
        }
        if let Some(depth) = self.max_depth {
            options = options.with_max_nesting_depth(depth);
        }
        options
    }
}

#[derive(Subcommand)]
/// Supported `luq` subcommands.
enum Commands {
    /// Parse queries and print their ASTs
    Parse {
        /// Query strings to parse
        #[arg(required = true)]
        queries: Vec<String>,

        /// Output the AST as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        /// Parser option overrides.
        options: OptionArgs,
    },

    /// Show how a query is tokenized
    Tokens {
        /// Query string to tokenize
        query: String,

        /// Output the tokens as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse every query in a file, reporting failures
    Check {
        /// File with one query per line; use - for stdin
        file: String,

        #[command(flatten)]
        /// Parser option overrides.
        options: OptionArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            queries,
            json,
            options,
        } => cmd_parse(&queries, json, &options.to_options()),
        Commands::Tokens { query, json } => cmd_tokens(&query, json),
        Commands::Check { file, options } => cmd_check(&file, &options.to_options()),
    }
}

/// Implements `luq parse`.
fn cmd_parse(queries: &[String], json: bool, options: &ParseOptions) -> ExitCode {
    for (index, query) in queries.iter().enumerate() {
        let expr = match parse_with_options(query, options) {
            Ok(expr) => expr,
            Err(e) => {
                eprintln!("{}", e.format_with_context());
                return ExitCode::FAILURE;
            }
        };

        if queries.len() > 1 {
            if index > 0 {
                println!();
            }
            println!("query: {query}");
        }

        if json {
            match serde_json::to_string_pretty(&expr) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    eprintln!("error: failed to serialize AST: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            // The tree Display ends with a newline already.
            print!("{expr}");
        }
    }

    ExitCode::SUCCESS
}

/// Implements `luq tokens`.
fn cmd_tokens(query: &str, json: bool) -> ExitCode {
    let tokens = match tokenize(query) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", e.format_with_context());
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&tokens) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to serialize tokens: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for token in &tokens {
            println!("{:>4}  {:<8} {:?}", token.offset, format!("{:?}", token.kind), token.text);
        }
    }

    ExitCode::SUCCESS
}

/// Implements `luq check`: parses one query per line, skipping blank
/// lines and `#` comments, and reports a pass/fail summary.
fn cmd_check(file: &str, options: &ParseOptions) -> ExitCode {
    let contents = match read_queries(file) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("error: failed to read {file}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut passed = 0usize;
    let mut failed = 0usize;

    for line in contents.lines() {
        let query = line.trim();
        if query.is_empty() || query.starts_with('#') {
            continue;
        }

        match parse_with_options(query, options) {
            Ok(_) => {
                passed += 1;
                println!("ok    {query}");
            }
            Err(e) => {
                failed += 1;
                println!("FAIL  {query}");
                println!("      {e}");
            }
        }
    }

    println!();
    println!("{passed} passed, {failed} failed");

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Reads the query file, or stdin when the path is `-`.
fn read_queries(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        Ok(contents)
    } else {
        fs::read_to_string(file)
    }
}
