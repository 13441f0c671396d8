use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use dump_extract::locator::DEFAULT_SCHEMA;
use dump_extract::{
    discover_tables, logging, read_schema_from_file, render_value_list, run_extract,
    table_inventory, DumpLines, ExtractOptions, ExtractReport, KeyFilter,
};

#[derive(Parser)]
#[command(name = "dump-extract")]
#[command(author, version, about = "Extract rows from legacy SQL Server script dumps")]
struct Cli {
    /// Schema qualifier used in the dump
    #[arg(long, global = true, default_value = DEFAULT_SCHEMA)]
    schema: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TableArgs {
    /// Path to the UTF-16LE dump file
    dump: PathBuf,

    /// Table to read
    #[arg(short, long)]
    table: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables referenced by CREATE TABLE or INSERT statements
    Tables {
        /// Path to the UTF-16LE dump file
        dump: PathBuf,

        /// Also show whether each table is declared and how many rows it has
        #[arg(long)]
        counts: bool,
    },

    /// Show a table's column ordinals from its CREATE TABLE statement
    Columns {
        #[command(flatten)]
        target: TableArgs,
    },

    /// Print sample rows of a table
    Sample {
        #[command(flatten)]
        target: TableArgs,

        /// Number of rows to print
        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// Print the row whose first value equals this identifier instead
        #[arg(long)]
        id: Option<String>,
    },

    /// Print rows whose column equals a value (column by name or 0-based ordinal)
    Rows {
        #[command(flatten)]
        target: TableArgs,

        /// Column name (e.g. MemberId) or ordinal
        #[arg(short, long)]
        column: String,

        /// Value to match
        #[arg(long)]
        value: String,

        /// Stop after this many rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn print_report(report: &ExtractReport) {
    for row in &report.rows {
        println!("{}\t{}", row.line_number, render_value_list(&row.fields));
    }
    if report.is_empty() {
        eprintln!("No rows found for table {}", report.table);
    } else if !report.failures.is_empty() {
        eprintln!(
            "{} row(s) of {} could not be parsed",
            report.failures.len(),
            report.table
        );
    }
}

fn open_dump(path: &Path) -> Result<DumpLines<std::io::BufReader<std::fs::File>>> {
    DumpLines::open(path).with_context(|| format!("Failed to open dump {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Tables { dump, counts } => {
            if counts {
                for table in table_inventory(open_dump(&dump)?)? {
                    println!(
                        "{}.{}\tdeclared={}\trows={}",
                        table.schema, table.name, table.declared, table.insert_lines
                    );
                }
            } else {
                for name in discover_tables(open_dump(&dump)?)? {
                    println!("{name}");
                }
            }
        }
        Commands::Columns { target } => {
            let schema = read_schema_from_file(&target.dump, &cli.schema, &target.table)?
                .with_context(|| format!("No CREATE TABLE for {} in the dump", target.table))?;
            for (ordinal, column) in schema.columns.iter().enumerate() {
                println!("{ordinal}\t{}\t{}", column.name, column.data_type);
            }
        }
        Commands::Sample { target, limit, id } => {
            let options = ExtractOptions {
                schema: cli.schema,
                limit: Some(if id.is_some() { 1 } else { limit }),
                key: id.map(KeyFilter::first_value),
                ..ExtractOptions::new(target.dump, target.table)
            };
            print_report(&run_extract(&options)?);
        }
        Commands::Rows {
            target,
            column,
            value,
            limit,
        } => {
            let key = match column.parse::<usize>() {
                Ok(ordinal) => KeyFilter::ordinal(ordinal, value),
                Err(_) => KeyFilter::named(column, value),
            };
            let options = ExtractOptions {
                schema: cli.schema,
                limit,
                key: Some(key),
                ..ExtractOptions::new(target.dump, target.table)
            };
            print_report(&run_extract(&options)?);
        }
    }

    Ok(())
}
