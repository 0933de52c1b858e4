//! schemamend - corrects drift in the CheeseMap Prisma schema
//!
//! Runs the fixed CheeseMap rule set against the schema file and writes the
//! corrected text back atomically. The rule set is hardcoded and ordered;
//! re-running on an already-corrected schema is a safe no-op.

mod process;

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

use process::mend_schema;

#[derive(Parser)]
#[command(name = "schemamend")]
#[command(version = "0.1.0")]
#[command(about = "Apply the CheeseMap drift-correction rules to a Prisma schema")]
struct Cli {
    /// Schema file to mend
    #[arg(default_value = "prisma/schema.prisma")]
    schema: PathBuf,

    /// Report what would change without writing anything
    #[arg(long)]
    check: bool,

    /// Show every rule's result, including already-satisfied ones
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let outcome = mend_schema(&cli.schema, cli.check)?;

    let mut applied = 0;
    for rule in &outcome.applied {
        if rule.edits > 0 {
            applied += 1;
            if cli.verbose {
                println!("  {} {} edit(s)", rule.name.green(), rule.edits);
            }
        } else if cli.verbose {
            println!("  {} {}", rule.name.dimmed(), "already satisfied".dimmed());
        }
    }

    if !outcome.changed {
        println!(
            "{} {} is already up to date",
            "OK".green().bold(),
            cli.schema.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    if cli.check {
        println!(
            "{} {} rule(s) would rewrite {}",
            "Drift".yellow().bold(),
            applied,
            cli.schema.display()
        );
        return Ok(ExitCode::from(1));
    }

    println!(
        "{} {} rule(s) applied to {}",
        "Mended".green().bold(),
        applied,
        cli.schema.display()
    );

    Ok(ExitCode::SUCCESS)
}
