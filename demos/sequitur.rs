use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use sequitur_grammar::Grammar;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Infers a Sequitur grammar from a file and prints its rules.
///
/// Usage: cargo run --example sequitur -- <file> [--verify] [--stats] [--top N]
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file, read as raw bytes; `-` reads standard input
    input: PathBuf,

    /// Re-expand the start rule and compare it with the input
    #[arg(long)]
    verify: bool,

    /// Print compression statistics instead of the rule listing
    #[arg(long)]
    stats: bool,

    /// Print the N highest-ranked phrases
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Shortest phrase considered by --top, after trimming whitespace
    #[arg(long, default_value_t = 5)]
    min_len: usize,

    /// Longest phrase considered by --top, after trimming whitespace
    #[arg(long, default_value_t = 25)]
    max_len: usize,
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .context("Failed to read standard input")?;
        Ok(buffer)
    } else {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn trim_ascii(phrase: &[u8]) -> &[u8] {
    let start = phrase
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(phrase.len());
    let end = phrase
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |end| end + 1);
    &phrase[start..end]
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.min_len > args.max_len {
        bail!(
            "--min-len ({}) must not exceed --max-len ({})",
            args.min_len,
            args.max_len
        );
    }

    let input = read_input(&args.input)?;
    let started = Instant::now();
    let grammar = Grammar::build(&input)
        .with_context(|| format!("Cannot build a grammar from {}", args.input.display()))?;
    info!(
        "Built {} rules from {} bytes in {:.2?}",
        grammar.rule_count(),
        input.len(),
        started.elapsed()
    );

    if args.verify {
        let mut expansion = grammar.iter();
        for (position, expected) in input.iter().enumerate() {
            match expansion.next() {
                Some(actual) if actual == expected => {}
                Some(actual) => bail!(
                    "Mismatch at position {}: input={}, grammar={}",
                    position,
                    expected,
                    actual
                ),
                None => bail!("Grammar ended early at position {}", position),
            }
        }
        if expansion.next().is_some() {
            bail!("Grammar expands past the end of the input");
        }
        eprintln!("Verified {} bytes", input.len());
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.stats {
        let stats = grammar.stats();
        writeln!(out, "Total bytes inserted: {}", stats.input_length)?;
        writeln!(out, "Symbols in grammar: {}", stats.grammar_symbols)?;
        writeln!(out, "Rules created: {}", stats.num_rules)?;
        writeln!(out, "Compression ratio: {:.2}%", stats.compression_ratio())?;
    } else if args.top.is_none() {
        grammar.print(&mut out).context("Failed to write the grammar")?;
    }

    if let Some(top) = args.top {
        let analysis = grammar.analyze();
        let ranked = analysis.rank(
            |phrase| {
                let len = trim_ascii(phrase).len();
                len >= args.min_len && len <= args.max_len
            },
            |stats| stats.coverage * f64::from(stats.usage) * f64::from(stats.usage),
        );

        for entry in ranked.iter().take(top) {
            let phrase = analysis.bytes(entry.id)?;
            writeln!(
                out,
                "{:>4} {:.4} {}",
                entry.index,
                entry.score,
                String::from_utf8_lossy(trim_ascii(&phrase))
            )?;
        }
    }

    out.flush()?;
    Ok(())
}
