//! CLI front-end for the redaction engine: reads text from a file or
//! stdin, runs it through `Engine::process`, and writes the redacted
//! text plus a summary of what was found.

use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use vulpes_phi_core::{Engine, EngineConfig, Policy, Warning};

#[derive(Parser)]
#[command(name = "vulpes-redact")]
#[command(version, about = "Redact PHI from clinical text")]
struct Cli {
    /// Input file; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Policy JSON file; defaults to all identifiers enabled.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Path to a persisted feedback store.
    #[arg(long)]
    feedback_store: Option<PathBuf>,

    /// Print per-category counts and elapsed time to stderr.
    #[arg(long)]
    stats: bool,
}

fn main() -> ExitCode {
    vulpes_phi_core::init_tracing();
    let cli = Cli::parse();

    let text = match read_input(cli.input.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error reading input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (policy, policy_warning) = load_policy(cli.policy.as_deref());
    if let Some(warning) = policy_warning {
        eprintln!("warning: {warning}");
    }

    let engine = match cli.feedback_store {
        Some(path) => Engine::with_feedback_store(EngineConfig::default(), path),
        None => Engine::new(EngineConfig::default()),
    };

    match engine.process(&text, &policy) {
        Ok(out) => {
            print!("{}", out.text);
            if cli.stats {
                eprintln!(
                    "redactions: {}  elapsed_ms: {}  vocabulary_vetoes: {}  threshold_rejections: {}",
                    out.redactions.len(),
                    out.stats.elapsed_ms,
                    out.stats.vocabulary_vetoes,
                    out.stats.threshold_rejections
                );
                for (category, count) in &out.stats.category_counts {
                    eprintln!("  {category:?}: {count}");
                }
                if !out.stats.degraded_filters.is_empty() {
                    eprintln!("degraded filters: {:?}", out.stats.degraded_filters);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("redaction failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: Option<&std::path::Path>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// A missing or unparseable `--policy` file is non-fatal (spec.md §7
/// ConfigurationError: "missing file -> treat as empty"): falls back to
/// `Policy::default()` and surfaces a `Warning::ConfigurationFallback`
/// rather than aborting the CLI.
fn load_policy(path: Option<&std::path::Path>) -> (Policy, Option<Warning>) {
    let Some(p) = path else {
        return (Policy::default(), None);
    };
    let fallback = |value: String| {
        Warning::ConfigurationFallback { field: "policy", value }
    };
    match fs::read_to_string(p) {
        Ok(raw) => match Policy::from_json_str(&raw) {
            Ok(policy) => (policy, None),
            Err(e) => (Policy::default(), Some(fallback(format!("{}: {e}", p.display())))),
        },
        Err(e) => (Policy::default(), Some(fallback(format!("{}: {e}", p.display())))),
    }
}
