//! wiretree CLI entry point.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wiretree::cli::{input_name, read_payload, Args, OutputFormatter};
use wiretree_core::buffer::Tvb;
use wiretree_core::protocol::{registry_with_preferences, Registry};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    let registry = registry_with_preferences(&args.preferences())
        .context("Failed to register dissectors")?;

    // Handle info-only commands
    if args.list_protocols {
        list_protocols(&registry);
    }
    if args.list_fields {
        list_fields(&registry);
    }
    if args.is_info_only() {
        return Ok(());
    }

    if args.files.is_empty() {
        anyhow::bail!("Payload file required. Use - for stdin or --help for usage.");
    }

    let formatter = OutputFormatter::new(args.format);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for path in &args.files {
        let name = input_name(path);
        let payload = read_payload(path, args.hex)
            .with_context(|| format!("Failed to load payload: {name}"))?;

        let tvb = Tvb::new(payload);
        let mut ctx = args.packet_context();
        let dissection = registry.dispatch_ports(&tvb, &mut ctx);
        tracing::info!(
            input = %name,
            protocol = dissection.protocol,
            consumed = dissection.consumed,
            "dissected"
        );

        formatter.write(&name, &dissection, &mut out)?;
    }
    out.flush()?;

    Ok(())
}

fn list_protocols(registry: &Registry) {
    println!("Registered Dissectors:");
    println!("{:-<50}", "");

    for dissector in registry.protocols() {
        println!("  {} ({})", dissector.display_name(), dissector.protocol_id());

        let keys: Vec<String> = registry
            .registrations()
            .filter(|(_, d)| d.protocol_id() == dissector.protocol_id())
            .map(|(key, _)| key.to_string())
            .collect();
        if keys.is_empty() {
            println!("    -> Fallback for unclaimed payloads");
        } else {
            println!("    -> Registered on: {}", keys.join(", "));
        }

        let fields = dissector.fields();
        if !fields.is_empty() {
            println!("    Fields: {}", fields.len());
        }
    }
}

fn list_fields(registry: &Registry) {
    println!("{:<36} {:<16} Name", "Field", "Type");
    println!("{:-<80}", "");

    for hf in registry.fields() {
        println!("{:<36} {:<16} {}", hf.abbrev, hf.kind.type_name(), hf.name);
    }

    println!();
    println!("{:<36} {:<16} Summary", "Expert Info", "Severity");
    println!("{:-<80}", "");

    for ei in registry.expert_infos() {
        println!("{:<36} {:<16} {}", ei.abbrev, ei.severity.as_str(), ei.summary);
    }
}
