use std::collections::BTreeSet;
use std::fs;
use std::str::FromStr;

use anyhow::{bail, Context};
use colored::Colorize;
use erl_crypto::{CommitmentEngine, InclusionProof};
use erl_ledger::{AuditIndexEntry, BatchEntry, BatchIndex, BatchStatus, LedgerReader};
use erl_registry::StudentResult;
use erl_types::{BatchKey, Hash256, Record, SubjectId};
use serde::Serialize;
use serde_json::json;

use crate::cli::*;
use crate::config::Config;
use crate::workspace::{self, read_records};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Root(args) => cmd_root(&config, format, args),
        Command::Verify(args) => cmd_verify(&config, format, args),
        Command::Prove(args) => cmd_prove(&config, format, args),
        Command::CheckProof(args) => cmd_check_proof(&config, format, args),
        Command::Publish(args) => cmd_publish(&config, format, args),
        Command::Confirm(args) => cmd_confirm(&config, format, args),
        Command::Status(args) => cmd_status(&config, format, args),
        Command::Audit(args) => cmd_audit(&config, format, args),
        Command::Lookup(args) => cmd_lookup(&config, format, args),
        Command::Events(args) => cmd_events(&config, format, args),
    }
}

impl BatchArgs {
    fn to_key(&self) -> anyhow::Result<BatchKey> {
        Ok(BatchKey::new(&self.session, &self.semester, &self.course_code)?)
    }
}

fn parse_subject(value: &str) -> anyhow::Result<SubjectId> {
    SubjectId::from_str(value).with_context(|| format!("invalid address {value:?}"))
}

fn parse_root(value: &str) -> anyhow::Result<Hash256> {
    Hash256::from_hex(value).with_context(|| format!("invalid root {value:?}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_label(status: &BatchStatus) -> String {
    match status {
        BatchStatus::Validated => "validated".green().to_string(),
        BatchStatus::Pending { .. } => status.to_string().yellow().to_string(),
    }
}

// ---- Engine commands ----

fn cmd_root(config: &Config, format: OutputFormat, args: RootArgs) -> anyhow::Result<()> {
    let engine = CommitmentEngine::new(config.engine);
    let records = read_records(&args.file)?;
    let root = engine.commit(&records)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "root": root,
            "records": records.len(),
            "scheme": engine.scheme(),
        })),
        OutputFormat::Text => {
            println!("Root: {}", root.to_hex().yellow().bold());
            println!("  Records: {}", records.len());
            println!("  Scheme: {}", engine.scheme().to_string().cyan());
            Ok(())
        }
    }
}

fn cmd_verify(config: &Config, format: OutputFormat, args: VerifyArgs) -> anyhow::Result<()> {
    let engine = CommitmentEngine::new(config.engine);
    let claimed = parse_root(&args.root)?;
    let records = read_records(&args.file)?;
    let matches = engine.verify(&records, &claimed)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "root": claimed, "valid": matches }))?,
        OutputFormat::Text if matches => {
            println!("{} Records match root {}", "✓".green().bold(), claimed.short_hex())
        }
        OutputFormat::Text => {
            println!("{} Records do not match root {}", "✗".red().bold(), claimed.short_hex())
        }
    }
    if !matches {
        bail!("root mismatch");
    }
    Ok(())
}

fn cmd_prove(config: &Config, format: OutputFormat, args: ProveArgs) -> anyhow::Result<()> {
    let engine = CommitmentEngine::new(config.engine);
    let subject = parse_subject(&args.subject)?;
    let records = read_records(&args.file)?;
    let batch = engine.canonicalize(&records)?;
    let Some(proof) = engine.prove_in_batch(&batch, &subject) else {
        bail!("{subject} has no record in {}", args.file.display());
    };
    let root = engine.commit_batch(&batch);

    let Some(path) = args.output else {
        return print_json(&proof);
    };
    fs::write(&path, serde_json::to_string_pretty(&proof)?)
        .with_context(|| format!("writing proof {}", path.display()))?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "root": root,
            "subject": subject,
            "proof": path,
            "siblings": proof.proof.sibling_count(),
        })),
        OutputFormat::Text => {
            println!("{} Proof written to {}", "✓".green().bold(), path.display());
            println!("  Subject: {}", subject.to_string().cyan());
            println!("  Root: {}", root.to_hex().yellow());
            println!(
                "  Leaf: {} of {}, {} siblings",
                proof.proof.leaf_index,
                proof.proof.leaf_count,
                proof.proof.sibling_count()
            );
            Ok(())
        }
    }
}

fn cmd_check_proof(
    config: &Config,
    format: OutputFormat,
    args: CheckProofArgs,
) -> anyhow::Result<()> {
    let engine = CommitmentEngine::new(config.engine);
    let text = fs::read_to_string(&args.proof)
        .with_context(|| format!("reading proof {}", args.proof.display()))?;
    let proof: InclusionProof = serde_json::from_str(&text)
        .with_context(|| format!("{} is not an inclusion proof", args.proof.display()))?;
    let record = Record::new(parse_subject(&args.subject)?, args.score);
    let root = parse_root(&args.root)?;
    let valid = engine.verify_inclusion(&proof, &record, &root);

    match format {
        OutputFormat::Json => print_json(&json!({
            "record": record,
            "root": root,
            "valid": valid,
        }))?,
        OutputFormat::Text if valid => println!(
            "{} {} scored {} under root {}",
            "✓".green().bold(),
            record.subject,
            record.score,
            root.short_hex()
        ),
        OutputFormat::Text => println!(
            "{} Proof does not place {} with score {} under root {}",
            "✗".red().bold(),
            record.subject,
            record.score,
            root.short_hex()
        ),
    }
    if !valid {
        bail!("inclusion proof rejected");
    }
    Ok(())
}

// ---- Registry commands ----

fn cmd_publish(config: &Config, format: OutputFormat, args: PublishArgs) -> anyhow::Result<()> {
    let key = args.batch.to_key()?;
    let uploader = parse_subject(&args.uploader)?;
    let records = read_records(&args.file)?;

    let registry = workspace::open(config)?;
    let receipt = registry
        .publish(&key, &records, uploader)
        .with_context(|| format!("publishing {key}"))?;
    workspace::save(config, &registry)?;

    match format {
        OutputFormat::Json => print_json(&receipt),
        OutputFormat::Text => {
            println!("{} Published {}", "✓".green().bold(), key.to_string().bold());
            println!("  Root: {}", receipt.merkle_root.to_hex().yellow());
            println!("  Document: {}", receipt.content_handle.short_hex().cyan());
            println!("  Records: {}", receipt.record_count);
            println!("  Status: {}", status_label(&receipt.status));
            Ok(())
        }
    }
}

fn cmd_confirm(config: &Config, format: OutputFormat, args: ConfirmArgs) -> anyhow::Result<()> {
    let key = args.batch.to_key()?;
    let validator = parse_subject(&args.validator)?;

    let registry = workspace::open(config)?;
    let status = registry
        .confirm(&key, validator)
        .with_context(|| format!("confirming {key}"))?;
    workspace::save(config, &registry)?;

    match format {
        OutputFormat::Json => print_json(&json!({ "key": key, "status": status })),
        OutputFormat::Text => {
            println!(
                "{} Confirmed {} as {}",
                "✓".green().bold(),
                key.to_string().bold(),
                validator.short()
            );
            println!("  Status: {}", status_label(&status));
            Ok(())
        }
    }
}

fn cmd_status(config: &Config, format: OutputFormat, args: StatusArgs) -> anyhow::Result<()> {
    let registry = workspace::open(config)?;
    let ledger = registry.ledger();

    if let Some(batch) = args.filter.as_key() {
        let key = batch.to_key()?;
        let Some(entry) = ledger.batch(&key)? else {
            bail!("batch {key} not found");
        };
        return match format {
            OutputFormat::Json => print_json(&entry),
            OutputFormat::Text => {
                print_entry(&entry);
                Ok(())
            }
        };
    }

    let uploader = args.uploader.as_deref().map(parse_subject).transpose()?;
    let awaited = match args.awaiting.as_deref() {
        Some(validator) => Some(awaiting_keys(ledger, &parse_subject(validator)?)?),
        None => None,
    };
    let entries = match &uploader {
        Some(uploader) => ledger.batches_by_uploader(uploader)?,
        None => ledger.batches()?,
    };
    let entries: Vec<BatchEntry> = entries
        .into_iter()
        .filter(|e| !args.pending || !e.is_validated())
        .filter(|e| awaited.as_ref().map_or(true, |keys| keys.contains(&e.key)))
        .filter(|e| matches_filter(&args.filter, &e.key))
        .collect();

    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No batches.");
            }
            for entry in &entries {
                println!(
                    "{}  {}  {}  {}",
                    entry.key.to_string().bold(),
                    entry.merkle_root.short_hex().yellow(),
                    entry.uploader.short().dimmed(),
                    status_label(&entry.status())
                );
            }
            Ok(())
        }
    }
}

/// Pending batches `validator` has not confirmed, read from a fresh index.
fn awaiting_keys<R: LedgerReader + ?Sized>(
    ledger: &R,
    validator: &SubjectId,
) -> anyhow::Result<BTreeSet<BatchKey>> {
    let mut index = BatchIndex::new();
    index.sync(ledger)?;
    Ok(index
        .awaiting(validator)
        .into_iter()
        .map(|b| b.key.clone())
        .collect())
}

fn batch_trail<R: LedgerReader + ?Sized>(
    ledger: &R,
    key: &BatchKey,
    since: u64,
) -> anyhow::Result<Vec<AuditIndexEntry>> {
    let mut index = BatchIndex::new();
    index.sync(ledger)?;
    Ok(index
        .audit_trail(key)
        .iter()
        .filter(|e| e.seq > since)
        .cloned()
        .collect())
}

fn matches_filter(filter: &BatchFilter, key: &BatchKey) -> bool {
    let component = |wanted: &Option<String>, actual: &str| {
        wanted.as_deref().map_or(true, |w| w.trim() == actual)
    };
    component(&filter.session, &key.session)
        && component(&filter.semester, &key.semester)
        && component(&filter.course_code, &key.course_code)
}

fn print_entry(entry: &BatchEntry) {
    println!("Batch {}", entry.key.to_string().bold());
    println!("  Root: {}", entry.merkle_root.to_hex().yellow());
    println!("  Document: {}", entry.content_handle.to_hex().cyan());
    println!("  Uploader: {}", entry.uploader);
    println!("  Uploaded: {}", entry.uploaded_at.to_rfc3339());
    println!("  Scheme: {}", entry.scheme.to_string().cyan());
    println!("  Status: {}", status_label(&entry.status()));
    for validator in &entry.confirmations {
        println!("    confirmed by {}", validator);
    }
}

fn cmd_audit(config: &Config, format: OutputFormat, args: AuditArgs) -> anyhow::Result<()> {
    let key = args.batch.to_key()?;
    let registry = workspace::open(config)?;
    let report = registry
        .audit(&key)
        .with_context(|| format!("auditing {key}"))?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "report": report,
            "root_matches": report.root_matches(),
        }))?,
        OutputFormat::Text => {
            let mark = if report.root_matches() {
                "✓".green().bold()
            } else {
                "✗".red().bold()
            };
            println!("{} Audit of {}", mark, key.to_string().bold());
            println!("  Ledger root:   {}", report.ledger_root.to_hex().yellow());
            println!("  Computed root: {}", report.computed_root.to_hex().yellow());
            println!("  Records: {}", report.record_count);
            println!("  Scheme: {}", report.scheme.to_string().cyan());
            println!("  Status: {}", status_label(&report.status));
        }
    }
    if !report.root_matches() {
        bail!("stored document for {key} does not reproduce the ledger root");
    }
    Ok(())
}

fn cmd_lookup(config: &Config, format: OutputFormat, args: LookupArgs) -> anyhow::Result<()> {
    let subject = parse_subject(&args.subject)?;
    let registry = workspace::open(config)?;

    let results: Vec<StudentResult> = match args.filter.as_key() {
        Some(batch) => {
            let key = batch.to_key()?;
            registry
                .student_result(&key, &subject)
                .with_context(|| format!("looking up {subject} in {key}"))?
                .into_iter()
                .collect()
        }
        None if args.filter.is_empty() => registry.transcript(&subject)?,
        None => bail!("--session, --semester and --course must be given together"),
    };

    match format {
        OutputFormat::Json => print_json(&results),
        OutputFormat::Text => {
            if results.is_empty() {
                println!("No validated results for {}.", subject);
            }
            for result in &results {
                let mark = if result.verified {
                    "✓".green().bold()
                } else {
                    "✗".red().bold()
                };
                println!(
                    "{} {}  score {}  root {}",
                    mark,
                    result.key.to_string().bold(),
                    result.record.score.to_string().yellow(),
                    result.ledger_root.short_hex()
                );
            }
            Ok(())
        }
    }
}

fn cmd_events(config: &Config, format: OutputFormat, args: EventsArgs) -> anyhow::Result<()> {
    let registry = workspace::open(config)?;
    if let Some(batch) = args.filter.as_key() {
        let key = batch.to_key()?;
        if registry.ledger().batch(&key)?.is_none() {
            bail!("batch {key} not found");
        }
        let trail = batch_trail(registry.ledger(), &key, args.since)?;
        return match format {
            OutputFormat::Json => print_json(&trail),
            OutputFormat::Text => {
                println!("Trail of {}", key.to_string().bold());
                for entry in &trail {
                    println!(
                        "{} {} {}",
                        format!("#{}", entry.seq).yellow(),
                        entry.recorded_at.to_rfc3339().dimmed(),
                        entry.summary
                    );
                }
                Ok(())
            }
        };
    }
    if !args.filter.is_empty() {
        bail!("--session, --semester and --course must be given together");
    }

    let events = registry.ledger().events_since(args.since)?;
    match format {
        OutputFormat::Json => print_json(&events),
        OutputFormat::Text => {
            for event in &events {
                println!(
                    "{} {} {} {}",
                    format!("#{}", event.seq).yellow(),
                    event.recorded_at.to_rfc3339().dimmed(),
                    event.kind.name(),
                    event.kind.key()
                );
            }
            Ok(())
        }
    }
}
