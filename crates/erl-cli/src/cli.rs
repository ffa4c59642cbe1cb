use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "erl",
    about = "Exam Result Ledger: Merkle commitments over published exam results",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (default: ./erl.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the Merkle root of a record file
    Root(RootArgs),
    /// Check a record file against a claimed root
    Verify(VerifyArgs),
    /// Produce an inclusion proof for one subject
    Prove(ProveArgs),
    /// Check an inclusion proof for a single record
    CheckProof(CheckProofArgs),
    /// Store a batch and record its root on the ledger
    Publish(PublishArgs),
    /// Add a validator confirmation to a batch
    Confirm(ConfirmArgs),
    /// Show one batch or list batches
    Status(StatusArgs),
    /// Recompute a batch root from its stored document
    Audit(AuditArgs),
    /// Show a student's validated results with proofs
    Lookup(LookupArgs),
    /// Print the ledger event feed
    Events(EventsArgs),
}

/// Identifies a batch on the ledger.
#[derive(Args, Clone, Debug)]
pub struct BatchArgs {
    #[arg(long)]
    pub session: String,
    #[arg(long)]
    pub semester: String,
    #[arg(long = "course")]
    pub course_code: String,
}

/// Batch selector where every component may be omitted.
#[derive(Args, Clone, Debug, Default)]
pub struct BatchFilter {
    #[arg(long)]
    pub session: Option<String>,
    #[arg(long)]
    pub semester: Option<String>,
    #[arg(long = "course")]
    pub course_code: Option<String>,
}

impl BatchFilter {
    pub fn is_empty(&self) -> bool {
        self.session.is_none() && self.semester.is_none() && self.course_code.is_none()
    }

    /// The full key when all three components are given.
    pub fn as_key(&self) -> Option<BatchArgs> {
        Some(BatchArgs {
            session: self.session.clone()?,
            semester: self.semester.clone()?,
            course_code: self.course_code.clone()?,
        })
    }
}

#[derive(Args)]
pub struct RootArgs {
    /// JSON array of records
    pub file: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub root: String,
}

#[derive(Args)]
pub struct ProveArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub subject: String,
    /// Write the proof to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckProofArgs {
    pub proof: PathBuf,
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub score: u64,
    #[arg(long)]
    pub root: String,
}

#[derive(Args)]
pub struct PublishArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub batch: BatchArgs,
    #[arg(long)]
    pub uploader: String,
}

#[derive(Args)]
pub struct ConfirmArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
    #[arg(long)]
    pub validator: String,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub filter: BatchFilter,
    /// Only batches uploaded by this address
    #[arg(long)]
    pub uploader: Option<String>,
    /// Only batches still awaiting confirmations
    #[arg(long)]
    pub pending: bool,
    /// Only pending batches this validator has not confirmed yet
    #[arg(long, value_name = "VALIDATOR")]
    pub awaiting: Option<String>,
}

#[derive(Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(Args)]
pub struct LookupArgs {
    // Restricts to one batch; all validated batches otherwise.
    #[command(flatten)]
    pub filter: BatchFilter,
    #[arg(long)]
    pub subject: String,
}

#[derive(Args)]
pub struct EventsArgs {
    /// Only events after this sequence number
    #[arg(long, default_value = "0")]
    pub since: u64,
    // With a full key, prints that batch's audit trail instead of the raw feed.
    #[command(flatten)]
    pub filter: BatchFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn parse_root() {
        let cli = Cli::try_parse_from(["erl", "root", "results.json"]).unwrap();
        if let Command::Root(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("results.json"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify_requires_root() {
        assert!(Cli::try_parse_from(["erl", "verify", "results.json"]).is_err());
        let cli =
            Cli::try_parse_from(["erl", "verify", "results.json", "--root", "0xabc"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn parse_prove_with_output() {
        let cli = Cli::try_parse_from([
            "erl", "prove", "results.json", "--subject", STUDENT, "-o", "proof.json",
        ])
        .unwrap();
        if let Command::Prove(args) = cli.command {
            assert_eq!(args.subject, STUDENT);
            assert_eq!(args.output, Some(PathBuf::from("proof.json")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_check_proof() {
        let cli = Cli::try_parse_from([
            "erl",
            "check-proof",
            "proof.json",
            "--subject",
            STUDENT,
            "--score",
            "85",
            "--root",
            "0xabc",
        ])
        .unwrap();
        if let Command::CheckProof(args) = cli.command {
            assert_eq!(args.score, 85);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_publish() {
        let cli = Cli::try_parse_from([
            "erl",
            "publish",
            "results.json",
            "--session",
            "2023/2024",
            "--semester",
            "First",
            "--course",
            "CSC101",
            "--uploader",
            STUDENT,
        ])
        .unwrap();
        if let Command::Publish(args) = cli.command {
            assert_eq!(args.batch.session, "2023/2024");
            assert_eq!(args.batch.course_code, "CSC101");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_confirm_requires_full_key() {
        assert!(Cli::try_parse_from([
            "erl",
            "confirm",
            "--session",
            "2023/2024",
            "--validator",
            STUDENT
        ])
        .is_err());
    }

    #[test]
    fn parse_status_filter() {
        let cli = Cli::try_parse_from(["erl", "status", "--pending"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert!(args.pending);
            assert!(args.filter.is_empty());
            assert!(args.filter.as_key().is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_lookup_single_batch() {
        let cli = Cli::try_parse_from([
            "erl",
            "lookup",
            "--subject",
            STUDENT,
            "--session",
            "2023/2024",
            "--semester",
            "First",
            "--course",
            "CSC101",
        ])
        .unwrap();
        if let Command::Lookup(args) = cli.command {
            let key = args.filter.as_key().unwrap();
            assert_eq!(key.semester, "First");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "erl",
            "events",
            "--since",
            "3",
            "--verbose",
            "--format",
            "json",
            "--config",
            "erl.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("erl.toml")));
    }

    #[test]
    fn parse_status_awaiting() {
        let cli = Cli::try_parse_from(["erl", "status", "--awaiting", STUDENT]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.awaiting.as_deref(), Some(STUDENT));
            assert!(!args.pending);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_events_for_one_batch() {
        let cli = Cli::try_parse_from([
            "erl",
            "events",
            "--session",
            "2023/2024",
            "--semester",
            "First",
            "--course",
            "CSC101",
        ])
        .unwrap();
        if let Command::Events(args) = cli.command {
            assert_eq!(args.since, 0);
            assert_eq!(args.filter.as_key().unwrap().course_code, "CSC101");
        } else {
            panic!("wrong command");
        }
    }
}
