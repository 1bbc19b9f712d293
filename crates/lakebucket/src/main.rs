use std::io::{self, Write};

use clap::{Parser, Subcommand};
use lakebucket_core::expr::PredicateOperation;
use lakebucket_core::expr::bound::{BoundPredicate, BoundReference};
use lakebucket_core::hash::{HASH_VERSION, hash_scalar};
use lakebucket_core::parse::parse_scalar;
use lakebucket_core::transform::bucket::BucketTransform;
use lakebucket_core::types::datatype::DataType;
use lakebucket_error::{BucketError, Result, ResultExt};
use logutil::LogFormat;
use tracing::{Level, debug};

#[derive(Parser)]
#[clap(name = "lakebucket", version)]
struct Arguments {
    /// Log level used when `RUST_LOG` isn't set.
    #[clap(long, env = "LAKEBUCKET_LOG_LEVEL", default_value = "error", value_parser = parse_level)]
    log_level: Level,
    /// Log output format (human or json).
    #[clap(long, env = "LAKEBUCKET_LOG_FORMAT", default_value = "human")]
    log_format: LogFormat,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical 32-bit hash of a value.
    Hash {
        /// Type of the value, e.g. `long`, `string`, `decimal(9,2)`.
        datatype: DataType,
        #[clap(allow_hyphen_values = true)]
        value: String,
    },
    /// Print the bucket a value is assigned to.
    Bucket {
        /// Number of buckets.
        #[clap(short = 'n', long)]
        num_buckets: i32,
        datatype: DataType,
        #[clap(allow_hyphen_values = true)]
        value: String,
    },
    /// Project a predicate on a column onto the column's bucket partition.
    Project {
        /// Number of buckets.
        #[clap(short = 'n', long)]
        num_buckets: i32,
        /// Produce a strict projection instead of an inclusive one.
        #[clap(long)]
        strict: bool,
        /// Name of the partition column. Defaults to `<column>_bucket`.
        #[clap(long)]
        partition_name: Option<String>,
        datatype: DataType,
        column: String,
        /// Operation, e.g. `=`, `!=`, `in`, `not_in`, `is_null`.
        op: PredicateOperation,
        /// Literal operands.
        #[clap(allow_hyphen_values = true)]
        values: Vec<String>,
    },
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|_| format!("Invalid log level: {s}"))
}

fn main() {
    let args = Arguments::parse();
    logutil::configure_global_logger(args.log_level, args.log_format, io::stderr);

    let mut stdout = io::stdout();
    if let Err(err) = run(args.command, &mut stdout) {
        println!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn run(command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Hash { datatype, value } => {
            let value = parse_scalar(&datatype, &value)?;
            debug!(%value, hash_version = HASH_VERSION, "hashing value");
            writeln!(out, "{}", hash_scalar(&value)?)?;
        }
        Command::Bucket {
            num_buckets,
            datatype,
            value,
        } => {
            let bound = BucketTransform::try_new(num_buckets)?.bind(&datatype)?;
            let value = parse_scalar(&datatype, &value)?;
            match bound.apply(&value)? {
                Some(bucket) => writeln!(out, "{bucket}")?,
                None => writeln!(out, "NULL")?,
            }
        }
        Command::Project {
            num_buckets,
            strict,
            partition_name,
            datatype,
            column,
            op,
            values,
        } => {
            let transform = BucketTransform::try_new(num_buckets)?;
            let name = partition_name.unwrap_or_else(|| format!("{column}_bucket"));
            let pred = bound_predicate(op, column, datatype, &values)?;
            debug!(%pred, %transform, strict, "projecting predicate");

            let projected = if strict {
                transform.project_strict(&name, &pred)?
            } else {
                transform.project(&name, &pred)?
            };
            match projected {
                Some(projected) => writeln!(out, "{projected}")?,
                None => writeln!(out, "no predicate")?,
            }
        }
    }

    Ok(())
}

fn bound_predicate(
    op: PredicateOperation,
    column: String,
    datatype: DataType,
    values: &[String],
) -> Result<BoundPredicate> {
    let literals = values
        .iter()
        .map(|v| parse_scalar(&datatype, v))
        .collect::<Result<Vec<_>>>()
        .context("Failed to parse predicate operands")?;
    let reference = BoundReference::new(1, column, datatype);

    if op.is_unary() {
        if !literals.is_empty() {
            return Err(BucketError::new(format!("{op} takes no values")));
        }
        BoundPredicate::try_new_unary(op, reference)
    } else if op.is_set() {
        BoundPredicate::try_new_set(op, reference, literals)
    } else {
        match <[_; 1]>::try_from(literals) {
            Ok([literal]) => BoundPredicate::try_new_literal(op, reference, literal),
            Err(literals) => Err(BucketError::new(format!(
                "{op} takes exactly one value, got {}",
                literals.len()
            ))),
        }
    }
}
