mod logging;
mod report;

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hashchain_core::{
    chain_from_json, chain_to_json,
    constants::{DEFAULT_DIFFICULTY, MINING_BATCH_SIZE, PARALLEL_CHUNK_SIZE},
    inspect_chain,
    mine::mine_block_parallel,
    validate_chain, BlockData, BlockPatch, BlockRecord, Chain, ChainConfig, Outcome,
};
use tracing::{debug, info};

use crate::logging::{init_logging, LogFormat};
use crate::report::Report;

#[derive(Parser, Debug)]
#[command(name = "hashchain")]
#[command(about = "Mine, edit and validate a proof-of-work hash chain", version)]
struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct MiningArgs {
    /// Leading zero hex characters required in a mined hash (1-10)
    #[arg(long, env = "HASHCHAIN_DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: usize,

    /// Nonces tried per mining batch before yielding
    #[arg(long, env = "HASHCHAIN_BATCH_SIZE", default_value_t = MINING_BATCH_SIZE)]
    batch_size: usize,
}

impl MiningArgs {
    fn config(&self) -> Result<ChainConfig> {
        Ok(ChainConfig::new(self.difficulty, self.batch_size)?)
    }
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// New payload
    #[arg(long)]
    data: Option<String>,
    /// New timestamp in milliseconds
    #[arg(long)]
    timestamp: Option<u64>,
    /// New previous hash
    #[arg(long)]
    previous_hash: Option<String>,
    /// New nonce
    #[arg(long)]
    nonce: Option<u64>,
    /// New stored hash
    #[arg(long)]
    hash: Option<String>,
}

impl From<PatchArgs> for BlockPatch {
    fn from(args: PatchArgs) -> Self {
        BlockPatch {
            data: args.data,
            timestamp: args.timestamp,
            previous_hash: args.previous_hash,
            nonce: args.nonce,
            hash: args.hash,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a new chain and print it as JSON
    Mine {
        #[command(flatten)]
        mining: MiningArgs,
        /// Payload of a block to mine; repeat for several blocks
        #[arg(long = "data")]
        data: Vec<String>,
        /// Append this many generated "Transaction N" blocks afterwards
        #[arg(long, default_value_t = 0)]
        auto: usize,
        /// Search nonces on all cores instead of in cooperative batches
        #[arg(long)]
        parallel: bool,
    },
    /// Check a chain read from a JSON file ("-" for stdin)
    Validate {
        #[arg(default_value = "-")]
        input: PathBuf,
        /// Print the verdict and per-block status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Overwrite fields of one block without re-mining and print the chain
    Edit {
        #[arg(default_value = "-")]
        input: PathBuf,
        /// Position of the block in the chain
        #[arg(long)]
        position: usize,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Print the hash of a block's fields
    Hash {
        #[arg(long, default_value_t = 0)]
        index: u64,
        #[arg(long, default_value_t = 0)]
        timestamp: u64,
        #[arg(long, default_value = "")]
        data: String,
        #[arg(long, default_value = "0")]
        previous_hash: String,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
    },
    /// Mine one block after genesis, tamper with it and show the validator catching it
    Demo {
        #[command(flatten)]
        mining: MiningArgs,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging("info", cli.log_format);

    match cli.cmd {
        Command::Mine {
            mining,
            data,
            auto,
            parallel,
        } => {
            let config = mining.config()?;
            let mut chain = Chain::from_config(&config)?;
            for payload in data {
                let record = if parallel {
                    let candidate = chain.next_candidate(payload);
                    mine_block_parallel(candidate, config.difficulty, PARALLEL_CHUNK_SIZE)
                } else {
                    mine_in_batches(&chain, payload, config.batch_size)
                };
                chain.add_block(record);
            }
            chain.auto_mine(auto);
            println!("{}", chain_to_json(chain.blocks())?);
        }
        Command::Validate { input, json } => {
            let records = read_chain(&input)?;
            let verdict = validate_chain(&records);
            let statuses = inspect_chain(&records);
            if json {
                let body = serde_json::json!({ "verdict": verdict, "blocks": statuses });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print!(
                    "{}",
                    Report {
                        records: &records,
                        statuses: &statuses,
                        verdict: &verdict,
                    }
                );
            }
            if !verdict.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Edit {
            input,
            position,
            patch,
        } => {
            let records = read_chain(&input)?;
            let mut chain = Chain::with_blocks(records, DEFAULT_DIFFICULTY);
            chain.edit_block(position, &patch.into())?;
            println!("{}", chain_to_json(chain.blocks())?);
        }
        Command::Hash {
            index,
            timestamp,
            data,
            previous_hash,
            nonce,
        } => {
            let record = BlockRecord::from_data(BlockData {
                index,
                timestamp,
                data,
                previous_hash,
                nonce,
                hash: String::new(),
            });
            println!("{}", record.calculate_hash());
        }
        Command::Demo { mining } => {
            let config = mining.config()?;
            return demo(&config);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Drive a mining session the way an interactive caller would: a batch of
/// nonces at a time.
fn mine_in_batches(chain: &Chain, data: String, batch_size: usize) -> BlockRecord {
    let started = Instant::now();
    let mut batches = 0u64;
    let mut outcome = Outcome::Continue(chain.start_mining(data));
    loop {
        match outcome {
            Outcome::Continue(session) => {
                batches += 1;
                debug!(batch = batches, nonce = session.record().nonce(), "mining");
                outcome = session.run(batch_size);
            }
            Outcome::Done(record) => {
                info!(
                    index = record.index(),
                    nonce = record.nonce(),
                    batches,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "block ready"
                );
                return record;
            }
        }
    }
}

fn read_chain(input: &Path) -> Result<Vec<BlockRecord>> {
    let json = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading chain from stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?
    };
    Ok(chain_from_json(&json)?)
}

fn print_report(chain: &Chain) {
    let statuses = inspect_chain(chain.blocks());
    let verdict = chain.validate();
    print!(
        "{}",
        Report {
            records: chain.blocks(),
            statuses: &statuses,
            verdict: &verdict,
        }
    );
}

fn demo(config: &ChainConfig) -> Result<ExitCode> {
    let mut chain = Chain::from_config(config)?;
    let record = mine_in_batches(&chain, "Alice pays Bob 10".to_string(), config.batch_size);
    chain.add_block(record);

    println!("mined {} blocks at difficulty {}", chain.len(), chain.difficulty());
    print_report(&chain);

    println!();
    println!("tampering: block 1 data -> \"Alice pays Bob 1000\"");
    chain.edit_block(1, &BlockPatch::default().data("Alice pays Bob 1000"))?;
    print_report(&chain);
    Ok(ExitCode::SUCCESS)
}
