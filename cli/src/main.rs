use std::path::PathBuf;

use anyhow::{anyhow, Result};
use ballot::{ChoiceId, Tally, VoteReceipt, VoterId};
use chrono::{DateTime, Utc};
use clap::Parser;
use cli::{cli_types::OutputFormat, utils::*, ElectionRoll, SubmitOutcome, VoteClient};
use log::info;
use serde::Serialize;
use tokio::runtime::Builder;

#[derive(Clone, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(
        short,
        long,
        env = "BALLOT_URL",
        default_value = "http://localhost:3000",
        value_parser = parse_base_url
    )]
    pub base_url: String,

    #[arg(
        short,
        long,
        env = "BALLOT_OUTPUT",
        default_value = "text",
        value_parser = parse_output_format
    )]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Clone)]
pub enum Commands {
    Vote {
        #[arg(long, value_parser = parse_voter_id)]
        voter: VoterId,

        #[arg(long, value_parser = parse_choice_id)]
        choice: ChoiceId,
    },
    Tally {},
    Summary {},
    Votes {},
    Choices {},
    Voter {
        #[arg(long, value_parser = parse_voter_id)]
        voter: VoterId,
    },
    Receipt {
        #[arg(long, value_parser = parse_voter_id)]
        voter: VoterId,
    },
    Audit {
        #[arg(long, env = "METRICS_AUTH_TOKEN", help = "Admin token of the service")]
        token: String,
    },
    GenerateRoll {
        #[arg(long, help = "Number of eligible voters to register")]
        voters: usize,

        #[arg(long, env, default_value = "./", help = "Directory to save the roll to")]
        save_path: PathBuf,

        #[arg(long, help = "Gzip the roll")]
        compressed: bool,
    },
    CheckRoll {
        #[arg(long, env, help = "Path to read the roll from")]
        read_path: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tally(tally: &Tally) {
    for (choice, entry) in tally.iter() {
        println!("{:<16} {:>8} {:>6.1}%", choice, entry.count, entry.percentage);
    }
    println!("{:<16} {:>8}", "total", tally.total_votes());
}

fn describe_bound(bound: Option<DateTime<Utc>>) -> String {
    bound.map_or_else(|| "unbounded".to_string(), |at| at.to_rfc3339())
}

fn print_receipt(receipt: &VoteReceipt) {
    println!("Vote Id: {}", receipt.vote_id);
    println!("Choice: {}", receipt.choice_id);
    println!("Timestamp: {}", receipt.timestamp.to_rfc3339());
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(false)
        .try_init();

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let cli = Cli::parse();
    let output = cli.output;

    match cli.command {
        // === Local roll files ===
        Commands::GenerateRoll {
            voters,
            save_path,
            compressed,
        } => {
            let roll = ElectionRoll::demo(voters);
            let file_name = if compressed {
                format!("roll-{}.json.gz", voters)
            } else {
                format!("roll-{}.json", voters)
            };
            let file_path = save_path.join(file_name);
            roll.save(&file_path)?;
            info!(
                "Saved roll with {} choices and {} voters to {:?}",
                roll.choices.len(),
                roll.voters.len(),
                file_path
            );
        }
        Commands::CheckRoll { read_path } => {
            let roll = ElectionRoll::read(&read_path)?;
            match output {
                OutputFormat::Json => print_json(&roll)?,
                OutputFormat::Text => {
                    println!("Election: {}", roll.name);
                    let window = roll.voting_window()?;
                    println!("Opens: {}", describe_bound(window.opens_at));
                    println!("Closes: {}", describe_bound(window.closes_at));
                    println!("Choices: {}", roll.choices.len());
                    for choice in &roll.choices {
                        println!("  {:<16} {}", choice.id, choice.name);
                    }
                    println!(
                        "Voters: {} ({} eligible)",
                        roll.voters.len(),
                        roll.eligible_voters()
                    );
                }
            }
        }
        // === Service requests ===
        command => {
            let client = VoteClient::new(&cli.base_url)?;
            runtime.block_on(run_remote(&client, command, output))?;
        }
    }
    Ok(())
}

async fn run_remote(client: &VoteClient, command: Commands, output: OutputFormat) -> Result<()> {
    match command {
        Commands::Vote { voter, choice } => {
            info!("Submitting vote of {} for {}...", voter, choice);
            match client.submit_vote(&voter, &choice).await? {
                SubmitOutcome::Accepted(receipt) => match output {
                    OutputFormat::Json => print_json(&receipt)?,
                    OutputFormat::Text => print_receipt(&receipt),
                },
                SubmitOutcome::Rejected { status, body } => {
                    return Err(anyhow!(
                        "Vote rejected ({}): {} {}",
                        status,
                        body.error,
                        body.message
                    ));
                }
            }
        }
        Commands::Tally {} => {
            let tally = client.tally().await?;
            match output {
                OutputFormat::Json => print_json(&tally)?,
                OutputFormat::Text => print_tally(&tally),
            }
        }
        Commands::Summary {} => {
            let summary = client.summary().await?;
            match output {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Text => {
                    println!("Total Votes: {}", summary.total_votes);
                    println!(
                        "Turnout: {}/{} ({:.1}%)",
                        summary.turnout.voted,
                        summary.turnout.eligible_voters,
                        summary.turnout.percentage
                    );
                    match &summary.leader {
                        Some(leader) => println!("Leader: {}", leader),
                        None => println!("Leader: none"),
                    }
                    print_tally(&summary.tally);
                }
            }
        }
        Commands::Votes {} => {
            let votes = client.votes().await?;
            match output {
                OutputFormat::Json => print_json(&votes)?,
                OutputFormat::Text => {
                    for vote in &votes {
                        println!(
                            "{:>6} {} {:<16} {}",
                            vote.id.0,
                            vote.timestamp.to_rfc3339(),
                            vote.choice_id,
                            vote.voter_id
                        );
                    }
                }
            }
        }
        Commands::Choices {} => {
            let choices = client.choices().await?;
            match output {
                OutputFormat::Json => print_json(&choices)?,
                OutputFormat::Text => {
                    for choice in &choices {
                        println!("{:<16} {:<24} {}", choice.id, choice.name, choice.description);
                    }
                }
            }
        }
        Commands::Voter { voter } => {
            let status = client.voter(&voter).await?;
            match output {
                OutputFormat::Json => print_json(&status)?,
                OutputFormat::Text => {
                    println!("Voter: {}", status.voter_id);
                    println!("Eligible: {}", status.eligible);
                    println!("Has Voted: {}", status.has_voted);
                }
            }
        }
        Commands::Receipt { voter } => match client.receipt(&voter).await? {
            Some(receipt) => match output {
                OutputFormat::Json => print_json(&receipt)?,
                OutputFormat::Text => print_receipt(&receipt),
            },
            None => info!("Voter {} has not voted", voter),
        },
        Commands::Audit { token } => {
            let audit = client.audit(&token).await?;
            print_json(&audit)?;
        }
        Commands::GenerateRoll { .. } | Commands::CheckRoll { .. } => {
            return Err(anyhow!("Roll commands run locally"));
        }
    }
    Ok(())
}
