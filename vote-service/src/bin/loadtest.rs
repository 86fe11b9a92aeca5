use rand::{seq::SliceRandom, thread_rng};
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use ballot::{ChoiceId, VoterId};
use cli::{ElectionRoll, SubmitOutcome, VoteClient};

/// Result of one submission: HTTP status (None on network error) and latency.
type Sample = (Option<StatusCode>, u128);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Quick-and-dirty CLI via envs
    let base_url =
        std::env::var("BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
    let roll_path = PathBuf::from(
        std::env::var("ELECTION_PATH").unwrap_or_else(|_| "election.json".to_string()),
    );
    let concurrency: usize = std::env::var("CONCURRENCY")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(64);
    let max_voters: Option<usize> = std::env::var("MAX_VOTERS").ok().and_then(|v| v.parse().ok());

    let roll = ElectionRoll::read(&roll_path)?;
    let choices: Vec<ChoiceId> = roll.choices.iter().map(|c| c.id.clone()).collect();
    let voters: Vec<VoterId> = roll
        .voters
        .iter()
        .filter(|v| v.eligible)
        .map(|v| v.id.clone())
        .take(max_voters.unwrap_or(usize::MAX))
        .collect();

    println!("BASE_URL={}", base_url);
    println!("ELECTION_PATH={}", roll_path.display());
    println!(
        "CONCURRENCY={} VOTERS={} CHOICES={}",
        concurrency,
        voters.len(),
        choices.len()
    );

    let http = Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(concurrency)
        .tcp_nodelay(true)
        .timeout(Duration::from_secs(15))
        .build()?;
    let client = VoteClient::with_http_client(http, &base_url)?;

    let before = client.tally().await?.total_votes();

    let start_at = Instant::now();
    let sem = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Sample>();

    let stats_handle = tokio::spawn(async move {
        let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
        let mut accepted = 0u64;
        let mut latencies_ms: Vec<u128> = Vec::new();
        while let Some((status, ms)) = rx.recv().await {
            let label = match status {
                Some(status) => status.as_u16().to_string(),
                None => "net".to_string(),
            };
            if status == Some(StatusCode::CREATED) {
                accepted += 1;
            }
            *by_status.entry(label).or_insert(0) += 1;
            latencies_ms.push(ms);
        }
        latencies_ms.sort_unstable();
        let p = |q: f64| -> u128 {
            if latencies_ms.is_empty() {
                return 0;
            }
            let idx = ((latencies_ms.len() as f64 - 1.0) * q).round() as usize;
            latencies_ms[idx]
        };
        let completed = latencies_ms.len();
        let elapsed = start_at.elapsed().as_secs_f64();
        let qps = if elapsed > 0.0 { completed as f64 / elapsed } else { 0.0 };
        println!(
            "Summary: completed={} accepted={} p50={}ms p90={}ms p99={}ms qps={:.1}",
            completed,
            accepted,
            p(0.50),
            p(0.90),
            p(0.99),
            qps
        );
        for (status, count) in &by_status {
            println!("  status {}: {}", status, count);
        }
        accepted
    });

    let mut rng = thread_rng();
    let mut tasks = Vec::with_capacity(voters.len());
    for voter in voters {
        let Some(choice) = choices.choose(&mut rng).cloned() else {
            anyhow::bail!("Election has no choices");
        };
        let permit = sem.clone().acquire_owned().await?;
        let client_ref = client.clone();
        let tx_ref = tx.clone();
        tasks.push(tokio::spawn(async move {
            let started = Instant::now();
            let resp = client_ref.submit_vote(&voter, &choice).await;
            let elapsed = started.elapsed().as_millis();
            drop(permit);
            let status = match &resp {
                Ok(SubmitOutcome::Accepted(_)) => Some(StatusCode::CREATED),
                Ok(SubmitOutcome::Rejected { status, .. }) => Some(*status),
                Err(_) => None,
            };
            let _ = tx_ref.send((status, elapsed));
            match resp {
                Ok(SubmitOutcome::Rejected { status, body }) => {
                    eprintln!("err {}ms {} status={} {}", elapsed, voter, status, body.error)
                }
                Err(e) => eprintln!("err {}ms {} net={}", elapsed, voter, e),
                Ok(SubmitOutcome::Accepted(_)) => {}
            }
        }));
    }

    // Close the stats channel so the summary prints
    drop(tx);
    for t in tasks {
        let _ = t.await;
    }
    let accepted = stats_handle.await?;

    // Every accepted vote must show up in the tally, and nothing else
    let after = client.tally().await?.total_votes();
    println!("Tally: before={} after={} accepted={}", before, after, accepted);
    if after.checked_sub(before) != Some(accepted) {
        anyhow::bail!(
            "Tally moved by {} but {} submissions were accepted",
            after.saturating_sub(before),
            accepted
        );
    }

    Ok(())
}
