use cli::ElectionRoll;
use reqwest::Client;
use std::process::{Command, Stdio};
use std::{
    net::TcpListener,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time::sleep;

pub const TEST_TOKEN: &str = "test-token";

/// Get an available ephemeral port on localhost.
pub fn find_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Resolve the vote-service binary path from env or common target dirs.
pub fn resolve_binary_path() -> String {
    if let Some(p) = option_env!("CARGO_BIN_EXE_vote-service") {
        return p.to_string();
    }

    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest.parent().unwrap_or(&manifest).to_path_buf();
    let candidates = [
        manifest.join("target/debug/vote-service"),
        manifest.join("target/release/vote-service"),
        workspace_root.join("target/debug/vote-service"),
        workspace_root.join("target/release/vote-service"),
    ];
    for cand in candidates.iter() {
        if Path::new(&cand).exists() {
            return cand.to_string_lossy().to_string();
        }
    }

    "vote-service".to_string()
}

/// Poll /healthz until the server responds OK or timeout.
pub async fn wait_ready(base: &str, timeout_ms: u64) -> anyhow::Result<()> {
    let client = Client::new();
    let mut waited = 0u64;
    loop {
        if waited >= timeout_ms {
            anyhow::bail!("server not ready after {}ms", timeout_ms);
        }
        if let Ok(resp) = client.get(format!("{}/healthz", base)).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        sleep(Duration::from_millis(50)).await;
        waited += 50;
    }
}

// Kills the child process and removes its roll file on drop
pub struct ChildGuard {
    child: std::process::Child,
    roll_path: PathBuf,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.roll_path);
    }
}

pub async fn setup_server(roll: &ElectionRoll) -> anyhow::Result<(String, ChildGuard)> {
    let bin = resolve_binary_path();
    let bin_path = Path::new(&bin);
    assert!(bin_path.exists(), "binary not found at {}", bin);

    let port = find_free_port();
    let base_url = format!("http://127.0.0.1:{}", port);

    let roll_path = std::env::temp_dir().join(format!("e2e_roll_{}.json.gz", port));
    roll.save(&roll_path)?;

    let child = Command::new(&bin)
        .env("ELECTION_PATH", &roll_path)
        .env("METRICS_AUTH_TOKEN", TEST_TOKEN)
        .env("DB_PATH", ":memory:")
        .env("PORT", port.to_string())
        .env("RUST_LOG", "info")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    // Ensure we always try to kill the child on exit
    let guard = ChildGuard { child, roll_path };

    wait_ready(&base_url, 10_000).await?;

    Ok((base_url, guard))
}
