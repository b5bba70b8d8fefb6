use anyhow::Result;
use std::time::Duration;

use neurovault::config::NeuroVaultConfig;
use neurovault::worker::{run_daemon, ValidatorClient};

pub struct WorkerArgs {
    pub once: bool,
    pub interval: Option<u64>,
    pub dry: bool,
    pub backend: Option<String>,
}

/// Run the polling validator once or as a daemon.
pub async fn worker(config: &NeuroVaultConfig, args: WorkerArgs) -> Result<()> {
    let mut worker_config = config.worker.clone();
    if let Some(backend) = args.backend {
        worker_config.backend_url = backend;
    }

    let client = ValidatorClient::new(&worker_config, args.dry)?;
    if args.once {
        let processed = client.run_once(worker_config.batch_size).await;
        println!("Processed {processed} candidates");
        return Ok(());
    }

    let interval_secs = args
        .interval
        .unwrap_or(worker_config.poll_interval_secs)
        .max(1);
    let interval = Duration::from_secs(interval_secs);
    run_daemon(&client, interval, worker_config.batch_size).await
}
