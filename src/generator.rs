use super::*;

/// The template loop: polls the node, detects when the work actually
/// changed, and publishes fresh immutable jobs to every session through a
/// watch channel. Found blocks come back in through the solution channel and
/// force an immediate refresh once the node takes them.
pub(crate) struct Generator {
    node: Arc<NodeClient>,
    settings: Arc<Settings>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// `None` when the template describes the same work as the last job,
/// otherwise the `clean_jobs` flag for the job to publish.
fn template_change(last: &BlockTemplate, next: &BlockTemplate) -> Option<bool> {
    if next.previous_block_hash != last.previous_block_hash {
        Some(true)
    } else if next.txids() != last.txids() {
        Some(false)
    } else {
        None
    }
}

impl Generator {
    pub(crate) fn new(node: Arc<NodeClient>, settings: Arc<Settings>) -> Self {
        Self {
            node,
            settings,
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    pub(crate) async fn spawn(
        &mut self,
    ) -> Result<(watch::Receiver<Arc<Job>>, mpsc::Sender<Block>)> {
        let cancel = self.cancel.clone();
        let node = self.node.clone();
        let settings = self.settings.clone();

        let initial = fetch_template(node.clone()).await?;

        info!("New block template for height {}", initial.height);

        let mut next_id = JobId::new(0);
        let initial_job = Arc::new(Job::new(
            Arc::new(initial),
            settings.payout_address()?,
            settings.coinbase_tag(),
            next_id,
            true,
        )?);
        next_id = next_id.next();

        let (job_tx, job_rx) = watch::channel(initial_job.clone());
        let (solution_tx, mut solution_rx) = mpsc::channel::<Block>(8);

        let handle = tokio::spawn(async move {
            info!("Spawning generator task");

            let mut ticker = interval(settings.update_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.reset();

            let mut last_job = initial_job;
            let mut backoff = Duration::from_secs(1);
            let mut retry_at: Option<Instant> = None;

            loop {
                let retry = async {
                    match retry_at {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                };

                let mut refresh = false;
                let mut solved = None;

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    block = solution_rx.recv() => {
                        match block {
                            Some(block) => solved = Some(block),
                            None => break,
                        }
                    }
                    _ = ticker.tick() => refresh = true,
                    _ = retry => refresh = true,
                }

                if let Some(block) = solved {
                    if submit_block(node.clone(), block).await {
                        refresh = true;
                    }
                }

                if !refresh {
                    continue;
                }

                match fetch_template(node.clone()).await {
                    Ok(template) => {
                        backoff = Duration::from_secs(1);
                        retry_at = None;

                        let Some(clean_jobs) = template_change(&last_job.template, &template)
                        else {
                            continue;
                        };

                        let payout_address = match settings.payout_address() {
                            Ok(address) => address,
                            Err(err) => {
                                error!("payout address became invalid: {err}");
                                continue;
                            }
                        };

                        match Job::new(
                            Arc::new(template),
                            payout_address,
                            settings.coinbase_tag(),
                            next_id,
                            clean_jobs,
                        ) {
                            Ok(job) => {
                                next_id = next_id.next();
                                let job = Arc::new(job);

                                info!(
                                    "New job {} for height {} (clean={clean_jobs})",
                                    job.job_id, job.template.height
                                );

                                last_job = job.clone();
                                job_tx.send_replace(job);
                            }
                            Err(err) => error!("Failed to build job from template: {err}"),
                        }
                    }
                    Err(err) => {
                        warn!("Failed to fetch block template: {err}; retrying in {backoff:?}");
                        retry_at = Some(Instant::now() + backoff);
                        backoff = (backoff * 2).min(MAX_POLL_BACKOFF);
                    }
                }
            }

            info!("Shutting down generator");
        });

        self.handle = Some(handle);

        Ok((job_rx, solution_tx))
    }

    pub(crate) async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn fetch_template(node: Arc<NodeClient>) -> Result<BlockTemplate, NodeError> {
    task::spawn_blocking(move || node.get_block_template())
        .await
        .map_err(|err| NodeError::Malformed {
            reason: format!("template fetch task failed: {err}"),
        })?
}

/// Returns true when the node accepted the block and the tip therefore
/// moved.
async fn submit_block(node: Arc<NodeClient>, block: Block) -> bool {
    let block_hash = block.block_hash();

    info!("Submitting block {block_hash} to the node");

    let result = task::spawn_blocking(move || node.submit_block(&block)).await;

    match result {
        Ok(Ok(None)) => {
            info!("Node accepted block {block_hash}");
            true
        }
        Ok(Ok(Some(reason))) => {
            error!("Node rejected block {block_hash}: {reason}");
            false
        }
        Ok(Err(err)) => {
            error!("Failed to submit block {block_hash}: {err}");
            false
        }
        Err(err) => {
            error!("Block submission task failed: {err}");
            false
        }
    }
}
