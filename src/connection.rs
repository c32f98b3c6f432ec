use super::*;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum State {
    Init,
    Subscribed,
    Authorized,
    Working,
}

enum Line {
    Message(Message),
    Malformed(String),
    Closed,
}

/// One miner connection: the line-framed wire loop and the Stratum state
/// machine. `Working` is the only state that accepts submits.
pub(crate) struct Connection<R, W> {
    settings: Arc<Settings>,
    extranonces: Arc<Extranonces>,
    solution_tx: mpsc::Sender<Block>,
    socket_addr: SocketAddr,
    reader: FramedRead<R, LinesCodec>,
    writer: FramedWrite<W, LinesCodec>,
    job_receiver: watch::Receiver<Arc<Job>>,
    cancel_token: CancellationToken,
    jobs: Jobs,
    state: State,
    worker_name: Option<String>,
    user_agent: Option<String>,
    extranonce1: Option<Extranonce>,
    difficulty: Difficulty,
    minimum_difficulty: Option<Difficulty>,
    version_mask: Option<Version>,
    protocol_errors: u32,
    connected_at: Instant,
    last_activity: Instant,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        settings: Arc<Settings>,
        extranonces: Arc<Extranonces>,
        solution_tx: mpsc::Sender<Block>,
        socket_addr: SocketAddr,
        reader: R,
        writer: W,
        job_receiver: watch::Receiver<Arc<Job>>,
        cancel_token: CancellationToken,
    ) -> Self {
        let difficulty = settings.start_difficulty();

        Self {
            settings,
            extranonces,
            solution_tx,
            socket_addr,
            reader: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_SIZE)),
            writer: FramedWrite::new(writer, LinesCodec::new()),
            job_receiver,
            cancel_token,
            jobs: Jobs::new(),
            state: State::Init,
            worker_name: None,
            user_agent: None,
            extranonce1: None,
            difficulty,
            minimum_difficulty: None,
            version_mask: None,
            protocol_errors: 0,
            connected_at: Instant::now(),
            last_activity: Instant::now(),
        }
    }

    pub(crate) async fn serve(&mut self) -> Result {
        let mut job_receiver = self.job_receiver.clone();
        let cancel_token = self.cancel_token.clone();

        loop {
            // Until the handshake lands the clock runs from accept; after
            // that any received bytes push the idle deadline out.
            let deadline = if self.state == State::Working {
                self.last_activity + IDLE_TIMEOUT
            } else {
                self.connected_at + HANDSHAKE_TIMEOUT
            };

            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Disconnecting from {}", self.socket_addr);
                    break;
                }

                _ = tokio::time::sleep_until(deadline) => {
                    warn!("Connection {} timed out", self.socket_addr);
                    break;
                }

                line = self.read_message() => {
                    self.last_activity = Instant::now();

                    match line? {
                        Line::Closed => break,
                        Line::Malformed(reason) => {
                            warn!("Malformed line from {}: {reason}", self.socket_addr);
                            self.send_error(
                                Id::Null,
                                StratumError::Other.with_context(reason),
                            )
                            .await?;

                            if self.note_protocol_error() {
                                break;
                            }
                        }
                        Line::Message(Message::Request { id, method, params }) => {
                            let was_protocol_error =
                                self.handle_request(id, &method, params).await?;

                            if was_protocol_error {
                                if self.note_protocol_error() {
                                    break;
                                }
                            } else {
                                self.protocol_errors = 0;
                            }
                        }
                        Line::Message(message) => {
                            warn!(?message, "Ignoring non-request from {}", self.socket_addr);
                        }
                    }
                }

                changed = job_receiver.changed() => {
                    if changed.is_err() {
                        warn!("Job channel closed, disconnecting {}", self.socket_addr);
                        break;
                    }

                    let job = job_receiver.borrow_and_update().clone();

                    if self.state == State::Working {
                        self.job_update(job).await?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns true when the error budget is exhausted and the connection
    /// should close.
    fn note_protocol_error(&mut self) -> bool {
        self.protocol_errors += 1;
        if self.protocol_errors >= 2 {
            warn!(
                "Closing {} after consecutive protocol errors",
                self.socket_addr
            );
            true
        } else {
            false
        }
    }

    /// Dispatches one request. Returns true when the request was malformed
    /// and counts against the protocol error budget.
    async fn handle_request(&mut self, id: Id, method: &str, params: Value) -> Result<bool> {
        match method {
            "mining.configure" => {
                debug!("CONFIGURE from {} with {params}", self.socket_addr);

                match serde_json::from_value::<Configure>(params) {
                    Ok(configure) => {
                        self.configure(id, configure).await?;
                        Ok(false)
                    }
                    Err(err) => {
                        self.send_error(id, StratumError::Other.with_context(err)).await?;
                        Ok(true)
                    }
                }
            }
            "mining.subscribe" => {
                debug!("SUBSCRIBE from {} with {params}", self.socket_addr);

                if self.state != State::Init {
                    self.send_error(
                        id,
                        StratumError::Other.with_context("already subscribed"),
                    )
                    .await?;
                    return Ok(false);
                }

                match serde_json::from_value::<Subscribe>(params) {
                    Ok(subscribe) => {
                        self.subscribe(id, subscribe).await?;
                        Ok(false)
                    }
                    Err(err) => {
                        self.send_error(id, StratumError::Other.with_context(err)).await?;
                        Ok(true)
                    }
                }
            }
            "mining.authorize" => {
                debug!("AUTHORIZE from {} with {params}", self.socket_addr);

                if self.state != State::Subscribed {
                    self.send_error(
                        id,
                        StratumError::Other.with_context("subscribe before authorizing"),
                    )
                    .await?;
                    return Ok(false);
                }

                match serde_json::from_value::<Authorize>(params) {
                    Ok(authorize) => {
                        self.authorize(id, authorize).await?;
                        Ok(false)
                    }
                    Err(err) => {
                        self.send_error(id, StratumError::Other.with_context(err)).await?;
                        Ok(true)
                    }
                }
            }
            "mining.suggest_difficulty" => {
                debug!("SUGGEST_DIFFICULTY from {} with {params}", self.socket_addr);

                match serde_json::from_value::<SuggestDifficulty>(params) {
                    Ok(suggest) => {
                        self.suggest_difficulty(id, suggest).await?;
                        Ok(false)
                    }
                    Err(err) => {
                        self.send_error(id, StratumError::Other.with_context(err)).await?;
                        Ok(true)
                    }
                }
            }
            "mining.submit" => {
                debug!("SUBMIT from {} with {params}", self.socket_addr);

                if self.state != State::Working {
                    self.send_error(id, StratumError::Unauthorized.into()).await?;
                    return Ok(false);
                }

                match serde_json::from_value::<Submit>(params) {
                    Ok(submit) => {
                        self.submit(id, submit).await?;
                        Ok(false)
                    }
                    Err(err) => {
                        self.send_error(id, StratumError::InvalidSubmit.with_context(err))
                            .await?;
                        Ok(true)
                    }
                }
            }
            method => {
                // Some firmwares disconnect on errors to methods we have no
                // use for, so humor them
                warn!(
                    "Unknown method {method} with {params} from {}",
                    self.socket_addr
                );
                self.respond(id, json!(true)).await?;
                Ok(false)
            }
        }
    }

    async fn configure(&mut self, id: Id, configure: Configure) -> Result {
        let mut result = serde_json::Map::new();

        for extension in &configure.extensions {
            match extension.as_str() {
                "version-rolling" => {
                    let requested = configure
                        .version_rolling_mask
                        .unwrap_or_else(|| Version::from(-1));
                    let mask = requested & self.settings.version_mask();

                    self.version_mask = Some(mask);

                    result.insert("version-rolling".into(), json!(true));
                    result.insert("version-rolling.mask".into(), json!(mask));
                }
                "minimum-difficulty" => match configure.minimum_difficulty_value {
                    Some(minimum) => {
                        self.minimum_difficulty = Some(minimum);
                        self.difficulty = self.difficulty.max(minimum);
                        result.insert("minimum-difficulty".into(), json!(true));
                    }
                    None => {
                        result.insert("minimum-difficulty".into(), json!(false));
                    }
                },
                unknown => {
                    warn!("Unsupported extension {unknown} from {}", self.socket_addr);
                    result.insert(unknown.into(), json!(false));
                }
            }
        }

        self.respond(id, Value::Object(result)).await
    }

    async fn subscribe(&mut self, id: Id, subscribe: Subscribe) -> Result {
        if let Some(suggested) = subscribe.extranonce1 {
            warn!("Ignoring extranonce1 suggestion {suggested} from {}", self.socket_addr);
        }

        let extranonce1 = self.extranonces.allocate();

        let result = SubscribeResult {
            subscriptions: vec![
                (
                    "mining.set_difficulty".to_string(),
                    SUBSCRIPTION_ID.to_string(),
                ),
                ("mining.notify".to_string(), SUBSCRIPTION_ID.to_string()),
            ],
            extranonce1: extranonce1.clone(),
            extranonce2_size: EXTRANONCE2_SIZE.try_into().unwrap(),
        };

        self.respond(id, json!(result)).await?;

        self.extranonce1 = Some(extranonce1);
        self.user_agent = Some(subscribe.user_agent);
        self.state = State::Subscribed;

        Ok(())
    }

    async fn authorize(&mut self, id: Id, authorize: Authorize) -> Result {
        // Worker names are opaque; the part before the dot is usually an
        // address, but payouts go to the configured address either way, so a
        // bad one only earns a warning.
        let address_part = authorize.username.split('.').next().unwrap_or_default();
        match address_part.parse::<Address<bitcoin::address::NetworkUnchecked>>() {
            Ok(address) => {
                if address
                    .require_network(self.settings.chain().network())
                    .is_err()
                {
                    warn!(
                        "Worker {} is named for the wrong network",
                        authorize.username
                    );
                }
            }
            Err(_) => warn!(
                "Worker {} does not start with an address",
                authorize.username
            ),
        }

        self.respond(id, json!(true)).await?;

        info!(
            "Worker {} authorized from {}",
            authorize.username, self.socket_addr
        );

        self.worker_name = Some(authorize.username);
        self.state = State::Authorized;

        if let Some(minimum) = self.minimum_difficulty {
            self.difficulty = self.difficulty.max(minimum);
        }

        debug!("Sending SET_DIFFICULTY");

        self.notify_difficulty().await?;

        debug!("Sending NOTIFY");

        let job = self.job_receiver.borrow().clone();
        self.jobs.insert(job.clone());

        // The first job a session sees is always a clean slate
        let mut notify = job.notify();
        notify.clean_jobs = true;

        self.send(Message::Notification {
            method: "mining.notify".into(),
            params: json!(notify),
        })
        .await?;

        self.state = State::Working;

        Ok(())
    }

    async fn suggest_difficulty(&mut self, id: Id, suggest: SuggestDifficulty) -> Result {
        let mut difficulty = suggest.difficulty().max(self.settings.min_difficulty());

        if let Some(minimum) = self.minimum_difficulty {
            difficulty = difficulty.max(minimum);
        }

        debug!(
            "Difficulty for {} set to {difficulty} (suggested {})",
            self.socket_addr,
            suggest.difficulty()
        );

        self.difficulty = difficulty;

        self.respond(id, json!(true)).await?;
        self.notify_difficulty().await?;

        Ok(())
    }

    async fn submit(&mut self, id: Id, submit: Submit) -> Result {
        let job = match self.jobs.lookup(submit.job_id) {
            JobEntry::Current(job) => job,
            JobEntry::Stale => {
                return self.send_error(id, StratumError::Stale.into()).await;
            }
            JobEntry::Unknown => {
                return self.send_error(id, StratumError::UnknownJob.into()).await;
            }
        };

        if submit.extranonce2.len() != EXTRANONCE2_SIZE {
            return self
                .send_error(
                    id,
                    StratumError::InvalidSubmit.with_context(format!(
                        "extranonce2 length {} (expected {EXTRANONCE2_SIZE})",
                        submit.extranonce2.len()
                    )),
                )
                .await;
        }

        if !job.ntime_in_range(submit.ntime) {
            return self
                .send_error(
                    id,
                    StratumError::InvalidSubmit
                        .with_context(format!("ntime {} out of range", submit.ntime)),
                )
                .await;
        }

        let version = match submit.version_bits {
            Some(version_bits) => {
                let mask = self.version_mask.unwrap_or_else(|| Version::from(0));
                let disallowed = version_bits & !mask;

                if disallowed != Version::from(0) {
                    return self
                        .send_error(
                            id,
                            StratumError::InvalidSubmit.with_context(format!(
                                "version bits {disallowed} outside negotiated mask"
                            )),
                        )
                        .await;
                }

                (job.version & !mask) | (version_bits & mask)
            }
            None => job.version,
        };

        let extranonce1 = self
            .extranonce1
            .clone()
            .ok_or_else(|| anyhow!("working session without extranonce1"))?;

        let merkle_root = job.merkle_root(&extranonce1, &submit.extranonce2)?;
        let header = job.header(version, merkle_root, submit.ntime, submit.nonce);
        let hash = header.block_hash();

        if self.jobs.is_duplicate(hash) {
            return self.send_error(id, StratumError::Duplicate.into()).await;
        }

        if !self.difficulty.target().is_met_by(hash) {
            debug!(
                "Share {hash} from {} above target at difficulty {}",
                self.socket_addr, self.difficulty
            );
            return self.send_error(id, StratumError::HighHash.into()).await;
        }

        self.respond(id, json!(true)).await?;

        debug!(
            "Share {hash} accepted from {} ({}) at difficulty {}",
            self.socket_addr,
            self.worker_name.as_deref().unwrap_or("unknown"),
            self.difficulty
        );

        if job.network_target().is_met_by(hash) {
            info!("Share {hash} from {} meets the network target", self.socket_addr);

            let block = job.assemble_block(header, &extranonce1, &submit.extranonce2)?;

            if self.solution_tx.try_send(block).is_err() {
                error!("Solution channel full, dropping block {hash}");
            }
        }

        Ok(())
    }

    async fn job_update(&mut self, job: Arc<Job>) -> Result {
        // The watch channel can replay the job we sent at authorize time
        if matches!(self.jobs.lookup(job.job_id), JobEntry::Current(_)) {
            return Ok(());
        }

        self.jobs.insert(job.clone());

        debug!("Job update, sending NOTIFY to {}", self.socket_addr);

        self.send(Message::Notification {
            method: "mining.notify".into(),
            params: json!(job.notify()),
        })
        .await
    }

    async fn notify_difficulty(&mut self) -> Result {
        self.send(Message::Notification {
            method: "mining.set_difficulty".into(),
            params: json!(SetDifficulty(self.difficulty)),
        })
        .await
    }

    async fn read_message(&mut self) -> Result<Line> {
        match self.reader.next().await {
            Some(Ok(line)) => match serde_json::from_str::<Message>(&line) {
                Ok(message) => Ok(Line::Message(message)),
                Err(err) => Ok(Line::Malformed(err.to_string())),
            },
            Some(Err(err)) => Err(anyhow!("read error from {}: {err}", self.socket_addr)),
            None => {
                info!("Connection {} disconnected", self.socket_addr);
                Ok(Line::Closed)
            }
        }
    }

    async fn respond(&mut self, id: Id, result: Value) -> Result {
        self.send(Message::Response {
            id,
            result: Some(result),
            error: None,
        })
        .await
    }

    async fn send_error(&mut self, id: Id, error: stratum::StratumErrorResponse) -> Result {
        self.send(Message::Response {
            id,
            result: None,
            error: Some(error),
        })
        .await
    }

    async fn send(&mut self, message: Message) -> Result {
        let frame = serde_json::to_string(&message)?;
        self.writer.send(frame).await?;
        Ok(())
    }
}

impl<R, W> Drop for Connection<R, W> {
    fn drop(&mut self) {
        if let Some(extranonce1) = &self.extranonce1 {
            self.extranonces.release(extranonce1);
        }

        info!(
            "Connection {} ({}) closed",
            self.socket_addr,
            self.user_agent.as_deref().unwrap_or("unknown")
        );
    }
}
