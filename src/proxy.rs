use {super::*, snafu::Snafu};

/// An unbindable listen address is a configuration problem, kept typed so
/// startup can exit with the config-error code.
#[derive(Debug, Snafu)]
#[snafu(display("Failed to listen on {address}: {source}"))]
pub(crate) struct BindError {
    address: String,
    source: io::Error,
}

pub(crate) struct Proxy {
    settings: Arc<Settings>,
}

impl Proxy {
    pub(crate) fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub(crate) async fn run(self, cancel_token: CancellationToken) -> Result {
        let settings = self.settings.clone();

        let node = Arc::new(
            task::spawn_blocking({
                let settings = settings.clone();
                move || NodeClient::connect(&settings)
            })
            .await??,
        );

        let mut generator = Generator::new(node, settings.clone());
        let (job_receiver, solution_tx) = generator.spawn().await?;

        let extranonces = Arc::new(Extranonces::new());

        let listener = TcpListener::bind((settings.address().to_string(), settings.port()))
            .await
            .map_err(|source| BindError {
                address: format!("{}:{}", settings.address(), settings.port()),
                source,
            })?;

        eprintln!("Listening on {}:{}", settings.address(), settings.port());

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, socket_addr) = match result {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!("Failed to accept connection: {err}");
                            continue;
                        }
                    };

                    if let Err(err) = stream.set_nodelay(true) {
                        warn!("Failed to set nodelay on {socket_addr}: {err}");
                    }

                    info!("Accepted connection from {socket_addr}");

                    let (reader, writer) = stream.into_split();

                    let settings = settings.clone();
                    let extranonces = extranonces.clone();
                    let solution_tx = solution_tx.clone();
                    let job_receiver = job_receiver.clone();
                    let cancel_token = cancel_token.child_token();

                    task::spawn(async move {
                        let mut connection = Connection::new(
                            settings,
                            extranonces,
                            solution_tx,
                            socket_addr,
                            reader,
                            writer,
                            job_receiver,
                            cancel_token,
                        );

                        if let Err(err) = connection.serve().await {
                            error!("Miner connection error: {err}");
                        }
                    });
                }

                _ = cancel_token.cancelled() => {
                    info!("Shutting down stratum listener");
                    generator.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }
}
