use {super::*, snafu::Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NodeError {
    #[snafu(display("Bitcoin Core unreachable: {source}"))]
    Unavailable { source: bitcoincore_rpc::Error },

    #[snafu(display("Bitcoin Core RPC error {code}: {message}"))]
    Rpc { code: i32, message: String },

    #[snafu(display("Malformed Bitcoin Core response: {reason}"))]
    Malformed { reason: String },
}

fn classify(err: bitcoincore_rpc::Error) -> NodeError {
    match err {
        bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::Error::Rpc(rpc)) => {
            NodeError::Rpc {
                code: rpc.code,
                message: rpc.message,
            }
        }
        bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::Error::Json(err)) => {
            NodeError::Malformed {
                reason: err.to_string(),
            }
        }
        bitcoincore_rpc::Error::Json(err) => NodeError::Malformed {
            reason: err.to_string(),
        },
        source => NodeError::Unavailable { source },
    }
}

/// Thin wrapper over the node's JSON-RPC interface. Calls are blocking and
/// run on the blocking pool; the transport keeps one authenticated HTTP
/// connection alive.
pub(crate) struct NodeClient {
    client: bitcoincore_rpc::Client,
    chain: Chain,
}

impl NodeClient {
    pub(crate) fn connect(settings: &Settings) -> Result<Self> {
        let url = settings.bitcoin_rpc_url();

        info!("Connecting to Bitcoin Core at {url}");

        let (user, password) = settings
            .bitcoin_credentials()?
            .get_user_pass()
            .context("failed to read Bitcoin Core RPC credentials")?;

        let mut builder = bitcoincore_rpc::jsonrpc::simple_http::Builder::new()
            .url(&url)
            .context("invalid Bitcoin Core RPC url")?
            .timeout(settings.rpc_timeout());

        if let Some(user) = user {
            builder = builder.auth(user, password);
        }

        let client = bitcoincore_rpc::Client::from_jsonrpc(
            bitcoincore_rpc::jsonrpc::client::Client::with_transport(builder.build()),
        );

        let node = Self {
            client,
            chain: settings.chain(),
        };

        node.verify_chain()?;

        Ok(node)
    }

    /// Waits out RPC warmup (-28) and confirms the node is on the chain we
    /// were configured for before any job reaches a miner.
    fn verify_chain(&self) -> Result {
        let mut checks = 0;

        let info = loop {
            match self.client.call::<Value>("getblockchaininfo", &[]) {
                Ok(info) => break info,
                Err(bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::Error::Rpc(
                    err,
                ))) if err.code == -28 => {}
                Err(err) => return Err(classify(err).into()),
            }

            checks += 1;
            if checks >= 100 {
                return Err(NodeError::Malformed {
                    reason: "node stuck warming up".into(),
                }
                .into());
            }

            std::thread::sleep(Duration::from_millis(100));
        };

        let node_chain = match info.get("chain").and_then(Value::as_str) {
            Some("main") => Chain::Mainnet,
            Some("test") => Chain::Testnet,
            Some("testnet4") => Chain::Testnet4,
            Some("signet") => Chain::Signet,
            Some("regtest") => Chain::Regtest,
            other => {
                return Err(NodeError::Malformed {
                    reason: format!("unknown chain in getblockchaininfo: {other:?}"),
                }
                .into());
            }
        };

        if node_chain != self.chain {
            return Err(NodeError::Malformed {
                reason: format!("node is on {node_chain} but adit is on {}", self.chain),
            }
            .into());
        }

        Ok(())
    }

    pub(crate) fn get_block_template(&self) -> Result<BlockTemplate, NodeError> {
        let mut rules = vec!["segwit"];
        if self.chain == Chain::Signet {
            rules.push("signet");
        }

        self.client
            .call::<BlockTemplate>("getblocktemplate", &[json!({"rules": rules})])
            .map_err(classify)
    }

    /// `submitblock` answers `null` on acceptance and a short reason string
    /// on rejection; both come back verbatim.
    pub(crate) fn submit_block(&self, block: &Block) -> Result<Option<String>, NodeError> {
        let block_hex = encode::serialize_hex(block);

        self.client
            .call::<Option<String>>("submitblock", &[Value::String(block_hex)])
            .map_err(classify)
    }
}
