use {
    anyhow::{Context, Error, anyhow, bail, ensure},
    arguments::Arguments,
    bitcoin::{
        Address, Amount, Block, BlockHash, CompactTarget, Network, OutPoint, ScriptBuf, Sequence,
        Target, Transaction, TxIn, TxOut, Txid, VarInt, Witness,
        block::{self, Header},
        consensus::{self, encode},
        hashes::{Hash, sha256d},
        locktime::absolute::LockTime,
        script::write_scriptint,
    },
    bitcoincore_rpc::{Auth, RpcApi},
    block_template::BlockTemplate,
    chain::Chain,
    clap::Parser,
    coinbase_builder::CoinbaseBuilder,
    connection::Connection,
    extranonces::Extranonces,
    futures::{sink::SinkExt, stream::StreamExt},
    generator::Generator,
    job::Job,
    jobs::{JobEntry, Jobs},
    lru::LruCache,
    node::{NodeClient, NodeError},
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::SerializeSeq,
    },
    serde_json::{Value, json},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    settings::Settings,
    std::{
        collections::{BTreeMap, HashMap},
        env,
        fmt::{self, Display, Formatter},
        fs, io,
        net::SocketAddr,
        num::NonZeroUsize,
        ops::{BitAnd, BitOr, Not},
        path::PathBuf,
        process,
        str::FromStr,
        sync::{Arc, LazyLock, Mutex},
        time::Duration,
    },
    stratum::{
        Authorize, Configure, Difficulty, Extranonce, Id, JobId, MerkleNode, Message, Nbits, Nonce,
        Notify, Ntime, PrevHash, SetDifficulty, StratumError, Submit, Subscribe, SubscribeResult,
        SuggestDifficulty, Version,
    },
    tokio::{
        io::{AsyncRead, AsyncWrite},
        net::TcpListener,
        runtime::Runtime,
        sync::{mpsc, watch},
        task::{self, JoinHandle},
        time::{Instant, MissedTickBehavior, interval},
    },
    tokio_util::{
        codec::{FramedRead, FramedWrite, LinesCodec},
        sync::CancellationToken,
    },
    tracing::{debug, error, info, warn},
    tracing_appender::non_blocking,
    tracing_subscriber::EnvFilter,
};

mod arguments;
pub mod block_template;
mod chain;
pub mod coinbase_builder;
mod connection;
mod extranonces;
mod generator;
pub mod job;
mod jobs;
mod node;
mod options;
mod proxy;
mod settings;
mod signal;
pub mod stratum;
#[cfg(test)]
mod testing;

pub const EXTRANONCE1_SIZE: usize = 4;
pub const EXTRANONCE2_SIZE: usize = 4;
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024;
/// Subscription ids carry no meaning in Stratum v1, one per proxy is plenty
pub const SUBSCRIPTION_ID: &str = "ad17ad17";
pub const DUPLICATE_CACHE_SIZE: usize = 256;

/// How far a submitted ntime may run ahead of the template's curtime.
pub const NTIME_FORWARD_SLACK: u64 = 7200;
/// Old jobs answer `Stale` instead of `Unknown job` for this long after a clean broadcast.
pub const JOB_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
pub const MAX_POLL_BACKOFF: Duration = Duration::from_secs(60);

type Result<T = (), E = Error> = std::result::Result<T, E>;

pub fn main() {
    let (writer, _guard) = non_blocking(io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(writer)
        .init();

    let args = Arguments::parse();

    let settings = match Settings::load(args.options) {
        Ok(settings) => settings,
        Err(err) => {
            error!("configuration error: {err}");
            process::exit(2);
        }
    };

    Runtime::new()
        .expect("Failed to create tokio runtime")
        .block_on(async {
            let cancel_token = signal::setup_signal_handler();

            match proxy::Proxy::new(settings).run(cancel_token).await {
                Err(err) => {
                    error!("error: {err}");

                    if env::var_os("RUST_BACKTRACE")
                        .map(|val| val == "1")
                        .unwrap_or_default()
                    {
                        error!("{}", err.backtrace());
                    }

                    if err.downcast_ref::<proxy::BindError>().is_some() {
                        process::exit(2);
                    }

                    if err.downcast_ref::<NodeError>().is_some() {
                        process::exit(3);
                    }

                    process::exit(1);
                }
                Ok(_) => {
                    process::exit(0);
                }
            }
        });
}
