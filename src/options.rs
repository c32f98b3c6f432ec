use super::*;

#[derive(Clone, Default, Debug, Parser)]
#[command(group(
    clap::ArgGroup::new("chains")
        .required(false)
        .args(&["chain", "signet", "regtest", "testnet", "testnet4"]),
))]
pub(crate) struct Options {
    #[arg(long, help = "Load configuration from <CONFIG>.")]
    pub(crate) config: Option<PathBuf>,

    #[arg(long, help = "Listen for miners at <ADDRESS>.")]
    pub(crate) address: Option<String>,

    #[arg(long, help = "Listen for miners on <PORT>.")]
    pub(crate) port: Option<u16>,

    #[arg(long = "chain", value_enum, help = "Mine on <CHAIN>. [default: mainnet]")]
    pub(crate) chain: Option<Chain>,

    #[arg(
        long,
        short = 't',
        help = "Use testnet. Equivalent to `--chain testnet`."
    )]
    pub(crate) testnet: bool,

    #[arg(long, short = 's', help = "Use signet. Equivalent to `--chain signet`.")]
    pub(crate) signet: bool,

    #[arg(
        long,
        short = 'r',
        help = "Use regtest. Equivalent to `--chain regtest`."
    )]
    pub(crate) regtest: bool,

    #[arg(long, help = "Use testnet4. Equivalent to `--chain testnet4`.")]
    pub(crate) testnet4: bool,

    #[arg(long, help = "Connect to Bitcoin Core RPC at <BITCOIN_RPC_HOST>.")]
    pub(crate) bitcoin_rpc_host: Option<String>,

    #[arg(long, help = "Connect to Bitcoin Core RPC on <BITCOIN_RPC_PORT>.")]
    pub(crate) bitcoin_rpc_port: Option<u16>,

    #[arg(
        long,
        help = "Authenticate to Bitcoin Core RPC as <BITCOIN_RPC_USERNAME>."
    )]
    pub(crate) bitcoin_rpc_username: Option<String>,

    #[arg(
        long,
        help = "Authenticate to Bitcoin Core RPC with <BITCOIN_RPC_PASSWORD>."
    )]
    pub(crate) bitcoin_rpc_password: Option<String>,

    #[arg(
        long,
        help = "Load Bitcoin Core RPC cookie file from <BITCOIN_RPC_COOKIE_FILE>."
    )]
    pub(crate) bitcoin_rpc_cookie_file: Option<PathBuf>,

    #[arg(long, help = "Load Bitcoin Core data dir from <BITCOIN_DATA_DIR>.")]
    pub(crate) bitcoin_data_dir: Option<PathBuf>,

    #[arg(long, help = "Pay block rewards to <PAYOUT_ADDRESS>.")]
    pub(crate) payout_address: Option<String>,

    #[arg(long, help = "Embed <COINBASE_TAG> in the coinbase scriptSig.")]
    pub(crate) coinbase_tag: Option<String>,

    #[arg(
        long,
        help = "Poll for new block templates every <UPDATE_INTERVAL> seconds."
    )]
    pub(crate) update_interval: Option<u64>,

    #[arg(long, help = "Offer version rolling with <VERSION_MASK>.")]
    pub(crate) version_mask: Option<String>,

    #[arg(long, help = "Give <START_DIFFICULTY> to new sessions.")]
    pub(crate) start_difficulty: Option<String>,

    #[arg(
        long,
        help = "Clamp suggested difficulties to at least <MIN_DIFFICULTY>."
    )]
    pub(crate) min_difficulty: Option<String>,

    #[arg(long, help = "Give up on node RPC calls after <RPC_TIMEOUT> seconds.")]
    pub(crate) rpc_timeout: Option<u64>,
}

impl Options {
    pub(crate) fn chain(&self) -> Option<Chain> {
        if let Some(chain) = self.chain {
            Some(chain)
        } else if self.signet {
            Some(Chain::Signet)
        } else if self.regtest {
            Some(Chain::Regtest)
        } else if self.testnet {
            Some(Chain::Testnet)
        } else if self.testnet4 {
            Some(Chain::Testnet4)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_flags_are_mutually_exclusive() {
        assert!(Options::try_parse_from(["adit", "--signet", "--regtest"]).is_err());
        assert!(Options::try_parse_from(["adit", "--chain", "signet", "--regtest"]).is_err());
    }

    #[test]
    fn chain_shorthands() {
        assert_eq!(
            Options::try_parse_from(["adit", "-t"]).unwrap().chain(),
            Some(Chain::Testnet)
        );
        assert_eq!(
            Options::try_parse_from(["adit", "-s"]).unwrap().chain(),
            Some(Chain::Signet)
        );
        assert_eq!(
            Options::try_parse_from(["adit", "-r"]).unwrap().chain(),
            Some(Chain::Regtest)
        );
        assert_eq!(Options::try_parse_from(["adit"]).unwrap().chain(), None);
    }

    #[test]
    fn chain_argument() {
        assert_eq!(
            Options::try_parse_from(["adit", "--chain", "testnet4"])
                .unwrap()
                .chain(),
            Some(Chain::Testnet4)
        );
    }

    #[test]
    fn bitcoin_rpc_options() {
        let options = Options::try_parse_from([
            "adit",
            "--bitcoin-rpc-port",
            "18443",
            "--bitcoin-rpc-username",
            "user",
            "--bitcoin-rpc-password",
            "pass",
        ])
        .unwrap();

        assert_eq!(options.bitcoin_rpc_port, Some(18443));
        assert_eq!(options.bitcoin_rpc_username, Some("user".into()));
        assert_eq!(options.bitcoin_rpc_password, Some("pass".into()));
    }

    #[test]
    fn payout_and_tag() {
        let options = Options::try_parse_from([
            "adit",
            "--payout-address",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            "--coinbase-tag",
            "/adit/",
        ])
        .unwrap();

        assert_eq!(
            options.payout_address.as_deref(),
            Some("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")
        );
        assert_eq!(options.coinbase_tag.as_deref(), Some("/adit/"));
    }
}
