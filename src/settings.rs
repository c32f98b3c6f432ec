use {super::*, options::Options};

/// Fully resolved configuration. CLI flags win over `ADIT_*` environment
/// variables, which win over the TOML config file, which wins over defaults.
/// Everything is resolved once at startup and handed around immutably.
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub(crate) address: String,
    pub(crate) port: u16,
    pub(crate) chain: Chain,
    pub(crate) bitcoin_rpc_host: String,
    pub(crate) bitcoin_rpc_port: u16,
    pub(crate) bitcoin_rpc_username: Option<String>,
    pub(crate) bitcoin_rpc_password: Option<String>,
    pub(crate) bitcoin_rpc_cookie_file: Option<PathBuf>,
    pub(crate) bitcoin_data_dir: Option<PathBuf>,
    pub(crate) payout_address: Option<String>,
    pub(crate) coinbase_tag: String,
    pub(crate) update_interval: Duration,
    pub(crate) rpc_timeout: Duration,
    pub(crate) version_mask: Version,
    pub(crate) start_difficulty: Difficulty,
    pub(crate) min_difficulty: Difficulty,
}

/// The subset of settings the TOML config file may carry.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    address: Option<String>,
    port: Option<u16>,
    chain: Option<Chain>,
    bitcoin_rpc_host: Option<String>,
    bitcoin_rpc_port: Option<u16>,
    bitcoin_rpc_username: Option<String>,
    bitcoin_rpc_password: Option<String>,
    bitcoin_rpc_cookie_file: Option<PathBuf>,
    bitcoin_data_dir: Option<PathBuf>,
    payout_address: Option<String>,
    coinbase_tag: Option<String>,
    update_interval: Option<u64>,
    version_mask: Option<String>,
    start_difficulty: Option<f64>,
    min_difficulty: Option<f64>,
    rpc_timeout: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 3333,
            chain: Chain::Mainnet,
            bitcoin_rpc_host: "127.0.0.1".into(),
            bitcoin_rpc_port: Chain::Mainnet.default_rpc_port(),
            bitcoin_rpc_username: None,
            bitcoin_rpc_password: None,
            bitcoin_rpc_cookie_file: None,
            bitcoin_data_dir: None,
            payout_address: None,
            coinbase_tag: "/adit/".into(),
            update_interval: Duration::from_secs(30),
            rpc_timeout: Duration::from_secs(10),
            version_mask: "1fffe000".parse().unwrap(),
            start_difficulty: Difficulty::from(1u64),
            min_difficulty: Difficulty::from(0.001),
        }
    }
}

fn env_parse<T>(env: &BTreeMap<String, String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    env.get(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| anyhow!("invalid ADIT_{key}: {err}"))
        })
        .transpose()
}

impl Settings {
    pub(crate) fn load(options: Options) -> Result<Settings> {
        let env = env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix("ADIT_")
                    .map(|stripped| (stripped.to_string(), value))
            })
            .collect();

        Self::merge(options, env)
    }

    pub(crate) fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Settings> {
        let config_path = options
            .config
            .clone()
            .or_else(|| env.get("CONFIG").map(PathBuf::from));

        let config = match &config_path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                toml::from_str::<Config>(&contents)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => Config::default(),
        };

        let defaults = Settings::default();

        let chain = options
            .chain()
            .or(env_parse::<Chain>(&env, "CHAIN")?)
            .or(config.chain)
            .unwrap_or_default();

        let version_mask = options
            .version_mask
            .as_deref()
            .map(Version::from_str)
            .transpose()
            .context("invalid --version-mask")?
            .or(env_parse::<Version>(&env, "VERSION_MASK")?)
            .or(config
                .version_mask
                .as_deref()
                .map(Version::from_str)
                .transpose()
                .context("invalid version_mask in config")?)
            .unwrap_or(defaults.version_mask);

        let start_difficulty = options
            .start_difficulty
            .as_deref()
            .map(Difficulty::from_str)
            .transpose()
            .context("invalid --start-difficulty")?
            .or(env_parse::<Difficulty>(&env, "START_DIFFICULTY")?)
            .or(config
                .start_difficulty
                .map(Difficulty::new)
                .transpose()
                .context("invalid start_difficulty in config")?)
            .unwrap_or(defaults.start_difficulty);

        let min_difficulty = options
            .min_difficulty
            .as_deref()
            .map(Difficulty::from_str)
            .transpose()
            .context("invalid --min-difficulty")?
            .or(env_parse::<Difficulty>(&env, "MIN_DIFFICULTY")?)
            .or(config
                .min_difficulty
                .map(Difficulty::new)
                .transpose()
                .context("invalid min_difficulty in config")?)
            .unwrap_or(defaults.min_difficulty);

        let settings = Settings {
            address: options
                .address
                .or(env_parse(&env, "ADDRESS")?)
                .or(config.address)
                .unwrap_or(defaults.address),
            port: options
                .port
                .or(env_parse(&env, "PORT")?)
                .or(config.port)
                .unwrap_or(defaults.port),
            bitcoin_rpc_host: options
                .bitcoin_rpc_host
                .or(env_parse(&env, "BITCOIN_RPC_HOST")?)
                .or(config.bitcoin_rpc_host)
                .unwrap_or(defaults.bitcoin_rpc_host),
            bitcoin_rpc_port: options
                .bitcoin_rpc_port
                .or(env_parse(&env, "BITCOIN_RPC_PORT")?)
                .or(config.bitcoin_rpc_port)
                .unwrap_or_else(|| chain.default_rpc_port()),
            bitcoin_rpc_username: options
                .bitcoin_rpc_username
                .or(env_parse(&env, "BITCOIN_RPC_USERNAME")?)
                .or(config.bitcoin_rpc_username),
            bitcoin_rpc_password: options
                .bitcoin_rpc_password
                .or(env_parse(&env, "BITCOIN_RPC_PASSWORD")?)
                .or(config.bitcoin_rpc_password),
            bitcoin_rpc_cookie_file: options
                .bitcoin_rpc_cookie_file
                .or(env_parse(&env, "BITCOIN_RPC_COOKIE_FILE")?)
                .or(config.bitcoin_rpc_cookie_file),
            bitcoin_data_dir: options
                .bitcoin_data_dir
                .or(env_parse(&env, "BITCOIN_DATA_DIR")?)
                .or(config.bitcoin_data_dir),
            payout_address: options
                .payout_address
                .or(env_parse(&env, "PAYOUT_ADDRESS")?)
                .or(config.payout_address),
            coinbase_tag: options
                .coinbase_tag
                .or(env_parse(&env, "COINBASE_TAG")?)
                .or(config.coinbase_tag)
                .unwrap_or(defaults.coinbase_tag),
            update_interval: options
                .update_interval
                .or(env_parse(&env, "UPDATE_INTERVAL")?)
                .or(config.update_interval)
                .map(Duration::from_secs)
                .unwrap_or(defaults.update_interval),
            rpc_timeout: options
                .rpc_timeout
                .or(env_parse(&env, "RPC_TIMEOUT")?)
                .or(config.rpc_timeout)
                .map(Duration::from_secs)
                .unwrap_or(defaults.rpc_timeout),
            chain,
            version_mask,
            start_difficulty,
            min_difficulty,
        };

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result {
        self.payout_address()?;

        // height push (up to 6 bytes) + 8 placeholder bytes must also fit
        ensure!(
            self.coinbase_tag.len() <= 86,
            "coinbase tag is {} bytes, maximum is 86",
            self.coinbase_tag.len()
        );

        ensure!(
            self.start_difficulty >= self.min_difficulty,
            "start_difficulty ({}) must be >= min_difficulty ({})",
            self.start_difficulty,
            self.min_difficulty
        );

        Ok(())
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn chain(&self) -> Chain {
        self.chain
    }

    pub(crate) fn bitcoin_rpc_url(&self) -> String {
        format!("http://{}:{}/", self.bitcoin_rpc_host, self.bitcoin_rpc_port)
    }

    pub(crate) fn bitcoin_credentials(&self) -> Result<Auth> {
        if let (Some(user), Some(pass)) = (&self.bitcoin_rpc_username, &self.bitcoin_rpc_password)
        {
            Ok(Auth::UserPass(user.clone(), pass.clone()))
        } else {
            Ok(Auth::CookieFile(self.cookie_file()?))
        }
    }

    pub(crate) fn cookie_file(&self) -> Result<PathBuf> {
        if let Some(cookie_file) = &self.bitcoin_rpc_cookie_file {
            return Ok(cookie_file.clone());
        }

        let path = if let Some(bitcoin_data_dir) = &self.bitcoin_data_dir {
            bitcoin_data_dir.clone()
        } else if cfg!(target_os = "linux") {
            dirs::home_dir()
                .ok_or_else(|| anyhow!("failed to get cookie file path: could not get home dir"))?
                .join(".bitcoin")
        } else {
            dirs::data_dir()
                .ok_or_else(|| anyhow!("failed to get cookie file path: could not get data dir"))?
                .join("Bitcoin")
        };

        Ok(self.chain.join_with_data_dir(path).join(".cookie"))
    }

    pub(crate) fn payout_address(&self) -> Result<Address> {
        let payout_address = self
            .payout_address
            .as_deref()
            .context("payout address is required; set --payout-address, ADIT_PAYOUT_ADDRESS, or payout_address in the config file")?;

        payout_address
            .parse::<Address<bitcoin::address::NetworkUnchecked>>()
            .with_context(|| format!("invalid payout address {payout_address}"))?
            .require_network(self.chain.network())
            .with_context(|| format!("payout address {payout_address} is not a {} address", self.chain))
    }

    pub(crate) fn coinbase_tag(&self) -> &str {
        &self.coinbase_tag
    }

    pub(crate) fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub(crate) fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }

    pub(crate) fn version_mask(&self) -> Version {
        self.version_mask
    }

    pub(crate) fn start_difficulty(&self) -> Difficulty {
        self.start_difficulty
    }

    pub(crate) fn min_difficulty(&self) -> Difficulty {
        self.min_difficulty
    }
}
