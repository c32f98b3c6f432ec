use super::*;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Mainnet,
    Testnet,
    Testnet4,
    Signet,
    Regtest,
}

impl Chain {
    pub fn network(self) -> Network {
        match self {
            Self::Mainnet => Network::Bitcoin,
            Self::Testnet => Network::Testnet,
            Self::Testnet4 => Network::Testnet4,
            Self::Signet => Network::Signet,
            Self::Regtest => Network::Regtest,
        }
    }

    pub fn default_rpc_port(self) -> u16 {
        match self {
            Self::Mainnet => 8332,
            Self::Testnet => 18332,
            Self::Testnet4 => 48332,
            Self::Signet => 38332,
            Self::Regtest => 18443,
        }
    }

    pub fn join_with_data_dir(self, data_dir: impl Into<PathBuf>) -> PathBuf {
        let data_dir = data_dir.into();
        match self {
            Self::Mainnet => data_dir,
            Self::Testnet => data_dir.join("testnet3"),
            Self::Testnet4 => data_dir.join("testnet4"),
            Self::Signet => data_dir.join("signet"),
            Self::Regtest => data_dir.join("regtest"),
        }
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Mainnet => "mainnet",
                Self::Testnet => "testnet",
                Self::Testnet4 => "testnet4",
                Self::Signet => "signet",
                Self::Regtest => "regtest",
            }
        )
    }
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet" | "main" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "testnet4" => Ok(Self::Testnet4),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            other => bail!("unknown chain: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_ports_follow_bitcoin_core() {
        assert_eq!(Chain::Mainnet.default_rpc_port(), 8332);
        assert_eq!(Chain::Testnet.default_rpc_port(), 18332);
        assert_eq!(Chain::Regtest.default_rpc_port(), 18443);
        assert_eq!(Chain::Signet.default_rpc_port(), 38332);
    }

    #[test]
    fn data_dir_layout() {
        assert_eq!(
            Chain::Mainnet.join_with_data_dir("/data"),
            PathBuf::from("/data")
        );
        assert_eq!(
            Chain::Testnet.join_with_data_dir("/data"),
            PathBuf::from("/data/testnet3")
        );
        assert_eq!(
            Chain::Regtest.join_with_data_dir("/data"),
            PathBuf::from("/data/regtest")
        );
    }

    #[test]
    fn display_and_parse_roundtrip() {
        for chain in [
            Chain::Mainnet,
            Chain::Testnet,
            Chain::Testnet4,
            Chain::Signet,
            Chain::Regtest,
        ] {
            assert_eq!(chain.to_string().parse::<Chain>().unwrap(), chain);
        }

        assert!("nonsense".parse::<Chain>().is_err());
    }
}
