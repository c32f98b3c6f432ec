use super::*;

/// One `getblocktemplate` response, decoded as far as the proxy needs it.
/// Everything here is immutable once deserialized; the generator publishes a
/// fresh snapshot instead of patching an old one.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
pub struct BlockTemplate {
    pub bits: Nbits,
    #[serde(rename = "previousblockhash")]
    pub previous_block_hash: BlockHash,
    #[serde(rename = "curtime")]
    pub current_time: u64,
    #[serde(rename = "mintime", default)]
    pub min_time: u64,
    pub height: u64,
    #[serde(deserialize_with = "version_from_i32")]
    pub version: Version,
    #[serde(default)]
    pub transactions: Vec<TemplateTransaction>,
    #[serde(default)]
    pub default_witness_commitment: Option<ScriptBuf>,
    #[serde(rename = "coinbasevalue", with = "bitcoin::amount::serde::as_sat")]
    pub coinbase_value: Amount,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
pub struct TemplateTransaction {
    pub txid: Txid,
    #[serde(rename = "data", deserialize_with = "tx_from_hex")]
    pub transaction: Transaction,
}

impl BlockTemplate {
    pub fn network_target(&self) -> Target {
        self.bits.target()
    }

    pub fn txids(&self) -> Vec<Txid> {
        self.transactions.iter().map(|tx| tx.txid).collect()
    }
}

fn version_from_i32<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Version::from(i32::deserialize(deserializer)?))
}

fn tx_from_hex<'de, D>(deserializer: D) -> Result<Transaction, D::Error>
where
    D: Deserializer<'de>,
{
    let s = <&str>::deserialize(deserializer)?;
    encode::deserialize_hex(s).map_err(de::Error::custom)
}
