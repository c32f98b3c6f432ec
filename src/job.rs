use super::*;

/// One published unit of work. Jobs are immutable snapshots derived from a
/// template; sessions hold them through an `Arc` and splice extranonces into
/// the prebuilt coinbase halves.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: JobId,
    pub prevhash: PrevHash,
    pub coinb1: String,
    pub coinb2: String,
    pub merkle_branches: Vec<MerkleNode>,
    pub version: Version,
    pub nbits: Nbits,
    pub ntime: Ntime,
    pub clean_jobs: bool,
    pub template: Arc<BlockTemplate>,
}

impl Job {
    pub fn new(
        template: Arc<BlockTemplate>,
        payout_address: Address,
        coinbase_tag: &str,
        job_id: JobId,
        clean_jobs: bool,
    ) -> Result<Self> {
        let (_coinbase, coinb1, coinb2) =
            CoinbaseBuilder::new(payout_address, template.height, template.coinbase_value)
                .with_tag(coinbase_tag)
                .with_witness_commitment(template.default_witness_commitment.clone())
                .build()?;

        let merkle_branches = stratum::merkle_branches(template.txids());

        Ok(Self {
            job_id,
            prevhash: PrevHash::from(template.previous_block_hash),
            coinb1,
            coinb2,
            merkle_branches,
            version: template.version,
            nbits: template.bits,
            ntime: Ntime::try_from(template.current_time).context("curtime exceeds u32")?,
            clean_jobs,
            template,
        })
    }

    pub fn notify(&self) -> Notify {
        Notify {
            job_id: self.job_id,
            prevhash: self.prevhash.clone(),
            coinb1: self.coinb1.clone(),
            coinb2: self.coinb2.clone(),
            merkle_branches: self.merkle_branches.clone(),
            version: self.version,
            nbits: self.nbits,
            ntime: self.ntime,
            clean_jobs: self.clean_jobs,
        }
    }

    pub fn network_target(&self) -> Target {
        self.template.network_target()
    }

    pub fn ntime_in_range(&self, ntime: Ntime) -> bool {
        let submitted = u64::from(u32::from(ntime));
        submitted >= self.template.min_time
            && submitted <= self.template.current_time + NTIME_FORWARD_SLACK
    }

    pub fn merkle_root(
        &self,
        extranonce1: &Extranonce,
        extranonce2: &Extranonce,
    ) -> Result<MerkleNode> {
        stratum::merkle_root(
            &self.coinb1,
            &self.coinb2,
            extranonce1,
            extranonce2,
            &self.merkle_branches,
        )
    }

    pub fn header(
        &self,
        version: Version,
        merkle_root: MerkleNode,
        ntime: Ntime,
        nonce: Nonce,
    ) -> Header {
        Header {
            version: version.into(),
            prev_blockhash: self.prevhash.clone().into(),
            merkle_root: merkle_root.into(),
            time: ntime.into(),
            bits: self.nbits.into(),
            nonce: nonce.into(),
        }
    }

    /// Rebuilds the full coinbase for block submission. The split halves are
    /// legacy-serialized, so the zero witness reserved value has to be put
    /// back when the template commits to witnesses.
    pub fn coinbase(&self, extranonce1: &Extranonce, extranonce2: &Extranonce) -> Result<Transaction> {
        let mut coinbase: Transaction = encode::deserialize_hex(&format!(
            "{}{}{}{}",
            self.coinb1, extranonce1, extranonce2, self.coinb2
        ))?;

        if self.template.default_witness_commitment.is_some() {
            coinbase.input[0].witness = Witness::from_slice(&[[0u8; 32]]);
        }

        Ok(coinbase)
    }

    pub fn assemble_block(
        &self,
        header: Header,
        extranonce1: &Extranonce,
        extranonce2: &Extranonce,
    ) -> Result<Block> {
        let coinbase = self.coinbase(extranonce1, extranonce2)?;

        let txdata = std::iter::once(coinbase)
            .chain(
                self.template
                    .transactions
                    .iter()
                    .map(|tx| tx.transaction.clone()),
            )
            .collect();

        Ok(Block {
            header,
            txdata,
        })
    }
}
