use super::*;

/// Synthesizes the coinbase for a template and splits its serialization at
/// the 8-byte extranonce placeholder, so every session can splice in
/// `extranonce1 ∥ extranonce2` without reserializing anything.
#[derive(Clone)]
pub struct CoinbaseBuilder {
    address: Address,
    height: u64,
    value: Amount,
    tag: String,
    witness_commitment: Option<ScriptBuf>,
}

impl CoinbaseBuilder {
    pub const MAX_SCRIPT_SIG_SIZE: usize = 100;
    pub const EXTRANONCE_PLACEHOLDER_SIZE: usize = EXTRANONCE1_SIZE + EXTRANONCE2_SIZE;

    pub fn new(address: Address, height: u64, value: Amount) -> Self {
        Self {
            address,
            height,
            value,
            tag: String::new(),
            witness_commitment: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_witness_commitment(mut self, commitment: Option<ScriptBuf>) -> Self {
        self.witness_commitment = commitment;
        self
    }

    /// Returns the coinbase transaction together with the hex halves
    /// `(coinb1, coinb2)`. The split is always taken over the non-witness
    /// serialization, which is also what the coinbase TXID commits to, so
    /// `coinb1 ∥ en1 ∥ en2 ∥ coinb2` parses as a legacy transaction no matter
    /// which nonce bytes a miner picks.
    pub fn build(self) -> Result<(Transaction, String, String)> {
        let mut script_sig: Vec<u8> = Vec::with_capacity(Self::MAX_SCRIPT_SIG_SIZE);

        // BIP34: the height as a minimally encoded scriptint push
        let mut height_bytes = [0u8; 8];
        let height_len = write_scriptint(
            &mut height_bytes,
            self.height.try_into().context("height too large")?,
        );
        script_sig.push(height_len as u8);
        script_sig.extend_from_slice(&height_bytes[..height_len]);

        let script_prefix_size = script_sig.len();

        script_sig.extend_from_slice(&[0u8; Self::EXTRANONCE_PLACEHOLDER_SIZE]);
        script_sig.extend_from_slice(self.tag.as_bytes());

        let script_sig_size = script_sig.len();
        ensure!(
            script_sig_size <= Self::MAX_SCRIPT_SIG_SIZE,
            "coinbase scriptSig is {script_sig_size} bytes (max {}); shorten the coinbase tag",
            Self::MAX_SCRIPT_SIG_SIZE
        );

        // Committing templates get the zero witness reserved value
        let witness = match &self.witness_commitment {
            Some(_) => Witness::from_slice(&[[0u8; 32]]),
            None => Witness::new(),
        };

        let mut output = vec![TxOut {
            value: self.value,
            script_pubkey: self.address.script_pubkey(),
        }];

        if let Some(commitment) = self.witness_commitment.clone() {
            output.push(TxOut {
                value: Amount::ZERO,
                script_pubkey: commitment,
            });
        }

        let coinbase = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::from_bytes(script_sig),
                sequence: Sequence::MAX,
                witness,
            }],
            output,
        };

        let mut stripped = coinbase.clone();
        stripped.input[0].witness = Witness::new();
        let bin = consensus::serialize(&stripped);

        // offset = tx version
        //  + number of inputs
        //  + coinbase outpoint
        //  + scriptSig length varint
        //  + scriptSig bytes before the extranonce placeholder
        let offset = 4
            + VarInt(1).size()
            + 36
            + VarInt(script_sig_size.try_into().unwrap()).size()
            + script_prefix_size;

        let coinb1 = hex::encode(&bin[..offset]);
        let coinb2 = hex::encode(&bin[offset + Self::EXTRANONCE_PLACEHOLDER_SIZE..]);

        Ok((coinbase, coinb1, coinb2))
    }
}
