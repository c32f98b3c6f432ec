use {super::*, block_template::TemplateTransaction};

pub(crate) fn payout_address() -> Address {
    "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        .parse::<Address<bitcoin::address::NetworkUnchecked>>()
        .unwrap()
        .assume_checked()
}

pub(crate) fn spending_transaction(seed: u8) -> Transaction {
    Transaction {
        version: bitcoin::transaction::Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::from_byte_array([seed; 32]),
                vout: 0,
            },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(1_000 + u64::from(seed)),
            script_pubkey: ScriptBuf::new(),
        }],
    }
}

pub(crate) fn template_full(
    height: u64,
    prev_seed: u8,
    tx_count: u8,
    easy: bool,
    commitment: Option<ScriptBuf>,
) -> BlockTemplate {
    let transactions = (1..=tx_count)
        .map(|seed| {
            let transaction = spending_transaction(seed);
            TemplateTransaction {
                txid: transaction.compute_txid(),
                transaction,
            }
        })
        .collect();

    BlockTemplate {
        // 207fffff is the regtest floor, 1703255b is a mainnet-era target no
        // test share will ever meet
        bits: if easy { "207fffff" } else { "1703255b" }.parse().unwrap(),
        previous_block_hash: BlockHash::from_byte_array([prev_seed; 32]),
        current_time: 1_700_000_000,
        min_time: 1_699_999_000,
        height,
        version: Version::from(0x2000_0000),
        transactions,
        default_witness_commitment: commitment,
        coinbase_value: Amount::from_sat(312_500_000),
    }
}

pub(crate) fn template(height: u64, tx_count: u8, easy: bool) -> BlockTemplate {
    template_full(height, 0x11, tx_count, easy, None)
}

pub(crate) fn template_with_commitment(height: u64, tx_count: u8, prev_seed: u8) -> BlockTemplate {
    template_full(
        height,
        prev_seed,
        tx_count,
        false,
        Some(ScriptBuf::from_bytes(
            hex::decode("6a24aa21a9ed5c5c111111111111f2a1d8e0d9cbb1b8b9887cbbf8ad0e0e0df78e94f0a73d3c")
                .unwrap(),
        )),
    )
}

pub(crate) fn job(template: BlockTemplate, id: u64, clean_jobs: bool) -> Arc<Job> {
    Arc::new(
        Job::new(
            Arc::new(template),
            payout_address(),
            "/adit/",
            JobId::new(id),
            clean_jobs,
        )
        .unwrap(),
    )
}
