use {
    adit::{
        block_template::{BlockTemplate, TemplateTransaction},
        coinbase_builder::CoinbaseBuilder,
        job::Job,
        stratum::{self, Difficulty, Extranonce, JobId, Message, Nonce, Ntime, Version},
    },
    bitcoin::{
        Amount, Block, BlockHash, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
        Witness, absolute::LockTime, address::NetworkUnchecked, consensus,
        hashes::Hash, transaction,
    },
    std::sync::Arc,
};

fn payout_address() -> bitcoin::Address {
    "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        .parse::<bitcoin::Address<NetworkUnchecked>>()
        .unwrap()
        .assume_checked()
}

fn spending_transaction(seed: u8) -> Transaction {
    Transaction {
        version: transaction::Version::TWO,
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

fn template(tx_count: u8) -> BlockTemplate {
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
        bits: "207fffff".parse().unwrap(),
        previous_block_hash: BlockHash::from_byte_array([0x44; 32]),
        current_time: 1_700_000_000,
        min_time: 1_699_999_000,
        height: 840_000,
        version: Version::from(0x2000_0000),
        transactions,
        default_witness_commitment: None,
        coinbase_value: Amount::from_sat(312_500_000),
    }
}

#[test]
fn coinbase_split_reassembles_for_arbitrary_extranonces() {
    let (coinbase, coinb1, coinb2) =
        CoinbaseBuilder::new(payout_address(), 840_000, Amount::from_sat(625_000_000))
            .with_tag("/adit/")
            .build()
            .unwrap();

    for seed in 0u8..16 {
        let extranonce = [seed; 8];

        let mut bin = hex::decode(&coinb1).unwrap();
        bin.extend_from_slice(&extranonce);
        bin.extend_from_slice(&hex::decode(&coinb2).unwrap());

        let decoded: Transaction = consensus::encode::deserialize_hex(&hex::encode(&bin)).unwrap();

        assert_eq!(decoded.input.len(), 1);
        assert_eq!(decoded.output[0].value, Amount::from_sat(625_000_000));

        if seed == 0 {
            assert_eq!(bin, consensus::serialize(&coinbase));
        }
    }
}

#[test]
fn jobs_produce_blocks_that_pass_consensus_checks() {
    for tx_count in [0u8, 1, 2, 5, 6] {
        let job = Job::new(
            Arc::new(template(tx_count)),
            payout_address(),
            "/adit/",
            JobId::new(1),
            true,
        )
        .unwrap();

        let extranonce1 = Extranonce::from_bytes(&[0, 0, 0, 3]);
        let extranonce2 = Extranonce::from_bytes(&[9, 9, 9, tx_count]);

        let root = job.merkle_root(&extranonce1, &extranonce2).unwrap();
        let header = job.header(job.version, root, job.ntime, Nonce::from(7));
        let block: Block = job
            .assemble_block(header, &extranonce1, &extranonce2)
            .unwrap();

        assert_eq!(block.txdata.len(), usize::from(tx_count) + 1);
        assert!(block.check_merkle_root(), "tx_count {tx_count}");
        assert_eq!(block.bip34_block_height().unwrap(), 840_000);
    }
}

#[test]
fn notify_for_a_job_round_trips_over_the_wire() {
    let job = Job::new(
        Arc::new(template(3)),
        payout_address(),
        "/adit/",
        JobId::new(0xbf),
        true,
    )
    .unwrap();

    let line = serde_json::to_string(&Message::Notification {
        method: "mining.notify".into(),
        params: serde_json::to_value(job.notify()).unwrap(),
    })
    .unwrap();

    let parsed: Message = serde_json::from_str(&line).unwrap();

    let Message::Notification { method, params } = parsed else {
        panic!("expected notification");
    };

    assert_eq!(method, "mining.notify");

    let notify: stratum::Notify = serde_json::from_value(params).unwrap();
    assert_eq!(notify.job_id, JobId::new(0xbf));
    assert_eq!(notify.merkle_branches, job.merkle_branches);
    assert!(notify.clean_jobs);
}

#[test]
fn share_difficulty_bounds_accepted_hashes() {
    let difficulty = Difficulty::from(0.0000001);
    let target = difficulty.target();

    let job = Job::new(
        Arc::new(template(2)),
        payout_address(),
        "/adit/",
        JobId::new(2),
        true,
    )
    .unwrap();

    let extranonce1 = Extranonce::from_bytes(&[0, 0, 0, 1]);
    let extranonce2 = Extranonce::from_bytes(&[0, 0, 0, 2]);
    let root = job.merkle_root(&extranonce1, &extranonce2).unwrap();

    let mut header = job.header(job.version, root, job.ntime, Nonce::from(0));

    let nonce = loop {
        if target.is_met_by(header.block_hash()) {
            break header.nonce;
        }
        header.nonce += 1;
    };

    let solved = job.header(job.version, root, job.ntime, Nonce::from(nonce));
    assert!(target.is_met_by(solved.block_hash()));

    // Every hash the target admits is also admitted by any easier target
    assert!(
        Difficulty::from(0.00000001)
            .target()
            .is_met_by(solved.block_hash())
    );
}

#[test]
fn submit_lines_from_real_miners_parse() {
    let line = r#"{"id": 4, "method": "mining.submit", "params": ["bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4.rig1", "bf", "00000001", "6553f100", "b2957c02", "04d46000"]}"#;

    let Message::Request { id, method, params } = serde_json::from_str(line).unwrap() else {
        panic!("expected request");
    };

    assert_eq!(id, stratum::Id::Number(4));
    assert_eq!(method, "mining.submit");

    let submit: stratum::Submit = serde_json::from_value(params).unwrap();
    assert_eq!(submit.job_id, JobId::new(0xbf));
    assert_eq!(submit.ntime, Ntime::from(0x6553f100));
    assert_eq!(submit.version_bits, Some(Version::from(0x04d46000)));
}
