use super::*;

/// `mining.notify` parameters, a 9-element positional array.
#[derive(Debug, PartialEq, Clone)]
pub struct Notify {
    pub job_id: JobId,
    pub prevhash: PrevHash,
    pub coinb1: String,
    pub coinb2: String,
    pub merkle_branches: Vec<MerkleNode>,
    pub version: Version,
    pub nbits: Nbits,
    pub ntime: Ntime,
    pub clean_jobs: bool,
}

impl Serialize for Notify {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(9))?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.prevhash)?;
        seq.serialize_element(&self.coinb1)?;
        seq.serialize_element(&self.coinb2)?;
        seq.serialize_element(&self.merkle_branches)?;
        seq.serialize_element(&self.version)?;
        seq.serialize_element(&self.nbits)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.clean_jobs)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Notify {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (job_id, prevhash, coinb1, coinb2, merkle_branches, version, nbits, ntime, clean_jobs) =
            <(
                JobId,
                PrevHash,
                String,
                String,
                Vec<MerkleNode>,
                Version,
                Nbits,
                Ntime,
                bool,
            )>::deserialize(deserializer)?;

        Ok(Notify {
            job_id,
            prevhash,
            coinb1,
            coinb2,
            merkle_branches,
            version,
            nbits,
            ntime,
            clean_jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notify {
        Notify {
            job_id: JobId::new(0xbf),
            prevhash: "4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000"
                .parse()
                .unwrap(),
            coinb1: "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff0e0300eb0b".into(),
            coinb2: "2f616469742f000000000100f2052a010000001976a914d23fcdf86f7e756a64a7a9688ef9903327048ed988ac00000000".into(),
            merkle_branches: Vec::new(),
            version: Version::from(0x20000000),
            nbits: "1c2ac4af".parse().unwrap(),
            ntime: "504e86b9".parse().unwrap(),
            clean_jobs: true,
        }
    }

    #[test]
    fn parameter_order() {
        let value = serde_json::to_value(sample()).unwrap();
        let params = value.as_array().unwrap();

        assert_eq!(params.len(), 9);
        assert_eq!(params[0], json!("bf"));
        assert_eq!(
            params[1],
            json!("4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000")
        );
        assert_eq!(params[4], json!([]));
        assert_eq!(params[5], json!("20000000"));
        assert_eq!(params[6], json!("1c2ac4af"));
        assert_eq!(params[7], json!("504e86b9"));
        assert_eq!(params[8], json!(true));
    }

    #[test]
    fn roundtrip() {
        let notify = sample();
        let serialized = serde_json::to_string(&notify).unwrap();
        assert_eq!(
            serde_json::from_str::<Notify>(&serialized).unwrap(),
            notify
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(serde_json::from_str::<Notify>(r#"["bf"]"#).is_err());
    }
}
