use super::*;

/// `mining.suggest_difficulty` request parameters: the difficulty the miner
/// would like to work at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestDifficulty(pub Difficulty);

impl SuggestDifficulty {
    pub fn difficulty(self) -> Difficulty {
        self.0
    }
}

impl Serialize for SuggestDifficulty {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&self.0)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SuggestDifficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (difficulty,): (Difficulty,) = Deserialize::deserialize(deserializer)?;
        Ok(SuggestDifficulty(difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let suggest: SuggestDifficulty = serde_json::from_str("[1000]").unwrap();
        assert_eq!(suggest.difficulty(), Difficulty::from(1000u64));
        assert_eq!(serde_json::to_value(suggest).unwrap(), json!([1000]));
    }

    #[test]
    fn fractional_suggestion() {
        let suggest: SuggestDifficulty = serde_json::from_str("[0.25]").unwrap();
        assert_eq!(suggest.difficulty(), Difficulty::from(0.25));
    }

    #[test]
    fn rejects_bad_arity_and_values() {
        assert!(serde_json::from_str::<SuggestDifficulty>("[]").is_err());
        assert!(serde_json::from_str::<SuggestDifficulty>("[1,2]").is_err());
        assert!(serde_json::from_str::<SuggestDifficulty>("[0]").is_err());
    }
}
