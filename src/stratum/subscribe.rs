use super::*;

/// `mining.subscribe` request: user agent plus an optional extranonce1 the
/// miner would like back after a reconnect. We never honor the suggestion.
#[derive(Debug, PartialEq)]
pub struct Subscribe {
    pub user_agent: String,
    pub extranonce1: Option<String>,
}

impl Serialize for Subscribe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.extranonce1.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.user_agent)?;
        if let Some(extranonce1) = &self.extranonce1 {
            seq.serialize_element(extranonce1)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Subscribe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Zero([String; 0]),
            One((String,)),
            Two((String, Option<String>)),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Zero(_) => Subscribe {
                user_agent: String::new(),
                extranonce1: None,
            },
            Raw::One((user_agent,)) => Subscribe {
                user_agent,
                extranonce1: None,
            },
            Raw::Two((user_agent, extranonce1)) => Subscribe {
                user_agent,
                extranonce1,
            },
        })
    }
}

/// The subscribe response triple: subscriptions, extranonce1, extranonce2
/// size.
#[derive(Debug, PartialEq, Clone)]
pub struct SubscribeResult {
    pub subscriptions: Vec<(String, String)>,
    pub extranonce1: Extranonce,
    pub extranonce2_size: u32,
}

impl Serialize for SubscribeResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.subscriptions)?;
        seq.serialize_element(&self.extranonce1)?;
        seq.serialize_element(&self.extranonce2_size)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SubscribeResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (subscriptions, extranonce1, extranonce2_size) =
            <(Vec<(String, String)>, Extranonce, u32)>::deserialize(deserializer)?;

        Ok(SubscribeResult {
            subscriptions,
            extranonce1,
            extranonce2_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_only() {
        let subscribe: Subscribe = serde_json::from_str(r#"["cgminer/4.10"]"#).unwrap();
        assert_eq!(
            subscribe,
            Subscribe {
                user_agent: "cgminer/4.10".into(),
                extranonce1: None,
            }
        );
        assert_eq!(
            serde_json::to_value(&subscribe).unwrap(),
            json!(["cgminer/4.10"])
        );
    }

    #[test]
    fn empty_params_tolerated() {
        let subscribe: Subscribe = serde_json::from_str("[]").unwrap();
        assert_eq!(subscribe.user_agent, "");
        assert_eq!(subscribe.extranonce1, None);
    }

    #[test]
    fn with_extranonce1_suggestion() {
        let subscribe: Subscribe =
            serde_json::from_str(r#"["cgminer/4.10","deadbeef"]"#).unwrap();
        assert_eq!(subscribe.extranonce1, Some("deadbeef".into()));
    }

    #[test]
    fn null_suggestion_normalizes_away() {
        let subscribe: Subscribe = serde_json::from_str(r#"["ua",null]"#).unwrap();
        assert_eq!(subscribe.extranonce1, None);
        assert_eq!(serde_json::to_value(&subscribe).unwrap(), json!(["ua"]));
    }

    #[test]
    fn result_shape() {
        let result = SubscribeResult {
            subscriptions: vec![
                ("mining.set_difficulty".into(), "ad17ad17".into()),
                ("mining.notify".into(), "ad17ad17".into()),
            ],
            extranonce1: "08000002".parse().unwrap(),
            extranonce2_size: 4,
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!([
                [
                    ["mining.set_difficulty", "ad17ad17"],
                    ["mining.notify", "ad17ad17"]
                ],
                "08000002",
                4
            ])
        );

        let back: SubscribeResult =
            serde_json::from_value(serde_json::to_value(&result).unwrap()).unwrap();
        assert_eq!(back, result);
    }
}
