use super::*;

/// `mining.configure` request: the list of requested extensions and a map of
/// dotted extension parameters.
#[derive(Debug, PartialEq, Clone)]
pub struct Configure {
    pub extensions: Vec<String>,
    pub minimum_difficulty_value: Option<Difficulty>,
    pub version_rolling_mask: Option<Version>,
    pub version_rolling_min_bit_count: Option<u32>,
}

impl Configure {
    pub fn requests(&self, extension: &str) -> bool {
        self.extensions.iter().any(|name| name == extension)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct ConfigureOptions {
    #[serde(
        rename = "minimum-difficulty.value",
        skip_serializing_if = "Option::is_none"
    )]
    minimum_difficulty_value: Option<Difficulty>,

    #[serde(
        rename = "version-rolling.mask",
        skip_serializing_if = "Option::is_none"
    )]
    version_rolling_mask: Option<Version>,

    #[serde(
        rename = "version-rolling.min-bit-count",
        skip_serializing_if = "Option::is_none"
    )]
    version_rolling_min_bit_count: Option<u32>,
}

impl Serialize for Configure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let options = ConfigureOptions {
            minimum_difficulty_value: self.minimum_difficulty_value,
            version_rolling_mask: self.version_rolling_mask,
            version_rolling_min_bit_count: self.version_rolling_min_bit_count,
        };

        (&self.extensions, &options).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Configure {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One((Vec<String>,)),
            Two((Vec<String>, ConfigureOptions)),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One((extensions,)) => Configure {
                extensions,
                minimum_difficulty_value: None,
                version_rolling_mask: None,
                version_rolling_min_bit_count: None,
            },
            Raw::Two((extensions, options)) => Configure {
                extensions,
                minimum_difficulty_value: options.minimum_difficulty_value,
                version_rolling_mask: options.version_rolling_mask,
                version_rolling_min_bit_count: options.version_rolling_min_bit_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_rolling_request() {
        let configure: Configure = serde_json::from_str(
            r#"[["version-rolling"],{"version-rolling.mask":"1fffe000","version-rolling.min-bit-count":2}]"#,
        )
        .unwrap();

        assert!(configure.requests("version-rolling"));
        assert!(!configure.requests("minimum-difficulty"));
        assert_eq!(
            configure.version_rolling_mask,
            Some("1fffe000".parse().unwrap())
        );
        assert_eq!(configure.version_rolling_min_bit_count, Some(2));
    }

    #[test]
    fn minimum_difficulty_request() {
        let configure: Configure = serde_json::from_str(
            r#"[["minimum-difficulty"],{"minimum-difficulty.value":2048}]"#,
        )
        .unwrap();

        assert!(configure.requests("minimum-difficulty"));
        assert_eq!(
            configure.minimum_difficulty_value,
            Some(Difficulty::from(2048u64))
        );
    }

    #[test]
    fn options_map_optional() {
        let configure: Configure = serde_json::from_str(r#"[["version-rolling"]]"#).unwrap();
        assert!(configure.requests("version-rolling"));
        assert_eq!(configure.version_rolling_mask, None);

        assert_eq!(
            serde_json::to_value(&configure).unwrap(),
            json!([["version-rolling"], {}])
        );
    }

    #[test]
    fn unknown_extensions_parse() {
        let configure: Configure =
            serde_json::from_str(r#"[["subscribe-extranonce"],{}]"#).unwrap();
        assert!(configure.requests("subscribe-extranonce"));
        assert_eq!(configure.version_rolling_mask, None);
    }
}
