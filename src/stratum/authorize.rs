use super::*;

/// `mining.authorize` request. The password slot is usually "x" and always
/// ignored.
#[derive(Debug, PartialEq)]
pub struct Authorize {
    pub username: String,
    pub password: Option<String>,
}

impl Serialize for Authorize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.password.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.username)?;
        if let Some(password) = &self.password {
            seq.serialize_element(password)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Authorize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One((String,)),
            Two((String, Option<String>)),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One((username,)) => Authorize {
                username,
                password: None,
            },
            Raw::Two((username, password)) => Authorize { username, password },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_password() {
        let authorize: Authorize =
            serde_json::from_str(r#"["bc1q.worker1","x"]"#).unwrap();
        assert_eq!(
            authorize,
            Authorize {
                username: "bc1q.worker1".into(),
                password: Some("x".into()),
            }
        );
    }

    #[test]
    fn password_optional() {
        let authorize: Authorize = serde_json::from_str(r#"["worker1"]"#).unwrap();
        assert_eq!(authorize.username, "worker1");
        assert_eq!(authorize.password, None);
    }

    #[test]
    fn serialize_shape() {
        assert_eq!(
            serde_json::to_value(Authorize {
                username: "w".into(),
                password: None,
            })
            .unwrap(),
            json!(["w"])
        );
        assert_eq!(
            serde_json::to_value(Authorize {
                username: "w".into(),
                password: Some("x".into()),
            })
            .unwrap(),
            json!(["w", "x"])
        );
    }
}
