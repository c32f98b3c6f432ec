use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(u64),
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Id::Null => write!(f, "null"),
            Id::Number(n) => write!(f, "{n}"),
            Id::String(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
    },
    Response {
        id: Id,
        result: Option<Value>,
        error: Option<StratumErrorResponse>,
    },
    Notification {
        method: String,
        params: Value,
    },
}

/// Stratum notifications carry `id: null`, which JSON-RPC proper would omit
/// entirely. Dispatch on the fields that are actually present so both forms
/// parse, and treat anything with a `result` or `error` key as a response.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let has_method = value.get("method").is_some();

        let is_response = value.get("result").is_some() || value.get("error").is_some();

        let is_notification = has_method
            && (value.get("id").is_none() || value.get("id") == Some(&Value::Null));

        if is_response {
            #[derive(Deserialize)]
            struct Response {
                id: Id,
                result: Option<Value>,
                error: Option<StratumErrorResponse>,
            }

            let response: Response = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Response {
                id: response.id,
                result: response.result,
                error: response.error,
            })
        } else if is_notification {
            let method = value
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| de::Error::missing_field("method"))?
                .to_string();

            let params = value
                .get("params")
                .cloned()
                .ok_or_else(|| de::Error::missing_field("params"))?;

            Ok(Message::Notification { method, params })
        } else if has_method && value.get("id").is_some() {
            #[derive(Deserialize)]
            struct Request {
                id: Id,
                method: String,
                params: Value,
            }

            let request: Request = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Request {
                id: request.id,
                method: request.method,
                params: request.params,
            })
        } else {
            Err(de::Error::custom("unknown message format"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn case(s: &str, expected: Message) {
        let actual = serde_json::from_str::<Message>(s).unwrap();
        assert_eq!(actual, expected, "deserialize Message from str");

        let serialized = serde_json::to_string(&actual).unwrap();
        let lhs: Value = serde_json::from_str(s).unwrap();
        let rhs: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(lhs, rhs, "JSON semantic equality");

        let round_trip = serde_json::from_str::<Message>(&serialized).unwrap();
        assert_eq!(round_trip, expected, "roundtrip");
    }

    #[test]
    fn request() {
        case(
            r#"{"id":1,"method":"mining.subscribe","params":["cgminer/4.10"]}"#,
            Message::Request {
                id: Id::Number(1),
                method: "mining.subscribe".into(),
                params: json!(["cgminer/4.10"]),
            },
        );
    }

    #[test]
    fn request_with_string_id() {
        case(
            r#"{"id":"a1","method":"mining.authorize","params":[]}"#,
            Message::Request {
                id: Id::String("a1".into()),
                method: "mining.authorize".into(),
                params: json!([]),
            },
        );
    }

    #[test]
    fn notification_with_and_without_null_id() {
        case(
            r#"{"method":"mining.notify","params":[]}"#,
            Message::Notification {
                method: "mining.notify".into(),
                params: json!([]),
            },
        );

        assert_eq!(
            serde_json::from_str::<Message>(r#"{"method":"mining.notify","params":[],"id":null}"#)
                .unwrap(),
            Message::Notification {
                method: "mining.notify".into(),
                params: json!([]),
            }
        );
    }

    #[test]
    fn response() {
        case(
            r#"{"id":2,"result":true,"error":null}"#,
            Message::Response {
                id: Id::Number(2),
                result: Some(json!(true)),
                error: None,
            },
        );
    }

    #[test]
    fn error_response() {
        case(
            r#"{"id":10,"result":null,"error":[21,"Job not found",null]}"#,
            Message::Response {
                id: Id::Number(10),
                result: None,
                error: Some(StratumError::Stale.into()),
            },
        );
    }

    #[test]
    fn garbage_rejected() {
        assert!(serde_json::from_str::<Message>(r#"{"foo":1}"#).is_err());
        assert!(serde_json::from_str::<Message>(r#"[1,2,3]"#).is_err());
    }

    #[test]
    fn id_display() {
        assert_eq!(Id::Null.to_string(), "null");
        assert_eq!(Id::Number(7).to_string(), "7");
        assert_eq!(Id::String("x".into()).to_string(), "x");
    }
}
