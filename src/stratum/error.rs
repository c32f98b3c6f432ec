use super::*;
use snafu::Snafu;

/// Rejection codes sent to miners, using the numeric code assignments
/// Stratum v1 pools converged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratumError {
    Other,
    Stale,
    Duplicate,
    InvalidSubmit,
    HighHash,
    Unauthorized,
    UnknownJob,
}

impl StratumError {
    pub fn code(self) -> i32 {
        match self {
            Self::Other => 20,
            Self::Stale => 21,
            Self::Duplicate => 22,
            Self::InvalidSubmit | Self::HighHash => 23,
            Self::Unauthorized => 24,
            Self::UnknownJob => 25,
        }
    }

    /// Attach context that is serialized into the traceback slot.
    pub fn with_context(self, context: impl fmt::Display) -> StratumErrorResponse {
        StratumErrorResponse {
            error: self,
            context: Some(context.to_string()),
        }
    }
}

impl fmt::Display for StratumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Other => "Other error",
            Self::Stale => "Job not found",
            Self::Duplicate => "Duplicate share",
            Self::InvalidSubmit => "Invalid submit",
            Self::HighHash => "High hash",
            Self::Unauthorized => "Unauthorized worker",
            Self::UnknownJob => "Unknown job",
        };
        write!(f, "{message}")
    }
}

impl From<StratumError> for StratumErrorResponse {
    fn from(error: StratumError) -> Self {
        StratumErrorResponse {
            error,
            context: None,
        }
    }
}

/// The error slot of a Stratum response, serialized as
/// `[code, message, traceback]`.
#[derive(Debug)]
pub struct StratumErrorResponse {
    pub error: StratumError,
    pub context: Option<String>,
}

impl Serialize for StratumErrorResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let traceback = self.context.as_ref().map(|context| json!({"error": context}));

        (self.error.code(), self.error.to_string(), traceback).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StratumErrorResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ErrorArray(i32, String, Option<Value>);

        let ErrorArray(code, message, _traceback) = ErrorArray::deserialize(deserializer)?;

        let error = match (code, message.as_str()) {
            (20, _) => StratumError::Other,
            (21, _) => StratumError::Stale,
            (22, _) => StratumError::Duplicate,
            (23, "High hash") => StratumError::HighHash,
            (23, _) => StratumError::InvalidSubmit,
            (24, _) => StratumError::Unauthorized,
            (25, _) => StratumError::UnknownJob,
            _ => {
                return Err(de::Error::custom(format!(
                    "unknown stratum error code: {code}"
                )));
            }
        };

        // Context is not reconstructed from the traceback slot.
        Ok(StratumErrorResponse {
            error,
            context: None,
        })
    }
}

impl PartialEq for StratumErrorResponse {
    fn eq(&self, other: &Self) -> bool {
        self.error == other.error
    }
}

impl fmt::Display for StratumErrorResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error.code(), self.error)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

/// Failures inside the protocol layer itself, as opposed to rejections a
/// miner caused.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum InternalError {
    #[snafu(display("Failed to parse hex string: {source}"))]
    HexParse { source: hex::FromHexError },

    #[snafu(display("Invalid length: expected {expected}, got {actual}"))]
    InvalidLength { expected: usize, actual: usize },

    #[snafu(display("Invalid value: {reason}"))]
    InvalidValue { reason: String },

    #[snafu(display("Parse error: {message}"))]
    Parse { message: String },
}
