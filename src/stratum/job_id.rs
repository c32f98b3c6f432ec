use super::*;

/// Job ids increase monotonically and wrap at u64::MAX. On the wire they are
/// short lowercase hex with no leading zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct JobId(u64);

impl JobId {
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl FromStr for JobId {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16)
            .map(JobId)
            .map_err(|err| InternalError::Parse {
                message: format!("invalid job id '{s}': {err}"),
            })
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(n: u64) -> JobId {
        JobId(n)
    }
}
