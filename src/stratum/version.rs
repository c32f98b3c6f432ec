use super::*;

/// Block version word, also used for the version-rolling mask and the rolled
/// bits in submits. Hex on the wire, two's complement like the header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Version(pub block::Version);

impl FromStr for Version {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(InternalError::InvalidLength {
                expected: 8,
                actual: s.len(),
            });
        }

        let n = u32::from_str_radix(s, 16).map_err(|err| InternalError::Parse {
            message: format!("invalid version '{s}': {err}"),
        })?;

        // The cast matches the consensus encoding of negative versions
        Ok(Self(block::Version::from_consensus(n as i32)))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0.to_consensus())
    }
}

impl From<block::Version> for Version {
    fn from(version: block::Version) -> Self {
        Self(version)
    }
}

impl From<Version> for block::Version {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl From<i32> for Version {
    fn from(value: i32) -> Self {
        Self(block::Version::from_consensus(value))
    }
}

impl BitAnd for Version {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(block::Version::from_consensus(
            self.0.to_consensus() & rhs.0.to_consensus(),
        ))
    }
}

impl BitOr for Version {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(block::Version::from_consensus(
            self.0.to_consensus() | rhs.0.to_consensus(),
        ))
    }
}

impl Not for Version {
    type Output = Self;
    fn not(self) -> Self {
        Self(block::Version::from_consensus(!self.0.to_consensus()))
    }
}
