use super::*;

/// The header timestamp, eight hex digits on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay,
)]
pub struct Ntime(u32);

impl FromStr for Ntime {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(InternalError::InvalidLength {
                expected: 8,
                actual: s.len(),
            });
        }

        u32::from_str_radix(s, 16)
            .map(Ntime)
            .map_err(|err| InternalError::Parse {
                message: format!("invalid ntime '{s}': {err}"),
            })
    }
}

impl fmt::Display for Ntime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<Ntime> for u32 {
    fn from(ntime: Ntime) -> u32 {
        ntime.0
    }
}

impl From<u32> for Ntime {
    fn from(ntime: u32) -> Ntime {
        Ntime(ntime)
    }
}

impl TryFrom<u64> for Ntime {
    type Error = <u32 as TryFrom<u64>>::Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(Ntime(u32::try_from(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        assert_eq!(Ntime::from(0x504e86b9).to_string(), "504e86b9");
        assert_eq!(
            "504e86b9".parse::<Ntime>().unwrap(),
            Ntime::from(0x504e86b9)
        );
    }

    #[test]
    fn ordering_follows_time() {
        assert!(Ntime::from(100) < Ntime::from(200));
    }

    #[test]
    fn must_be_exactly_four_bytes() {
        assert!("1".parse::<Ntime>().is_err());
        assert!("123456789".parse::<Ntime>().is_err());
    }

    #[test]
    fn from_u64_overflow() {
        assert!(Ntime::try_from(u64::from(u32::MAX)).is_ok());
        assert!(Ntime::try_from(u64::from(u32::MAX) + 1).is_err());
    }
}
