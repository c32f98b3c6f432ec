use super::*;

/// Compact network target from the template's `bits` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Nbits(CompactTarget);

impl Nbits {
    pub fn to_compact(self) -> CompactTarget {
        self.0
    }

    pub fn target(self) -> Target {
        Target::from_compact(self.0)
    }
}

impl FromStr for Nbits {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Nbits(CompactTarget::from_unprefixed_hex(s)?))
    }
}

impl fmt::Display for Nbits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0.to_consensus())
    }
}

impl From<Nbits> for CompactTarget {
    fn from(nbits: Nbits) -> CompactTarget {
        nbits.0
    }
}

impl From<CompactTarget> for Nbits {
    fn from(compact: CompactTarget) -> Nbits {
        Nbits(compact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_roundtrip() {
        for hex in ["1d00ffff", "1b0404cb", "207fffff", "1703255b"] {
            let nbits = hex.parse::<Nbits>().unwrap();
            assert_eq!(nbits.to_string(), hex);
        }
    }

    #[test]
    fn target_roundtrips_through_compact() {
        // Canonical compact forms survive decode/encode unchanged
        for hex in ["1d00ffff", "1b0404cb", "1a0ffff0", "207fffff"] {
            let nbits = hex.parse::<Nbits>().unwrap();
            let reencoded = Nbits::from(nbits.target().to_compact_lossy());
            assert_eq!(reencoded, nbits, "{hex}");
        }
    }

    #[test]
    fn genesis_bits_decode_to_max_target() {
        assert_eq!("1d00ffff".parse::<Nbits>().unwrap().target(), Target::MAX);
    }

    #[test]
    fn rejects_prefixed_or_garbage_hex() {
        assert!("0x1d00ffff".parse::<Nbits>().is_err());
        assert!("xyz".parse::<Nbits>().is_err());
    }

    #[test]
    fn serde_as_hex_string() {
        let nbits = "1d00ffff".parse::<Nbits>().unwrap();
        assert_eq!(serde_json::to_string(&nbits).unwrap(), "\"1d00ffff\"");
        assert_eq!(
            serde_json::from_str::<Nbits>("\"1d00ffff\"").unwrap(),
            nbits
        );
    }
}
