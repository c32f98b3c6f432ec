use {super::*, primitive_types::U256};

/// The difficulty-1 target, 0x00000000FFFF0000...0, as a 256-bit integer.
pub static DIFFICULTY_1_TARGET: LazyLock<U256> =
    LazyLock::new(|| U256::from_big_endian(&Target::MAX.to_be_bytes()));

/// Share difficulty. A share at difficulty `d` must hash at or below
/// `floor(DIFFICULTY_1_TARGET / d)`, computed in 256-bit integer arithmetic
/// rather than through the lossy compact form.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Difficulty(f64);

impl Difficulty {
    pub fn new(value: f64) -> Result<Self, InternalError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(InternalError::InvalidValue {
                reason: "difficulty must be finite and > 0".into(),
            });
        }
        Ok(Difficulty(value))
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 { other } else { self }
    }

    /// floor(DIFFICULTY_1_TARGET / difficulty), computed by scaling the
    /// difficulty into an integer denominator first. A difficulty small
    /// enough to overflow 256 bits clamps to the all-ones target.
    pub fn target(self) -> Target {
        // DIFFICULTY_1_TARGET is just under 2^224, so a 2^32 - 1 scale
        // keeps the numerator within 256 bits.
        const MAX_SCALE: u64 = 0xFFFF_FFFF;

        let max_by_denominator = (u64::MAX as f64 / self.0).floor();
        let scale = max_by_denominator.min(MAX_SCALE as f64).max(1.0) as u64;

        let numerator = (*DIFFICULTY_1_TARGET).saturating_mul(U256::from(scale));
        let denominator = (self.0 * scale as f64).round() as u64;

        let target = if denominator == 0 {
            U256::MAX
        } else {
            numerator / U256::from(denominator)
        };

        Target::from_be_bytes(target.to_big_endian())
    }
}

impl From<u64> for Difficulty {
    fn from(difficulty: u64) -> Self {
        assert!(difficulty > 0, "difficulty must be > 0");
        Difficulty(difficulty as f64)
    }
}

impl From<f64> for Difficulty {
    fn from(difficulty: f64) -> Self {
        Difficulty::new(difficulty).expect("difficulty must be finite and > 0")
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0 <= u64::MAX as f64 {
            serializer.serialize_u64(self.0 as u64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Int(u64),
            Float(f64),
        }

        let value = match Wire::deserialize(deserializer)? {
            Wire::Int(n) => n as f64,
            Wire::Float(x) => x,
        };

        Difficulty::new(value).map_err(de::Error::custom)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0 <= u64::MAX as f64 {
            write!(f, "{}", self.0 as u64)
        } else {
            let s = format!("{:.8}", self.0);
            f.write_str(s.trim_end_matches('0').trim_end_matches('.'))
        }
    }
}

impl FromStr for Difficulty {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|err| InternalError::Parse {
            message: format!("difficulty must be a number: {err}"),
        })?;
        Difficulty::new(value)
    }
}
