use super::*;

/// The 4-byte header nonce, always exactly eight hex digits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Nonce(u32);

impl FromStr for Nonce {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(InternalError::InvalidLength {
                expected: 8,
                actual: s.len(),
            });
        }

        u32::from_str_radix(s, 16)
            .map(Nonce)
            .map_err(|err| InternalError::Parse {
                message: format!("invalid nonce '{s}': {err}"),
            })
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<Nonce> for u32 {
    fn from(nonce: Nonce) -> u32 {
        nonce.0
    }
}

impl From<u32> for Nonce {
    fn from(nonce: u32) -> Nonce {
        Nonce(nonce)
    }
}
