use {
    super::*,
    byteorder::{BigEndian, ByteOrder, LittleEndian},
};

/// The tip hash in the `mining.notify` byte order, which swaps every 4-byte
/// word of the internal hash into big endian. A historical accident the whole
/// fleet of ASIC firmware now depends on.
#[derive(Debug, PartialEq, Eq, Clone, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash(BlockHash);

fn swap_words(bytes: &[u8; 32]) -> [u8; 32] {
    let mut swapped = [0u8; 32];
    for (src, dst) in bytes.chunks_exact(4).zip(swapped.chunks_mut(4)) {
        let word = BigEndian::read_u32(src);
        LittleEndian::write_u32(dst, word);
    }
    swapped
}

impl FromStr for PrevHash {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(s.len() == 64, "prevhash hex must be 64 chars");

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;

        Ok(PrevHash(BlockHash::from_byte_array(swap_words(&bytes))))
    }
}

impl fmt::Display for PrevHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(swap_words(self.0.as_byte_array())))
    }
}

impl From<BlockHash> for PrevHash {
    fn from(blockhash: BlockHash) -> Self {
        PrevHash(blockhash)
    }
}

impl From<PrevHash> for BlockHash {
    fn from(prevhash: PrevHash) -> Self {
        prevhash.0
    }
}
