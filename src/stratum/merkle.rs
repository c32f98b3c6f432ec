use super::*;

/// A node of the Merkle sibling path. Unlike `Txid` display, which reverses
/// bytes, branch entries go over the wire as the internal little-endian bytes
/// hex-encoded as-is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct MerkleNode(sha256d::Hash);

impl MerkleNode {
    pub fn as_byte_array(&self) -> &[u8; 32] {
        self.0.as_byte_array()
    }

    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(sha256d::Hash::from_byte_array(bytes))
    }

    pub fn to_raw_hash(self) -> sha256d::Hash {
        self.0
    }
}

impl FromStr for MerkleNode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(s.len() == 64, "merkle node hex must be 64 chars");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(MerkleNode(sha256d::Hash::from_byte_array(bytes)))
    }
}

impl fmt::Display for MerkleNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_byte_array()))
    }
}

impl From<sha256d::Hash> for MerkleNode {
    fn from(hash: sha256d::Hash) -> Self {
        Self(hash)
    }
}

impl From<MerkleNode> for bitcoin::TxMerkleNode {
    fn from(node: MerkleNode) -> Self {
        node.0.into()
    }
}

impl From<Txid> for MerkleNode {
    fn from(txid: Txid) -> Self {
        Self::from_byte_array(txid.to_byte_array())
    }
}

/// Recomputes the Merkle root for one coinbase variant: hash the reassembled
/// coinbase, then fold the precomputed sibling path over it.
pub fn merkle_root(
    coinb1: &str,
    coinb2: &str,
    extranonce1: &Extranonce,
    extranonce2: &Extranonce,
    branches: &[MerkleNode],
) -> Result<MerkleNode> {
    let coinbase = hex::decode(format!("{coinb1}{extranonce1}{extranonce2}{coinb2}"))?;

    let mut root = sha256d::Hash::hash(&coinbase);

    for branch in branches {
        root = hash_pair(root, branch.to_raw_hash());
    }

    Ok(MerkleNode::from(root))
}

fn hash_pair(left: sha256d::Hash, right: sha256d::Hash) -> sha256d::Hash {
    let mut concat = [0u8; 64];
    concat[..32].copy_from_slice(left.as_byte_array());
    concat[32..].copy_from_slice(right.as_byte_array());
    sha256d::Hash::hash(&concat)
}

/// The sibling path for the coinbase leaf of the standard Bitcoin Merkle
/// tree, with the template's transactions at slots 1.., a placeholder at
/// slot 0, and the last hash duplicated on odd levels. The path depends only
/// on the siblings' positions, so it holds for every coinbase the miners
/// produce.
pub fn merkle_branches(non_coinbase_txids: Vec<Txid>) -> Vec<MerkleNode> {
    if non_coinbase_txids.is_empty() {
        return Vec::new();
    }

    let mut level: Vec<sha256d::Hash> = Vec::with_capacity(non_coinbase_txids.len() + 1);
    level.push(sha256d::Hash::all_zeros());
    level.extend(non_coinbase_txids.iter().map(|txid| txid.to_raw_hash()));

    let mut branches = Vec::new();
    let mut index = 0;

    while level.len() > 1 {
        // XOR flips to the sibling on either side
        let sibling = index ^ 1;
        branches.push(MerkleNode::from(
            level[if sibling < level.len() { sibling } else { index }],
        ));

        level = level
            .chunks(2)
            .map(|pair| hash_pair(pair[0], *pair.last().expect("chunks are non-empty")))
            .collect();

        index /= 2;
    }

    branches
}
