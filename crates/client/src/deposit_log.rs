//! Client-side replay of the deposit log.
//!
//! The runtime only stores the commitments and the running accumulator. A
//! depositor proving inclusion replays the log to find a root that covers
//! its commitment.

use privtoken_types::{deposit_log_step, Digest, DEPOSIT_LOG_GENESIS};

/// Inclusion of one commitment in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InclusionWitness {
    pub index: u64,
    /// A root produced after the commitment was appended
    pub root: Digest,
}

/// Deposit commitments in log order.
#[derive(Clone, Debug, Default)]
pub struct DepositLog {
    commitments: Vec<Digest>,
}

impl DepositLog {
    pub fn new(commitments: Vec<Digest>) -> Self {
        Self { commitments }
    }

    pub fn push(&mut self, commitment: Digest) {
        self.commitments.push(commitment);
    }

    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }

    /// Every root the log has had, starting with the empty root.
    pub fn roots(&self) -> Vec<Digest> {
        let mut roots = Vec::with_capacity(self.commitments.len() + 1);
        let mut root = DEPOSIT_LOG_GENESIS;
        roots.push(root);
        for (index, commitment) in self.commitments.iter().enumerate() {
            root = deposit_log_step(&root, index as u64, commitment);
            roots.push(root);
        }
        roots
    }

    /// Current root.
    pub fn root(&self) -> Digest {
        self.roots()
            .last()
            .copied()
            .unwrap_or(DEPOSIT_LOG_GENESIS)
    }

    /// Witness for the first occurrence of `commitment`, against the latest root.
    pub fn inclusion(&self, commitment: &Digest) -> Option<InclusionWitness> {
        let index = self.commitments.iter().position(|c| c == commitment)?;
        Some(InclusionWitness {
            index: index as u64,
            root: self.root(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privtoken_types::sha256;

    #[test]
    fn test_empty_log() {
        let log = DepositLog::default();
        assert_eq!(log.root(), DEPOSIT_LOG_GENESIS);
        assert_eq!(log.roots(), vec![DEPOSIT_LOG_GENESIS]);
        assert!(log.inclusion(&sha256(b"x")).is_none());
    }

    #[test]
    fn test_inclusion_uses_latest_root() {
        let a = sha256(b"a");
        let b = sha256(b"b");
        let log = DepositLog::new(vec![a, b]);

        let witness = log.inclusion(&a).unwrap();
        assert_eq!(witness.index, 0);
        assert_eq!(witness.root, log.root());
        assert_eq!(log.roots().len(), 3);
        assert_eq!(
            log.root(),
            deposit_log_step(&deposit_log_step(&DEPOSIT_LOG_GENESIS, 0, &a), 1, &b)
        );
    }
}
