//! Static allowlist of identities permitted to authenticate.

use std::collections::HashSet;

/// Normalized set of authorized identities, fixed at startup. Membership is
/// the sole authorization criterion; there is no runtime mutation.
#[derive(Debug, Clone)]
pub struct Allowlist {
    members: HashSet<String>,
}

impl Allowlist {
    /// Build from raw configured identities. Entries that normalize to the
    /// empty string are discarded.
    pub fn new(identities: &[String]) -> Self {
        let members = identities
            .iter()
            .map(|identity| Self::normalize(identity))
            .filter(|identity| !identity.is_empty())
            .collect();

        Self { members }
    }

    /// The single normalization point: trim whitespace, lowercase.
    pub fn normalize(identity: &str) -> String {
        identity.trim().to_lowercase()
    }

    /// O(1) membership test on the normalized identity. Empty or malformed
    /// input is never authorized.
    pub fn is_authorized(&self, identity: &str) -> bool {
        let normalized = Self::normalize(identity);
        !normalized.is_empty() && self.members.contains(&normalized)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in stable order, for status reporting and notification fan-out.
    pub fn members(&self) -> Vec<String> {
        let mut members: Vec<String> = self.members.iter().cloned().collect();
        members.sort();
        members
    }
}
