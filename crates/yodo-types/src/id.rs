use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Handle for a single-use blob.
///
/// A `BlobId` is a version-4 UUID drawn from the operating system's CSPRNG,
/// so freshly generated ids collide with negligible probability. It is the
/// only external reference to a stored blob and doubles as the on-disk key:
/// [`Display`](fmt::Display) renders the lowercase hyphenated form, which
/// never contains path separators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(Uuid);

impl BlobId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse an identifier supplied by a client.
    ///
    /// Any textual UUID form (hyphenated, simple, braced, URN) is accepted and
    /// normalised; everything else is rejected.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TypeError::InvalidId(s.to_string()))
    }

    /// Short representation (first 8 characters), for log lines.
    pub fn short_id(&self) -> String {
        self.to_string()[..8].to_string()
    }
}

impl FromStr for BlobId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.short_id())
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<Uuid> for BlobId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generated_ids_are_v4() {
        let id = BlobId::generate();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(BlobId::generate(), BlobId::generate());
    }

    #[test]
    fn display_is_lowercase_hyphenated() {
        let id = BlobId::parse("2C8000BC-7C10-4700-9CC3-EB0DCE0A9D1A").unwrap();
        assert_eq!(id.to_string(), "2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a");
    }

    #[test]
    fn parse_normalises_alternate_forms() {
        let canonical = BlobId::parse("2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a").unwrap();
        let simple = BlobId::parse("2c8000bc7c1047009cc3eb0dce0a9d1a").unwrap();
        let braced = BlobId::parse("{2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a}").unwrap();
        assert_eq!(canonical, simple);
        assert_eq!(canonical, braced);
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "not-a-uuid", "../etc/passwd", "2c8000bc-7c10-4700-9cc3"] {
            let err = BlobId::parse(input).unwrap_err();
            assert_eq!(err, TypeError::InvalidId(input.to_string()));
        }
    }

    #[test]
    fn from_str_matches_parse() {
        let id: BlobId = "2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a".parse().unwrap();
        assert_eq!(id.short_id(), "2c8000bc");
    }

    #[test]
    fn serde_uses_hyphenated_string() {
        let id = BlobId::parse("2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a\"");
        let parsed: BlobId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    proptest! {
        #[test]
        fn display_parses_back(bytes in any::<[u8; 16]>()) {
            let id = BlobId::from_uuid(Uuid::from_bytes(bytes));
            let rendered = id.to_string();
            prop_assert!(!rendered.contains('/'));
            prop_assert_eq!(BlobId::parse(&rendered).unwrap(), id);
        }
    }
}
