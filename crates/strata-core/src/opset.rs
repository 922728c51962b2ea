//! Operator-set identifiers.

use std::fmt;

use strata_onnx::OperatorSetIdProto;

/// The default operator domain.
pub const DEFAULT_DOMAIN: &str = "ai.onnx";

/// Map an empty domain to [`DEFAULT_DOMAIN`].
pub fn canonical_domain(domain: &str) -> &str {
    if domain.is_empty() { DEFAULT_DOMAIN } else { domain }
}

/// A `(domain, version)` pair naming one operator set.
///
/// The domain is stored in canonical form, so `("", 13)` and
/// `("ai.onnx", 13)` are the same set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorSetId {
    domain: String,
    version: i64,
}

impl OperatorSetId {
    pub fn new(domain: impl AsRef<str>, version: i64) -> Self {
        Self {
            domain: canonical_domain(domain.as_ref()).to_string(),
            version,
        }
    }

    pub fn from_proto(proto: &OperatorSetIdProto) -> Self {
        Self::new(&proto.domain, proto.version)
    }

    /// Convert a model's imports, assuming `(ai.onnx, 1)` when there are none.
    pub fn from_imports(imports: &[OperatorSetIdProto]) -> Vec<Self> {
        if imports.is_empty() {
            return vec![Self::default()];
        }
        imports.iter().map(Self::from_proto).collect()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Loggable identifier, `domain:version`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl Default for OperatorSetId {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN, 1)
    }
}

impl fmt::Display for OperatorSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id() {
        let id = OperatorSetId::new("", 13);
        assert_eq!(id.domain(), DEFAULT_DOMAIN);
        assert_eq!(id.id(), "ai.onnx:13");
        assert_eq!(id, OperatorSetId::new("ai.onnx", 13));
        assert_eq!(OperatorSetId::new("com.microsoft", 1).id(), "com.microsoft:1");
    }

    #[test]
    fn test_from_imports_default() {
        assert_eq!(OperatorSetId::from_imports(&[]), vec![OperatorSetId::new("ai.onnx", 1)]);

        let imports = vec![OperatorSetIdProto {
            domain: String::new(),
            version: 11,
        }];
        assert_eq!(OperatorSetId::from_imports(&imports)[0].version(), 11);
    }
}
