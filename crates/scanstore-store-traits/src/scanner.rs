#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScannerKind {
    Package,
    Distribution,
    Repository,
    File,
}

impl ScannerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScannerKind::Package => "package",
            ScannerKind::Distribution => "distribution",
            ScannerKind::Repository => "repository",
            ScannerKind::File => "file",
        }
    }
}

/// A content extractor identity, interned as a small integer id by the
/// scanner registry. `(name, version, kind)` is the natural key.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Scanner {
    pub name: String,
    pub version: String,
    pub kind: ScannerKind,
}

/// A scanner together with the small integer id the registry assigned it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScannerId(pub i64);
