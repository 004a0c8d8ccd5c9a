use crate::version::Version;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PackageKind {
    Binary,
    Source,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Binary => "binary",
            PackageKind::Source => "source",
        }
    }
}

/// A discovered software artifact: an installed package, as reported by a
/// scanner. Binary packages may carry a back-pointer to their source
/// package; source and binary packages share this same shape, distinguished
/// by `kind`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Package {
    pub name: String,
    pub kind: PackageKind,
    pub version: String,
    pub normalized_version: Option<Version>,
    pub module: String,
    pub arch: String,
    pub source: Option<Box<Package>>,
}

impl Package {
    pub fn is_name_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// The zero-source sentinel substituted when a package carries no
    /// `source` pointer, so that every package row has an associated source
    /// row in storage (possibly this sentinel itself).
    pub fn zero_source_sentinel() -> Package {
        Package {
            name: String::new(),
            kind: PackageKind::Source,
            version: String::new(),
            normalized_version: None,
            module: String::new(),
            arch: String::new(),
            source: None,
        }
    }
}
