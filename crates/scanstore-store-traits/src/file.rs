#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FileKind {
    Regular,
    Whiteout,
    Directory,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Regular => "regular",
            FileKind::Whiteout => "whiteout",
            FileKind::Directory => "directory",
        }
    }
}

/// A file, for layers where file presence matters for matching (e.g. a
/// distro marker file a matcher keys on).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexFile {
    pub path: String,
    pub kind: FileKind,
}
