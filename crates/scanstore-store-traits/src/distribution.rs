/// An OS identity, as reported by a scanner (typically parsed from
/// `/etc/os-release`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Distribution {
    pub did: String,
    pub name: String,
    pub version: String,
    pub version_id: String,
    pub version_code_name: String,
    pub pretty_name: String,
    pub arch: String,
    pub cpe: String,
}
