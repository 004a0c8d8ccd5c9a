/// A package repository, e.g. an RPM channel or a language registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Repository {
    pub name: String,
    pub key: String,
    pub uri: String,
    pub cpe: String,
}
