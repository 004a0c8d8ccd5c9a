use crate::distribution::Distribution;
use crate::package::Package;
use crate::repository::Repository;
use crate::vulnerability::Vulnerability;

/// A candidate index record composed during affected-manifest resolution:
/// a package plus the distribution/repository context it was found in.
#[derive(Clone, Debug)]
pub struct IndexRecord {
    pub package: Package,
    pub distribution: Option<Distribution>,
    pub repository: Option<Repository>,
}

/// The external predicate deciding whether a candidate index record is
/// vulnerable to a given vulnerability. Version comparators and CPE/
/// repository filters live behind this trait; the store only calls it.
pub trait Matcher: Send + Sync {
    /// Whether `record` is vulnerable to `vuln`.
    fn vulnerable(&self, record: &IndexRecord, vuln: &Vulnerability) -> bool;

    /// When `true`, the store pushes `vulnerable_range @> normalized_version`
    /// into the database query instead of relying solely on in-memory
    /// filtering in [`Matcher::vulnerable`].
    fn version_filter_is_authoritative(&self) -> bool {
        false
    }

    /// When `true`, candidates with no `fixed_in_version` are dropped
    /// before [`Matcher::vulnerable`] is ever called.
    fn requires_fixed_in_version(&self) -> bool {
        false
    }
}
