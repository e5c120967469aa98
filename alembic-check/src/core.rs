use std::collections::HashSet;

use crate::error::Error;

/// Name of the table Alembic records the applied revision in.
pub const ALEMBIC_VERSION_TABLE: &str = "alembic_version";

/// Column of [ALEMBIC_VERSION_TABLE] holding the revision identifier.
pub const VERSION_COLUMN: &str = "version_num";

/// One migration script's position in the revision chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRecord {
    /// The identifier of this revision.
    pub revision: String,
    /// The identifier of the revision this one follows, or `None` for the chain root.
    pub down_revision: Option<String>,
}

impl RevisionRecord {
    pub fn new(revision: impl Into<String>, down_revision: Option<&str>) -> Self {
        Self {
            revision: revision.into(),
            down_revision: down_revision.map(str::to_string),
        }
    }
}

/// Resolves revision identifiers to their records.
pub trait RevisionLookup {
    /// Returns the record for `id`, or `None` if no such revision is known.
    fn get_revision(&self, id: &str) -> Option<&RevisionRecord>;
}

impl RevisionLookup for [RevisionRecord] {
    fn get_revision(&self, id: &str) -> Option<&RevisionRecord> {
        self.iter().find(|record| record.revision == id)
    }
}

impl RevisionLookup for Vec<RevisionRecord> {
    fn get_revision(&self, id: &str) -> Option<&RevisionRecord> {
        self.as_slice().get_revision(id)
    }
}

/// Reads the revision a database currently records in its Alembic version table.
pub trait VersionSource {
    fn current_version(&mut self) -> Result<String, Error>;
}

/// How the database revision is compared against the latest migration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonPolicy {
    /// Only an identical revision is accepted.
    ExactMatch,
    /// Any ancestor of the latest revision is accepted, reporting the number of pending migrations.
    ChainWalk,
}

/// The outcome of comparing a database revision with the latest migration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// The database is at the latest revision.
    UpToDate,
    /// The database is at an ancestor of the latest revision, this many migrations behind.
    Pending(usize),
    /// The database revision is not the latest revision nor one of its ancestors.
    Mismatch,
}

impl Alignment {
    /// Whether this outcome should let the pipeline continue.
    pub fn is_success(&self) -> bool {
        !matches!(self, Alignment::Mismatch)
    }

    /// The process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Classify `db_version` against `latest_revision`.
///
/// Under [ComparisonPolicy::ChainWalk] the `down_revision` pointers are followed from
/// `latest_revision` until `db_version` is found (counting the steps taken) or the chain ends.
/// A pointer to a revision the lookup doesn't know ends the chain, as does a revision seen twice.
pub fn evaluate_alignment<L>(
    latest_revision: &str,
    db_version: &str,
    policy: ComparisonPolicy,
    lookup: &L,
) -> Alignment
where
    L: RevisionLookup + ?Sized,
{
    if latest_revision == db_version {
        return Alignment::UpToDate;
    }
    if policy == ComparisonPolicy::ExactMatch {
        return Alignment::Mismatch;
    }

    let mut visited = HashSet::new();
    let mut pending = 0;
    let mut current = lookup.get_revision(latest_revision);
    while let Some(record) = current {
        if record.revision == db_version {
            return Alignment::Pending(pending);
        }
        if !visited.insert(record.revision.as_str()) {
            break;
        }
        pending += 1;
        current = record
            .down_revision
            .as_deref()
            .and_then(|down| lookup.get_revision(down));
    }

    Alignment::Mismatch
}

/// The schema the version table should be qualified with, if any.
/// An empty name and `public` both mean the connection's default schema.
pub(crate) fn qualifying_schema(schema: Option<&str>) -> Option<&str> {
    schema
        .map(str::trim)
        .filter(|schema| !schema.is_empty() && *schema != "public")
}
