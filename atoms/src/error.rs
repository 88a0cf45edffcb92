use crate::Tag;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtomsError {
    #[error("{0} requires the ghost atoms to be cleared first")]
    GhostsPresent(&'static str),

    #[error("atom type {itype} is out of range 1..={ntypes}")]
    UnknownType { itype: usize, ntypes: usize },

    #[error("group '{0}' already exists")]
    DuplicateGroup(String),

    #[error("too many groups, at most {0} are supported")]
    TooManyGroups(usize),

    #[error("atom {tag} is not present on this process")]
    MissingAtom { tag: Tag },

    #[error("atom index {index} is out of range, {nlocal} atoms are owned")]
    IndexOutOfRange { index: usize, nlocal: usize },

    #[error("truncated atom buffer: needed {needed} values, found {found}")]
    TruncatedBuffer { needed: usize, found: usize },
}
