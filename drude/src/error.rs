use crate::ParticleRole;

use atoms::{AtomsError, Tag};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DrudeError {
    #[error("invalid Drude type declaration: {0}")]
    InvalidTypeDeclaration(String),

    #[error("{role:?} type {itype} is not paired with a partner type")]
    UnpairedType { itype: usize, role: ParticleRole },

    #[error("{role:?} atom {tag} has no bonded partner")]
    MissingPartner { tag: Tag, role: ParticleRole },

    #[error("{role:?} atom {tag} has several bonded partner candidates {candidates:?}")]
    AmbiguousPartner {
        tag: Tag,
        role: ParticleRole,
        candidates: Vec<Tag>,
    },

    #[error("Drude topology is inconsistent: {nfaults} fault(s) detected on other processes")]
    RemoteTopology { nfaults: i64 },

    #[error("cannot apply the {op} transform: coordinates are already {state}")]
    TransformState { op: &'static str, state: &'static str },

    #[error("partner {partner} of atom {tag} is not present on this process")]
    PartnerNotMapped { tag: Tag, partner: Tag },

    #[error("core/Drude pair of core {tag} was not reduced by this transform")]
    PairNotReduced { tag: Tag },

    #[error(transparent)]
    Atoms(#[from] AtomsError),
}
