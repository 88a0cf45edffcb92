use crate::{DrudeError, DrudeTypes, ParticleRole};

use atoms::{Atoms, Tag};
use std::collections::{BTreeSet, HashMap};

/// Bookkeeping of the partner discovery on one process.
///
/// Discovery runs in two ring passes. In the first, every process circulates
/// the bonds it stores (`[tag_i, tag_j]` records) and each receiver records,
/// for every local copy of a polarizable atom, the tags it is bonded to. In
/// the second, every process circulates `[tag, type]` records of the
/// polarizable atoms it owns, and each receiver keeps those bonded tags whose
/// type is the declared partner type. A polarizable atom must end up with
/// exactly one candidate.
///
/// The accumulators only see buffers, so the protocol can be driven without
/// a communicator.
#[derive(Debug, Default)]
pub struct PartnerDiscovery {
    bonded: Vec<BTreeSet<Tag>>,
    candidates: Vec<BTreeSet<Tag>>,
    watchers: HashMap<Tag, Vec<usize>>,
}

/// A polarizable atom owned by this process with zero or several candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyFault {
    pub tag: Tag,
    pub role: ParticleRole,
    pub candidates: Vec<Tag>,
}

impl From<TopologyFault> for DrudeError {
    fn from(fault: TopologyFault) -> DrudeError {
        if fault.candidates.is_empty() {
            DrudeError::MissingPartner {
                tag: fault.tag,
                role: fault.role,
            }
        } else {
            DrudeError::AmbiguousPartner {
                tag: fault.tag,
                role: fault.role,
                candidates: fault.candidates,
            }
        }
    }
}

impl PartnerDiscovery {
    pub fn new(nall: usize) -> PartnerDiscovery {
        PartnerDiscovery {
            bonded: vec![BTreeSet::new(); nall],
            candidates: vec![BTreeSet::new(); nall],
            watchers: HashMap::new(),
        }
    }

    /// `[tag_i, tag_j]` for every bond stored on an owned atom.
    pub fn bond_records(atoms: &Atoms) -> Vec<i64> {
        let mut buf = Vec::new();

        for i in 0..atoms.nlocal {
            for &tj in atoms.bond_atom[i].iter() {
                buf.push(atoms.tag[i]);
                buf.push(tj);
            }
        }

        buf
    }

    /// First pass: attach each bond of a circulating buffer to the local
    /// copies of its polarizable ends.
    pub fn absorb_bonds(&mut self, atoms: &Atoms, types: &DrudeTypes, buf: &[i64]) {
        for rec in buf.chunks_exact(2) {
            let (a, b) = (rec[0], rec[1]);

            self.attach(atoms, types, a, b);
            self.attach(atoms, types, b, a);
        }
    }

    fn attach(&mut self, atoms: &Atoms, types: &DrudeTypes, tag: Tag, other: Tag) {
        for k in atoms.images(tag) {
            if types.role(atoms.atom_type[k]).is_polarizable() {
                self.bonded[k].insert(other);
            }
        }
    }

    /// Index the bonded tags so that the second pass finds the local atoms
    /// interested in a circulating record.
    pub fn index_watchers(&mut self) {
        self.watchers.clear();

        for (k, bonded) in self.bonded.iter().enumerate() {
            for &t in bonded.iter() {
                self.watchers.entry(t).or_default().push(k);
            }
        }
    }

    /// `[tag, type]` for every polarizable owned atom.
    pub fn type_records(atoms: &Atoms, types: &DrudeTypes) -> Vec<i64> {
        let mut buf = Vec::new();

        for i in 0..atoms.nlocal {
            let itype = atoms.atom_type[i];

            if types.role(itype).is_polarizable() {
                buf.push(atoms.tag[i]);
                buf.push(itype as i64);
            }
        }

        buf
    }

    /// Second pass: keep the bonded tags of partner type.
    pub fn absorb_types(&mut self, atoms: &Atoms, types: &DrudeTypes, buf: &[i64]) {
        for rec in buf.chunks_exact(2) {
            let (tag, jtype) = (rec[0], rec[1] as usize);

            if let Some(watchers) = self.watchers.get(&tag) {
                for &k in watchers.iter() {
                    if types.are_partners(atoms.atom_type[k], jtype) {
                        self.candidates[k].insert(tag);
                    }
                }
            }
        }
    }

    /// Partner tag (0 for none) of every local atom, owned and ghost, and
    /// the faults of the owned ones.
    pub fn resolve(self, atoms: &Atoms, types: &DrudeTypes) -> (Vec<Tag>, Vec<TopologyFault>) {
        let nall = atoms.get_nall();

        let mut drudeid = vec![0; nall];
        let mut faults = Vec::new();

        for k in 0..nall {
            let role = types.role(atoms.atom_type[k]);

            if !role.is_polarizable() {
                continue;
            }

            let candidates = &self.candidates[k];

            if candidates.len() == 1 {
                drudeid[k] = *candidates.iter().next().unwrap_or(&0);
            } else if k < atoms.nlocal {
                faults.push(TopologyFault {
                    tag: atoms.tag[k],
                    role,
                    candidates: candidates.iter().copied().collect(),
                });
            }
        }

        (drudeid, faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector3::Vector3f64;

    fn owned(tags_types: &[(Tag, usize)]) -> Atoms {
        let mut atoms = Atoms::new(3, false, false);
        for (k, &(tag, itype)) in tags_types.iter().enumerate() {
            let x = Vector3f64::new(k as f64, 0.0, 0.0);
            atoms.add_atom(tag, itype, x, Vector3f64::zeros(), 0.0, &mut []).unwrap();
        }
        atoms
    }

    #[test]
    fn test_remote_records_resolve_local_core() {
        let types = DrudeTypes::parse("C D N", "1:2", 3).unwrap();

        // the core is here, its Drude particle and the bond live elsewhere
        let atoms = owned(&[(10, 1), (11, 3)]);

        let mut discovery = PartnerDiscovery::new(atoms.get_nall());

        discovery.absorb_bonds(&atoms, &types, &PartnerDiscovery::bond_records(&atoms));
        discovery.absorb_bonds(&atoms, &types, &[20, 10, 20, 21]);
        discovery.index_watchers();

        discovery.absorb_types(&atoms, &types, &PartnerDiscovery::type_records(&atoms, &types));
        discovery.absorb_types(&atoms, &types, &[20, 2, 21, 2]);

        let (drudeid, faults) = discovery.resolve(&atoms, &types);

        assert_eq!(drudeid, vec![20, 0]);
        assert!(faults.is_empty());
    }

    #[test]
    fn test_fault_kinds() {
        let types = DrudeTypes::parse("C D N", "1:2", 3).unwrap();
        let atoms = owned(&[(1, 1), (2, 2), (3, 2)]);

        let mut discovery = PartnerDiscovery::new(atoms.get_nall());
        discovery.absorb_bonds(&atoms, &types, &[1, 2, 1, 3]);
        discovery.index_watchers();
        discovery.absorb_types(&atoms, &types, &PartnerDiscovery::type_records(&atoms, &types));

        let (drudeid, faults) = discovery.resolve(&atoms, &types);

        assert_eq!(drudeid, vec![0, 1, 1]);
        assert_eq!(faults.len(), 1);
        assert_eq!(
            DrudeError::from(faults[0].clone()),
            DrudeError::AmbiguousPartner {
                tag: 1,
                role: ParticleRole::Core,
                candidates: vec![2, 3],
            }
        );

        let missing = TopologyFault {
            tag: 7,
            role: ParticleRole::Drude,
            candidates: vec![],
        };
        assert_eq!(
            DrudeError::from(missing),
            DrudeError::MissingPartner {
                tag: 7,
                role: ParticleRole::Drude
            }
        );
    }
}
