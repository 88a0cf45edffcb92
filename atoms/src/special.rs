use crate::{Atoms, AtomsError, Tag};

use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};

// Special neighbors of one owned atom: atoms 1, 2 and 3 bonds away.
//
// Pair styles scale the interaction of an atom with its special neighbors
// by the factor of the corresponding level (special_coul[1..=3]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialList {
    pub onetwo: Vec<Tag>,
    pub onethree: Vec<Tag>,
    pub onefour: Vec<Tag>,
}

impl SpecialList {
    pub fn new(onetwo: Vec<Tag>, onethree: Vec<Tag>, onefour: Vec<Tag>) -> SpecialList {
        SpecialList {
            onetwo,
            onethree,
            onefour,
        }
    }

    /// 1 for a 1-2 neighbor, 2 for 1-3, 3 for 1-4, 0 otherwise.
    pub fn level_of(&self, tag: Tag) -> usize {
        if self.onetwo.contains(&tag) {
            1
        } else if self.onethree.contains(&tag) {
            2
        } else if self.onefour.contains(&tag) {
            3
        } else {
            0
        }
    }

    pub fn level(&self, level: usize) -> &[Tag] {
        match level {
            1 => &self.onetwo,
            2 => &self.onethree,
            _ => &self.onefour,
        }
    }

    pub fn level_mut(&mut self, level: usize) -> &mut Vec<Tag> {
        match level {
            1 => &mut self.onetwo,
            2 => &mut self.onethree,
            _ => &mut self.onefour,
        }
    }

    pub fn remove(&mut self, tag: Tag) {
        self.onetwo.retain(|&t| t != tag);
        self.onethree.retain(|&t| t != tag);
        self.onefour.retain(|&t| t != tag);
    }

    pub fn len(&self) -> usize {
        self.onetwo.len() + self.onethree.len() + self.onefour.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pack(&self, buf: &mut Vec<f64>) {
        buf.push(self.onetwo.len() as f64);
        buf.push(self.onethree.len() as f64);
        buf.push(self.onefour.len() as f64);

        for level in 1..=3 {
            buf.extend(self.level(level).iter().map(|&t| t as f64));
        }
    }

    /// Returns the list and the number of values consumed.
    pub fn unpack(buf: &[f64]) -> Result<(SpecialList, usize), AtomsError> {
        if buf.len() < 3 {
            return Err(AtomsError::TruncatedBuffer {
                needed: 3,
                found: buf.len(),
            });
        }

        let counts = [buf[0] as usize, buf[1] as usize, buf[2] as usize];
        let needed = 3 + counts.iter().sum::<usize>();

        if buf.len() < needed {
            return Err(AtomsError::TruncatedBuffer {
                needed,
                found: buf.len(),
            });
        }

        let mut special = SpecialList::default();
        let mut m = 3;

        for (level, &n) in counts.iter().enumerate() {
            *special.level_mut(level + 1) = buf[m..m + n].iter().map(|&t| t as Tag).collect();
            m += n;
        }

        Ok((special, m))
    }
}

/// Build 1-2/1-3/1-4 lists of all owned atoms from the bond lists.
///
/// Serial helper: every bonded atom must be owned by this process.
pub fn build_special(atoms: &mut Atoms) -> Result<(), AtomsError> {
    let nlocal = atoms.nlocal;

    let mut adjacency: HashMap<Tag, BTreeSet<Tag>> = HashMap::new();

    for i in 0..nlocal {
        let ti = atoms.tag[i];
        adjacency.entry(ti).or_default();

        for &tj in atoms.bond_atom[i].iter() {
            match atoms.map(tj) {
                Some(j) if j < nlocal => {}
                _ => return Err(AtomsError::MissingAtom { tag: tj }),
            }

            adjacency.entry(ti).or_default().insert(tj);
            adjacency.entry(tj).or_default().insert(ti);
        }
    }

    let empty = BTreeSet::new();

    for i in 0..nlocal {
        let ti = atoms.tag[i];

        let onetwo: Vec<Tag> = adjacency[&ti].iter().copied().collect();

        let onethree: Vec<Tag> = onetwo
            .iter()
            .flat_map(|t| adjacency.get(t).unwrap_or(&empty).iter().copied())
            .filter(|&t| t != ti && !onetwo.contains(&t))
            .unique()
            .sorted()
            .collect();

        let onefour: Vec<Tag> = onethree
            .iter()
            .flat_map(|t| adjacency.get(t).unwrap_or(&empty).iter().copied())
            .filter(|&t| t != ti && !onetwo.contains(&t) && !onethree.contains(&t))
            .unique()
            .sorted()
            .collect();

        atoms.special[i] = SpecialList::new(onetwo, onethree, onefour);
    }

    Ok(())
}
