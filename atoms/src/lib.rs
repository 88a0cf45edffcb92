//! Per-atom storage of one process of a spatially decomposed run.
//!
//! Atoms `0..nlocal` are owned by this process, atoms `nlocal..nlocal+nghost`
//! are ghost copies of atoms owned elsewhere (or periodic images of owned
//! atoms). Local indices are not stable: they change whenever atoms migrate,
//! are sorted or ghosts are rebuilt. The global tag is the stable identity.
//!
//! Extra per-atom data owned by other components travels with the atoms
//! through the `AtomColumn` hooks, which every reallocation, copy, exchange
//! and border operation below invokes in lock-step with the standard arrays.

mod domain;
mod error;
mod neighbor;
mod special;

pub use domain::*;
pub use error::*;
pub use neighbor::*;
pub use special::*;

use dwmpi::Comm;
use vector3::*;

use std::collections::HashMap;

pub type Tag = i64;

pub const GROUP_ALL_BIT: u32 = 1;

const MAX_GROUPS: usize = 32;
const DELTA: usize = 16;

/// Hooks through which a component keeps its own per-atom column aligned
/// with the atom arrays.
pub trait AtomColumn {
    /// Make room for `nmax` atoms.
    fn grow(&mut self, nmax: usize);

    /// Copy the value of atom `i` into slot `j`. `delflag` is set when `j`
    /// is being overwritten because the atom there was deleted.
    fn copy(&mut self, i: usize, j: usize, delflag: bool);

    /// Append the values of atom `i` for migration; returns the count.
    fn pack_exchange(&self, i: usize, buf: &mut Vec<f64>) -> usize;

    /// Read the values of a migrated atom now stored at `nlocal`; returns
    /// the count consumed.
    fn unpack_exchange(&mut self, nlocal: usize, buf: &[f64]) -> usize;

    /// Append the values of the atoms in `list` for ghost replication.
    fn pack_border(&self, list: &[usize], buf: &mut Vec<f64>) -> usize;

    /// Read the values of `n` ghosts stored from index `first` on.
    fn unpack_border(&mut self, n: usize, first: usize, buf: &[f64]) -> usize;
}

#[derive(Debug, Default)]
pub struct Atoms {
    pub nlocal: usize,
    pub nghost: usize,
    pub ntypes: usize,

    pub tag: Vec<Tag>,
    pub atom_type: Vec<usize>,
    pub mask: Vec<u32>,
    pub x: Vec<Vector3f64>,
    pub v: Vec<Vector3f64>,
    pub f: Vec<Vector3f64>,

    pub q: Option<Vec<f64>>,     // None when the charge attribute is disabled
    pub rmass: Option<Vec<f64>>, // None when masses are per type
    pub mass: Vec<f64>,          // per type, index 0 unused

    // owned atoms only; bonds are stored once, on one of the two atoms
    pub bond_atom: Vec<Vec<Tag>>,
    pub special: Vec<SpecialList>,

    nmax: usize,

    groups: Vec<String>,
    group_types: Vec<Option<Vec<usize>>>,

    map: HashMap<Tag, usize>,
    sametag: Vec<Option<usize>>,
}

impl Atoms {
    pub fn new(ntypes: usize, q_flag: bool, rmass_flag: bool) -> Atoms {
        Atoms {
            ntypes,
            q: if q_flag { Some(Vec::new()) } else { None },
            rmass: if rmass_flag { Some(Vec::new()) } else { None },
            mass: vec![0.0; ntypes + 1],
            groups: vec!["all".to_string()],
            group_types: vec![None],
            ..Default::default()
        }
    }

    pub fn get_nall(&self) -> usize {
        self.nlocal + self.nghost
    }

    pub fn get_nmax(&self) -> usize {
        self.nmax
    }

    pub fn has_charge(&self) -> bool {
        self.q.is_some()
    }

    pub fn set_mass(&mut self, itype: usize, m: f64) -> Result<(), AtomsError> {
        self.check_type(itype)?;
        self.mass[itype] = m;
        Ok(())
    }

    /// Mass of atom `i`, per atom if enabled, otherwise per type.
    pub fn mass_of(&self, i: usize) -> f64 {
        match &self.rmass {
            Some(rmass) => rmass[i],
            None => self.mass[self.atom_type[i]],
        }
    }

    pub fn charge_of(&self, i: usize) -> Option<f64> {
        self.q.as_ref().map(|q| q[i])
    }

    fn check_type(&self, itype: usize) -> Result<(), AtomsError> {
        if itype == 0 || itype > self.ntypes {
            return Err(AtomsError::UnknownType {
                itype,
                ntypes: self.ntypes,
            });
        }
        Ok(())
    }

    ///////////////////////////////////////////////////
    // reallocation

    /// Resize every per-atom array, and every extra column, to `nmax`.
    pub fn grow(&mut self, nmax: usize, columns: &mut [&mut dyn AtomColumn]) {
        if nmax <= self.nmax {
            return;
        }

        self.tag.resize(nmax, 0);
        self.atom_type.resize(nmax, 0);
        self.mask.resize(nmax, 0);
        self.x.resize(nmax, Vector3f64::zeros());
        self.v.resize(nmax, Vector3f64::zeros());
        self.f.resize(nmax, Vector3f64::zeros());

        if let Some(q) = self.q.as_mut() {
            q.resize(nmax, 0.0);
        }

        if let Some(rmass) = self.rmass.as_mut() {
            rmass.resize(nmax, 0.0);
        }

        self.bond_atom.resize(nmax, Vec::new());
        self.special.resize(nmax, SpecialList::default());
        self.sametag.resize(nmax, None);

        for col in columns.iter_mut() {
            col.grow(nmax);
        }

        log::debug!("atom arrays grown to {}", nmax);

        self.nmax = nmax;
    }

    fn ensure_room(&mut self, n: usize, columns: &mut [&mut dyn AtomColumn]) {
        let need = self.get_nall() + n;

        if need > self.nmax {
            let nmax = need.max(2 * self.nmax).max(DELTA);
            self.grow(nmax, columns);
        }
    }

    ///////////////////////////////////////////////////
    // creation, copy and deletion of owned atoms

    pub fn add_atom(
        &mut self,
        tag: Tag,
        itype: usize,
        x: Vector3f64,
        v: Vector3f64,
        q: f64,
        columns: &mut [&mut dyn AtomColumn],
    ) -> Result<usize, AtomsError> {
        if self.nghost > 0 {
            return Err(AtomsError::GhostsPresent("adding atoms"));
        }

        self.check_type(itype)?;
        self.ensure_room(1, columns);

        let i = self.nlocal;

        self.tag[i] = tag;
        self.atom_type[i] = itype;
        self.mask[i] = self.type_group_mask(itype);
        self.x[i] = x;
        self.v[i] = v;
        self.f[i] = Vector3f64::zeros();

        if let Some(qs) = self.q.as_mut() {
            qs[i] = q;
        }

        if let Some(rmass) = self.rmass.as_mut() {
            rmass[i] = self.mass[itype];
        }

        self.bond_atom[i].clear();
        self.special[i] = SpecialList::default();

        self.nlocal += 1;

        self.sametag[i] = None;
        self.map.entry(tag).or_insert(i);

        Ok(i)
    }

    pub fn add_bond(&mut self, i: usize, partner: Tag) {
        self.bond_atom[i].push(partner);
    }

    /// Copy every field of atom `i` into slot `j`.
    pub fn copy_atom(&mut self, i: usize, j: usize, delflag: bool, columns: &mut [&mut dyn AtomColumn]) {
        self.tag[j] = self.tag[i];
        self.atom_type[j] = self.atom_type[i];
        self.mask[j] = self.mask[i];
        self.x[j] = self.x[i];
        self.v[j] = self.v[i];
        self.f[j] = self.f[i];

        if let Some(q) = self.q.as_mut() {
            q[j] = q[i];
        }

        if let Some(rmass) = self.rmass.as_mut() {
            rmass[j] = rmass[i];
        }

        self.bond_atom[j] = self.bond_atom[i].clone();
        self.special[j] = self.special[i].clone();

        for col in columns.iter_mut() {
            col.copy(i, j, delflag);
        }
    }

    /// Remove owned atom `i` by moving the last owned atom into its slot.
    pub fn delete_local(&mut self, i: usize, columns: &mut [&mut dyn AtomColumn]) -> Result<(), AtomsError> {
        if i >= self.nlocal {
            return Err(AtomsError::IndexOutOfRange {
                index: i,
                nlocal: self.nlocal,
            });
        }

        if self.nghost > 0 {
            return Err(AtomsError::GhostsPresent("deleting atoms"));
        }

        let last = self.nlocal - 1;

        if i != last {
            self.copy_atom(last, i, true, columns);
        }

        self.nlocal -= 1;
        self.map_set();

        Ok(())
    }

    ///////////////////////////////////////////////////
    // migration between processes

    /// Serialize owned atom `i` with all its columns for migration.
    pub fn pack_exchange(&self, i: usize, columns: &[&mut dyn AtomColumn]) -> Vec<f64> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&self.x[i].to_array());
        buf.extend_from_slice(&self.v[i].to_array());
        buf.push(self.tag[i] as f64);
        buf.push(self.atom_type[i] as f64);
        buf.push(self.mask[i] as f64);

        if let Some(q) = self.q.as_ref() {
            buf.push(q[i]);
        }

        if let Some(rmass) = self.rmass.as_ref() {
            buf.push(rmass[i]);
        }

        buf.push(self.bond_atom[i].len() as f64);
        buf.extend(self.bond_atom[i].iter().map(|&t| t as f64));

        self.special[i].pack(&mut buf);

        for col in columns.iter() {
            col.pack_exchange(i, &mut buf);
        }

        buf
    }

    /// Append a migrated atom as a new owned atom; returns its local index.
    pub fn unpack_exchange(&mut self, buf: &[f64], columns: &mut [&mut dyn AtomColumn]) -> Result<usize, AtomsError> {
        if self.nghost > 0 {
            return Err(AtomsError::GhostsPresent("unpacking migrated atoms"));
        }

        let nfixed = 9 + self.q.is_some() as usize + self.rmass.is_some() as usize + 1;

        if buf.len() < nfixed {
            return Err(AtomsError::TruncatedBuffer {
                needed: nfixed,
                found: buf.len(),
            });
        }

        self.ensure_room(1, columns);

        let i = self.nlocal;
        let mut m = 0;

        self.x[i] = Vector3f64::from_slice(&buf[m..m + 3]);
        m += 3;
        self.v[i] = Vector3f64::from_slice(&buf[m..m + 3]);
        m += 3;
        self.tag[i] = buf[m] as Tag;
        self.atom_type[i] = buf[m + 1] as usize;
        self.mask[i] = buf[m + 2] as u32;
        m += 3;
        self.f[i] = Vector3f64::zeros();

        if let Some(q) = self.q.as_mut() {
            q[i] = buf[m];
            m += 1;
        }

        if let Some(rmass) = self.rmass.as_mut() {
            rmass[i] = buf[m];
            m += 1;
        }

        let nbond = buf[m] as usize;
        m += 1;

        if buf.len() < m + nbond {
            return Err(AtomsError::TruncatedBuffer {
                needed: m + nbond,
                found: buf.len(),
            });
        }

        self.bond_atom[i] = buf[m..m + nbond].iter().map(|&t| t as Tag).collect();
        m += nbond;

        let (special, n) = SpecialList::unpack(&buf[m..])?;
        self.special[i] = special;
        m += n;

        for col in columns.iter_mut() {
            m += col.unpack_exchange(i, &buf[m..]);
        }

        self.nlocal += 1;
        self.map_set();

        Ok(i)
    }

    ///////////////////////////////////////////////////
    // ghost replication

    pub fn clear_ghosts(&mut self) {
        self.nghost = 0;
        self.map_set();
    }

    const BORDER_FIXED: usize = 9;

    fn border_size(&self) -> usize {
        Self::BORDER_FIXED + self.q.is_some() as usize + self.rmass.is_some() as usize
    }

    /// Serialize the atoms in `list` as ghosts displaced by `shift`.
    pub fn pack_border(&self, list: &[usize], shift: Vector3f64, columns: &[&mut dyn AtomColumn]) -> Vec<f64> {
        let mut buf = Vec::with_capacity(list.len() * self.border_size());

        for &i in list.iter() {
            buf.extend_from_slice(&(self.x[i] + shift).to_array());
            buf.extend_from_slice(&self.v[i].to_array());
            buf.push(self.tag[i] as f64);
            buf.push(self.atom_type[i] as f64);
            buf.push(self.mask[i] as f64);

            if let Some(q) = self.q.as_ref() {
                buf.push(q[i]);
            }

            if let Some(rmass) = self.rmass.as_ref() {
                buf.push(rmass[i]);
            }
        }

        for col in columns.iter() {
            col.pack_border(list, &mut buf);
        }

        buf
    }

    /// Append `n` ghosts from a border buffer; returns the index of the first.
    pub fn unpack_border(&mut self, n: usize, buf: &[f64], columns: &mut [&mut dyn AtomColumn]) -> Result<usize, AtomsError> {
        let size = self.border_size();

        if buf.len() < n * size {
            return Err(AtomsError::TruncatedBuffer {
                needed: n * size,
                found: buf.len(),
            });
        }

        self.ensure_room(n, columns);

        let first = self.get_nall();
        let mut m = 0;

        for i in first..first + n {
            self.x[i] = Vector3f64::from_slice(&buf[m..m + 3]);
            self.v[i] = Vector3f64::from_slice(&buf[m + 3..m + 6]);
            self.tag[i] = buf[m + 6] as Tag;
            self.atom_type[i] = buf[m + 7] as usize;
            self.mask[i] = buf[m + 8] as u32;
            self.f[i] = Vector3f64::zeros();
            m += Self::BORDER_FIXED;

            if let Some(q) = self.q.as_mut() {
                q[i] = buf[m];
                m += 1;
            }

            if let Some(rmass) = self.rmass.as_mut() {
                rmass[i] = buf[m];
                m += 1;
            }
        }

        for col in columns.iter_mut() {
            m += col.unpack_border(n, first, &buf[m..]);
        }

        self.nghost += n;
        self.map_set();

        Ok(first)
    }

    ///////////////////////////////////////////////////
    // tag map and periodic images

    /// Rebuild the tag map. Owned atoms take precedence over ghosts: the map
    /// points at the lowest index holding a tag, `sametag` chains the rest.
    pub fn map_set(&mut self) {
        let nall = self.get_nall();

        self.map.clear();

        for i in (0..nall).rev() {
            self.sametag[i] = self.map.insert(self.tag[i], i);
        }
    }

    pub fn map(&self, tag: Tag) -> Option<usize> {
        self.map.get(&tag).copied()
    }

    pub fn sametag(&self, i: usize) -> Option<usize> {
        self.sametag[i]
    }

    /// Every local index holding `tag`, owned copy first.
    pub fn images(&self, tag: Tag) -> Images<'_> {
        Images {
            atoms: self,
            next: self.map(tag),
        }
    }

    /// The copy of atom `j` (any image) nearest to atom `i`.
    pub fn closest_image(&self, i: usize, j: usize) -> usize {
        let xi = self.x[i];

        let mut closest = j;
        let mut rsqmin = (xi - self.x[j]).norm2_squared();

        let mut next = self.sametag[j];

        while let Some(k) = next {
            let rsq = (xi - self.x[k]).norm2_squared();

            if rsq < rsqmin {
                rsqmin = rsq;
                closest = k;
            }

            next = self.sametag[k];
        }

        closest
    }

    pub fn closest_image_of_tag(&self, i: usize, tag: Tag) -> Option<usize> {
        self.map(tag).map(|j| self.closest_image(i, j))
    }

    ///////////////////////////////////////////////////
    // groups

    pub fn define_group_by_types(&mut self, name: &str, types: &[usize]) -> Result<u32, AtomsError> {
        if self.groups.iter().any(|g| g == name) {
            return Err(AtomsError::DuplicateGroup(name.to_string()));
        }

        if self.groups.len() == MAX_GROUPS {
            return Err(AtomsError::TooManyGroups(MAX_GROUPS));
        }

        for &t in types.iter() {
            self.check_type(t)?;
        }

        let bit = 1u32 << self.groups.len();

        self.groups.push(name.to_string());
        self.group_types.push(Some(types.to_vec()));

        for i in 0..self.get_nall() {
            if types.contains(&self.atom_type[i]) {
                self.mask[i] |= bit;
            }
        }

        Ok(bit)
    }

    pub fn group_bit(&self, name: &str) -> Option<u32> {
        self.groups
            .iter()
            .position(|g| g == name)
            .map(|idx| 1u32 << idx)
    }

    fn type_group_mask(&self, itype: usize) -> u32 {
        let mut mask = GROUP_ALL_BIT;

        for (idx, types) in self.group_types.iter().enumerate() {
            if let Some(types) = types {
                if types.contains(&itype) {
                    mask |= 1u32 << idx;
                }
            }
        }

        mask
    }

    /// Number of owned atoms in the group, summed over all processes.
    pub fn group_count(&self, groupbit: u32, comm: &dyn Comm) -> f64 {
        let n = self.mask[..self.nlocal]
            .iter()
            .filter(|&&m| m & groupbit != 0)
            .count();

        comm.all_sum_scalar_f64(n as f64)
    }
}

pub struct Images<'a> {
    atoms: &'a Atoms,
    next: Option<usize>,
}

impl<'a> Iterator for Images<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let cur = self.next?;
        self.next = self.atoms.sametag[cur];
        Some(cur)
    }
}

#[cfg(test)]
mod tests;
