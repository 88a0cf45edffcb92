use crate::{DrudeError, DrudeTypes, ParticleRole, PartnerDiscovery, TopologyFault};

use atoms::{AtomColumn, Atoms, SpecialList, Tag};
use dwmpi::Comm;
use std::collections::HashMap;

/// Per-atom partner links of core/Drude pairs.
///
/// `drudeid[i]` is the tag of the partner of local atom `i` (the Drude
/// particle of a core, the core of a Drude particle), 0 for non-polarizable
/// atoms. The column is kept aligned with the atom arrays through the
/// `AtomColumn` hooks, which are its only mutation paths after discovery.
#[derive(Debug, Clone)]
pub struct PartnerRegistry {
    types: DrudeTypes,
    drudeid: Vec<Tag>,
    is_reduced: bool,
}

impl PartnerRegistry {
    pub fn new(types: DrudeTypes) -> PartnerRegistry {
        PartnerRegistry {
            types,
            drudeid: Vec::new(),
            is_reduced: false,
        }
    }

    pub fn get_types(&self) -> &DrudeTypes {
        &self.types
    }

    pub fn classify(&self, itype: usize) -> ParticleRole {
        self.types.role(itype)
    }

    pub fn role_of(&self, atoms: &Atoms, i: usize) -> ParticleRole {
        self.types.role(atoms.atom_type[i])
    }

    pub fn partner_of(&self, i: usize) -> Option<Tag> {
        match self.drudeid.get(i) {
            Some(&t) if t != 0 => Some(t),
            _ => None,
        }
    }

    pub fn get_drudeid(&self) -> &[Tag] {
        &self.drudeid
    }

    /// Local index of a tag, possibly a ghost image.
    pub fn lookup_local_index(&self, atoms: &Atoms, tag: Tag) -> Option<usize> {
        atoms.map(tag)
    }

    /// Copy of the partner of `i` nearest to `i`.
    pub fn partner_index(&self, atoms: &Atoms, i: usize) -> Result<Option<usize>, DrudeError> {
        match self.partner_of(i) {
            None => Ok(None),
            Some(partner) => atoms
                .closest_image_of_tag(i, partner)
                .map(Some)
                .ok_or(DrudeError::PartnerNotMapped {
                    tag: atoms.tag[i],
                    partner,
                }),
        }
    }

    pub fn is_reduced(&self) -> bool {
        self.is_reduced
    }

    pub fn set_reduced(&mut self, reduced: bool) {
        self.is_reduced = reduced;
    }

    /// Discover the partner of every polarizable local atom, owned and
    /// ghost, from the bonds stored across all processes.
    ///
    /// Collective: every process must call it. If any process detects a
    /// missing or ambiguous partner, every process returns an error; the
    /// detecting process returns the descriptive one. Returns the number of
    /// pairs whose core is owned here.
    pub fn build_partner_links(&mut self, atoms: &Atoms, comm: &dyn Comm) -> Result<usize, DrudeError> {
        let nall = atoms.get_nall();

        let mut discovery = PartnerDiscovery::new(nall);

        let bonds = PartnerDiscovery::bond_records(atoms);
        comm.ring_i64(&bonds, &mut |buf| discovery.absorb_bonds(atoms, &self.types, buf));

        discovery.index_watchers();

        let records = PartnerDiscovery::type_records(atoms, &self.types);
        comm.ring_i64(&records, &mut |buf| discovery.absorb_types(atoms, &self.types, buf));

        let (drudeid, faults) = discovery.resolve(atoms, &self.types);

        log::debug!(
            "rank {}: {} bond records, {} polarizable atoms, {} faults",
            comm.rank(),
            bonds.len() / 2,
            records.len() / 2,
            faults.len()
        );

        check_faults(faults, comm)?;

        self.grow(atoms.get_nmax().max(nall));
        self.drudeid[..nall].copy_from_slice(&drudeid);
        self.drudeid[nall..].iter_mut().for_each(|t| *t = 0);

        let npairs = (0..atoms.nlocal)
            .filter(|&i| self.role_of(atoms, i) == ParticleRole::Core)
            .count();

        let total = comm.all_sum_scalar_i64(npairs as i64);

        if comm.is_root() {
            log::info!("found {} core/Drude pairs", total);
        }

        Ok(npairs)
    }

    /// Whether every local atom with a partner present on this process is
    /// that partner's partner.
    pub fn is_symmetric(&self, atoms: &Atoms) -> bool {
        (0..atoms.get_nall()).all(|i| match self.partner_of(i) {
            None => true,
            Some(partner) => atoms
                .images(partner)
                .all(|j| self.partner_of(j) == Some(atoms.tag[i])),
        })
    }

    /// Rework the special lists so that each Drude particle shares the
    /// exclusions of its core.
    ///
    /// A Drude tag is removed from every list except its core's, then added
    /// at the level of its core wherever the core appears. Finally each Drude
    /// particle takes its core's list, with its own tag replaced by the core.
    /// Collective; requires `build_partner_links` to have run.
    pub fn rebuild_special(&self, atoms: &mut Atoms, comm: &dyn Comm) -> Result<(), DrudeError> {
        let nlocal = atoms.nlocal;

        // [drude, core] of every owned Drude particle
        let mut buf = Vec::new();
        for i in 0..nlocal {
            if self.role_of(atoms, i) == ParticleRole::Drude {
                if let Some(core) = self.partner_of(i) {
                    buf.push(atoms.tag[i]);
                    buf.push(core);
                }
            }
        }

        let mut core_of: HashMap<Tag, Tag> = HashMap::new();
        let mut drude_of: HashMap<Tag, Tag> = HashMap::new();

        comm.ring_i64(&buf, &mut |recv| {
            for rec in recv.chunks_exact(2) {
                core_of.insert(rec[0], rec[1]);
                drude_of.insert(rec[1], rec[0]);
            }
        });

        for i in 0..nlocal {
            let ti = atoms.tag[i];
            let special = &mut atoms.special[i];

            for level in 1..=3 {
                special
                    .level_mut(level)
                    .retain(|t| core_of.get(t).map_or(true, |&core| core == ti));
            }

            for level in 1..=3 {
                let added: Vec<Tag> = special
                    .level(level)
                    .iter()
                    .filter_map(|t| drude_of.get(t).copied())
                    .filter(|&d| d != ti && special.level_of(d) == 0)
                    .collect();

                special.level_mut(level).extend(added);
            }
        }

        // [core, drude, n12, n13, n14, tags...] of every owned core
        let mut buf = Vec::new();
        for i in 0..nlocal {
            if let Some(&drude) = drude_of.get(&atoms.tag[i]) {
                let special = &atoms.special[i];

                buf.push(atoms.tag[i]);
                buf.push(drude);

                for level in 1..=3 {
                    buf.push(special.level(level).len() as i64);
                }

                for level in 1..=3 {
                    buf.extend_from_slice(special.level(level));
                }
            }
        }

        let mut copies: HashMap<Tag, SpecialList> = HashMap::new();

        comm.ring_i64(&buf, &mut |recv| {
            let mut m = 0;

            while m + 5 <= recv.len() {
                let (core, drude) = (recv[m], recv[m + 1]);
                let counts = [recv[m + 2] as usize, recv[m + 3] as usize, recv[m + 4] as usize];
                m += 5;

                let mut special = SpecialList::default();

                for (level, &n) in counts.iter().enumerate() {
                    *special.level_mut(level + 1) = recv[m..m + n]
                        .iter()
                        .map(|&t| if t == drude { core } else { t })
                        .collect();
                    m += n;
                }

                copies.insert(drude, special);
            }
        });

        for i in 0..nlocal {
            if let Some(special) = copies.remove(&atoms.tag[i]) {
                atoms.special[i] = special;
            }
        }

        Ok(())
    }
}

fn check_faults(faults: Vec<TopologyFault>, comm: &dyn Comm) -> Result<(), DrudeError> {
    let nfaults = comm.all_sum_scalar_i64(faults.len() as i64);

    if nfaults == 0 {
        return Ok(());
    }

    for fault in faults.iter() {
        log::error!(
            "{:?} atom {} has {} bonded partner candidates {:?}",
            fault.role,
            fault.tag,
            fault.candidates.len(),
            fault.candidates
        );
    }

    match faults.into_iter().next() {
        Some(fault) => Err(fault.into()),
        None => Err(DrudeError::RemoteTopology { nfaults }),
    }
}

impl AtomColumn for PartnerRegistry {
    fn grow(&mut self, nmax: usize) {
        if nmax > self.drudeid.len() {
            self.drudeid.resize(nmax, 0);
        }
    }

    fn copy(&mut self, i: usize, j: usize, _delflag: bool) {
        self.drudeid[j] = self.drudeid[i];
    }

    fn pack_exchange(&self, i: usize, buf: &mut Vec<f64>) -> usize {
        buf.push(self.drudeid[i] as f64);
        1
    }

    fn unpack_exchange(&mut self, nlocal: usize, buf: &[f64]) -> usize {
        self.drudeid[nlocal] = buf[0] as Tag;
        1
    }

    fn pack_border(&self, list: &[usize], buf: &mut Vec<f64>) -> usize {
        buf.extend(list.iter().map(|&i| self.drudeid[i] as f64));
        list.len()
    }

    fn unpack_border(&mut self, n: usize, first: usize, buf: &[f64]) -> usize {
        for (k, &val) in buf[..n].iter().enumerate() {
            self.drudeid[first + k] = val as Tag;
        }
        n
    }
}
