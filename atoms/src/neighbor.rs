use crate::Atoms;

/// Bits of a neighbor index above `SBBITS` carry the special level.
pub const SBBITS: u32 = 30;
pub const NEIGHMASK: usize = 0x3FFF_FFFF;

/// Special level (0 for none, 1..=3 for 1-2/1-3/1-4) encoded in a neighbor entry.
#[inline]
pub fn sbmask(j: usize) -> usize {
    (j >> SBBITS) & 3
}

#[derive(Debug, Default, Clone)]
pub struct NeighborList {
    ilist: Vec<usize>,
    firstneigh: Vec<Vec<usize>>,
}

impl NeighborList {
    pub fn new(ilist: Vec<usize>, firstneigh: Vec<Vec<usize>>) -> NeighborList {
        NeighborList { ilist, firstneigh }
    }

    pub fn inum(&self) -> usize {
        self.ilist.len()
    }

    pub fn get_ilist(&self) -> &[usize] {
        &self.ilist
    }

    /// Raw neighbor entries of the `ii`-th listed atom, special bits included.
    pub fn get_neighbors(&self, ii: usize) -> &[usize] {
        &self.firstneigh[ii]
    }

    pub fn total_neighbors(&self) -> usize {
        self.firstneigh.iter().map(|n| n.len()).sum()
    }

    /// Half list over all pairs within `cutoff` by direct search.
    ///
    /// Owned pairs are stored once. With `newton_pair` an owned/ghost pair is
    /// stored only when the ghost lies above the owned atom (z, then y, then
    /// x), otherwise every owned/ghost pair is stored. Pairs of two copies of
    /// the same atom are never stored.
    pub fn build_half(atoms: &Atoms, cutoff: f64, newton_pair: bool) -> NeighborList {
        let nlocal = atoms.nlocal;
        let nall = atoms.get_nall();
        let cutsq = cutoff * cutoff;

        let mut ilist = Vec::with_capacity(nlocal);
        let mut firstneigh = Vec::with_capacity(nlocal);

        for i in 0..nlocal {
            let xi = atoms.x[i];
            let mut neighs = Vec::new();

            for j in (i + 1)..nall {
                if atoms.tag[j] == atoms.tag[i] {
                    continue;
                }

                let xj = atoms.x[j];

                if j >= nlocal && newton_pair {
                    let above = if xj.z != xi.z {
                        xj.z > xi.z
                    } else if xj.y != xi.y {
                        xj.y > xi.y
                    } else {
                        xj.x > xi.x
                    };

                    if !above {
                        continue;
                    }
                }

                if (xi - xj).norm2_squared() >= cutsq {
                    continue;
                }

                let level = atoms.special[i].level_of(atoms.tag[j]);

                neighs.push(j | (level << SBBITS));
            }

            ilist.push(i);
            firstneigh.push(neighs);
        }

        log::debug!(
            "half neighbor list: {} atoms, {} pairs",
            ilist.len(),
            firstneigh.iter().map(|n: &Vec<usize>| n.len()).sum::<usize>()
        );

        NeighborList { ilist, firstneigh }
    }
}
