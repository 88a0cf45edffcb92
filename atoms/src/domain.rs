use crate::{AtomColumn, Atoms, AtomsError};

use vector3::*;

// Orthogonal simulation box with per-dimension periodicity.
#[derive(Debug, Clone)]
pub struct Domain {
    lo: Vector3f64,
    hi: Vector3f64,
    periodic: [bool; 3],
    dimension: usize,
}

impl Domain {
    pub fn new(lo: Vector3f64, hi: Vector3f64, periodic: [bool; 3], dimension: usize) -> Domain {
        Domain {
            lo,
            hi,
            periodic,
            dimension,
        }
    }

    pub fn get_lo(&self) -> Vector3f64 {
        self.lo
    }

    pub fn get_hi(&self) -> Vector3f64 {
        self.hi
    }

    pub fn get_dimension(&self) -> usize {
        self.dimension
    }

    pub fn prd(&self) -> Vector3f64 {
        self.hi - self.lo
    }

    pub fn volume(&self) -> f64 {
        let prd = self.prd();

        if self.dimension == 2 {
            prd.x * prd.y
        } else {
            prd.x * prd.y * prd.z
        }
    }

    /// Shortest periodic representative of a separation vector.
    pub fn minimum_image(&self, mut d: Vector3f64) -> Vector3f64 {
        let prd = self.prd();

        for idim in 0..3 {
            if !self.periodic[idim] {
                continue;
            }

            let l = prd.get(idim);
            let mut c = d.get(idim);

            if c.abs() > 0.5 * l {
                c -= l * (c / l).round();
            }

            d.set(idim, c);
        }

        d
    }

    /// Wrap a position back into the box along periodic dimensions.
    pub fn remap(&self, mut x: Vector3f64) -> Vector3f64 {
        let prd = self.prd();

        for idim in 0..3 {
            if !self.periodic[idim] {
                continue;
            }

            let lo = self.lo.get(idim);
            let l = prd.get(idim);
            let c = x.get(idim) - lo;

            x.set(idim, lo + c - l * (c / l).floor());
        }

        x
    }

    fn image_shifts(&self) -> Vec<Vector3f64> {
        let prd = self.prd();

        let range = |idim: usize| -> Vec<i32> {
            if self.periodic[idim] && idim < self.dimension {
                vec![-1, 0, 1]
            } else {
                vec![0]
            }
        };

        let mut shifts = Vec::new();

        for ix in range(0) {
            for iy in range(1) {
                for iz in range(2) {
                    if ix == 0 && iy == 0 && iz == 0 {
                        continue;
                    }

                    shifts.push(Vector3f64::new(
                        ix as f64 * prd.x,
                        iy as f64 * prd.y,
                        iz as f64 * prd.z,
                    ));
                }
            }
        }

        shifts
    }

    /// Rebuild the periodic ghost images of the owned atoms within `cutoff`
    /// of the box, carrying every extra column along. Single-process host.
    pub fn borders(
        &self,
        atoms: &mut Atoms,
        cutoff: f64,
        columns: &mut [&mut dyn AtomColumn],
    ) -> Result<usize, AtomsError> {
        atoms.clear_ghosts();

        let lo = self.lo - Vector3f64::new(cutoff, cutoff, cutoff);
        let hi = self.hi + Vector3f64::new(cutoff, cutoff, cutoff);

        let inside = |p: Vector3f64| -> bool {
            (0..3).all(|idim| p.get(idim) >= lo.get(idim) && p.get(idim) < hi.get(idim))
        };

        for shift in self.image_shifts() {
            let list: Vec<usize> = (0..atoms.nlocal)
                .filter(|&i| inside(atoms.x[i] + shift))
                .collect();

            if list.is_empty() {
                continue;
            }

            let buf = atoms.pack_border(&list, shift, columns);
            atoms.unpack_border(list.len(), &buf, columns)?;
        }

        log::debug!("{} ghost images within {} of the box", atoms.nghost, cutoff);

        Ok(atoms.nghost)
    }

    /// Fold forces accumulated on ghost images back onto their owners.
    pub fn reverse_comm_forces(&self, atoms: &mut Atoms) {
        for j in atoms.nlocal..atoms.get_nall() {
            if let Some(i) = atoms.map(atoms.tag[j]) {
                if i < atoms.nlocal {
                    let fj = atoms.f[j];
                    atoms.f[i] += fj;
                }
            }

            atoms.f[j].set_zeros();
        }
    }
}
