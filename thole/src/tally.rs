use dwmpi::Comm;
use vector3::*;

/// Coulomb energy and virial accumulated by one pair evaluation.
///
/// Virial components are ordered xx, yy, zz, xy, xz, yz.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyVirial {
    pub eng_coul: f64,
    pub virial: [f64; 6],
}

impl EnergyVirial {
    pub fn new() -> EnergyVirial {
        EnergyVirial::default()
    }

    /// Add the contribution of pair (i, j). Without newton_pair a pair with
    /// a ghost is evaluated by both owners, so each owned side counts half.
    #[allow(clippy::too_many_arguments)]
    pub fn tally(
        &mut self,
        i: usize,
        j: usize,
        nlocal: usize,
        newton_pair: bool,
        eflag: bool,
        vflag: bool,
        ecoul: f64,
        fpair: f64,
        del: Vector3f64,
    ) {
        let weight = if newton_pair {
            1.0
        } else {
            0.5 * ((i < nlocal) as u8 + (j < nlocal) as u8) as f64
        };

        if eflag {
            self.eng_coul += weight * ecoul;
        }

        if vflag {
            let v = del.outer_voigt(&del);

            for (acc, vk) in self.virial.iter_mut().zip(v.iter()) {
                *acc += weight * vk * fpair;
            }
        }
    }

    /// Totals over all processes.
    pub fn all_sum(&self, comm: &dyn Comm) -> EnergyVirial {
        let mut local = vec![self.eng_coul];
        local.extend_from_slice(&self.virial);

        let total = comm.all_sum_f64(&local);

        let mut virial = [0.0; 6];
        virial.copy_from_slice(&total[1..7]);

        EnergyVirial {
            eng_coul: total[0],
            virial,
        }
    }
}
