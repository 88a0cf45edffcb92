//! Temperature of the thermal motion of core/Drude systems.
//!
//! The velocity of a Drude particle is measured relative to its core, so
//! the estimate sees the motion of the atoms and of the induced dipoles but
//! not the drift of a Drude particle carried along by its core.

use atoms::Atoms;
use drude::{DrudeError, ParticleRole, PartnerRegistry};
use dwconsts::Units;
use dwmpi::Comm;
use vector3::*;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TempDrudeError {
    #[error("temperature computed before setup")]
    NotSetUp,

    #[error("no velocity bias cached for atom {index}: the last compute cached {cached} atoms")]
    StaleBias { index: usize, cached: usize },

    #[error(transparent)]
    Drude(#[from] DrudeError),
}

/// A constraint or integrator that removes degrees of freedom from a group.
pub trait DofSource {
    fn dof(&self, groupbit: u32) -> f64;
}

#[derive(Debug, Clone)]
pub struct TempDrude {
    groupbit: u32,
    dimension: usize,

    boltz: f64,
    mvv2e: f64,

    extra_dof: f64,
    fix_dof: f64,
    dynamic: bool,

    dof: f64,
    tfactor: f64,
    is_setup: bool,

    // entries below nbias hold the bias of the last compute
    vbias: Vec<Vector3f64>,
    nbias: usize,

    scalar: f64,
    vector: [f64; 6],
}

impl TempDrude {
    pub fn new(groupbit: u32, dimension: usize, units: &Units) -> TempDrude {
        TempDrude {
            groupbit,
            dimension,
            boltz: units.get_boltz(),
            mvv2e: units.get_mvv2e(),
            extra_dof: dimension as f64,
            fix_dof: 0.0,
            dynamic: false,
            dof: 0.0,
            tfactor: 0.0,
            is_setup: false,
            vbias: Vec::new(),
            nbias: 0,
            scalar: 0.0,
            vector: [0.0; 6],
        }
    }

    pub fn set_extra_dof(&mut self, extra_dof: f64) {
        self.extra_dof = extra_dof;
    }

    pub fn set_dynamic(&mut self, dynamic: bool) {
        self.dynamic = dynamic;
    }

    pub fn get_dof(&self) -> f64 {
        self.dof
    }

    pub fn get_tfactor(&self) -> f64 {
        self.tfactor
    }

    pub fn get_scalar(&self) -> f64 {
        self.scalar
    }

    pub fn get_vector(&self) -> [f64; 6] {
        self.vector
    }

    /// Bias of owned atom `i` cached by the last compute.
    pub fn get_vbias(&self, i: usize) -> Option<Vector3f64> {
        self.vbias[..self.nbias].get(i).copied()
    }

    /// Gather the degrees of freedom removed by every source and count the
    /// atoms of the group.
    pub fn setup(&mut self, atoms: &Atoms, sources: &[&dyn DofSource], comm: &dyn Comm) {
        self.fix_dof = sources.iter().map(|s| s.dof(self.groupbit)).sum();
        self.dof_compute(atoms, comm);
        self.is_setup = true;
    }

    fn dof_compute(&mut self, atoms: &Atoms, comm: &dyn Comm) {
        let natoms = atoms.group_count(self.groupbit, comm);

        self.dof = self.dimension as f64 * natoms - self.extra_dof - self.fix_dof;

        self.tfactor = if self.dof > 0.0 {
            self.mvv2e / (self.dof * self.boltz)
        } else {
            0.0
        };

        log::debug!("temp/drude: {} atoms, {} degrees of freedom", natoms, self.dof);
    }

    // velocity of the core for a Drude particle, zero for any other atom
    fn refresh_bias(&mut self, atoms: &Atoms, registry: &PartnerRegistry) -> Result<(), TempDrudeError> {
        if !self.is_setup {
            return Err(TempDrudeError::NotSetUp);
        }

        self.nbias = 0;

        if self.vbias.len() < atoms.get_nmax() {
            self.vbias.resize(atoms.get_nmax(), Vector3f64::zeros());
        }

        for i in 0..atoms.nlocal {
            if atoms.mask[i] & self.groupbit == 0 {
                continue;
            }

            self.vbias[i] = match registry.role_of(atoms, i) {
                ParticleRole::Drude => match registry.partner_index(atoms, i)? {
                    Some(ic) => atoms.v[ic],
                    None => Vector3f64::zeros(),
                },
                _ => Vector3f64::zeros(),
            };
        }

        self.nbias = atoms.nlocal;

        Ok(())
    }

    fn check_bias(&self, atoms: &Atoms, i: usize) -> Result<(), TempDrudeError> {
        if i >= self.nbias || i >= atoms.nlocal {
            return Err(TempDrudeError::StaleBias {
                index: i,
                cached: self.nbias,
            });
        }

        Ok(())
    }

    // the cache must cover exactly the owned atoms
    fn check_bias_all(&self, atoms: &Atoms) -> Result<(), TempDrudeError> {
        if self.nbias != atoms.nlocal {
            return Err(TempDrudeError::StaleBias {
                index: self.nbias.min(atoms.nlocal),
                cached: self.nbias,
            });
        }

        Ok(())
    }

    /// Temperature of the group, bias removed.
    pub fn compute_scalar(&mut self, atoms: &Atoms, registry: &PartnerRegistry, comm: &dyn Comm) -> Result<f64, TempDrudeError> {
        self.refresh_bias(atoms, registry)?;

        let mut t = 0.0;

        for i in 0..atoms.nlocal {
            if atoms.mask[i] & self.groupbit != 0 {
                let vthermal = atoms.v[i] - self.vbias[i];
                t += atoms.mass_of(i) * vthermal.norm2_squared();
            }
        }

        let t = comm.all_sum_scalar_f64(t);

        if self.dynamic {
            self.dof_compute(atoms, comm);
        }

        self.scalar = t * self.tfactor;

        Ok(self.scalar)
    }

    /// Kinetic energy tensor of the group (xx, yy, zz, xy, xz, yz), bias removed.
    pub fn compute_vector(&mut self, atoms: &Atoms, registry: &PartnerRegistry, comm: &dyn Comm) -> Result<[f64; 6], TempDrudeError> {
        self.refresh_bias(atoms, registry)?;

        let mut t = [0.0; 6];

        for i in 0..atoms.nlocal {
            if atoms.mask[i] & self.groupbit != 0 {
                let vthermal = atoms.v[i] - self.vbias[i];
                let m = atoms.mass_of(i);

                for (tk, vk) in t.iter_mut().zip(vthermal.outer_voigt(&vthermal).iter()) {
                    *tk += m * vk;
                }
            }
        }

        let total = comm.all_sum_f64(&t);

        for (k, val) in total.iter().enumerate() {
            self.vector[k] = val * self.mvv2e;
        }

        Ok(self.vector)
    }

    /// Remove the bias cached by the last compute from owned atom `i`.
    pub fn remove_bias(&self, atoms: &mut Atoms, i: usize) -> Result<(), TempDrudeError> {
        self.check_bias(atoms, i)?;
        atoms.v[i] -= self.vbias[i];
        Ok(())
    }

    pub fn remove_bias_all(&self, atoms: &mut Atoms) -> Result<(), TempDrudeError> {
        self.check_bias_all(atoms)?;

        for i in 0..atoms.nlocal {
            if atoms.mask[i] & self.groupbit != 0 {
                atoms.v[i] -= self.vbias[i];
            }
        }

        Ok(())
    }

    pub fn restore_bias(&self, atoms: &mut Atoms, i: usize) -> Result<(), TempDrudeError> {
        self.check_bias(atoms, i)?;
        atoms.v[i] += self.vbias[i];
        Ok(())
    }

    pub fn restore_bias_all(&self, atoms: &mut Atoms) -> Result<(), TempDrudeError> {
        self.check_bias_all(atoms)?;

        for i in 0..atoms.nlocal {
            if atoms.mask[i] & self.groupbit != 0 {
                atoms.v[i] += self.vbias[i];
            }
        }

        Ok(())
    }
}
