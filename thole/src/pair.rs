use crate::{EnergyVirial, PairTable, TholeError};

use atoms::{sbmask, Atoms, NeighborList, NEIGHMASK};
use drude::{DrudeError, ParticleRole, PartnerRegistry};
use dwconsts::*;

/// Force-field constants the kernel reads from the host.
#[derive(Debug, Clone, Copy)]
pub struct PairContext {
    pub qqrd2e: f64,
    pub special_coul: [f64; 4], // index 0 for ordinary pairs
    pub newton_pair: bool,
}

impl PairContext {
    pub fn new(qqrd2e: f64, special_coul: [f64; 3], newton_pair: bool) -> PairContext {
        PairContext {
            qqrd2e,
            special_coul: [1.0, special_coul[0], special_coul[1], special_coul[2]],
            newton_pair,
        }
    }
}

/// Force and energy prefactors of the Thole damping at distance `r`, with
/// the share already counted by the ordinary Coulomb interaction removed.
pub fn thole_factors(a_screen: f64, r: f64, factor_coul: f64) -> (f64, f64) {
    let ar = a_screen * r;
    let exp_ar = (-ar).exp();

    let factor_f = 0.5 * (2.0 + exp_ar * (-2.0 - ar * (2.0 + ar))) - factor_coul;
    let factor_e = 0.5 * (2.0 - exp_ar * (2.0 + ar)) - factor_coul;

    (factor_f, factor_e)
}

/// Thole-screened Coulomb interaction between induced dipoles.
///
/// Only core and Drude particles interact, and never with their own partner.
/// The charge of a Drude particle is its own, the charge of a core is minus
/// that of its Drude particle.
#[derive(Debug, Clone)]
pub struct PairThole {
    ntypes: usize,

    thole_global: f64,
    cut_global: f64,

    setflag: PairTable<bool>,
    polar: PairTable<f64>,
    thole: PairTable<f64>,
    cut: PairTable<f64>,
    cutsq: PairTable<f64>,
    scale: PairTable<f64>,

    cut_max: f64,
    initialized: bool,
}

impl PairThole {
    pub fn new(ntypes: usize) -> PairThole {
        PairThole {
            ntypes,
            thole_global: 0.0,
            cut_global: 0.0,
            setflag: PairTable::new(ntypes, false),
            polar: PairTable::new(ntypes, 0.0),
            thole: PairTable::new(ntypes, 0.0),
            cut: PairTable::new(ntypes, 0.0),
            cutsq: PairTable::new(ntypes, 0.0),
            scale: PairTable::new(ntypes, 1.0),
            cut_max: 0.0,
            initialized: false,
        }
    }

    pub fn get_thole_global(&self) -> f64 {
        self.thole_global
    }

    pub fn get_cut_global(&self) -> f64 {
        self.cut_global
    }

    pub fn get_cut_max(&self) -> f64 {
        self.cut_max
    }

    pub fn is_set(&self, itype: usize, jtype: usize) -> bool {
        self.setflag.get(itype, jtype)
    }

    /// `thole_global cut_global`. Pairs set before keep their polarizability
    /// but take the new global damping and cutoff.
    pub fn settings(&mut self, args: &[&str]) -> Result<(), TholeError> {
        if args.len() != 2 {
            return Err(TholeError::IllegalArguments(format!(
                "expected 'thole_global cut_global', found {} argument(s)",
                args.len()
            )));
        }

        self.thole_global = numeric(args[0])?;
        self.cut_global = numeric(args[1])?;

        for i in 1..=self.ntypes {
            for j in (i + 1)..=self.ntypes {
                if self.setflag.get(i, j) {
                    self.thole.set(i, j, self.thole_global);
                    self.cut.set(i, j, self.cut_global);
                }
            }
        }

        self.initialized = false;

        Ok(())
    }

    /// `I J polar [thole [cut]]`, where `I` and `J` are type bounds.
    pub fn coeff(&mut self, args: &[&str]) -> Result<(), TholeError> {
        if args.len() < 3 || args.len() > 5 {
            return Err(TholeError::IncorrectCoeffArgs(format!(
                "expected 'I J polar [thole [cut]]', found {} argument(s)",
                args.len()
            )));
        }

        let (ilo, ihi) = bounds(args[0], self.ntypes)?;
        let (jlo, jhi) = bounds(args[1], self.ntypes)?;

        let polar_one = numeric(args[2])?;

        let thole_one = match args.get(3) {
            Some(s) => numeric(s)?,
            None => self.thole_global,
        };

        let cut_one = match args.get(4) {
            Some(s) => numeric(s)?,
            None => self.cut_global,
        };

        let mut count = 0;

        for i in ilo..=ihi {
            for j in jlo.max(i)..=jhi {
                self.polar.set(i, j, polar_one);
                self.thole.set(i, j, thole_one);
                self.cut.set(i, j, cut_one);
                self.scale.set(i, j, 1.0);
                self.setflag.set(i, j, true);
                count += 1;
            }
        }

        if count == 0 {
            return Err(TholeError::IncorrectCoeffArgs(format!(
                "no type pair selected by '{} {}'",
                args[0], args[1]
            )));
        }

        self.initialized = false;

        Ok(())
    }

    pub fn init_style(&self, atoms: &Atoms) -> Result<(), TholeError> {
        if !atoms.has_charge() {
            return Err(TholeError::MissingCharge);
        }

        Ok(())
    }

    /// Complete and symmetrize the coefficients of pair (i, j), i <= j.
    /// Returns its cutoff.
    pub fn init_one(&mut self, i: usize, j: usize) -> Result<f64, TholeError> {
        if !self.setflag.get(i, j) {
            if !self.setflag.get(i, i) || !self.setflag.get(j, j) {
                return Err(TholeError::CoeffsNotSet { itype: i, jtype: j });
            }

            self.thole
                .set(i, j, 0.5 * (self.thole.get(i, i) + self.thole.get(j, j)));
            self.polar
                .set(i, j, (self.polar.get(i, i) * self.polar.get(j, j)).sqrt());
            self.cut
                .set(i, j, (self.cut.get(i, i) * self.cut.get(j, j)).sqrt());
            self.scale.set(i, j, 1.0);
        }

        self.polar.mirror(i, j);
        self.thole.mirror(i, j);
        self.scale.mirror(i, j);
        self.cut.mirror(i, j);

        let cut = self.cut.get(i, j);

        self.cutsq.set(i, j, cut * cut);
        self.cutsq.mirror(i, j);

        Ok(cut)
    }

    /// Check the host and complete every pair. Returns the largest cutoff.
    pub fn init(&mut self, atoms: &Atoms) -> Result<f64, TholeError> {
        self.init_style(atoms)?;

        let mut cut_max: f64 = 0.0;

        for i in 1..=self.ntypes {
            for j in i..=self.ntypes {
                cut_max = cut_max.max(self.init_one(i, j)?);
            }
        }

        self.cut_max = cut_max;
        self.initialized = true;

        log::debug!("pair thole initialized, largest cutoff {}", cut_max);

        Ok(cut_max)
    }

    /// Accumulate forces on `atoms.f`; returns the energy and virial of
    /// this process when requested.
    pub fn compute(
        &self,
        atoms: &mut Atoms,
        registry: &PartnerRegistry,
        list: &NeighborList,
        ctx: &PairContext,
        eflag: bool,
        vflag: bool,
    ) -> Result<EnergyVirial, TholeError> {
        if !self.initialized {
            return Err(TholeError::NotInitialized);
        }

        let nlocal = atoms.nlocal;
        let mut ev = EnergyVirial::new();

        for (ii, &i) in list.get_ilist().iter().enumerate() {
            if !registry.role_of(atoms, i).is_polarizable() {
                continue;
            }

            let di = partner_image(atoms, registry, i)?;
            let qi = dipole_charge(atoms, registry, i)?;

            let xi = atoms.x[i];
            let itype = atoms.atom_type[i];

            for &jraw in list.get_neighbors(ii) {
                let factor_coul = ctx.special_coul[sbmask(jraw)];
                let j = jraw & NEIGHMASK;

                if !registry.role_of(atoms, j).is_polarizable() || j == di {
                    continue;
                }

                let qj = dipole_charge(atoms, registry, j)?;

                let del = xi - atoms.x[j];
                let rsq = del.norm2_squared();
                let jtype = atoms.atom_type[j];

                if rsq >= self.cutsq.get(itype, jtype) {
                    continue;
                }

                let (fpair, ecoul) = self.pair_terms(itype, jtype, rsq, factor_coul, qi * qj, ctx.qqrd2e);

                atoms.f[i] += del * fpair;

                if ctx.newton_pair || j < nlocal {
                    atoms.f[j] -= del * fpair;
                }

                if eflag || vflag {
                    ev.tally(i, j, nlocal, ctx.newton_pair, eflag, vflag, ecoul, fpair, del);
                }
            }
        }

        Ok(ev)
    }

    // (fpair, ecoul) of a pair within the cutoff
    fn pair_terms(&self, itype: usize, jtype: usize, rsq: f64, factor_coul: f64, qiqj: f64, qqrd2e: f64) -> (f64, f64) {
        let r2inv = 1.0 / rsq;
        let rinv = r2inv.sqrt();
        let r = rsq.sqrt();

        let a_screen = self.thole.get(itype, jtype) / self.polar.get(itype, jtype).cbrt();
        let (factor_f, factor_e) = thole_factors(a_screen, r, factor_coul);

        let prefactor = qqrd2e * self.scale.get(itype, jtype) * qiqj * rinv;

        (factor_f * prefactor * r2inv, factor_e * prefactor)
    }

    /// Energy and `fforce` (force over distance) of one pair at `rsq`, as
    /// `compute` evaluates it.
    #[allow(clippy::too_many_arguments)]
    pub fn single(
        &self,
        atoms: &Atoms,
        registry: &PartnerRegistry,
        ctx: &PairContext,
        i: usize,
        j: usize,
        itype: usize,
        jtype: usize,
        rsq: f64,
        factor_coul: f64,
    ) -> Result<(f64, f64), TholeError> {
        if !self.initialized {
            return Err(TholeError::NotInitialized);
        }

        if i == j
            || !registry.role_of(atoms, i).is_polarizable()
            || !registry.role_of(atoms, j).is_polarizable()
        {
            return Ok((0.0, 0.0));
        }

        let di = partner_image(atoms, registry, i)?;

        if j == di || rsq >= self.cutsq.get(itype, jtype) {
            return Ok((0.0, 0.0));
        }

        let qi = dipole_charge(atoms, registry, i)?;
        let qj = dipole_charge(atoms, registry, j)?;

        let (fforce, phicoul) = self.pair_terms(itype, jtype, rsq, factor_coul, qi * qj, ctx.qqrd2e);

        Ok((phicoul, fforce))
    }

    /// Coefficient tables by name: `scale`, `polar` or `thole`.
    pub fn extract(&self, name: &str) -> Option<&PairTable<f64>> {
        match name {
            "scale" => Some(&self.scale),
            "polar" => Some(&self.polar),
            "thole" => Some(&self.thole),
            _ => None,
        }
    }

    pub fn extract_mut(&mut self, name: &str) -> Option<&mut PairTable<f64>> {
        match name {
            "scale" => Some(&mut self.scale),
            "polar" => Some(&mut self.polar),
            "thole" => Some(&mut self.thole),
            _ => None,
        }
    }

    pub fn display(&self) {
        println!();
        println!("   {:-^80}", " pair thole ");
        println!();

        println!("   {:<width1$} = {:>width2$}", "thole_global", self.thole_global, width1 = OUT_WIDTH1, width2 = OUT_WIDTH2);
        println!("   {:<width1$} = {:>width2$}", "cut_global", self.cut_global, width1 = OUT_WIDTH1, width2 = OUT_WIDTH2);

        for i in 1..=self.ntypes {
            for j in i..=self.ntypes {
                if !self.setflag.get(i, j) && !self.initialized {
                    continue;
                }

                let key = format!("pair {} {} (polar thole cut)", i, j);
                let val = format!(
                    "{:.4} {:.4} {:.4}",
                    self.polar.get(i, j),
                    self.thole.get(i, j),
                    self.cut.get(i, j)
                );

                println!("   {:<width1$} = {:>width2$}", key, val, width1 = OUT_WIDTH1, width2 = OUT_WIDTH2);
            }
        }
    }
}

// closest copy of the partner of polarizable atom i
fn partner_image(atoms: &Atoms, registry: &PartnerRegistry, i: usize) -> Result<usize, TholeError> {
    registry.partner_index(atoms, i)?.ok_or_else(|| {
        TholeError::Drude(DrudeError::PartnerNotMapped {
            tag: atoms.tag[i],
            partner: 0,
        })
    })
}

// A Drude particle carries its own charge; a core carries minus the charge
// of its Drude partner, the only case that needs the partner present.
fn dipole_charge(atoms: &Atoms, registry: &PartnerRegistry, i: usize) -> Result<f64, TholeError> {
    let q = atoms.q.as_ref().ok_or(TholeError::MissingCharge)?;

    match registry.role_of(atoms, i) {
        ParticleRole::Drude => Ok(q[i]),
        _ => Ok(-q[partner_image(atoms, registry, i)?]),
    }
}

fn numeric(s: &str) -> Result<f64, TholeError> {
    s.parse::<f64>().map_err(|_| TholeError::Parse(s.to_string()))
}

/// Type range of `*`, `n`, `*m`, `n*` or `n*m` within 1..=ntypes.
pub fn bounds(s: &str, ntypes: usize) -> Result<(usize, usize), TholeError> {
    let bad = || TholeError::InvalidBounds {
        token: s.to_string(),
        ntypes,
    };

    let index = |t: &str, default: usize| -> Result<usize, TholeError> {
        if t.is_empty() {
            Ok(default)
        } else {
            t.parse::<usize>().map_err(|_| bad())
        }
    };

    let (lo, hi) = match s.split_once('*') {
        None => {
            let n = index(s, 0)?;
            (n, n)
        }
        Some((l, h)) => (index(l, 1)?, index(h, ntypes)?),
    };

    if lo < 1 || hi > ntypes || lo > hi {
        return Err(bad());
    }

    Ok((lo, hi))
}
