//! Reduced coordinates of core/Drude pairs.
//!
//! The direct transform replaces the core quantities of a pair by those of
//! its center of mass and the Drude quantities by the relative ones:
//!
//! ```text
//! M' = M + m            m' = M m / M'
//! X' = (M X + m x) / M'  x' = x - X     (same for velocities)
//! F' = F + f             f' = (M f - m F) / M'
//! ```
//!
//! The inverse transform restores the real quantities from the Drude mass
//! fraction `m / M'` recorded by the direct transform, never from the
//! reduced masses alone. Kinetic energy and virial are invariant under both.

use atoms::{Atoms, Tag};
use drude::{DrudeError, ParticleRole, PartnerRegistry};
use vector3::*;

use std::collections::HashMap;

/// Mass, position, velocity and force of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub mass: f64,
    pub x: Vector3f64,
    pub v: Vector3f64,
    pub f: Vector3f64,
}

/// A core/Drude pair in real coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealPair {
    pub core: Particle,
    pub drude: Particle,
}

/// A core/Drude pair in reduced coordinates: `com` holds the total mass and
/// the center-of-mass quantities, `rel` the reduced mass and the relative
/// quantities. `drude_fraction` is `m / M'` of the real pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReducedPair {
    pub com: Particle,
    pub rel: Particle,
    pub drude_fraction: f64,
}

impl RealPair {
    pub fn reduce(&self) -> ReducedPair {
        let (mc, md) = (self.core.mass, self.drude.mass);
        let (c, d) = (&self.core, &self.drude);

        let mt = mc + md;

        ReducedPair {
            drude_fraction: md / mt,
            com: Particle {
                mass: mt,
                x: (mc * c.x + md * d.x) / mt,
                v: (mc * c.v + md * d.v) / mt,
                f: c.f + d.f,
            },
            rel: Particle {
                mass: mc * md / mt,
                x: d.x - c.x,
                v: d.v - c.v,
                f: (mc * d.f - md * c.f) / mt,
            },
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * (self.core.mass * self.core.v.norm2_squared() + self.drude.mass * self.drude.v.norm2_squared())
    }

    pub fn virial(&self) -> f64 {
        self.core.x * self.core.f + self.drude.x * self.drude.f
    }
}

impl ReducedPair {
    pub fn restore(&self) -> RealPair {
        let mt = self.com.mass;
        let wd = self.drude_fraction;
        let wc = 1.0 - wd;
        let (g, r) = (&self.com, &self.rel);

        RealPair {
            core: Particle {
                mass: mt - wd * mt,
                x: g.x - wd * r.x,
                v: g.v - wd * r.v,
                f: wc * g.f - r.f,
            },
            drude: Particle {
                mass: wd * mt,
                x: g.x + wc * r.x,
                v: g.v + wc * r.v,
                f: wd * g.f + r.f,
            },
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * (self.com.mass * self.com.v.norm2_squared() + self.rel.mass * self.rel.v.norm2_squared())
    }

    pub fn virial(&self) -> f64 {
        self.com.x * self.com.f + self.rel.x * self.rel.f
    }
}

/// Which of the two transforms to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Direct,
    Inverse,
}

/// Applies the transforms to the pairs whose core is in a group.
///
/// The direct transform records the Drude mass fraction of every pair it
/// reduces, keyed by the core tag, and the real per-type masses; the
/// inverse transform restores the real pairs from those records.
#[derive(Debug, Clone)]
pub struct ReducedTransform {
    groupbit: u32,
    drude_fraction: HashMap<Tag, f64>,
    type_masses: Option<Vec<f64>>,
}

impl ReducedTransform {
    pub fn new(groupbit: u32) -> ReducedTransform {
        ReducedTransform {
            groupbit,
            drude_fraction: HashMap::new(),
            type_masses: None,
        }
    }

    pub fn get_groupbit(&self) -> u32 {
        self.groupbit
    }

    /// Real to reduced. Returns the number of pairs transformed here.
    pub fn direct(&mut self, atoms: &mut Atoms, registry: &mut PartnerRegistry) -> Result<usize, DrudeError> {
        if registry.is_reduced() {
            return Err(DrudeError::TransformState {
                op: "direct",
                state: "reduced",
            });
        }

        let n = self.apply(atoms, registry, Direction::Direct)?;

        registry.set_reduced(true);

        Ok(n)
    }

    /// Reduced to real. Returns the number of pairs transformed here.
    pub fn inverse(&mut self, atoms: &mut Atoms, registry: &mut PartnerRegistry) -> Result<usize, DrudeError> {
        if !registry.is_reduced() {
            return Err(DrudeError::TransformState {
                op: "inverse",
                state: "real",
            });
        }

        let n = self.apply(atoms, registry, Direction::Inverse)?;

        self.drude_fraction.clear();
        self.type_masses = None;

        registry.set_reduced(false);

        Ok(n)
    }

    // Every update is computed from the values before the call, so the order
    // in which pairs are visited does not matter. Each process writes only
    // the atoms it owns: an owned core writes itself and its Drude particle
    // if owned, an owned Drude particle whose core is a ghost writes itself.
    fn apply(&mut self, atoms: &mut Atoms, registry: &PartnerRegistry, dir: Direction) -> Result<usize, DrudeError> {
        let nlocal = atoms.nlocal;
        let per_atom_mass = atoms.rmass.is_some();

        if dir == Direction::Direct {
            self.drude_fraction.clear();
        }

        let mut updates: Vec<(usize, Particle)> = Vec::new();
        let mut npairs = 0;

        for i in 0..nlocal {
            let role = registry.role_of(atoms, i);

            let (ic, id) = match role {
                ParticleRole::NonPolarizable => continue,
                ParticleRole::Core => match registry.partner_index(atoms, i)? {
                    Some(j) => (i, j),
                    None => continue,
                },
                ParticleRole::Drude => match registry.partner_index(atoms, i)? {
                    Some(j) if j >= nlocal => (j, i),
                    _ => continue,
                },
            };

            if atoms.mask[ic] & self.groupbit == 0 {
                continue;
            }

            let (core, drude) = match dir {
                Direction::Direct => {
                    let reduced = RealPair {
                        core: particle(atoms, ic),
                        drude: particle(atoms, id),
                    }
                    .reduce();

                    self.drude_fraction
                        .insert(atoms.tag[ic], reduced.drude_fraction);

                    (reduced.com, reduced.rel)
                }
                Direction::Inverse => {
                    let drude_fraction = *self
                        .drude_fraction
                        .get(&atoms.tag[ic])
                        .ok_or(DrudeError::PairNotReduced { tag: atoms.tag[ic] })?;

                    let real = ReducedPair {
                        com: particle(atoms, ic),
                        rel: particle(atoms, id),
                        drude_fraction,
                    }
                    .restore();

                    (real.core, real.drude)
                }
            };

            if role == ParticleRole::Core {
                npairs += 1;
                updates.push((ic, core));

                if id < nlocal {
                    updates.push((id, drude));
                }
            } else {
                updates.push((id, drude));
            }
        }

        for (i, p) in updates {
            atoms.x[i] = p.x;
            atoms.v[i] = p.v;
            atoms.f[i] = p.f;

            if let Some(rmass) = atoms.rmass.as_mut() {
                rmass[i] = p.mass;
            }
        }

        if !per_atom_mass {
            self.apply_type_masses(atoms, registry, dir)?;
        }

        log::debug!("{:?} transform of {} core/Drude pairs", dir, npairs);

        Ok(npairs)
    }

    // Per-type masses are shared by every pair of a type pair and are
    // transformed once per (core, Drude) type pair. The real table is kept
    // for the inverse.
    fn apply_type_masses(&mut self, atoms: &mut Atoms, registry: &PartnerRegistry, dir: Direction) -> Result<(), DrudeError> {
        match dir {
            Direction::Direct => {
                self.type_masses = Some(atoms.mass.clone());

                for (tc, td) in registry.get_types().pairs() {
                    let (mc, md) = (atoms.mass[tc], atoms.mass[td]);

                    atoms.mass[tc] = mc + md;
                    atoms.mass[td] = mc * md / (mc + md);
                }
            }
            Direction::Inverse => {
                let real = self
                    .type_masses
                    .take()
                    .ok_or(DrudeError::TransformState {
                        op: "inverse",
                        state: "real",
                    })?;

                for (tc, td) in registry.get_types().pairs() {
                    atoms.mass[tc] = real[tc];
                    atoms.mass[td] = real[td];
                }
            }
        }

        Ok(())
    }
}

fn particle(atoms: &Atoms, i: usize) -> Particle {
    Particle {
        mass: atoms.mass_of(i),
        x: atoms.x[i],
        v: atoms.v[i],
        f: atoms.f[i],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair() -> RealPair {
        RealPair {
            core: Particle {
                mass: 10.0,
                x: Vector3f64::new(1.0, 2.0, 3.0),
                v: Vector3f64::new(0.1, -0.2, 0.3),
                f: Vector3f64::new(-1.0, 0.5, 2.0),
            },
            drude: Particle {
                mass: 0.1,
                x: Vector3f64::new(1.1, 1.9, 3.05),
                v: Vector3f64::new(2.0, 1.0, -3.0),
                f: Vector3f64::new(4.0, -2.0, 0.25),
            },
        }
    }

    #[test]
    fn test_reduce_masses() {
        let reduced = pair().reduce();

        assert_relative_eq!(reduced.com.mass, 10.1, epsilon = 1e-12);
        assert_relative_eq!(reduced.rel.mass, 1.0 / 10.1, epsilon = 1e-12);
        assert_relative_eq!(reduced.rel.mass, 0.0990099, epsilon = 1e-7);
    }

    #[test]
    fn test_restore_drude_heavier_than_core() {
        let mut p = pair();
        p.core.mass = 1.0;
        p.drude.mass = 3.0;
        p.core.x = Vector3f64::zeros();
        p.drude.x = Vector3f64::new(0.2, 0.0, 0.0);

        let back = p.reduce().restore();

        assert_relative_eq!(back.core.mass, 1.0, epsilon = 1e-14);
        assert_relative_eq!(back.drude.mass, 3.0, epsilon = 1e-14);
        assert_relative_eq!(back.core.x.norm2(), 0.0, epsilon = 1e-14);
        assert_relative_eq!(back.drude.x.x, 0.2, epsilon = 1e-14);
        assert_relative_eq!((back.drude.v - p.drude.v).norm2(), 0.0, epsilon = 1e-12);
        assert_relative_eq!((back.core.f - p.core.f).norm2(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_restore_tiny_drude_mass() {
        for &(mc, md) in [(1.0, 1e-10), (1e4, 1e-6)].iter() {
            let mut p = pair();
            p.core.mass = mc;
            p.drude.mass = md;

            let back = p.reduce().restore();

            assert_relative_eq!(back.core.mass, mc, max_relative = 1e-14);
            assert_relative_eq!(back.drude.mass, md, max_relative = 1e-14);
            assert_relative_eq!((back.drude.x - p.drude.x).norm2(), 0.0, epsilon = 1e-12);
            assert_relative_eq!((back.drude.v - p.drude.v).norm2(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_restore_reduce() {
        let p = pair();
        let back = p.reduce().restore();

        assert_relative_eq!(back.core.mass, p.core.mass, epsilon = 1e-10);
        assert_relative_eq!(back.drude.mass, p.drude.mass, epsilon = 1e-10);

        for (a, b) in [
            (back.core.x, p.core.x),
            (back.core.v, p.core.v),
            (back.core.f, p.core.f),
            (back.drude.x, p.drude.x),
            (back.drude.v, p.drude.v),
            (back.drude.f, p.drude.f),
        ] {
            assert_relative_eq!((a - b).norm2(), 0.0, epsilon = 1e-10);
        }
    }
}
