use atoms::{AtomColumn, Atoms, AtomsError, Tag};
use dwconsts::*;
use vector3::*;

use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("cannot read system file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: malformed '{keyword}' record '{text}'")]
    Malformed {
        line: usize,
        keyword: String,
        text: String,
    },

    #[error("line {line}: unknown record '{keyword}'")]
    UnknownRecord { line: usize, keyword: String },

    #[error("'{0}' record is missing")]
    Missing(&'static str),

    #[error("duplicate atom tag {0}")]
    DuplicateTag(Tag),

    #[error("bond {0}-{1} refers to an atom that is not defined")]
    DanglingBond(Tag, Tag),

    #[error(transparent)]
    Atoms(#[from] AtomsError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub tag: Tag,
    pub itype: usize,
    pub q: f64,
    pub x: Vector3f64,
    pub v: Vector3f64,
}

/// Particles, bonds and periodic box of one molecular system.
///
/// One record per line, `#` starts a comment:
///
/// ```text
/// types  ntypes
/// box    xlo xhi ylo yhi zlo zhi
/// mass   type m
/// atom   tag type q x y z [vx vy vz]
/// bond   tag1 tag2
/// ```
#[derive(Debug, Default)]
pub struct System {
    ntypes: usize,
    lo: Vector3f64,
    hi: Vector3f64,
    masses: Vec<(usize, f64)>,
    atoms: Vec<AtomRecord>,
    bonds: Vec<(Tag, Tag)>,
}

impl System {
    pub fn new() -> System {
        System::default()
    }

    pub fn get_ntypes(&self) -> usize {
        self.ntypes
    }

    pub fn get_lo(&self) -> Vector3f64 {
        self.lo
    }

    pub fn get_hi(&self) -> Vector3f64 {
        self.hi
    }

    pub fn get_n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn get_n_bonds(&self) -> usize {
        self.bonds.len()
    }

    pub fn read_file(&mut self, inpfile: &str) -> Result<(), SystemError> {
        let text = fs::read_to_string(inpfile).map_err(|source| SystemError::Io {
            path: inpfile.to_string(),
            source,
        })?;

        self.read_str(&text)
    }

    pub fn read_str(&mut self, text: &str) -> Result<(), SystemError> {
        *self = System::default();

        let mut has_box = false;

        for (iline, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("");
            let s: Vec<&str> = line.split_whitespace().collect();

            if s.is_empty() {
                continue;
            }

            let malformed = || SystemError::Malformed {
                line: iline + 1,
                keyword: s[0].to_string(),
                text: line.trim().to_string(),
            };

            match s[0] {
                "types" => {
                    if s.len() != 2 {
                        return Err(malformed());
                    }
                    self.ntypes = s[1].parse().map_err(|_| malformed())?;
                }

                "box" => {
                    let b = parse_reals(&s[1..], 6).ok_or_else(malformed)?;
                    self.lo = Vector3f64::new(b[0], b[2], b[4]);
                    self.hi = Vector3f64::new(b[1], b[3], b[5]);

                    if (0..3).any(|idim| self.hi.get(idim) <= self.lo.get(idim)) {
                        return Err(malformed());
                    }

                    has_box = true;
                }

                "mass" => {
                    if s.len() != 3 {
                        return Err(malformed());
                    }
                    let itype = s[1].parse().map_err(|_| malformed())?;
                    let m: f64 = s[2].parse().map_err(|_| malformed())?;

                    if m <= 0.0 {
                        return Err(malformed());
                    }

                    self.masses.push((itype, m));
                }

                "atom" => {
                    if s.len() != 7 && s.len() != 10 {
                        return Err(malformed());
                    }

                    let tag: Tag = s[1].parse().map_err(|_| malformed())?;
                    let itype: usize = s[2].parse().map_err(|_| malformed())?;
                    let vals = parse_reals(&s[3..], s.len() - 3).ok_or_else(malformed)?;

                    if tag <= 0 {
                        return Err(malformed());
                    }

                    let v = if vals.len() == 7 {
                        Vector3f64::from_slice(&vals[4..7])
                    } else {
                        Vector3f64::zeros()
                    };

                    self.atoms.push(AtomRecord {
                        tag,
                        itype,
                        q: vals[0],
                        x: Vector3f64::from_slice(&vals[1..4]),
                        v,
                    });
                }

                "bond" => {
                    if s.len() != 3 {
                        return Err(malformed());
                    }
                    let t1: Tag = s[1].parse().map_err(|_| malformed())?;
                    let t2: Tag = s[2].parse().map_err(|_| malformed())?;
                    self.bonds.push((t1, t2));
                }

                _ => {
                    return Err(SystemError::UnknownRecord {
                        line: iline + 1,
                        keyword: s[0].to_string(),
                    })
                }
            }
        }

        if self.ntypes == 0 {
            return Err(SystemError::Missing("types"));
        }

        if !has_box {
            return Err(SystemError::Missing("box"));
        }

        Ok(())
    }

    /// Add every particle and bond to `atoms` as owned atoms, positions
    /// wrapped into the box. Bonds are stored on their first atom.
    pub fn populate(&self, atoms: &mut Atoms, columns: &mut [&mut dyn AtomColumn]) -> Result<(), SystemError> {
        for &(itype, m) in self.masses.iter() {
            atoms.set_mass(itype, m)?;
        }

        for rec in self.atoms.iter() {
            if atoms.map(rec.tag).is_some() {
                return Err(SystemError::DuplicateTag(rec.tag));
            }

            let x = wrap(rec.x, self.lo, self.hi);

            atoms.add_atom(rec.tag, rec.itype, x, rec.v, rec.q, columns)?;
        }

        for &(t1, t2) in self.bonds.iter() {
            match (atoms.map(t1), atoms.map(t2)) {
                (Some(i), Some(_)) => atoms.add_bond(i, t2),
                _ => return Err(SystemError::DanglingBond(t1, t2)),
            }
        }

        Ok(())
    }

    pub fn display(&self) {
        println!();
        println!("   {:-^80}", " system ");
        println!();

        let rows = [
            ("ntypes", self.ntypes.to_string()),
            ("natoms", self.atoms.len().to_string()),
            ("nbonds", self.bonds.len().to_string()),
            (
                "box lo",
                format!("{:.4} {:.4} {:.4}", self.lo.x, self.lo.y, self.lo.z),
            ),
            (
                "box hi",
                format!("{:.4} {:.4} {:.4}", self.hi.x, self.hi.y, self.hi.z),
            ),
        ];

        for (key, val) in rows.iter() {
            println!(
                "   {:<width1$} = {:>width2$}",
                key,
                val,
                width1 = OUT_WIDTH1,
                width2 = OUT_WIDTH2
            );
        }
    }
}

fn parse_reals(s: &[&str], n: usize) -> Option<Vec<f64>> {
    if s.len() != n {
        return None;
    }

    s.iter().map(|t| t.parse::<f64>().ok()).collect()
}

fn wrap(mut x: Vector3f64, lo: Vector3f64, hi: Vector3f64) -> Vector3f64 {
    for idim in 0..3 {
        let len = hi.get(idim) - lo.get(idim);
        let mut c = x.get(idim);

        c = lo.get(idim) + (c - lo.get(idim)).rem_euclid(len);

        if c >= hi.get(idim) {
            c = lo.get(idim);
        }

        x.set(idim, c);
    }

    x
}
