use crate::DrudeError;

use itertools::Itertools;

/// Classification of an atom type with respect to Drude polarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleRole {
    NonPolarizable,
    Core,
    Drude,
}

impl ParticleRole {
    /// `N`/`C`/`D` (any case) or the numeric codes `0`/`1`/`2`.
    pub fn from_token(token: &str) -> Option<ParticleRole> {
        match token.to_ascii_uppercase().as_str() {
            "N" | "0" => Some(ParticleRole::NonPolarizable),
            "C" | "1" => Some(ParticleRole::Core),
            "D" | "2" => Some(ParticleRole::Drude),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            ParticleRole::NonPolarizable => 'N',
            ParticleRole::Core => 'C',
            ParticleRole::Drude => 'D',
        }
    }

    pub fn is_polarizable(&self) -> bool {
        *self != ParticleRole::NonPolarizable
    }

    /// The role a bonded partner must have.
    pub fn complement(&self) -> Option<ParticleRole> {
        match self {
            ParticleRole::NonPolarizable => None,
            ParticleRole::Core => Some(ParticleRole::Drude),
            ParticleRole::Drude => Some(ParticleRole::Core),
        }
    }
}

/// Roles of all atom types and the one-to-one core/Drude type pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct DrudeTypes {
    roles: Vec<ParticleRole>,         // index 0 unused
    partner_type: Vec<Option<usize>>, // index 0 unused
}

impl DrudeTypes {
    /// `roles[t-1]` is the role of type `t`; `pairs` lists `(core, drude)`
    /// type pairs. Every core and every Drude type must appear in exactly
    /// one pair.
    pub fn new(roles: &[ParticleRole], pairs: &[(usize, usize)]) -> Result<DrudeTypes, DrudeError> {
        let ntypes = roles.len();

        let mut all_roles = vec![ParticleRole::NonPolarizable];
        all_roles.extend_from_slice(roles);

        let mut partner_type = vec![None; ntypes + 1];

        for &(core, drude) in pairs.iter() {
            for t in [core, drude] {
                if t == 0 || t > ntypes {
                    return Err(DrudeError::InvalidTypeDeclaration(format!(
                        "type {} in pair {}:{} is out of range 1..={}",
                        t, core, drude, ntypes
                    )));
                }
            }

            if all_roles[core] != ParticleRole::Core || all_roles[drude] != ParticleRole::Drude {
                return Err(DrudeError::InvalidTypeDeclaration(format!(
                    "pair {}:{} must join a core type to a Drude type, found {}:{}",
                    core,
                    drude,
                    all_roles[core].letter(),
                    all_roles[drude].letter()
                )));
            }

            for t in [core, drude] {
                if partner_type[t].is_some() {
                    return Err(DrudeError::InvalidTypeDeclaration(format!(
                        "type {} appears in more than one core:drude pair",
                        t
                    )));
                }
            }

            partner_type[core] = Some(drude);
            partner_type[drude] = Some(core);
        }

        for t in 1..=ntypes {
            if all_roles[t].is_polarizable() && partner_type[t].is_none() {
                return Err(DrudeError::UnpairedType {
                    itype: t,
                    role: all_roles[t],
                });
            }
        }

        Ok(DrudeTypes {
            roles: all_roles,
            partner_type,
        })
    }

    /// Parse the role letters (`"C D N"`) and the pairs (`"1:2 3:4"`).
    pub fn parse(roles: &str, pairs: &str, ntypes: usize) -> Result<DrudeTypes, DrudeError> {
        let roles: Vec<ParticleRole> = roles
            .split_whitespace()
            .map(|tok| {
                ParticleRole::from_token(tok).ok_or_else(|| {
                    DrudeError::InvalidTypeDeclaration(format!("unknown role '{}'", tok))
                })
            })
            .collect::<Result<_, _>>()?;

        if roles.len() != ntypes {
            return Err(DrudeError::InvalidTypeDeclaration(format!(
                "{} roles given for {} atom types",
                roles.len(),
                ntypes
            )));
        }

        let pairs: Vec<(usize, usize)> = pairs
            .split_whitespace()
            .map(|tok| {
                let bad = || DrudeError::InvalidTypeDeclaration(format!("malformed pair '{}'", tok));

                let (c, d) = tok.split(':').collect_tuple().ok_or_else(bad)?;
                let c = c.parse::<usize>().map_err(|_| bad())?;
                let d = d.parse::<usize>().map_err(|_| bad())?;

                Ok((c, d))
            })
            .collect::<Result<_, DrudeError>>()?;

        DrudeTypes::new(&roles, &pairs)
    }

    pub fn ntypes(&self) -> usize {
        self.roles.len() - 1
    }

    pub fn role(&self, itype: usize) -> ParticleRole {
        self.roles
            .get(itype)
            .copied()
            .unwrap_or(ParticleRole::NonPolarizable)
    }

    pub fn partner_type(&self, itype: usize) -> Option<usize> {
        self.partner_type.get(itype).copied().flatten()
    }

    /// Whether an atom of `itype` and an atom of `jtype` may form a pair.
    pub fn are_partners(&self, itype: usize, jtype: usize) -> bool {
        self.partner_type(itype) == Some(jtype)
    }

    /// `(core, drude)` type pairs in ascending core type.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        (1..self.roles.len())
            .filter(|&t| self.roles[t] == ParticleRole::Core)
            .filter_map(|t| self.partner_type[t].map(|d| (t, d)))
            .collect()
    }

    pub fn letters(&self) -> String {
        self.roles[1..].iter().map(|r| r.letter()).join(" ")
    }
}
