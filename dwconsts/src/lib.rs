// units : real (kcal/mol, Angstrom, fs, g/mol, e)

pub const REAL_BOLTZ: f64 = 0.0019872067; // kcal/mol/K
pub const REAL_MVV2E: f64 = 48.88821291 * 48.88821291;
pub const REAL_QQR2E: f64 = 332.06371;

// units : metal (eV, Angstrom, ps, g/mol, e)

pub const METAL_BOLTZ: f64 = 8.617343e-5; // eV/K
pub const METAL_MVV2E: f64 = 1.0364269e-4;
pub const METAL_QQR2E: f64 = 14.399645;

// output table layout

pub const OUT_WIDTH1: usize = 30;
pub const OUT_WIDTH2: usize = 20;

// numerical tolerance

pub const EPS8: f64 = 1E-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStyle {
    Real,
    Metal,
    LJ,
}

// Conversion factors of one unit style.
//
// - boltz : Boltzmann constant in energy/temperature
// - mvv2e : mass*velocity^2 to energy
// - qqr2e : q*q/r to energy
#[derive(Debug, Clone, Copy)]
pub struct Units {
    style: UnitStyle,
    boltz: f64,
    mvv2e: f64,
    qqr2e: f64,
}

impl Units {
    pub fn new(style: UnitStyle) -> Units {
        match style {
            UnitStyle::Real => Units {
                style,
                boltz: REAL_BOLTZ,
                mvv2e: REAL_MVV2E,
                qqr2e: REAL_QQR2E,
            },

            UnitStyle::Metal => Units {
                style,
                boltz: METAL_BOLTZ,
                mvv2e: METAL_MVV2E,
                qqr2e: METAL_QQR2E,
            },

            UnitStyle::LJ => Units {
                style,
                boltz: 1.0,
                mvv2e: 1.0,
                qqr2e: 1.0,
            },
        }
    }

    pub fn from_name(name: &str) -> Option<Units> {
        match name {
            "real" => Some(Units::new(UnitStyle::Real)),
            "metal" => Some(Units::new(UnitStyle::Metal)),
            "lj" => Some(Units::new(UnitStyle::LJ)),
            _ => None,
        }
    }

    pub fn get_style(&self) -> UnitStyle {
        self.style
    }

    pub fn get_name(&self) -> &'static str {
        match self.style {
            UnitStyle::Real => "real",
            UnitStyle::Metal => "metal",
            UnitStyle::LJ => "lj",
        }
    }

    pub fn get_boltz(&self) -> f64 {
        self.boltz
    }

    pub fn get_mvv2e(&self) -> f64 {
        self.mvv2e
    }

    pub fn get_qqr2e(&self) -> f64 {
        self.qqr2e
    }

    // Coulomb prefactor screened by a uniform dielectric.
    pub fn get_qqrd2e(&self, dielectric: f64) -> f64 {
        self.qqr2e / dielectric
    }
}

impl Default for Units {
    fn default() -> Self {
        Units::new(UnitStyle::Real)
    }
}

#[test]
fn test_units_by_name() {
    assert_eq!(Units::from_name("real").unwrap().get_style(), UnitStyle::Real);
    assert_eq!(Units::from_name("metal").unwrap().get_name(), "metal");
    assert!(Units::from_name("si").is_none());

    let lj = Units::new(UnitStyle::LJ);
    assert_eq!(lj.get_qqrd2e(2.0), 0.5);
}
