use dwconsts::*;

use itertools::Itertools;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    str::FromStr,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("cannot read control file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("line {line}: expected 'key = value', found '{text}'")]
    MalformedLine { line: usize, text: String },

    #[error("invalid value '{value}' for parameter '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("unknown parameter(s): {}", .0.join(", "))]
    UnknownParameters(Vec<String>),
}

/// An atom group selected by type.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDef {
    pub name: String,
    pub types: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct Control {
    verbosity: String,

    units: Units,
    dimension: usize,
    dielectric: f64,
    newton_pair: bool,
    special_coul: [f64; 3], // 1-2, 1-3, 1-4

    drude_types: String, // one of N/C/D per atom type
    drude_pairs: String, // core:drude type pairs

    pair_thole: String,      // thole_global cut_global
    pair_coeff: Vec<String>, // I J polar [thole [cut]]

    groups: Vec<GroupDef>,
    transform_group: String,
    temp_group: String,
    temp_extra_dof: Option<f64>,
    temp_dynamic: bool,

    system_file: String,
}

impl Control {
    pub fn new() -> Control {
        Control::default()
    }

    pub fn get_verbosity(&self) -> &str {
        &self.verbosity
    }

    /// Default `env_logger` filter for the verbosity: `low` logs warnings,
    /// `normal` progress and `high` the per-stage details.
    pub fn get_log_filter(&self) -> &'static str {
        match self.verbosity.as_str() {
            "low" => "warn",
            "high" => "debug",
            _ => "info",
        }
    }

    pub fn get_units(&self) -> &Units {
        &self.units
    }

    pub fn get_dimension(&self) -> usize {
        self.dimension
    }

    pub fn get_dielectric(&self) -> f64 {
        self.dielectric
    }

    pub fn get_newton_pair(&self) -> bool {
        self.newton_pair
    }

    pub fn get_special_coul(&self) -> [f64; 3] {
        self.special_coul
    }

    pub fn get_drude_types(&self) -> &str {
        &self.drude_types
    }

    pub fn get_drude_pairs(&self) -> &str {
        &self.drude_pairs
    }

    pub fn get_pair_thole(&self) -> Vec<&str> {
        self.pair_thole.split_whitespace().collect()
    }

    pub fn get_pair_coeff(&self) -> Vec<Vec<&str>> {
        self.pair_coeff
            .iter()
            .map(|line| line.split_whitespace().collect())
            .collect()
    }

    pub fn get_groups(&self) -> &[GroupDef] {
        &self.groups
    }

    pub fn get_transform_group(&self) -> &str {
        &self.transform_group
    }

    pub fn get_temp_group(&self) -> &str {
        &self.temp_group
    }

    /// Degrees of freedom removed by the temperature estimate; the
    /// dimension unless set.
    pub fn get_temp_extra_dof(&self) -> f64 {
        self.temp_extra_dof.unwrap_or(self.dimension as f64)
    }

    pub fn get_temp_dynamic(&self) -> bool {
        self.temp_dynamic
    }

    pub fn get_system_file(&self) -> &str {
        &self.system_file
    }

    fn set_defaults(&mut self) {
        self.verbosity = "normal".to_string();

        self.units = Units::new(UnitStyle::Real);
        self.dimension = 3;
        self.dielectric = 1.0;
        self.newton_pair = true;
        self.special_coul = [0.0, 0.0, 0.0];

        self.drude_types = String::new();
        self.drude_pairs = String::new();

        self.pair_thole = "2.6 12.0".to_string();
        self.pair_coeff = Vec::new();

        self.groups = Vec::new();
        self.transform_group = "all".to_string();
        self.temp_group = "all".to_string();
        self.temp_extra_dof = None;
        self.temp_dynamic = false;

        self.system_file = "in.system".to_string();
    }

    pub fn read_file(&mut self, inpfile: &str) -> Result<(), ControlError> {
        let lines = read_file_data_to_vec(inpfile)?;

        self.read_lines(&lines)
    }

    pub fn read_str(&mut self, text: &str) -> Result<(), ControlError> {
        let lines: Vec<String> = text.lines().map(|s| s.to_string()).collect();

        self.read_lines(&lines)
    }

    fn read_lines(&mut self, lines: &[String]) -> Result<(), ControlError> {
        self.set_defaults();

        let mut unknown = Vec::new();

        for (iline, raw) in lines.iter().enumerate() {
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw.as_str(),
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => {
                    return Err(ControlError::MalformedLine {
                        line: iline + 1,
                        text: raw.to_string(),
                    })
                }
            };

            match key {
                "verbosity" => {
                    let v = value.to_lowercase();

                    if !["low", "normal", "high"].contains(&v.as_str()) {
                        return Err(invalid(key, value));
                    }

                    self.verbosity = v;
                }

                "units" => {
                    self.units = Units::from_name(value).ok_or_else(|| invalid(key, value))?;
                }

                "dimension" => {
                    self.dimension = parse_value(key, value)?;

                    if self.dimension != 2 && self.dimension != 3 {
                        return Err(invalid(key, value));
                    }
                }

                "dielectric" => {
                    self.dielectric = parse_value(key, value)?;
                }

                "newton_pair" => {
                    self.newton_pair = parse_value(key, value)?;
                }

                "special_coul" => {
                    let factors: Vec<f64> = value
                        .split_whitespace()
                        .map(|v| parse_value(key, v))
                        .collect::<Result<_, _>>()?;

                    if factors.len() != 3 {
                        return Err(invalid(key, value));
                    }

                    self.special_coul.copy_from_slice(&factors);
                }

                "drude_types" => {
                    self.drude_types = value.to_string();
                }

                "drude_pairs" => {
                    self.drude_pairs = value.to_string();
                }

                "pair_thole" => {
                    self.pair_thole = value.to_string();
                }

                "pair_coeff" => {
                    self.pair_coeff.push(value.to_string());
                }

                "group" => {
                    let tokens: Vec<&str> = value.split_whitespace().collect();

                    if tokens.len() < 3 || tokens[1] != "type" {
                        return Err(invalid(key, value));
                    }

                    let types = tokens[2..]
                        .iter()
                        .map(|t| parse_value(key, t))
                        .collect::<Result<_, _>>()?;

                    self.groups.push(GroupDef {
                        name: tokens[0].to_string(),
                        types,
                    });
                }

                "transform_group" => {
                    self.transform_group = value.to_string();
                }

                "temp_group" => {
                    self.temp_group = value.to_string();
                }

                "temp_extra_dof" => {
                    self.temp_extra_dof = Some(parse_value(key, value)?);
                }

                "temp_dynamic" => {
                    self.temp_dynamic = parse_value(key, value)?;
                }

                "system_file" => {
                    self.system_file = value.to_string();
                }

                _ => {
                    unknown.push(key.to_string());
                }
            }
        }

        if !unknown.is_empty() {
            return Err(ControlError::UnknownParameters(unknown));
        }

        Ok(())
    }

    pub fn display(&self) {
        println!("   {:-^80}", " control parameters ");
        println!();

        let rows = [
            ("verbosity", self.verbosity.clone()),
            ("units", self.units.get_name().to_string()),
            ("dimension", self.dimension.to_string()),
            ("dielectric", self.dielectric.to_string()),
            ("newton_pair", self.newton_pair.to_string()),
            ("special_coul", self.special_coul.iter().join(" ")),
            ("drude_types", self.drude_types.clone()),
            ("drude_pairs", self.drude_pairs.clone()),
            ("pair_thole", self.pair_thole.clone()),
            ("transform_group", self.transform_group.clone()),
            ("temp_group", self.temp_group.clone()),
            ("temp_extra_dof", self.get_temp_extra_dof().to_string()),
            ("temp_dynamic", self.temp_dynamic.to_string()),
            ("system_file", self.system_file.clone()),
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

        for coeff in self.pair_coeff.iter() {
            println!(
                "   {:<width1$} = {:>width2$}",
                "pair_coeff",
                coeff,
                width1 = OUT_WIDTH1,
                width2 = OUT_WIDTH2
            );
        }

        for group in self.groups.iter() {
            println!(
                "   {:<width1$} = {:>width2$}",
                format!("group {}", group.name),
                group.types.iter().join(" "),
                width1 = OUT_WIDTH1,
                width2 = OUT_WIDTH2
            );
        }

        println!();
    }
}

fn read_file_data_to_vec(inpfile: &str) -> Result<Vec<String>, ControlError> {
    let io_err = |source| ControlError::Io {
        path: inpfile.to_string(),
        source,
    };

    let file = File::open(inpfile).map_err(io_err)?;

    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<String>, _>>()
        .map_err(io_err)
}

fn invalid(key: &str, value: &str) -> ControlError {
    ControlError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ControlError> {
    value.parse::<T>().map_err(|_| invalid(key, value))
}

#[cfg(test)]
mod tests;
