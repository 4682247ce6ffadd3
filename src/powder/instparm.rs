// SPDX-License-Identifier: LGPL-2.1

//! GSAS instrument-parameter files.
//!
//! The file is line-oriented with a fixed 12-character key column; the
//! remainder of each line is the raw value, kept as text because the
//! meaning of a value depends on the key and on the instrument type.
//! When no parameter file accompanies a data file, one of a few built-in
//! presets stands in.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::Result;

const KEY_WIDTH: usize = 12;

/// Scan-coordinate convention of a data set, recovered from the `HTYPE`
/// parameter: constant-wavelength scans store centidegrees, time-of-flight
/// scans store microseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
  ConstantWavelength,
  TimeOfFlight,
}

impl DataKind {
  /// Divisor taking stored x values to degrees (CW) or milliseconds (TOF).
  pub fn x_scale(&self) -> f64 {
    match self {
      Self::ConstantWavelength => 100.0,
      Self::TimeOfFlight => 1000.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstrumentParams {
  map: BTreeMap<String, String>,
}

impl InstrumentParams {
  pub fn load(path: &Path) -> Result<InstrumentParams> {
    Ok(Self::parse(&fs::read_to_string(path)?))
  }

  pub fn parse(text: &str) -> InstrumentParams {
    let mut map = BTreeMap::new();
    for line in text.lines() {
      if line.len() <= KEY_WIDTH {
        continue;
      }
      map.insert(line[..KEY_WIDTH].to_string(), line[KEY_WIDTH..].to_string());
    }
    InstrumentParams { map }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.map.get(key).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  /// Read the histogram type record; its third character distinguishes
  /// time-of-flight ('T') from constant-wavelength data.
  pub fn data_kind(&self) -> DataKind {
    match self.get("INS   HTYPE ").and_then(|v| v.chars().nth(2)) {
      Some('T') => DataKind::TimeOfFlight,
      _ => DataKind::ConstantWavelength,
    }
  }
}

/// Built-in parameter sets used when no `.prm` file is at hand.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
  /// Sealed-tube Cu Ka lab diffractometer; the assumed default.
  LabCuKa,
  /// Synchrotron CW beamline, short wavelength.
  SynchrotronCw,
  /// Constant-wavelength reactor neutron instrument.
  NeutronCw,
  /// TOF spallation-source detector banks at three scattering angles.
  TofBank2,
  TofBank3,
  TofBank4,
}

impl Preset {
  pub const ALL: [Preset; 6] = [
    Preset::LabCuKa,
    Preset::SynchrotronCw,
    Preset::NeutronCw,
    Preset::TofBank2,
    Preset::TofBank3,
    Preset::TofBank4,
  ];

  pub fn params(&self) -> &'static InstrumentParams {
    match self {
      Self::LabCuKa => &PRESET_LAB_CUKA,
      Self::SynchrotronCw => &PRESET_SYNCHROTRON_CW,
      Self::NeutronCw => &PRESET_NEUTRON_CW,
      Self::TofBank2 => &PRESET_TOF_BANK2,
      Self::TofBank3 => &PRESET_TOF_BANK3,
      Self::TofBank4 => &PRESET_TOF_BANK4,
    }
  }
}

fn preset_from_pairs(pairs: &[(&str, &str)]) -> InstrumentParams {
  let mut map = BTreeMap::new();
  for (key, value) in pairs {
    map.insert((*key).to_string(), (*value).to_string());
  }
  InstrumentParams { map }
}

lazy_static! {
  static ref PRESET_LAB_CUKA: InstrumentParams = preset_from_pairs(&[
    ("INS   HTYPE ", "PXC "),
    ("INS  1 ICONS", "  1.540500  1.544300       0.0         0       0.7    0       0.5   "),
    ("INS  1PRCF1 ", "    3    8      0.01                                                "),
    ("INS  1PRCF11", "   2.000000E+00  -2.000000E+00   5.000000E+00   0.000000E+00        "),
    ("INS  1PRCF12", "   0.000000E+00   0.000000E+00   0.150000E-01   0.150000E-01        "),
  ]);
  static ref PRESET_SYNCHROTRON_CW: InstrumentParams = preset_from_pairs(&[
    ("INS   HTYPE ", "PXC "),
    ("INS  1 ICONS", "  0.413263  0.000000       0.0         0       0.9    0       0.5   "),
    ("INS  1PRCF1 ", "    3    8      0.01                                                "),
    ("INS  1PRCF11", "   1.000000E+00   0.000000E+00   1.000000E+00   0.000000E+00        "),
    ("INS  1PRCF12", "   0.000000E+00   0.000000E+00   0.100000E-01   0.100000E-01        "),
  ]);
  static ref PRESET_NEUTRON_CW: InstrumentParams = preset_from_pairs(&[
    ("INS   HTYPE ", "PNC "),
    ("INS  1 ICONS", "  1.909000  0.000000       0.0         0       0.0    0       0.0   "),
    ("INS  1PRCF1 ", "    3    8      0.01                                                "),
    ("INS  1PRCF11", "   2.870000E+02  -1.930000E+02   1.200000E+02   0.000000E+00        "),
    ("INS  1PRCF12", "   0.000000E+00   0.000000E+00   0.000000E+00   0.000000E+00        "),
  ]);
  static ref PRESET_TOF_BANK2: InstrumentParams = preset_from_pairs(&[
    ("INS   HTYPE ", "PNT "),
    ("INS  2 ICONS", "  22585.8       0.00      0.00                                      "),
    ("INS  2PRCF1 ", "    1   12      0.002                                               "),
    ("INS  2PRCF11", "   0.000000E+00   6.140000E+01   6.160000E+00   0.000000E+00        "),
    ("INS  2PRCF12", "   0.000000E+00   0.000000E+00   0.000000E+00   0.000000E+00        "),
  ]);
  static ref PRESET_TOF_BANK3: InstrumentParams = preset_from_pairs(&[
    ("INS   HTYPE ", "PNT "),
    ("INS  3 ICONS", "  15583.6       0.00      0.00                                      "),
    ("INS  3PRCF1 ", "    1   12      0.002                                               "),
    ("INS  3PRCF11", "   0.000000E+00   4.600000E+01   4.800000E+00   0.000000E+00        "),
    ("INS  3PRCF12", "   0.000000E+00   0.000000E+00   0.000000E+00   0.000000E+00        "),
  ]);
  static ref PRESET_TOF_BANK4: InstrumentParams = preset_from_pairs(&[
    ("INS   HTYPE ", "PNT "),
    ("INS  4 ICONS", "   9523.1       0.00      0.00                                      "),
    ("INS  4PRCF1 ", "    1   12      0.002                                               "),
    ("INS  4PRCF11", "   0.000000E+00   2.800000E+01   3.100000E+00   0.000000E+00        "),
    ("INS  4PRCF12", "   0.000000E+00   0.000000E+00   0.000000E+00   0.000000E+00        "),
  ]);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_column_is_exactly_twelve_chars() {
    let params = InstrumentParams::parse("INS   HTYPE PXC \nINS  1 ICONS  1.540500  1.544300\nshort\n");
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("INS   HTYPE "), Some("PXC "));
    assert_eq!(params.get("INS  1 ICONS"), Some("  1.540500  1.544300"));
  }

  #[test]
  fn data_kind_follows_htype() {
    assert_eq!(InstrumentParams::parse("INS   HTYPE PXC \n").data_kind(), DataKind::ConstantWavelength);
    assert_eq!(InstrumentParams::parse("INS   HTYPE PNT \n").data_kind(), DataKind::TimeOfFlight);
    // No HTYPE record at all reads as CW, matching the lab default.
    assert_eq!(InstrumentParams::parse("").data_kind(), DataKind::ConstantWavelength);
  }

  #[test]
  fn presets_are_complete_and_typed() {
    for preset in Preset::ALL {
      let params = preset.params();
      assert!(!params.is_empty());
      assert!(params.get("INS   HTYPE ").is_some());
    }
    assert_eq!(Preset::LabCuKa.params().data_kind(), DataKind::ConstantWavelength);
    assert_eq!(Preset::TofBank3.params().data_kind(), DataKind::TimeOfFlight);
    assert!(Preset::LabCuKa.params().get("INS  1 ICONS").unwrap().starts_with("  1.540500"));
  }

  #[test]
  fn x_scale_per_kind() {
    assert_eq!(DataKind::ConstantWavelength.x_scale(), 100.0);
    assert_eq!(DataKind::TimeOfFlight.x_scale(), 1000.0);
  }
}
