//! Region types and the property names their boundary files use.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BandMapError, Result};

/// Kind of area a boundary file describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    /// Lower layer super output areas (2011)
    Lsoa,
    /// Sub-ICB locations (2022)
    Sicbl,
    /// Welsh local health boards (2020)
    Lhb,
}

impl RegionType {
    pub const ALL: [RegionType; 3] = [RegionType::Lsoa, RegionType::Sicbl, RegionType::Lhb];

    /// Boundary file name used when none is configured
    pub fn default_file(&self) -> &'static str {
        match self {
            RegionType::Lsoa => "LSOA.geojson",
            RegionType::Sicbl => "SICBL.geojson",
            RegionType::Lhb => "LHB.geojson",
        }
    }

    /// Name/code property pairs accepted for this region type, preferred first
    pub fn accepted_properties(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            RegionType::Lsoa => &[("LSOA11NM", "LSOA11CD"), ("LSOA21NM", "LSOA21CD")],
            RegionType::Sicbl => &[("SICBL22NM", "SICBL22CD"), ("SICBL23NM", "SICBL23CD")],
            RegionType::Lhb => &[("LHB20NM", "LHB20CD"), ("LHB22NM", "LHB22CD")],
        }
    }

    /// Pick the first accepted property pair present in `keys`.
    ///
    /// Fails with [`BandMapError::Schema`] when no declared pair is present;
    /// property names are matched exactly.
    pub fn resolve_properties<'a, I>(&self, keys: I) -> Result<PropertyNames>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keys: Vec<&str> = keys.into_iter().collect();

        for (name, code) in self.accepted_properties() {
            if keys.contains(name) && keys.contains(code) {
                return Ok(PropertyNames {
                    name: name.to_string(),
                    code: code.to_string(),
                });
            }
        }

        let accepted: Vec<String> = self
            .accepted_properties()
            .iter()
            .map(|(name, code)| format!("{}/{}", name, code))
            .collect();
        Err(BandMapError::Schema {
            message: format!(
                "{} boundaries need one of the property pairs [{}]; found [{}]",
                self,
                accepted.join(", "),
                keys.join(", ")
            ),
        })
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionType::Lsoa => "LSOA",
            RegionType::Sicbl => "SICBL",
            RegionType::Lhb => "LHB",
        };
        write!(f, "{}", name)
    }
}

/// Property names resolved for one boundary file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyNames {
    pub name: String,
    pub code: String,
}

/// Which area identifier joins values to boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JoinKey {
    /// Area name, e.g. "Bath and North East Somerset 001A"
    Name,
    /// Area code, e.g. "E01014370"
    #[default]
    Code,
}
