//! Canonical spreadsheet columns and test outcomes.
//!
//! Each variant carries the reference label that raw header or result text is
//! scored against. Declaration order is significant: it is the tie-break
//! order when two labels score equally.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic column of an antibiogram sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    SpecimenId,
    PatientName,
    Department,
    Organism,
    RequestDate,
    SpecimenDate,
    AntibioticName,
    Result,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 8] = [
        Self::SpecimenId,
        Self::PatientName,
        Self::Department,
        Self::Organism,
        Self::RequestDate,
        Self::SpecimenDate,
        Self::AntibioticName,
        Self::Result,
    ];

    /// Columns a sheet header must resolve before any row is read.
    pub const REQUIRED: [CanonicalColumn; 3] =
        [Self::SpecimenId, Self::AntibioticName, Self::Result];

    /// Reference header label used for approximate matching.
    pub fn label(self) -> &'static str {
        match self {
            Self::SpecimenId => "barkod no",
            Self::PatientName => "hasta adi soyadi",
            Self::Department => "birim",
            Self::Organism => "organizma adı",
            Self::RequestDate => "istem tarihi",
            Self::SpecimenDate => "barkod tarihi",
            Self::AntibioticName => "antibiyotik adı",
            Self::Result => "sonuç şablon",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SpecimenId => "specimen id",
            Self::PatientName => "patient name",
            Self::Department => "department",
            Self::Organism => "organism",
            Self::RequestDate => "request date",
            Self::SpecimenDate => "specimen date",
            Self::AntibioticName => "antibiotic name",
            Self::Result => "result",
        };
        f.write_str(name)
    }
}

/// Interpreted outcome of one antibiotic test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Resistant,
    Susceptible,
    SusceptibleAtHighDose,
}

impl TestOutcome {
    pub const ALL: [TestOutcome; 3] = [
        Self::Resistant,
        Self::Susceptible,
        Self::SusceptibleAtHighDose,
    ];

    /// Reference result label used for approximate matching.
    pub fn label(self) -> &'static str {
        match self {
            Self::Resistant => "dirençli",
            Self::Susceptible => "duyarlı",
            Self::SusceptibleAtHighDose => "yüksek dozda duyarlı",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resistant => "resistant",
            Self::Susceptible => "susceptible",
            Self::SusceptibleAtHighDose => "susceptible at high dose",
        };
        f.write_str(name)
    }
}
