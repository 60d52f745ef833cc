//! Atom representation and related functionality

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// AutoDock atom type as read from columns 77-78 of a PDBQT record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdType {
    /// Nonpolar hydrogen (H)
    Hydrogen,
    /// Polar hydrogen (HD)
    PolarHydrogen,
    /// Aliphatic carbon (C)
    Carbon,
    /// Aromatic carbon (A)
    AromaticCarbon,
    /// Nitrogen (N)
    Nitrogen,
    /// Nitrogen, hydrogen bond acceptor (NA)
    AcceptorNitrogen,
    /// Oxygen, hydrogen bond acceptor (OA)
    AcceptorOxygen,
    /// Sulfur (S)
    Sulfur,
    /// Sulfur, hydrogen bond acceptor (SA)
    AcceptorSulfur,
    /// Selenium (Se)
    Selenium,
    /// Phosphorus (P)
    Phosphorus,
    /// Fluorine (F)
    Fluorine,
    /// Chlorine (Cl)
    Chlorine,
    /// Bromine (Br)
    Bromine,
    /// Iodine (I)
    Iodine,
}

impl AdType {
    /// Parse an AutoDock type code. Returns `None` for codes the docking
    /// core does not support; such atoms are kept in the output stream but
    /// excluded from the topology.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(AdType::Hydrogen),
            "HD" => Some(AdType::PolarHydrogen),
            "C" => Some(AdType::Carbon),
            "A" => Some(AdType::AromaticCarbon),
            "N" => Some(AdType::Nitrogen),
            "NA" => Some(AdType::AcceptorNitrogen),
            "OA" => Some(AdType::AcceptorOxygen),
            "S" => Some(AdType::Sulfur),
            "SA" => Some(AdType::AcceptorSulfur),
            "Se" => Some(AdType::Selenium),
            "P" => Some(AdType::Phosphorus),
            "F" => Some(AdType::Fluorine),
            "Cl" => Some(AdType::Chlorine),
            "Br" => Some(AdType::Bromine),
            "I" => Some(AdType::Iodine),
            _ => None,
        }
    }

    /// The type code as it appears in a PDBQT file.
    pub fn to_code(self) -> &'static str {
        match self {
            AdType::Hydrogen => "H",
            AdType::PolarHydrogen => "HD",
            AdType::Carbon => "C",
            AdType::AromaticCarbon => "A",
            AdType::Nitrogen => "N",
            AdType::AcceptorNitrogen => "NA",
            AdType::AcceptorOxygen => "OA",
            AdType::Sulfur => "S",
            AdType::AcceptorSulfur => "SA",
            AdType::Selenium => "Se",
            AdType::Phosphorus => "P",
            AdType::Fluorine => "F",
            AdType::Chlorine => "Cl",
            AdType::Bromine => "Br",
            AdType::Iodine => "I",
        }
    }

    /// Covalent radius of the underlying element in Angstroms.
    pub fn covalent_radius(self) -> f64 {
        match self {
            AdType::Hydrogen | AdType::PolarHydrogen => 0.37,
            AdType::Carbon | AdType::AromaticCarbon => 0.77,
            AdType::Nitrogen | AdType::AcceptorNitrogen => 0.75,
            AdType::AcceptorOxygen => 0.73,
            AdType::Sulfur | AdType::AcceptorSulfur => 1.02,
            AdType::Selenium => 1.16,
            AdType::Phosphorus => 1.06,
            AdType::Fluorine => 0.71,
            AdType::Chlorine => 0.99,
            AdType::Bromine => 1.14,
            AdType::Iodine => 1.33,
        }
    }

    pub fn is_hydrogen(self) -> bool {
        matches!(self, AdType::Hydrogen | AdType::PolarHydrogen)
    }

    /// Initial XScore interaction type before donor/hydrophobic adjustment.
    pub fn to_xs(self) -> XsType {
        match self {
            AdType::Hydrogen | AdType::PolarHydrogen => XsType::Hydrogen,
            AdType::Carbon | AdType::AromaticCarbon => XsType::CarbonHydrophobic,
            AdType::Nitrogen => XsType::NitrogenPolar,
            AdType::AcceptorNitrogen => XsType::NitrogenAcceptor,
            AdType::AcceptorOxygen => XsType::OxygenAcceptor,
            AdType::Sulfur | AdType::AcceptorSulfur | AdType::Selenium => XsType::Sulfur,
            AdType::Phosphorus => XsType::Phosphorus,
            AdType::Fluorine => XsType::Fluorine,
            AdType::Chlorine => XsType::Chlorine,
            AdType::Bromine => XsType::Bromine,
            AdType::Iodine => XsType::Iodine,
        }
    }
}

/// XScore interaction type, the key into grid maps and pair-potential
/// tables. Only the 14 scored heavy-atom types take part in scoring; the
/// `Hydrogen` sentinel exists so every parsed atom carries a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XsType {
    CarbonHydrophobic,
    CarbonPolar,
    NitrogenPolar,
    NitrogenDonor,
    NitrogenAcceptor,
    NitrogenDonorAcceptor,
    OxygenAcceptor,
    OxygenDonorAcceptor,
    Sulfur,
    Phosphorus,
    Fluorine,
    Chlorine,
    Bromine,
    Iodine,
    Hydrogen,
}

impl XsType {
    /// Number of scored heavy-atom types.
    pub const NUM_SCORED: usize = 14;

    /// The scored types in index order.
    pub const SCORED: [XsType; Self::NUM_SCORED] = [
        XsType::CarbonHydrophobic,
        XsType::CarbonPolar,
        XsType::NitrogenPolar,
        XsType::NitrogenDonor,
        XsType::NitrogenAcceptor,
        XsType::NitrogenDonorAcceptor,
        XsType::OxygenAcceptor,
        XsType::OxygenDonorAcceptor,
        XsType::Sulfur,
        XsType::Phosphorus,
        XsType::Fluorine,
        XsType::Chlorine,
        XsType::Bromine,
        XsType::Iodine,
    ];

    /// Index into grid maps and pair tables. The `Hydrogen` sentinel maps
    /// past the scored range and must never reach a lookup.
    pub fn index(self) -> usize {
        match self {
            XsType::CarbonHydrophobic => 0,
            XsType::CarbonPolar => 1,
            XsType::NitrogenPolar => 2,
            XsType::NitrogenDonor => 3,
            XsType::NitrogenAcceptor => 4,
            XsType::NitrogenDonorAcceptor => 5,
            XsType::OxygenAcceptor => 6,
            XsType::OxygenDonorAcceptor => 7,
            XsType::Sulfur => 8,
            XsType::Phosphorus => 9,
            XsType::Fluorine => 10,
            XsType::Chlorine => 11,
            XsType::Bromine => 12,
            XsType::Iodine => 13,
            XsType::Hydrogen => Self::NUM_SCORED,
        }
    }

    /// Van der Waals radius in Angstroms, used by the pair potential.
    pub fn vdw_radius(self) -> f64 {
        match self {
            XsType::CarbonHydrophobic | XsType::CarbonPolar => 1.9,
            XsType::NitrogenPolar
            | XsType::NitrogenDonor
            | XsType::NitrogenAcceptor
            | XsType::NitrogenDonorAcceptor => 1.8,
            XsType::OxygenAcceptor | XsType::OxygenDonorAcceptor => 1.7,
            XsType::Sulfur => 2.0,
            XsType::Phosphorus => 2.1,
            XsType::Fluorine => 1.5,
            XsType::Chlorine => 1.8,
            XsType::Bromine => 2.0,
            XsType::Iodine => 2.2,
            XsType::Hydrogen => 0.0,
        }
    }

    pub fn is_hydrophobic(self) -> bool {
        matches!(
            self,
            XsType::CarbonHydrophobic
                | XsType::Fluorine
                | XsType::Chlorine
                | XsType::Bromine
                | XsType::Iodine
        )
    }

    pub fn is_donor(self) -> bool {
        matches!(
            self,
            XsType::NitrogenDonor | XsType::NitrogenDonorAcceptor | XsType::OxygenDonorAcceptor
        )
    }

    pub fn is_acceptor(self) -> bool {
        matches!(
            self,
            XsType::NitrogenAcceptor
                | XsType::NitrogenDonorAcceptor
                | XsType::OxygenAcceptor
                | XsType::OxygenDonorAcceptor
        )
    }
}

/// An atom of the ligand or the receptor.
///
/// Coordinates of ligand atoms are rewritten exactly once after parsing,
/// from world space to the owning frame's rotor-Y origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// Atom serial number as read from the input file.
    pub serial: usize,

    /// 3D coordinate (in Angstroms).
    pub coord: Vector3<f64>,

    /// AutoDock type parsed from the input.
    pub ad: AdType,

    /// Current XScore interaction type. Starts at `ad.to_xs()` and may be
    /// promoted by `donorize` or demoted by `dehydrophobicize` while the
    /// covalent graph is built.
    pub xs: XsType,
}

impl Atom {
    pub fn new(serial: usize, coord: Vector3<f64>, ad: AdType) -> Self {
        Self {
            serial,
            coord,
            ad,
            xs: ad.to_xs(),
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.ad.is_hydrogen()
    }

    pub fn is_polar_hydrogen(&self) -> bool {
        self.ad == AdType::PolarHydrogen
    }

    /// A heavy atom that is not carbon. Only hetero atoms can accept or
    /// donate hydrogen bonds.
    pub fn is_hetero(&self) -> bool {
        !matches!(
            self.ad,
            AdType::Hydrogen | AdType::PolarHydrogen | AdType::Carbon | AdType::AromaticCarbon
        )
    }

    /// Geometric covalent-bond test: the interatomic distance is below
    /// 1.1 times the sum of the covalent radii.
    pub fn has_covalent_bond(&self, other: &Atom) -> bool {
        let cutoff = 1.1 * (self.ad.covalent_radius() + other.ad.covalent_radius());
        (self.coord - other.coord).norm_squared() < cutoff * cutoff
    }

    /// Marks this atom as a hydrogen bond donor. Called on the hetero atom
    /// bonded to a polar hydrogen.
    pub fn donorize(&mut self) {
        self.xs = match self.xs {
            XsType::NitrogenPolar => XsType::NitrogenDonor,
            XsType::NitrogenAcceptor => XsType::NitrogenDonorAcceptor,
            XsType::OxygenAcceptor => XsType::OxygenDonorAcceptor,
            other => other,
        };
    }

    /// A carbon bonded to a hetero atom is no longer hydrophobic.
    pub fn dehydrophobicize(&mut self) {
        if self.xs == XsType::CarbonHydrophobic {
            self.xs = XsType::CarbonPolar;
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} ({}, {}, {})",
            self.ad.to_code(),
            self.serial,
            self.coord.x,
            self.coord.y,
            self.coord.z
        )
    }
}
