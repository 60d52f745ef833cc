//! Input parsing for receptor structures.

use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::atom::{AdType, Atom};

/// Errors that can occur during file parsing.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Parse the coordinate record of an ATOM/HETATM line.
///
/// Returns `Ok(None)` when the atom type code in columns 77-78 is not
/// supported by the docking core; callers keep the raw line but skip the
/// atom for topology and scoring.
pub(crate) fn parse_atom_record(line: &str, line_number: usize) -> Result<Option<Atom>, IoError> {
    if line.len() < 79 {
        return Err(IoError::Parse {
            line: line_number,
            message: format!("line too short for an atom record: {line}"),
        });
    }

    let ad = match AdType::from_code(&line[77..79]) {
        Some(ad) => ad,
        None => return Ok(None),
    };

    let serial = line[6..11]
        .trim()
        .parse::<usize>()
        .map_err(|_| IoError::Parse {
            line: line_number,
            message: format!("invalid atom serial number: {}", &line[6..11]),
        })?;

    let mut coord = [0.0f64; 3];
    for (i, range) in [(30, 38), (38, 46), (46, 54)].iter().enumerate() {
        coord[i] = line[range.0..range.1]
            .trim()
            .parse::<f64>()
            .map_err(|_| IoError::Parse {
                line: line_number,
                message: format!("invalid coordinate: {}", &line[range.0..range.1]),
            })?;
    }

    Ok(Some(Atom::new(
        serial,
        Vector3::new(coord[0], coord[1], coord[2]),
        ad,
    )))
}

/// Parse the heavy atoms of a receptor PDBQT file.
///
/// Only ATOM/HETATM records contribute; hydrogens and unsupported atom
/// types are skipped because the energy maps are built from heavy atoms.
pub fn parse_receptor_pdbqt<P: AsRef<Path>>(path: P) -> Result<Vec<Atom>, IoError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut atoms = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if !(line.starts_with("ATOM") || line.starts_with("HETATM")) {
            continue;
        }
        if let Some(atom) = parse_atom_record(&line, i + 1)? {
            if !atom.is_hydrogen() {
                atoms.push(atom);
            }
        }
    }
    Ok(atoms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::XsType;
    use std::io::Write;

    fn atom_line(serial: usize, x: f64, y: f64, z: f64, code: &str) -> String {
        format!(
            "ATOM  {serial:>5}  C   LIG A   1    {x:>8.3}{y:>8.3}{z:>8.3}  0.00  0.00    +0.000 {code:<2}"
        )
    }

    #[test]
    fn test_parse_atom_record_fields() {
        let line = atom_line(42, 1.5, -2.25, 10.125, "OA");
        let atom = parse_atom_record(&line, 1)
            .expect("well-formed line")
            .expect("supported type");
        assert_eq!(atom.serial, 42);
        assert_eq!(atom.ad, AdType::AcceptorOxygen);
        assert_eq!(atom.xs, XsType::OxygenAcceptor);
        assert!((atom.coord - Vector3::new(1.5, -2.25, 10.125)).norm() < 1e-12);
    }

    #[test]
    fn test_parse_atom_record_unsupported_type() {
        let line = atom_line(1, 0.0, 0.0, 0.0, "Zn");
        assert!(parse_atom_record(&line, 1).expect("well-formed line").is_none());
    }

    #[test]
    fn test_parse_atom_record_short_line() {
        assert!(parse_atom_record("ATOM      1  C", 3).is_err());
    }

    #[test]
    fn test_parse_receptor_skips_hydrogens() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "REMARK receptor").expect("write");
        writeln!(file, "{}", atom_line(1, 0.0, 0.0, 0.0, "C")).expect("write");
        writeln!(file, "{}", atom_line(2, 1.0, 0.0, 0.0, "HD")).expect("write");
        writeln!(file, "{}", atom_line(3, 2.0, 0.0, 0.0, "N")).expect("write");
        writeln!(file, "TER").expect("write");

        let atoms = parse_receptor_pdbqt(file.path()).expect("parse");
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[0].serial, 1);
        assert_eq!(atoms[1].serial, 3);
    }
}
