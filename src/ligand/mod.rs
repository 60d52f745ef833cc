//! Flexible ligand model: parsing, topology, and conformation scoring.
//!
//! A ligand is parsed once from a PDBQT-like stream into a tree of rigid
//! frames connected by rotatable bonds, then treated as read-only shared
//! state. A conformation is a flat vector `x` of length
//! `7 + num_active_torsions`: the ROOT position, the ROOT orientation
//! quaternion in (w, x, y, z) order, and one raw torsion angle in radians
//! per active rotor. The matching gradient vector has length
//! `6 + num_active_torsions`: force, torque, and per-torsion projected
//! torques, all with the derivative sign convention.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::atom::Atom;
use crate::io::parse_atom_record;
use crate::math;
use crate::optimization::Pose;
use crate::receptor::Receptor;
use crate::scoring::ScoringFunction;

/// Errors raised while constructing a ligand from its input file.
#[derive(Error, Debug)]
pub enum LigandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error reading {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Error parsing {path}: an empty BRANCH has been detected, indicating the input ligand structure is probably invalid")]
    EmptyBranch { path: String },

    #[error("Error parsing {path}: ENDBRANCH without a matching BRANCH")]
    UnmatchedEndBranch { path: String },

    #[error("Error parsing {path}: BRANCH without a matching ENDBRANCH")]
    UnclosedBranch { path: String },

    #[error("Error parsing {path}: BRANCH rotor X serial {serial} not found in the current frame")]
    RotorXNotFound { path: String, serial: usize },

    #[error("Error parsing {path}: no supported heavy atoms")]
    NoHeavyAtoms { path: String },

    #[error("Error parsing {path}: {message}")]
    Malformed { path: String, message: String },
}

/// A rigid group of atoms, node of the ligand's torsion tree.
///
/// Frames are stored in depth-first insertion order, so every non-root
/// frame's parent has a strictly smaller index and a single in-order sweep
/// implements forward kinematics.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Index of the parent frame. ROOT points to itself.
    pub parent: usize,

    /// Input-file serial of the parent-side rotor atom.
    pub rotorx_serial: usize,

    /// Input-file serial of this frame's first heavy atom.
    pub rotory_serial: usize,

    /// Heavy-atom index of rotor X, owned by the parent frame.
    pub rotorx_index: usize,

    /// Heavy-atom index of rotor Y, the first heavy atom of this frame.
    pub rotory_index: usize,

    /// Half-open range of owned heavy atoms.
    pub heavy_begin: usize,
    pub heavy_end: usize,

    /// Half-open range of owned hydrogens.
    pub hydrogen_begin: usize,
    pub hydrogen_end: usize,

    /// Child frame indices in insertion order.
    pub branches: Vec<usize>,

    /// False when the torsion cannot change the scored energy (the frame
    /// owns only rotor Y plus hydrogens, e.g. -OH or -NH2).
    pub active: bool,

    /// Slot of this frame's torsion in `x[7..]` / `g[6..]`. Only
    /// meaningful when `active` is true.
    pub torsion_index: usize,

    /// Vector from the parent's rotor Y to this frame's rotor Y, in
    /// parent-local coordinates.
    pub parent_rotory_to_current_rotory: Vector3<f64>,

    /// Unit vector along the rotor axis, in parent-local coordinates.
    pub parent_rotorx_to_current_rotory: Vector3<f64>,
}

impl Frame {
    fn root() -> Self {
        Self {
            parent: 0,
            rotorx_serial: 0,
            rotory_serial: 0,
            rotorx_index: 0,
            rotory_index: 0,
            heavy_begin: 0,
            heavy_end: 0,
            hydrogen_begin: 0,
            hydrogen_end: 0,
            branches: Vec::new(),
            active: true,
            torsion_index: usize::MAX,
            parent_rotory_to_current_rotory: Vector3::zeros(),
            parent_rotorx_to_current_rotory: Vector3::zeros(),
        }
    }

    fn branch(
        parent: usize,
        rotorx_serial: usize,
        rotory_serial: usize,
        rotorx_index: usize,
        heavy_begin: usize,
        hydrogen_begin: usize,
    ) -> Self {
        Self {
            parent,
            rotorx_serial,
            rotory_serial,
            rotorx_index,
            rotory_index: heavy_begin,
            heavy_begin,
            heavy_end: 0,
            hydrogen_begin,
            hydrogen_end: 0,
            branches: Vec::new(),
            active: true,
            torsion_index: usize::MAX,
            parent_rotory_to_current_rotory: Vector3::zeros(),
            parent_rotorx_to_current_rotory: Vector3::zeros(),
        }
    }
}

/// A pair of heavy atoms separated by more than three covalent bonds,
/// scored against the intra-ligand pair potential.
#[derive(Debug, Clone, Copy)]
pub struct InteractingPair {
    pub i: usize,
    pub j: usize,

    /// Base offset of the pair's type block in the scoring tables.
    pub p_offset: usize,
}

/// A parsed ligand, immutable after construction.
#[derive(Debug, Clone)]
pub struct Ligand {
    /// Heavy atoms in file order, coordinates relative to the owning
    /// frame's rotor Y.
    pub heavy_atoms: Vec<Atom>,

    /// Hydrogens in file order, coordinates relative to the owning
    /// frame's rotor Y.
    pub hydrogens: Vec<Atom>,

    /// Rigid frames; `frames[0]` is ROOT.
    pub frames: Vec<Frame>,

    /// Intra-ligand interacting pairs.
    pub interacting_pairs: Vec<InteractingPair>,

    /// Original input lines, kept for output rewriting.
    pub lines: Vec<String>,

    pub num_heavy_atoms: usize,
    pub num_hydrogens: usize,
    pub num_frames: usize,
    pub num_torsions: usize,
    pub num_active_torsions: usize,
    pub num_heavy_atoms_inverse: f64,
}

impl Ligand {
    /// Parse a ligand from a PDBQT file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LigandError> {
        let name = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|source| LigandError::Read {
            path: name.clone(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), &name)
    }

    /// Parse a ligand from any buffered stream. `name` identifies the
    /// source in error messages.
    pub fn from_reader<R: BufRead>(reader: R, name: &str) -> Result<Self, LigandError> {
        let mut heavy_atoms: Vec<Atom> = Vec::with_capacity(100);
        let mut hydrogens: Vec<Atom> = Vec::with_capacity(50);
        let mut frames = vec![Frame::root()];
        let mut lines: Vec<String> = Vec::with_capacity(200);
        let mut bonds: Vec<Vec<usize>> = Vec::with_capacity(100);
        let mut current = 0usize;
        let mut num_active_torsions = 0usize;
        let mut line_number = 0usize;

        for line in reader.lines() {
            let line = line.map_err(|source| LigandError::Read {
                path: name.to_string(),
                source,
            })?;
            line_number += 1;
            let record = if line.len() >= 6 { &line[..6] } else { line.as_str() };
            match record {
                "ATOM  " | "HETATM" => {
                    lines.push(line.clone());
                    let a = parse_atom_record(&line, line_number).map_err(|e| {
                        LigandError::Malformed {
                            path: name.to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    // Unsupported atom types stay in the line buffer but
                    // take no part in the topology.
                    let mut a = match a {
                        Some(a) => a,
                        None => continue,
                    };

                    if a.is_hydrogen() {
                        // The hetero atom bonded to a polar hydrogen is a
                        // hydrogen bond donor.
                        if a.is_polar_hydrogen() {
                            for i in (frames[current].heavy_begin..heavy_atoms.len()).rev() {
                                if !heavy_atoms[i].is_hetero() {
                                    continue;
                                }
                                if a.has_covalent_bond(&heavy_atoms[i]) {
                                    heavy_atoms[i].donorize();
                                    break;
                                }
                            }
                        }
                        hydrogens.push(a);
                    } else {
                        // Covalent bonds within the current frame.
                        let i_new = heavy_atoms.len();
                        debug_assert_eq!(bonds.len(), i_new);
                        bonds.push(Vec::with_capacity(4));
                        for i in (frames[current].heavy_begin..i_new).rev() {
                            if a.has_covalent_bond(&heavy_atoms[i]) {
                                bonds[i_new].push(i);
                                bonds[i].push(i_new);
                                if a.is_hetero() && !heavy_atoms[i].is_hetero() {
                                    heavy_atoms[i].dehydrophobicize();
                                } else if !a.is_hetero() && heavy_atoms[i].is_hetero() {
                                    a.dehydrophobicize();
                                }
                            }
                        }

                        if current > 0 && a.serial == frames[current].rotory_serial {
                            frames[current].rotory_index = i_new;
                        }
                        heavy_atoms.push(a);
                    }
                }
                "BRANCH" => {
                    lines.push(line.clone());
                    let (rotorx_serial, rotory_serial) = parse_branch_serials(&line, name)?;

                    // Locate rotor X among the current frame's heavy atoms.
                    let rotorx_index = (frames[current].heavy_begin..heavy_atoms.len())
                        .find(|&i| heavy_atoms[i].serial == rotorx_serial)
                        .ok_or_else(|| LigandError::RotorXNotFound {
                            path: name.to_string(),
                            serial: rotorx_serial,
                        })?;

                    frames.push(Frame::branch(
                        current,
                        rotorx_serial,
                        rotory_serial,
                        rotorx_index,
                        heavy_atoms.len(),
                        hydrogens.len(),
                    ));
                    let inserted = frames.len() - 1;
                    frames[current].branches.push(inserted);
                    current = inserted;

                    // The atom ranges of the previously inserted frame end
                    // where the new frame begins.
                    frames[inserted - 1].heavy_end = heavy_atoms.len();
                    frames[inserted - 1].hydrogen_end = hydrogens.len();
                }
                "ENDBRA" => {
                    lines.push(line.clone());
                    if current == 0 {
                        return Err(LigandError::UnmatchedEndBranch {
                            path: name.to_string(),
                        });
                    }
                    if frames[current].heavy_begin == heavy_atoms.len() {
                        return Err(LigandError::EmptyBranch {
                            path: name.to_string(),
                        });
                    }

                    // A leaf frame owning only rotor Y (plus hydrogens),
                    // e.g. -OH or -NH2, carries no effective torsion.
                    if current == frames.len() - 1
                        && frames[current].heavy_begin + 1 == heavy_atoms.len()
                    {
                        frames[current].active = false;
                    } else {
                        num_active_torsions += 1;
                    }

                    let ry = frames[current].rotory_index;
                    let rx = frames[current].rotorx_index;
                    bonds[ry].push(rx);
                    bonds[rx].push(ry);

                    let ry_hetero = heavy_atoms[ry].is_hetero();
                    let rx_hetero = heavy_atoms[rx].is_hetero();
                    if ry_hetero && !rx_hetero {
                        heavy_atoms[rx].dehydrophobicize();
                    }
                    if rx_hetero && !ry_hetero {
                        heavy_atoms[ry].dehydrophobicize();
                    }

                    // Both vectors are world-space here; the post-parse
                    // translation makes them frame-local.
                    let parent = frames[current].parent;
                    let parent_rotory = frames[parent].rotory_index;
                    frames[current].parent_rotory_to_current_rotory =
                        heavy_atoms[ry].coord - heavy_atoms[parent_rotory].coord;
                    frames[current].parent_rotorx_to_current_rotory =
                        (heavy_atoms[ry].coord - heavy_atoms[rx].coord).normalize();

                    current = parent;
                }
                "ROOT" | "ENDROO" | "TORSDO" => {
                    lines.push(line.clone());
                }
                _ => {}
            }
        }

        if current != 0 {
            return Err(LigandError::UnclosedBranch {
                path: name.to_string(),
            });
        }
        if heavy_atoms.is_empty() {
            return Err(LigandError::NoHeavyAtoms {
                path: name.to_string(),
            });
        }

        let num_heavy_atoms = heavy_atoms.len();
        let num_hydrogens = hydrogens.len();
        let num_frames = frames.len();
        let last = num_frames - 1;
        frames[last].heavy_end = num_heavy_atoms;
        frames[last].hydrogen_end = num_hydrogens;

        // Assign torsion slots in the order the forward pass consumes
        // them: parents first, branches in insertion order.
        let mut t = 0usize;
        for k in 0..num_frames {
            let branches = frames[k].branches.clone();
            for b in branches {
                if frames[b].active {
                    frames[b].torsion_index = t;
                    t += 1;
                }
            }
        }
        debug_assert_eq!(t, num_active_torsions);

        // Re-express atom coordinates relative to the owning frame's
        // rotor Y.
        for frame in &frames {
            let origin = heavy_atoms[frame.rotory_index].coord;
            for atom in &mut heavy_atoms[frame.heavy_begin..frame.heavy_end] {
                atom.coord -= origin;
            }
            for atom in &mut hydrogens[frame.hydrogen_begin..frame.hydrogen_end] {
                atom.coord -= origin;
            }
        }

        let interacting_pairs = find_interacting_pairs(&frames, &heavy_atoms, &bonds);

        Ok(Self {
            heavy_atoms,
            hydrogens,
            frames,
            interacting_pairs,
            lines,
            num_heavy_atoms,
            num_hydrogens,
            num_frames,
            num_torsions: num_frames - 1,
            num_active_torsions,
            num_heavy_atoms_inverse: 1.0 / num_heavy_atoms as f64,
        })
    }

    /// Scores conformation `x`, writing the total energy into `e` and,
    /// when accepted, the analytic gradient into `g`.
    ///
    /// Returns false when the energy reaches `e_upper_bound`; the gradient
    /// is not computed in that case. The line search passes the Armijo
    /// bound here so insufficient steps are rejected without paying for
    /// the gradient.
    pub fn evaluate(
        &self,
        x: &[f64],
        sf: &ScoringFunction,
        rec: &Receptor,
        e_upper_bound: f64,
        e: &mut f64,
        g: &mut [f64],
    ) -> bool {
        debug_assert_eq!(x.len(), 7 + self.num_active_torsions);
        debug_assert_eq!(g.len(), 6 + self.num_active_torsions);

        let nf = self.num_frames;
        let mut origin = vec![Vector3::zeros(); nf];
        let mut axis = vec![Vector3::zeros(); nf];
        let mut orient = vec![UnitQuaternion::identity(); nf];
        let mut gf = vec![Vector3::zeros(); nf];
        let mut gt = vec![Vector3::zeros(); nf];
        let mut c = vec![Vector3::zeros(); self.num_heavy_atoms];
        let mut d = vec![Vector3::zeros(); self.num_heavy_atoms];

        origin[0] = Vector3::new(x[0], x[1], x[2]);
        orient[0] = math::quat_from_wxyz(x[3], x[4], x[5], x[6]);

        // Forward kinematics, frames in index order.
        for k in 0..nf {
            let f = &self.frames[k];
            let m = orient[k].to_rotation_matrix();
            for i in f.heavy_begin..f.heavy_end {
                c[i] = origin[k] + m * self.heavy_atoms[i].coord;
            }
            for &b in &f.branches {
                let bf = &self.frames[b];
                origin[b] = origin[k] + m * bf.parent_rotory_to_current_rotory;

                // An inactive frame owns only rotor Y, which sits at its
                // origin; its orientation is never consulted.
                if !bf.active {
                    debug_assert_eq!(bf.heavy_begin + 1, bf.heavy_end);
                    debug_assert_eq!(bf.heavy_begin, bf.rotory_index);
                    continue;
                }
                let a = m * bf.parent_rotorx_to_current_rotory;
                orient[b] =
                    math::axis_angle_to_quat(&Unit::new_normalize(a), x[7 + bf.torsion_index])
                        * orient[k];
                axis[b] = a;
            }
        }

        // Receptor grid term with a soft wall outside the box.
        *e = 0.0;
        for i in 0..self.num_heavy_atoms {
            if !rec.within(&c[i]) {
                *e += 10.0;
                d[i] = Vector3::zeros();
                continue;
            }

            let map = &rec.maps[self.heavy_atoms[i].xs.index()];
            debug_assert!(!map.is_empty());

            let index = rec.coordinate_to_index(&c[i]);
            let o000 = rec.map_index(index);
            let e000 = map[o000];
            let e100 = map[o000 + 1];
            let e010 = map[o000 + rec.num_probes[0]];
            let e001 = map[o000 + rec.num_probes[0] * rec.num_probes[1]];
            d[i] = Vector3::new(e100 - e000, e010 - e000, e001 - e000) * rec.granularity_inverse;
            *e += e000;
        }

        // Intra-ligand pair term.
        for p in &self.interacting_pairs {
            let r = c[p.j] - c[p.i];
            let r2 = r.norm_squared();
            if r2 < ScoringFunction::CUTOFF_SQR {
                let o = p.p_offset + (ScoringFunction::NS as f64 * r2) as usize;
                *e += sf.e[o];
                let derivative = sf.d[o] * r;
                d[p.i] -= derivative;
                d[p.j] += derivative;
            }
        }

        if *e >= e_upper_bound {
            return false;
        }

        // Aggregate force and torque from the leaves to the root.
        for k in (1..nf).rev() {
            let f = &self.frames[k];
            for i in f.heavy_begin..f.heavy_end {
                gf[k] += d[i];
                gt[k] += (c[i] - origin[k]).cross(&d[i]);
            }
            let gfk = gf[k];
            let gtk = gt[k];
            gf[f.parent] += gfk;
            gt[f.parent] += gtk + (origin[k] - origin[f.parent]).cross(&gfk);

            if f.active {
                g[6 + f.torsion_index] = gtk.dot(&axis[k]);
            }
        }
        let root = &self.frames[0];
        for i in root.heavy_begin..root.heavy_end {
            gf[0] += d[i];
            gt[0] += (c[i] - origin[0]).cross(&d[i]);
        }
        g[0] = gf[0].x;
        g[1] = gf[0].y;
        g[2] = gf[0].z;
        g[3] = gt[0].x;
        g[4] = gt[0].y;
        g[5] = gt[0].z;

        true
    }

    /// Replays forward kinematics for conformation `x` and returns world
    /// coordinates for all heavy atoms and hydrogens.
    pub fn compose_result(&self, e: f64, x: &[f64]) -> Pose {
        debug_assert_eq!(x.len(), 7 + self.num_active_torsions);

        let nf = self.num_frames;
        let mut origin = vec![Vector3::zeros(); nf];
        let mut orient = vec![UnitQuaternion::identity(); nf];
        let mut heavy_atoms = vec![Vector3::zeros(); self.num_heavy_atoms];
        let mut hydrogens = vec![Vector3::zeros(); self.num_hydrogens];

        origin[0] = Vector3::new(x[0], x[1], x[2]);
        orient[0] = math::quat_from_wxyz(x[3], x[4], x[5], x[6]);

        for k in 0..nf {
            let f = &self.frames[k];
            let m = orient[k].to_rotation_matrix();
            for i in f.heavy_begin..f.heavy_end {
                heavy_atoms[i] = origin[k] + m * self.heavy_atoms[i].coord;
            }
            for i in f.hydrogen_begin..f.hydrogen_end {
                hydrogens[i] = origin[k] + m * self.hydrogens[i].coord;
            }
            for &b in &f.branches {
                let bf = &self.frames[b];
                origin[b] = origin[k] + m * bf.parent_rotory_to_current_rotory;
                let angle = if bf.active { x[7 + bf.torsion_index] } else { 0.0 };
                let a = m * bf.parent_rotorx_to_current_rotory;
                orient[b] = math::axis_angle_to_quat(&Unit::new_normalize(a), angle) * orient[k];
            }
        }

        Pose {
            energy: e,
            heavy_atoms,
            hydrogens,
        }
    }

    /// Writes the retained poses as MODEL/ENDMDL blocks, rewriting the
    /// coordinate columns of the cached input lines and leaving every
    /// other byte untouched.
    pub fn write_models<P: AsRef<Path>>(&self, path: P, poses: &[Pose]) -> Result<(), LigandError> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        for (n, pose) in poses.iter().enumerate() {
            writeln!(w, "MODEL     {:>4}", n + 1)?;
            writeln!(
                w,
                "REMARK       TOTAL FREE ENERGY PREDICTED BY GRIDDOCK:{:8.3} KCAL/MOL",
                pose.energy
            )?;
            let mut heavy = 0;
            let mut hydrogen = 0;
            for line in &self.lines {
                if line.len() >= 79 {
                    // ATOM/HETATM record; column 77 distinguishes
                    // hydrogens, which trail the heavy atoms in the pose.
                    let coord = if line.as_bytes()[77] == b'H' {
                        let c = pose.hydrogens[hydrogen];
                        hydrogen += 1;
                        c
                    } else {
                        let c = pose.heavy_atoms[heavy];
                        heavy += 1;
                        c
                    };
                    writeln!(
                        w,
                        "{}{:8.3}{:8.3}{:8.3}{}{:>6}{}",
                        &line[..30],
                        coord.x,
                        coord.y,
                        coord.z,
                        &line[54..70],
                        0,
                        &line[76..]
                    )?;
                } else {
                    writeln!(w, "{line}")?;
                }
            }
            writeln!(w, "ENDMDL")?;
        }
        Ok(())
    }
}

/// Parse "BRANCH   X   Y": right-justified four-column serials.
fn parse_branch_serials(line: &str, name: &str) -> Result<(usize, usize), LigandError> {
    if line.len() < 14 {
        return Err(LigandError::Malformed {
            path: name.to_string(),
            message: format!("truncated BRANCH record: {line}"),
        });
    }
    let parse = |cols: &str| {
        cols.trim().parse::<usize>().map_err(|_| LigandError::Malformed {
            path: name.to_string(),
            message: format!("invalid BRANCH serial: {cols}"),
        })
    };
    Ok((parse(&line[6..10])?, parse(&line[10..14])?))
}

/// Collects intra-ligand pairs separated by more than three covalent
/// bonds, excluding rotor-adjacent combinations whose separation is fixed
/// or nearly fixed by the tree.
fn find_interacting_pairs(
    frames: &[Frame],
    heavy_atoms: &[Atom],
    bonds: &[Vec<usize>],
) -> Vec<InteractingPair> {
    let mut pairs = Vec::new();
    let mut neighbors: Vec<usize> = Vec::with_capacity(10);
    for (k1, f1) in frames.iter().enumerate() {
        for i in f1.heavy_begin..f1.heavy_end {
            // Atoms reachable from i within three covalent bonds.
            for &b1 in &bonds[i] {
                if !neighbors.contains(&b1) {
                    neighbors.push(b1);
                }
                for &b2 in &bonds[b1] {
                    if !neighbors.contains(&b2) {
                        neighbors.push(b2);
                    }
                    for &b3 in &bonds[b2] {
                        if !neighbors.contains(&b3) {
                            neighbors.push(b3);
                        }
                    }
                }
            }

            for (k2, f2) in frames.iter().enumerate().skip(k1 + 1) {
                let f3 = &frames[f2.parent];
                for j in f2.heavy_begin..f2.heavy_end {
                    if k1 == f2.parent && (i == f2.rotorx_index || j == f2.rotory_index) {
                        continue;
                    }
                    if k1 > 0
                        && f1.parent == f2.parent
                        && i == f1.rotory_index
                        && j == f2.rotory_index
                    {
                        continue;
                    }
                    if f2.parent > 0
                        && k1 == f3.parent
                        && i == f3.rotorx_index
                        && j == f2.rotory_index
                    {
                        continue;
                    }
                    if neighbors.contains(&j) {
                        continue;
                    }
                    pairs.push(InteractingPair {
                        i,
                        j,
                        p_offset: ScoringFunction::offset(heavy_atoms[i].xs, heavy_atoms[j].xs),
                    });
                }
            }

            neighbors.clear();
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom_line(serial: usize, x: f64, y: f64, z: f64, code: &str) -> String {
        format!(
            "ATOM  {serial:>5}  C   LIG A   1    {x:>8.3}{y:>8.3}{z:>8.3}  0.00  0.00    +0.000 {code:<2}"
        )
    }

    #[test]
    fn test_parse_single_atom() {
        let text = format!("ROOT\n{}\nENDROOT\nTORSDOF 0\n", atom_line(1, 1.0, 2.0, 3.0, "C"));
        let lig = Ligand::from_reader(text.as_bytes(), "one.pdbqt").expect("parse");
        assert_eq!(lig.num_frames, 1);
        assert_eq!(lig.num_heavy_atoms, 1);
        assert_eq!(lig.num_torsions, 0);
        assert_eq!(lig.num_active_torsions, 0);
        assert!(lig.interacting_pairs.is_empty());
        // The only atom is the root's rotor Y, so its local coordinate is
        // the origin.
        assert!(lig.heavy_atoms[0].coord.norm() < 1e-12);
        assert_eq!(lig.lines.len(), 4);
    }

    #[test]
    fn test_unsupported_atoms_kept_in_lines() {
        let text = format!(
            "ROOT\n{}\n{}\nENDROOT\nTORSDOF 0\n",
            atom_line(1, 0.0, 0.0, 0.0, "C"),
            atom_line(2, 1.5, 0.0, 0.0, "Zn"),
        );
        let lig = Ligand::from_reader(text.as_bytes(), "zinc.pdbqt").expect("parse");
        assert_eq!(lig.num_heavy_atoms, 1);
        assert_eq!(lig.lines.len(), 5);
    }

    #[test]
    fn test_unmatched_endbranch_rejected() {
        let text = format!(
            "ROOT\n{}\nENDROOT\nENDBRANCH   1   2\n",
            atom_line(1, 0.0, 0.0, 0.0, "C")
        );
        let err = Ligand::from_reader(text.as_bytes(), "bad.pdbqt").unwrap_err();
        assert!(err.to_string().contains("bad.pdbqt"));
    }

    #[test]
    fn test_unclosed_branch_rejected() {
        let text = format!(
            "ROOT\n{}\nENDROOT\nBRANCH   1   2\n{}\n",
            atom_line(1, 0.0, 0.0, 0.0, "C"),
            atom_line(2, 1.5, 0.0, 0.0, "C"),
        );
        let err = Ligand::from_reader(text.as_bytes(), "open.pdbqt").unwrap_err();
        assert!(matches!(err, LigandError::UnclosedBranch { .. }));
        assert!(err.to_string().contains("open.pdbqt"));
    }

    #[test]
    fn test_missing_rotorx_rejected() {
        let text = format!(
            "ROOT\n{}\nENDROOT\nBRANCH   7   2\n{}\nENDBRANCH   7   2\n",
            atom_line(1, 0.0, 0.0, 0.0, "C"),
            atom_line(2, 1.5, 0.0, 0.0, "C"),
        );
        let err = Ligand::from_reader(text.as_bytes(), "norx.pdbqt").unwrap_err();
        assert!(matches!(err, LigandError::RotorXNotFound { serial: 7, .. }));
    }
}
