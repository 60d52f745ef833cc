//! Main executable for griddock

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::path::PathBuf;

use griddock::atom::XsType;
use griddock::io::parse_receptor_pdbqt;
use griddock::ligand::Ligand;
use griddock::optimization::{bfgs, OptimizerParams, Pose};
use griddock::receptor::Receptor;
use griddock::scoring::ScoringFunction;

/// Command-line arguments for the application
#[derive(Parser, Debug)]
#[clap(
    name = "griddock",
    version = griddock::VERSION,
    about = "Grid-based docking of flexible ligands"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dock one or more ligands against a receptor
    Dock {
        /// PDBQT file containing the receptor
        #[clap(long, value_parser)]
        receptor: PathBuf,

        /// PDBQT files containing the ligands to dock
        #[clap(long, value_parser)]
        ligand: Vec<PathBuf>,

        /// Center of the search box (x,y,z)
        #[clap(long, value_parser, value_delimiter = ',')]
        center: Vec<f64>,

        /// Size of the search box (x,y,z)
        #[clap(long, value_parser, value_delimiter = ',')]
        size: Vec<f64>,

        /// Probe lattice spacing of the energy grids, in Angstroms
        #[clap(long, default_value_t = 0.15625)]
        granularity: f64,

        /// Number of independent optimization tasks per ligand
        #[clap(long, default_value_t = 32)]
        tasks: usize,

        /// Number of perturb-and-relax generations per task
        #[clap(long, default_value_t = 100)]
        generations: usize,

        /// Base random seed; task k uses seed + k
        #[clap(long, default_value_t = 2018)]
        seed: u64,

        /// Number of binding modes to write per ligand
        #[clap(long, default_value_t = 9)]
        num_modes: usize,

        /// Output directory for the docked poses
        #[clap(long, value_parser)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dock {
            receptor,
            ligand,
            center,
            size,
            granularity,
            tasks,
            generations,
            seed,
            num_modes,
            dir,
        } => {
            if center.len() != 3 || size.len() != 3 {
                return Err(anyhow::anyhow!(
                    "Both center and size must be given as x,y,z triples"
                ));
            }
            let center = Vector3::new(center[0], center[1], center[2]);
            let size = Vector3::new(size[0], size[1], size[2]);

            info!("Search box center: ({}, {}, {})", center.x, center.y, center.z);
            info!("Search box size: ({}, {}, {})", size.x, size.y, size.z);

            info!("Precomputing the scoring function");
            let sf = ScoringFunction::new();

            info!("Loading receptor: {}", receptor.display());
            let receptor_atoms = parse_receptor_pdbqt(&receptor).with_context(|| {
                format!("Failed to parse receptor file: {}", receptor.display())
            })?;
            info!("Receptor has {} heavy atoms", receptor_atoms.len());

            let mut rec = Receptor::new(center, size, granularity)
                .context("Failed to construct the search box")?;

            // Parse all ligands up front so only the needed grid maps are
            // populated.
            let mut ligands: Vec<(PathBuf, Ligand)> = Vec::with_capacity(ligand.len());
            for ligand_path in ligand {
                match Ligand::from_path(&ligand_path) {
                    Ok(lig) => ligands.push((ligand_path, lig)),
                    Err(err) => warn!("Skipping {}: {}", ligand_path.display(), err),
                }
            }
            if ligands.is_empty() {
                return Err(anyhow::anyhow!("No ligand could be parsed"));
            }

            let mut used = [false; XsType::NUM_SCORED];
            for (_, lig) in &ligands {
                for atom in &lig.heavy_atoms {
                    used[atom.xs.index()] = true;
                }
            }
            let xs_types: Vec<XsType> = XsType::SCORED
                .iter()
                .copied()
                .filter(|xs| used[xs.index()])
                .collect();

            info!("Populating {} energy grid maps", xs_types.len());
            rec.populate(&sf, &receptor_atoms, &xs_types);

            let params = OptimizerParams {
                num_generations: generations,
                ..OptimizerParams::default()
            };

            for (ligand_path, lig) in &ligands {
                info!(
                    "Docking {} ({} heavy atoms, {} active torsions, {} tasks)",
                    ligand_path.display(),
                    lig.num_heavy_atoms,
                    lig.num_active_torsions,
                    tasks
                );

                let mut poses: Vec<Pose> = (0..tasks)
                    .into_par_iter()
                    .map(|k| bfgs(lig, &sf, &rec, seed.wrapping_add(k as u64), &params))
                    .collect();
                poses.sort_by(|a, b| a.energy.total_cmp(&b.energy));
                poses.truncate(num_modes);

                let output_path = if let Some(dir_path) = &dir {
                    let ligand_name = ligand_path.file_stem().unwrap().to_string_lossy();
                    dir_path.join(format!("{}_out.pdbqt", ligand_name))
                } else {
                    let ligand_stem = ligand_path.file_stem().unwrap().to_string_lossy();
                    PathBuf::from(format!("{}_out.pdbqt", ligand_stem))
                };

                info!(
                    "Writing {} poses (best {:.3} kcal/mol) to {}",
                    poses.len(),
                    poses.first().map(|p| p.energy).unwrap_or(0.0),
                    output_path.display()
                );
                lig.write_models(&output_path, &poses).with_context(|| {
                    format!("Failed to write poses to {}", output_path.display())
                })?;
            }

            info!("Docking completed successfully");
        }
    }

    Ok(())
}
