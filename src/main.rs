//! Retex CLI - Command-line tool for inspecting TPF texture packs.
//!
//! This is the main entry point for the retex command-line application.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use retex::prelude::*;

/// Retex - texture pack inspection tool
#[derive(Parser)]
#[command(name = "retex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of a TPF texture pack
    TpfList {
        /// Path to the TPF file
        #[arg(short, long, env = "INPUT_TPF")]
        tpf: PathBuf,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract textures from a TPF texture pack
    TpfExtract {
        /// Path to the TPF file
        #[arg(short, long, env = "INPUT_TPF")]
        tpf: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,
    },

    /// Show the manifest of a TPF texture pack
    TpfManifest {
        /// Path to the TPF file
        #[arg(short, long, env = "INPUT_TPF")]
        tpf: PathBuf,
    },

    /// Compute identifier hashes for a texture name or file
    Hash {
        /// Texture name to hash with the name-space hash
        #[arg(short, long)]
        name: Option<String>,

        /// File whose contents to hash with the content-space hash
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::TpfList { tpf, detailed } => {
            cmd_tpf_list(&tpf, detailed)?;
        }
        Commands::TpfExtract { tpf, output } => {
            cmd_tpf_extract(&tpf, &output)?;
        }
        Commands::TpfManifest { tpf } => {
            cmd_tpf_manifest(&tpf)?;
        }
        Commands::Hash { name, file } => {
            cmd_hash(name.as_deref(), file.as_deref())?;
        }
    }

    Ok(())
}

fn cmd_tpf_list(tpf_path: &PathBuf, detailed: bool) -> Result<()> {
    let archive = TpfArchive::open(tpf_path).context("Failed to open TPF archive")?;

    for entry in archive.entries() {
        if detailed {
            println!("{:#010x} {:>12} {}", entry.hash, entry.data.len(), entry.name);
        } else {
            println!("{}", entry.name);
        }
    }

    println!("\nTotal: {} entries", archive.entry_count());
    if !archive.mappings().is_empty() {
        println!("Manifest mappings: {}", archive.mappings().len());
    }

    Ok(())
}

fn cmd_tpf_extract(tpf_path: &PathBuf, output: &PathBuf) -> Result<()> {
    println!("Opening TPF archive: {}", tpf_path.display());

    let start = Instant::now();
    let archive = TpfArchive::open(tpf_path).context("Failed to open TPF archive")?;

    println!("Loaded {} entries in {:?}", archive.entry_count(), start.elapsed());

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut extracted = 0;
    for entry in archive.entries() {
        let output_path = output.join(&entry.name);
        fs::write(&output_path, &entry.data)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        extracted += 1;
    }

    println!("Extracted {} textures in {:?}", extracted, start.elapsed());

    Ok(())
}

fn cmd_tpf_manifest(tpf_path: &PathBuf) -> Result<()> {
    let archive = TpfArchive::open(tpf_path).context("Failed to open TPF archive")?;

    match archive.manifest_text() {
        Some(text) => {
            print!("{text}");
            println!("\n{} mappings parsed:", archive.mappings().len());
            for (name_id, content_id) in archive.mappings() {
                println!("  {name_id:#010x} -> {content_id:#010x}");
            }
        }
        None => println!("No texmod.def manifest in this pack"),
    }

    Ok(())
}

fn cmd_hash(name: Option<&str>, file: Option<&std::path::Path>) -> Result<()> {
    if name.is_none() && file.is_none() {
        anyhow::bail!("Provide --name and/or --file");
    }

    if let Some(name) = name {
        println!("name hash:    {:#010x}  ({name})", name_hash(name));
    }

    if let Some(file) = file {
        let data = fs::read(file).context("Failed to read input file")?;
        println!(
            "content hash: {:#010x}  ({}, {} bytes)",
            content_hash(&data),
            file.display(),
            data.len()
        );
    }

    Ok(())
}
