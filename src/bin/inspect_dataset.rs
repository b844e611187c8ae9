use anyhow::{Context, Result};
use clap::Parser;
use incidentscraper::dataset::{read_dataset, Dataset};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{collections::BTreeSet, fs::File, path::PathBuf};

#[derive(Parser)]
#[command(about = "Print schema, row count and null counts of an incident dataset")]
struct Args {
    /// Dataset written by `incidentscraper`
    dataset: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = File::open(&args.dataset)
        .with_context(|| format!("opening {}", args.dataset.display()))?;
    let reader = SerializedFileReader::new(file).context("reading parquet footer")?;
    let meta = reader.metadata();
    let file_size = std::fs::metadata(&args.dataset)?.len();

    println!("=== Dataset: {} ===", args.dataset.display());
    println!(
        "Created by:           {}",
        meta.file_metadata().created_by().unwrap_or("<unknown>")
    );
    println!("Row groups:           {}", meta.num_row_groups());
    println!("File size on disk:    {} bytes", file_size);
    println!();

    let dataset = read_dataset(&args.dataset)?;
    print_summary(&dataset);
    Ok(())
}

fn print_summary(dataset: &Dataset) {
    let incidents: BTreeSet<&str> = dataset
        .rows()
        .iter()
        .map(|r| r.incident_name.as_str())
        .collect();
    println!("Rows:                 {}", dataset.num_rows());
    println!("Distinct incidents:   {}", incidents.len());
    println!();

    println!("=== Columns ===");
    println!("- {:<40} | {:<10} | nulls: 0", "incident_name", "Text");
    for (idx, col) in dataset.columns().iter().enumerate() {
        let nulls = dataset.rows().iter().filter(|r| r.cells[idx].is_none()).count();
        println!(
            "- {:<40} | {:<10} | nulls: {}",
            col.name,
            format!("{:?}", col.kind),
            nulls
        );
    }
}
