//! Simple winding example: wind a coil description and print the layout.

use coilplan::prelude::*;
use std::path::Path;

fn main() -> Result<(), WindError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/interleaved_transformer.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example wind_transformer [path/to/coil.json]");
        std::process::exit(1);
    }

    let mut coil = coilplan::load_coil(path)?;
    let winder = Winder::new(WindSettings::default());
    let plan = WindPlan {
        pattern: Some(vec![0, 1]),
        repetitions: 2,
        ..WindPlan::default()
    };

    winder.wind(&mut coil, &plan)?;

    println!("Wound layout for: {}", path.display());
    for section in coil.conduction_sections() {
        let layers = coil.layers_by_section(&section.name);
        println!(
            "  {} - {} turns in {} layers, {:.2} x {:.2} mm",
            section.name,
            section.physical_turns(),
            layers.len(),
            section.dimensions[0] * 1e3,
            section.dimensions[1] * 1e3,
        );
    }

    let report = winder.report(&coil)?;
    println!();
    print!("{}", report.human());

    if !report.fits {
        println!("\nWinding does not fit the window.");
        std::process::exit(1);
    }
    Ok(())
}
