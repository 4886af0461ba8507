//! Coilplan CLI - coil winding layout from the command line.

use clap::{Args, Parser, Subcommand, ValueEnum};
use coilplan::insulation::InsulationGrade;
use coilplan::{Coil, WindPlan, WindReport, WindSettings, Winder};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "coilplan")]
#[command(about = "Coil winding layout engine for magnetic components", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wind a coil description into sections, layers and turns
    Wind {
        /// Path to a coil description JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Winding plan JSON file; individual flags override its fields
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,

        /// Window share per winding, comma separated
        #[arg(long, value_delimiter = ',')]
        proportions: Option<Vec<f64>>,

        /// Section order as winding indices, comma separated
        #[arg(long, value_delimiter = ',')]
        pattern: Option<Vec<usize>>,

        /// Repetitions of the section pattern
        #[arg(long)]
        repetitions: Option<u32>,

        /// Insulation between layers of a section, meters
        #[arg(long, value_name = "METERS")]
        insulation_thickness: Option<f64>,

        /// Run the pipeline up to this stage
        #[arg(long, value_enum, default_value = "turns")]
        until: Stage,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Write the wound coil description to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Exit with error code if the winding does not fit
        #[arg(long)]
        fail_on_unfit: bool,
    },

    /// Wind a planar coil from an explicit board stack-up
    Planar {
        /// Path to a coil description JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Winding plan JSON file; individual flags override its fields
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,

        /// Board layer order as winding indices, comma separated
        #[arg(long, value_delimiter = ',')]
        stack_up: Option<Vec<usize>>,

        /// Distance under each stack boundary, meters, comma separated
        #[arg(long, value_delimiter = ',')]
        stack_distances: Option<Vec<f64>>,

        /// Maximum stack-up entries to accept
        #[arg(long, default_value_t = 32)]
        max_layers: usize,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Write the wound coil description to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Exit with error code if the winding does not fit
        #[arg(long)]
        fail_on_unfit: bool,
    },

    /// Check a wound coil description against its window
    Check {
        /// Path to a wound coil description JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if the winding does not fit
        #[arg(long)]
        fail_on_unfit: bool,
    },

    /// Compact a wound coil description in place
    Compact {
        /// Path to a wound coil description JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the compacted coil description to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// Working voltage between isolation sides, volts
    #[arg(long, default_value_t = 0.0)]
    voltage: f64,

    /// Insulation grade for derived distances
    #[arg(long, value_enum, default_value = "basic")]
    grade: Grade,

    /// Carry isolation with margin tape instead of barrier sections
    #[arg(long)]
    margin_tape: bool,

    /// Do not let triple-insulated wire waive margins and barriers
    #[arg(long)]
    no_insulated_wire: bool,

    /// Keep an overflowing layout instead of failing
    #[arg(long)]
    allow_overfill: bool,

    /// Do not retry a failed wind with derived proportions
    #[arg(long)]
    no_rewind: bool,
}

impl SettingsArgs {
    fn to_settings(&self) -> WindSettings {
        WindSettings {
            working_voltage: self.voltage,
            insulation_grade: self.grade.into(),
            allow_margin_tape: self.margin_tape,
            allow_insulated_wire: !self.no_insulated_wire,
            wind_even_if_not_fit: self.allow_overfill,
            try_rewind: !self.no_rewind,
            ..WindSettings::default()
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    Sections,
    Layers,
    Turns,
    Compact,
}

#[derive(Clone, Copy, ValueEnum)]
enum Grade {
    Functional,
    Basic,
    Reinforced,
}

impl From<Grade> for InsulationGrade {
    fn from(grade: Grade) -> Self {
        match grade {
            Grade::Functional => InsulationGrade::Functional,
            Grade::Basic => InsulationGrade::Basic,
            Grade::Reinforced => InsulationGrade::Reinforced,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Wind {
            file,
            plan,
            proportions,
            pattern,
            repetitions,
            insulation_thickness,
            until,
            settings,
            format,
            out,
            fail_on_unfit,
        } => {
            let plan = match load_plan(plan.as_deref()) {
                Ok(mut loaded) => {
                    if proportions.is_some() {
                        loaded.proportions = proportions;
                    }
                    if pattern.is_some() {
                        loaded.pattern = pattern;
                    }
                    if let Some(repetitions) = repetitions {
                        loaded.repetitions = repetitions;
                    }
                    if insulation_thickness.is_some() {
                        loaded.insulation_thickness = insulation_thickness;
                    }
                    loaded
                }
                Err(code) => process::exit(code),
            };
            handle_wind(&file, &plan, until, &settings, format, out.as_deref(), fail_on_unfit)
        }
        Commands::Planar {
            file,
            plan,
            stack_up,
            stack_distances,
            max_layers,
            settings,
            format,
            out,
            fail_on_unfit,
        } => {
            let plan = match load_plan(plan.as_deref()) {
                Ok(mut loaded) => {
                    if stack_up.is_some() {
                        loaded.stack_up = stack_up;
                    }
                    if stack_distances.is_some() {
                        loaded.stack_distances = stack_distances;
                    }
                    loaded
                }
                Err(code) => process::exit(code),
            };
            handle_planar(
                &file,
                &plan,
                max_layers,
                &settings,
                format,
                out.as_deref(),
                fail_on_unfit,
            )
        }
        Commands::Check {
            file,
            format,
            fail_on_unfit,
        } => handle_check(&file, format, fail_on_unfit),
        Commands::Compact { file, out, format } => handle_compact(&file, out.as_deref(), format),
    };

    process::exit(exit_code);
}

fn load_plan(path: Option<&std::path::Path>) -> Result<WindPlan, i32> {
    let Some(path) = path else {
        return Ok(WindPlan::default());
    };
    let json = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: cannot read plan {}: {}", path.display(), e);
        1
    })?;
    serde_json::from_str(&json).map_err(|e| {
        eprintln!("Error: invalid plan {}: {}", path.display(), e);
        1
    })
}

fn handle_wind(
    file: &std::path::Path,
    plan: &WindPlan,
    until: Stage,
    settings: &SettingsArgs,
    format: OutputFormat,
    out: Option<&std::path::Path>,
    fail_on_unfit: bool,
) -> i32 {
    let mut coil = match coilplan::load_coil(file) {
        Ok(coil) => coil,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut wind_settings = settings.to_settings();
    wind_settings.delimit_and_compact = matches!(until, Stage::Compact);
    let winder = Winder::new(wind_settings);

    let result = match until {
        Stage::Sections => winder.wind_by_sections(&mut coil, plan),
        Stage::Layers => winder
            .wind_by_sections(&mut coil, plan)
            .and_then(|_| winder.wind_by_layers(&mut coil, plan)),
        Stage::Turns | Stage::Compact => winder.wind(&mut coil, plan),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return 1;
    }

    finish(&winder, &coil, file, format, out, fail_on_unfit)
}

fn handle_planar(
    file: &std::path::Path,
    plan: &WindPlan,
    max_layers: usize,
    settings: &SettingsArgs,
    format: OutputFormat,
    out: Option<&std::path::Path>,
    fail_on_unfit: bool,
) -> i32 {
    let mut coil = match coilplan::load_coil(file) {
        Ok(coil) => coil,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut wind_settings = settings.to_settings();
    wind_settings.max_planar_layers = max_layers;
    let winder = Winder::new(wind_settings);

    if let Err(e) = winder.wind_planar(&mut coil, plan) {
        eprintln!("Error: {}", e);
        return 1;
    }

    finish(&winder, &coil, file, format, out, fail_on_unfit)
}

fn handle_check(file: &std::path::Path, format: OutputFormat, fail_on_unfit: bool) -> i32 {
    let coil = match coilplan::load_coil(file) {
        Ok(coil) => coil,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let winder = Winder::default();
    // Checking an unwound description is an error, not an empty report.
    let report = match winder.check_fit(&coil).and_then(|_| winder.report(&coil)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    output_report(&coil, file, &report, &format);
    if fail_on_unfit && !report.fits {
        return 1;
    }
    0
}

fn handle_compact(file: &std::path::Path, out: Option<&std::path::Path>, format: OutputFormat) -> i32 {
    let mut coil = match coilplan::load_coil(file) {
        Ok(coil) => coil,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let winder = Winder::default();
    if let Err(e) = winder.delimit_and_compact(&mut coil) {
        eprintln!("Error: {}", e);
        return 1;
    }

    match format {
        OutputFormat::Human => {
            let report = match winder.report(&coil) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            };
            output_report(&coil, file, &report, &OutputFormat::Human);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&coil).unwrap());
        }
    }

    if let Some(out) = out {
        if let Err(e) = write_coil(&coil, out) {
            eprintln!("Error: cannot write {}: {}", out.display(), e);
            return 1;
        }
    }
    0
}

/// Report, optional coil output and exit code shared by the wind paths.
fn finish(
    winder: &Winder,
    coil: &Coil,
    file: &std::path::Path,
    format: OutputFormat,
    out: Option<&std::path::Path>,
    fail_on_unfit: bool,
) -> i32 {
    let report = match winder.report(coil) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    output_report(coil, file, &report, &format);

    if let Some(out) = out {
        if let Err(e) = write_coil(coil, out) {
            eprintln!("Error: cannot write {}: {}", out.display(), e);
            return 1;
        }
    }
    if fail_on_unfit && !report.fits {
        return 1;
    }
    0
}

fn write_coil(coil: &Coil, out: &std::path::Path) -> std::io::Result<()> {
    std::fs::write(out, serde_json::to_string_pretty(coil).unwrap())
}

fn output_report(coil: &Coil, file: &std::path::Path, report: &WindReport, format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(coil, file, report),
        OutputFormat::Json => output_json(file, report),
    }
}

fn output_human(coil: &Coil, file: &std::path::Path, report: &WindReport) {
    println!("\nCoil: {}", file.display());
    println!("{}", "─".repeat(60));

    for section in coil.conduction_sections() {
        let layers = coil.layers_by_section(&section.name);
        println!(
            "  {} - {} turns in {} layers, {:.3} x {:.3} mm",
            section.name,
            section.physical_turns(),
            layers.len(),
            section.dimensions[0] * 1e3,
            section.dimensions[1] * 1e3,
        );
    }
    println!();
    print!("{}", report.human());
}

fn output_json(file: &std::path::Path, report: &WindReport) {
    let output = serde_json::json!({
        "file": file.display().to_string(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
