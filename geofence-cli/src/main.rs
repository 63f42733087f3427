//! geofence: replay position logs through the geofence engine and inspect
//! fence definitions.

use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};

use geofence_core::{evaluate, Geofence, GeofenceEngine, GeofenceEvent, PositionSample};

mod input;
mod replay;

#[derive(Parser)]
#[command(name = "geofence", version, about = "Geofence evaluation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines sample log through the engine and print events
    Replay {
        /// Path to sample log (one JSON object per line), or `-` for stdin
        file: PathBuf,

        /// Path to fence definitions (JSON array)
        #[arg(long, env = "GEOFENCE_FENCES")]
        fences: PathBuf,

        /// Device id for lines without their own `deviceId`
        #[arg(long, default_value = "device-0")]
        device: String,

        /// Print events as JSON lines instead of a summary table
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a single position against every fence
    Check {
        /// Path to fence definitions (JSON array)
        #[arg(long, env = "GEOFENCE_FENCES")]
        fences: PathBuf,

        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,

        /// Altitude in meters
        #[arg(long)]
        alt: Option<f64>,

        /// Evaluation time as Unix seconds (defaults to now)
        #[arg(long)]
        at: Option<f64>,
    },

    /// Validate a fence file and print the definitions
    Fences {
        /// Path to fence definitions (JSON array)
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            file,
            fences,
            device,
            json,
        } => cmd_replay(file, fences, &device, json),
        Commands::Check {
            fences,
            lat,
            lon,
            alt,
            at,
        } => cmd_check(fences, lat, lon, alt, at),
        Commands::Fences { file } => cmd_fences(file),
    }
}

fn load_fences_or_exit(path: &PathBuf) -> Vec<Geofence> {
    input::load_fences(path).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {e}", path.display());
        std::process::exit(1);
    })
}

fn cmd_replay(file: PathBuf, fences_path: PathBuf, fallback_device: &str, json: bool) {
    let fences = load_fences_or_exit(&fences_path);

    let mut engine = GeofenceEngine::new();
    for fence in fences {
        let id = fence.id.clone();
        if let Err(e) = engine.upsert_geofence(fence) {
            eprintln!("Error in fence '{id}': {e}");
            std::process::exit(1);
        }
    }

    let reader: Box<dyn BufRead> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let f = std::fs::File::open(&file).unwrap_or_else(|e| {
            eprintln!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        });
        Box::new(io::BufReader::new(f))
    };

    if json {
        // Events stream out as they are produced; nothing is buffered.
        replay::run_replay(&mut engine, reader, fallback_device, |event| {
            match serde_json::to_string(event) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("Error serializing event: {e}"),
            }
        });
        return;
    }

    let mut all_events: Vec<GeofenceEvent> = Vec::new();
    let unparseable = replay::run_replay(&mut engine, reader, fallback_device, |event| {
        all_events.push(event.clone())
    });

    println!();
    println!("Replay complete: {}", file.display());
    println!(
        "  Samples: {} processed, {} rejected, {} unparseable",
        engine.samples_ingested, engine.samples_rejected, unparseable
    );
    println!(
        "  Events: {} across {} devices",
        engine.events_emitted,
        engine.device_count()
    );

    if !all_events.is_empty() {
        println!();
        print_events(&all_events);
    }
}

fn cmd_check(fences_path: PathBuf, lat: f64, lon: f64, alt: Option<f64>, at: Option<f64>) {
    let fences = load_fences_or_exit(&fences_path);
    for fence in &fences {
        if let Err(e) = fence.validate() {
            eprintln!("Error in fence '{}': {e}", fence.id);
            std::process::exit(1);
        }
    }

    let now = at.unwrap_or_else(unix_now);
    let sample = PositionSample {
        latitude: lat,
        longitude: lon,
        altitude: alt,
        bearing: None,
        timestamp: now,
    };
    if let Err(e) = sample.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let mut table = Table::new();
    table.set_header(vec!["Region", "Name", "Eligible", "Dist (m)", "Inside"]);
    for fence in &fences {
        let membership = evaluate(fence, &sample);
        table.add_row(vec![
            Cell::new(&fence.id),
            Cell::new(if fence.name.is_empty() {
                "-"
            } else {
                fence.name.as_str()
            }),
            Cell::new(if fence.eligible_at(now) { "yes" } else { "no" }),
            Cell::new(format!("{:.1}", membership.distance_m)),
            Cell::new(if membership.inside { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
}

fn cmd_fences(file: PathBuf) {
    let fences = load_fences_or_exit(&file);

    let mut invalid = 0u32;
    let mut table = Table::new();
    table.set_header(vec![
        "Region",
        "Name",
        "Lat",
        "Lon",
        "Radius (m)",
        "Active",
        "Constraints",
        "Priority",
        "Status",
    ]);

    for fence in &fences {
        let status = match fence.validate() {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                invalid += 1;
                e.to_string()
            }
        };

        let mut constraints = Vec::new();
        if fence.sector.is_some() {
            constraints.push("sector");
        }
        if fence.altitude.is_some() {
            constraints.push("altitude");
        }
        if fence.window.is_some() {
            constraints.push("window");
        }
        let constraints = if constraints.is_empty() {
            "-".to_string()
        } else {
            constraints.join("+")
        };

        table.add_row(vec![
            Cell::new(&fence.id),
            Cell::new(if fence.name.is_empty() {
                "-"
            } else {
                fence.name.as_str()
            }),
            Cell::new(format!("{:.4}", fence.latitude)),
            Cell::new(format!("{:.4}", fence.longitude)),
            Cell::new(format!("{:.0}", fence.radius_meters)),
            Cell::new(if fence.active { "yes" } else { "no" }),
            Cell::new(constraints),
            Cell::new(fence.settings.priority.to_string()),
            Cell::new(status),
        ]);
    }

    println!("{table}");
    println!();
    println!("{} fences, {invalid} invalid", fences.len());

    if invalid > 0 {
        std::process::exit(1);
    }
}

fn print_events(events: &[GeofenceEvent]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Time", "Device", "Region", "Type", "Dist (m)", "Lat", "Lon",
    ]);

    for event in events {
        table.add_row(vec![
            Cell::new(format!("{:.1}", event.timestamp)),
            Cell::new(&event.device_id),
            Cell::new(&event.region_id),
            Cell::new(event.kind.to_string()),
            Cell::new(format!("{:.1}", event.distance_from_center)),
            Cell::new(format!("{:.5}", event.position.latitude)),
            Cell::new(format!("{:.5}", event.position.longitude)),
        ]);
    }

    println!("{table}");
}

fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
