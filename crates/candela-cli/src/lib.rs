//! # Candela CLI
//!
//! Command-line interface for the Candela card renderer.
//!
//! ## Commands
//! - `probe` - Probe the graphics device and print its profile
//! - `tiers` - Print the quality tier table
//! - `simulate` - Run the adaptive frame loop headless against a frame-time schedule
//! - `camera` - Check the starting camera against its defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use candela_core::{Geometry, QualityTier, SceneGraph};
use candela_platform::{
    CapabilityProbe, CapabilitySource, DeviceProfile, FileStore, FixedCapabilities, HighResTimer, KeyValueStore,
    MemoryStore, ProcessMemory, WgpuCapabilitySource, Window,
};
use candela_renderer::{
    AppConfig, Camera, CardApp, ContextAttributes, HeadlessRenderer, LightingRig, RenderConfig, TierChange,
    build_render_config, select_initial_tier,
};

/// Candela card renderer CLI
#[derive(Parser)]
#[command(name = "candela")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device options shared by `probe` and `simulate`
#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Override mobile classification
    #[arg(long)]
    pub mobile: Option<bool>,

    /// Display pixel ratio
    #[arg(long, default_value = "1.0")]
    pub pixel_ratio: f32,

    /// Skip the GPU adapter and use this texture size limit
    #[arg(long)]
    pub max_tex: Option<u32>,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Probe the graphics device
    Probe {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Print the quality tier table
    Tiers {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the adaptive frame loop headless
    Simulate {
        #[command(flatten)]
        device: DeviceArgs,

        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u32,

        /// Frame times in milliseconds, cycled
        #[arg(long, value_delimiter = ',', default_value = "16.7")]
        frame_ms: Vec<f64>,

        /// Application config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Key-value store file holding the camera start position
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Sleep between frames and use the wall clock
        #[arg(long)]
        realtime: bool,

        /// Print metrics every N frames (0 disables)
        #[arg(long, default_value = "60")]
        report_every: u32,
    },

    /// Check the starting camera against its defaults
    Camera {
        /// Key-value store file holding the camera start position
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Probe { device } => {
            let profile = probe_device(&device)?;
            let tier = select_initial_tier(&profile);
            println!(
                "{}",
                serde_json::to_string_pretty(&ProbeReport {
                    profile: &profile,
                    initial_tier: tier,
                    config: build_render_config(tier),
                })?
            );
        }

        Commands::Tiers { json } => {
            let rows = tier_table();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in rows {
                    println!("{}", row);
                }
            }
        }

        Commands::Simulate {
            device,
            frames,
            frame_ms,
            config,
            store,
            realtime,
            report_every,
        } => {
            let app_config = match config {
                Some(path) => load_config(&path)?,
                None => AppConfig::default(),
            };
            let profile = probe_device(&device)?;
            let store = open_store(store.as_deref());
            let summary = simulate(
                profile,
                store.as_ref(),
                app_config,
                &Schedule::new(frame_ms),
                frames,
                realtime,
                report_every,
            )?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Camera { store } => {
            let store = open_store(store.as_deref());
            let camera = Camera::from_store(store.as_ref(), 16.0 / 9.0);
            let state = camera.state();
            let (azimuth, polar) = camera.orbital_angles();

            for check in state.check_defaults() {
                println!(
                    "{:<12} expected {:>9.4} actual {:>9.4} (±{}) {}",
                    check.name,
                    check.expected,
                    check.actual,
                    check.tolerance,
                    if check.passed { "ok" } else { "MISMATCH" }
                );
            }
            println!("azimuth {:.4} rad | polar {:.4} rad", azimuth, polar);
            println!("matches defaults: {}", state.matches_defaults());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    profile: &'a DeviceProfile,
    initial_tier: QualityTier,
    config: RenderConfig,
}

/// One row of the tier table
#[derive(Debug, Serialize)]
pub struct TierRow {
    pub config: RenderConfig,
    pub lights: usize,
}

impl std::fmt::Display for TierRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = &self.config;
        write!(
            f,
            "{:<6} shadows={:<5} map={:<5} dir_lights={} aa={:<5} precision={:?} ratio_scale={} lights={}",
            c.tier.as_str(),
            c.shadows_enabled,
            c.shadow_map_size.map_or_else(|| "-".to_string(), |s| s.to_string()),
            c.directional_light_count,
            c.antialias,
            c.precision,
            c.pixel_ratio_scale,
            self.lights
        )
    }
}

/// Configuration and light count of every tier, highest first
pub fn tier_table() -> Vec<TierRow> {
    QualityTier::ALL
        .iter()
        .rev()
        .map(|&tier| {
            let config = build_render_config(tier);
            TierRow {
                lights: LightingRig::build(&config).len(),
                config,
            }
        })
        .collect()
}

fn probe_device(args: &DeviceArgs) -> Result<DeviceProfile> {
    let mut probe = CapabilityProbe::new().with_pixel_ratio(args.pixel_ratio);
    if let Some(mobile) = args.mobile {
        probe = probe.with_mobile(mobile);
    }

    let source: Box<dyn CapabilitySource> = match args.max_tex {
        Some(size) => Box::new(FixedCapabilities::uniform(size)),
        None => Box::new(WgpuCapabilitySource::default()),
    };

    probe.probe(source.as_ref()).context("Device probe failed")
}

fn open_store(path: Option<&Path>) -> Box<dyn KeyValueStore> {
    match path {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    }
}

/// Load an application config from a JSON file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: AppConfig =
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    config.adaptive.validate()?;
    Ok(config)
}

/// Cycled list of frame times
#[derive(Debug, Clone)]
pub struct Schedule {
    frame_ms: Vec<f64>,
}

impl Schedule {
    /// Create a schedule; an empty list falls back to 60 fps
    pub fn new(frame_ms: Vec<f64>) -> Self {
        let frame_ms: Vec<f64> = frame_ms.into_iter().filter(|ms| ms.is_finite() && *ms > 0.0).collect();
        if frame_ms.is_empty() {
            Self { frame_ms: vec![16.7] }
        } else {
            Self { frame_ms }
        }
    }

    /// Frame time of frame `index`
    pub fn frame_time(&self, index: usize) -> f64 {
        self.frame_ms[index % self.frame_ms.len()]
    }
}

/// Small birthday card scene: card halves, cake and candles
pub fn demo_scene() -> SceneGraph {
    let mut scene = SceneGraph::new();

    let card = scene.add_group("card", None);
    scene.add_mesh("card_front", Geometry::indexed(4, 6), Some(card));
    scene.add_mesh("card_back", Geometry::indexed(4, 6), Some(card));

    let cake = scene.add_group("cake", Some(card));
    scene.add_mesh("cake_body", Geometry::indexed(2_400, 12_288), Some(cake));
    scene.add_mesh("frosting", Geometry::indexed(3_600, 18_432), Some(cake));

    for i in 0..5 {
        let candle = scene.add_group(format!("candle_{}", i), Some(cake));
        scene.add_mesh(format!("candle_{}_wax", i), Geometry::indexed(96, 540), Some(candle));
        scene.add_mesh(format!("candle_{}_flame", i), Geometry::non_indexed(288), Some(candle));
    }

    scene
}

/// Result of a simulation run
#[derive(Debug, Serialize)]
pub struct SimulationSummary {
    pub frames: u32,
    pub elapsed_ms: f64,
    pub initial_tier: QualityTier,
    pub final_tier: QualityTier,
    pub changes: Vec<TimedChange>,
    pub metrics: candela_core::MetricsSnapshot,
}

/// Tier change with the time it happened
#[derive(Debug, Serialize)]
pub struct TimedChange {
    pub at_ms: f64,
    #[serde(flatten)]
    pub change: TierChange,
}

/// Run the card app headless over `frames` frames
pub fn simulate(
    profile: DeviceProfile,
    store: &dyn KeyValueStore,
    config: AppConfig,
    schedule: &Schedule,
    frames: u32,
    realtime: bool,
    report_every: u32,
) -> Result<SimulationSummary> {
    let initial = build_render_config(select_initial_tier(&profile));
    let backend = HeadlessRenderer::new(ContextAttributes::from_config(&initial));
    let window = Window::new(1280, 720, profile.pixel_ratio);

    let mut app = CardApp::start(backend, profile, store, window, demo_scene(), config, 0.0)?
        .with_telemetry(Box::new(ProcessMemory::new()));
    let initial_tier = app.context().tier();

    let clock = HighResTimer::new();
    let mut now_ms = 0.0;
    let mut changes = Vec::new();

    for frame in 0..frames {
        let frame_ms = schedule.frame_time(frame as usize);
        if realtime {
            std::thread::sleep(Duration::from_secs_f64(frame_ms / 1000.0));
            now_ms = clock.elapsed_millis();
        } else {
            now_ms += frame_ms;
        }

        let report = app.tick(now_ms);
        if let Some(change) = report.tier_change {
            changes.push(TimedChange { at_ms: now_ms, change });
        }
        if report_every > 0 && (frame + 1) % report_every == 0 {
            log::info!("[{:>8.1} ms] {} | tier {}", now_ms, app.metrics(), app.context().tier());
        }
        if app.should_close() {
            break;
        }
    }

    Ok(SimulationSummary {
        frames: app.context().backend().frame_number() as u32,
        elapsed_ms: now_ms,
        initial_tier,
        final_tier: app.context().tier(),
        changes,
        metrics: app.metrics(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> DeviceProfile {
        DeviceProfile {
            is_mobile: false,
            pixel_ratio: 1.0,
            max_texture_size: 4096,
            max_renderbuffer_size: 4096,
        }
    }

    #[test]
    fn test_cli_parse() {
        let cli = Cli::parse_from(["candela", "tiers"]);
        assert!(matches!(cli.command, Commands::Tiers { json: false }));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_simulate_command() {
        let cli = Cli::parse_from([
            "candela",
            "-v",
            "simulate",
            "--frames",
            "120",
            "--frame-ms",
            "16.7,50",
            "--mobile",
            "true",
            "--max-tex",
            "2048",
        ]);
        assert!(cli.verbose);
        if let Commands::Simulate {
            device,
            frames,
            frame_ms,
            realtime,
            ..
        } = cli.command
        {
            assert_eq!(frames, 120);
            assert_eq!(frame_ms, vec![16.7, 50.0]);
            assert_eq!(device.mobile, Some(true));
            assert_eq!(device.max_tex, Some(2048));
            assert_eq!(device.pixel_ratio, 1.0);
            assert!(!realtime);
        } else {
            panic!("Expected Simulate command");
        }
    }

    #[test]
    fn test_probe_with_fixed_limits() {
        let args = DeviceArgs {
            mobile: Some(true),
            pixel_ratio: 2.0,
            max_tex: Some(4096),
        };
        let profile = probe_device(&args).unwrap();
        assert!(profile.is_mobile);
        assert_eq!(profile.max_texture_size, 4096);
        assert_eq!(select_initial_tier(&profile), QualityTier::Low);
    }

    #[test]
    fn test_tier_table() {
        let rows = tier_table();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].config.tier, QualityTier::High);
        assert_eq!(rows[0].lights, 4);
        assert_eq!(rows[2].lights, 2);
        assert!(rows[2].to_string().starts_with("low"));
    }

    #[test]
    fn test_schedule_cycles() {
        let schedule = Schedule::new(vec![10.0, 20.0]);
        assert_eq!(schedule.frame_time(0), 10.0);
        assert_eq!(schedule.frame_time(3), 20.0);

        let fallback = Schedule::new(vec![0.0, f64::NAN]);
        assert_eq!(fallback.frame_time(5), 16.7);
    }

    #[test]
    fn test_demo_scene_metrics() {
        let scene = demo_scene();
        let mut monitor = candela_core::PerformanceMonitor::new(0.0);
        monitor.update_scene_metrics(&scene);
        let metrics = monitor.metrics();
        assert_eq!(metrics.meshes, 14);
        assert_eq!(metrics.draw_calls, 14);
        assert_eq!(metrics.triangles_k, 12);
    }

    #[test]
    fn test_simulate_slow_device_downgrades() {
        let summary = simulate(
            desktop(),
            &MemoryStore::new(),
            AppConfig::default(),
            &Schedule::new(vec![50.0]),
            240,
            false,
            0,
        )
        .unwrap();

        assert_eq!(summary.frames, 240);
        assert_eq!(summary.initial_tier, QualityTier::High);
        assert_eq!(summary.final_tier, QualityTier::Low);
        assert_eq!(summary.changes.len(), 2);
        assert_eq!(summary.changes[0].at_ms, 5000.0);
    }

    #[test]
    fn test_simulate_fast_device_holds_high() {
        let summary = simulate(
            desktop(),
            &MemoryStore::new(),
            AppConfig::default(),
            &Schedule::new(vec![10.0]),
            1000,
            false,
            0,
        )
        .unwrap();

        assert_eq!(summary.final_tier, QualityTier::High);
        assert!(summary.changes.is_empty());
    }

    #[test]
    fn test_load_config() {
        let path = std::env::temp_dir().join(format!("candela-cli-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"adaptive": {"enabled": false}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.adaptive.enabled);

        std::fs::write(&path, r#"{"adaptive": {"downgrade_below_fps": 90}}"#).unwrap();
        assert!(load_config(&path).is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
