use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use env_logger::Builder;
use log::LevelFilter;

use tensile_host::{ColliderProxy, HostConfig, HostRuntime};
use tensile_native::{ColliderShape, Pose, Vec3};

fn init_logging() {
    let level = std::env::var("TENSILE_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let mut builder = Builder::new();
    builder.filter_level(level);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{:<5}] {:<18} {}",
            record.level(),
            record.target(),
            record.args()
        )
    });
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    init_logging();

    let config =
        HostConfig::load_json(Path::new("runner.json")).context("loading runner.json")?;
    log::info!(
        "runner: hosting '{}' from '{}'",
        config.module_file,
        config.plugin_dir.display()
    );

    let mut runtime = HostRuntime::new(&config).context("mapping the engine module")?;
    if config.watch {
        runtime
            .watch(Duration::from_millis(config.debounce_ms))
            .context("watching the plugin directory")?;
    }

    // Minimal demo scene: a ground plane plus a sphere obstacle. Real
    // applications enumerate their own proxies each tick.
    let proxies = vec![
        ColliderProxy::new(ColliderShape::Plane, Pose::identity()),
        ColliderProxy::new(
            ColliderShape::Sphere,
            Pose {
                position: Vec3::new(0.0, 1.0, 0.0),
                ..Pose::identity()
            },
        ),
    ];

    runtime.start(&proxies).context("initializing the simulation")?;
    if let Some(mesh) = runtime.host().mesh() {
        log::info!(
            "runner: mesh ready ({} vertices, {} triangles)",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing ctrl-c handler")?;
    }

    let tick = Duration::from_secs_f64(1.0 / config.tick_hz.max(1) as f64);
    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        runtime.tick(&proxies);
        if let Some(rest) = tick.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    log::info!("runner: shutting down");
    runtime.shutdown();
    Ok(())
}
