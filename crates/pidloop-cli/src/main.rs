//! `pidloop` – step-response bench for tuning a controller.
//!
//! This binary is a tuning front-end for `pidloop-core`.  It:
//!
//! 1. Loads controller, plant and run settings from `pidloop.toml` (see
//!    [`config`]), applying `PIDLOOP_*` environment overrides.
//! 2. Closes the loop around a simulated first-order plant and prints one row
//!    per sample: time, setpoint, process value, output.
//! 3. Intercepts **Ctrl-C** to stop the run early and still print a summary.

mod config;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use pidloop_core::PidController;
use pidloop_hal::{ControlLoop, SimPlant};

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (default "info"); PIDLOOP_LOG_FORMAT=json
    // switches to newline-delimited JSON.  The step table itself goes to
    // stdout via println!.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("PIDLOOP_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run cannot be interrupted early");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(cfg) => {
            info!(path = %config::config_path().display(), "configuration loaded");
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    let controller = match PidController::new(&cfg.controller) {
        Ok(pid) => pid,
        Err(e) => {
            error!(error = %e, "invalid controller settings");
            println!("{}: {}", "Invalid controller settings".red(), e);
            std::process::exit(1);
        }
    };

    print_settings(&controller);

    // ── Closed loop ───────────────────────────────────────────────────────
    let plant = SimPlant::new(cfg.plant, controller.sample_time());
    let (mut sensor, mut actuator) = plant.split();
    let mut control = ControlLoop::new(controller);

    println!(
        "  {:>8}  {:>10}  {:>10}  {:>10}",
        "t [s]".bold(),
        "setpoint".bold(),
        "input".bold(),
        "output".bold()
    );

    for step in 0..cfg.run.steps {
        if shutdown.load(Ordering::SeqCst) {
            println!("{}", "  ⚠  Interrupted.".yellow().bold());
            break;
        }

        let t = step as f32 * control.controller().sample_time();
        match control.tick(&mut sensor, &mut actuator) {
            Ok(Some(output)) => println!(
                "  {:>8.2}  {:>10.3}  {:>10.3}  {:>10.3}",
                t,
                control.controller().setpoint(),
                control.controller().input(),
                output
            ),
            Ok(None) => println!(
                "  {:>8.2}  {:>10.3}  {:>10.3}  {:>10}",
                t,
                control.controller().setpoint(),
                control.controller().input(),
                "manual".dimmed()
            ),
            Err(e) => {
                println!("{}: {}", "Control loop fault".red(), e);
                break;
            }
        }

        if cfg.run.realtime {
            std::thread::sleep(control.period());
        }
    }

    // ── Summary ───────────────────────────────────────────────────────────
    let pid = control.controller();
    let remaining = pid.setpoint() - plant.value();
    println!();
    println!(
        "  {} after {} samples: process value {:.3}, error {:.3}, output {:.3}",
        "Done".green().bold(),
        control.ticks(),
        plant.value(),
        remaining,
        pid.output()
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Output helpers
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!(
        "  {} {}",
        "pidloop".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  PID step-response bench");
    println!();
}

fn print_settings(pid: &PidController) {
    let (min, max) = pid.output_limits();
    println!(
        "  Kp {}  Ki {}  Kd {}  dt {} s",
        pid.kp().to_string().bold(),
        pid.ki().to_string().bold(),
        pid.kd().to_string().bold(),
        pid.sample_time()
    );
    println!(
        "  output [{}, {}]  mode {}  direction {}",
        min,
        max,
        pid.mode().to_string().bold(),
        pid.direction().to_string().bold()
    );
    println!();
}
