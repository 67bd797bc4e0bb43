// src/main.rs
mod app;
mod args;
mod command;
mod config;
mod data;
mod error;
mod geometry;
mod gesture;
mod headless;
mod landmarks;
mod mediapipe_bridge;
mod tracking;
mod transport;
mod ui;
mod video;

use anyhow::Result;
use clap::Parser;
use eframe::egui;
use tracing::info;

use crate::args::Args;
use crate::config::AppConfig;
use crate::headless::HeadlessOptions;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hand_gesture={},nokhwa=warn", level).into()),
        )
        .init();

    info!("hand_gesture v{} starting", env!("CARGO_PKG_VERSION"));

    if args.list {
        match video::list_cameras() {
            Ok(cameras) => {
                println!("Found {} camera(s):", cameras.len());
                for camera in &cameras {
                    println!("  {}", camera.label());
                }
            }
            Err(e) => println!("Cannot list cameras: {}", e),
        }
        match transport::list_ports() {
            Ok(ports) => {
                println!("Found {} serial port(s):", ports.len());
                for port in &ports {
                    println!("  {}", port.label());
                }
            }
            Err(e) => println!("Cannot list serial ports: {}", e),
        }
        return Ok(());
    }

    let config_path = args.config.clone().or_else(AppConfig::default_path);
    let mut config = config_path
        .as_deref()
        .map(AppConfig::load)
        .unwrap_or_default();
    args.apply(&mut config);

    if args.headless || args.replay.is_some() {
        let options = HeadlessOptions {
            replay: args.replay.clone(),
            max_frames: args.frames,
            record: args.record,
        };
        return headless::run(&config, options);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 600.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Hand Gesture Control",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(ui::visuals());
            Box::new(app::GestureApp::new(cc, config, config_path))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Error running application: {}", e))
}
