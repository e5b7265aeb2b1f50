use anyhow::{Context, Result};
use cli::parse_args;
use conf::{APP_NAME, load_config};
use cv::net::YoloPersonDetector;
use cv::{OpenCvCamera, select_camera_index};
use journal::Journal;
use log::logger::AdvancedLogger;
use log::{LogLevel, info};
use runner::{Dispatcher, PeopleCounter};
use std::sync::Arc;

mod cli;
mod conf;
mod cv;
mod journal;
mod runner;
mod ui;

fn main() -> Result<()> {
	let args = parse_args();
	AdvancedLogger::init(APP_NAME, LogLevel::Info)?;

	let mut cfg = load_config(args.config.as_deref())?;
	cfg.apply_args(&args);
	log::set_level(cfg.log_level())?;
	let zone = cfg.zone()?;

	let runtime = tokio::runtime::Runtime::new().context("Failed to start worker runtime")?;

	let backend = OpenCvCamera;
	let camera_index = match cfg.camera.index {
		Some(index) => {
			info!("Using configured camera {}", index);
			index
		}
		None => select_camera_index(&backend, cfg.camera.scan_range(), cfg.camera.fallback),
	};

	let detector = YoloPersonDetector::new(&cfg.model_path, cfg.detection.clone())?;
	let counter = Arc::new(PeopleCounter::new(backend, detector, camera_index));
	let dispatcher = Dispatcher::new(runtime.handle().clone(), move || counter.count());

	ui::run(&cfg.window, dispatcher, Journal::new(zone))?;

	info!("Window closed, shutting down");
	Ok(())
}
