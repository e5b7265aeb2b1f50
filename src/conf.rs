use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use log::{LogLevel, debug, info};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::cli::Args;

pub const APP_NAME: &str = "headcount";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
	pub version: u8,
	pub debug: bool,
	/// Detection weights, relative to the working directory
	pub model_path: PathBuf,
	/// IANA zone name used for log timestamps
	pub time_zone: String,
	pub camera: CameraConf,
	pub detection: DetectionConf,
	pub window: WindowConf,
}

impl ::std::default::Default for Conf {
	fn default() -> Self {
		Self {
			version: 0,
			debug: false,
			model_path: "yolov8n.onnx".into(),
			time_zone: "Israel".into(),
			camera: CameraConf::default(),
			detection: DetectionConf::default(),
			window: WindowConf::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConf {
	/// Fixed device index; skips probing when set
	pub index: Option<i32>,
	pub scan_first: i32,
	pub scan_last: i32,
	/// Built-in camera, used when no scanned index opens
	pub fallback: i32,
}

impl Default for CameraConf {
	fn default() -> Self {
		Self { index: None, scan_first: 1, scan_last: 4, fallback: 0 }
	}
}

impl CameraConf {
	pub fn scan_range(&self) -> RangeInclusive<i32> {
		self.scan_first..=self.scan_last
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConf {
	/// Square model input edge in pixels
	pub input_size: i32,
	pub confidence: f32,
	pub iou: f32,
}

impl Default for DetectionConf {
	fn default() -> Self {
		Self { input_size: 640, confidence: 0.25, iou: 0.7 }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConf {
	pub width: f32,
	pub height: f32,
	pub always_on_top: bool,
}

impl Default for WindowConf {
	fn default() -> Self {
		Self { width: 500., height: 500., always_on_top: true }
	}
}

impl Conf {
	/// Command line flags win over the file.
	pub fn apply_args(&mut self, args: &Args) {
		if args.debug {
			self.debug = true;
		}
		if let Some(model) = &args.model {
			self.model_path = model.clone();
		}
		if let Some(index) = args.camera {
			self.camera.index = Some(index);
		}
	}

	pub fn log_level(&self) -> LogLevel {
		if self.debug { LogLevel::Debug } else { LogLevel::Info }
	}

	pub fn zone(&self) -> Result<Tz> {
		self.time_zone
			.parse::<Tz>()
			.map_err(|e| anyhow!("Unknown time zone '{}': {}", self.time_zone, e))
	}
}

/// Loads the config, falling back to defaults when no file exists.
///
/// Nothing is written to disk.
pub fn load_config(path: Option<&Path>) -> Result<Conf> {
	let path = match path {
		Some(path) => path.to_path_buf(),
		None => confy::get_configuration_file_path(APP_NAME, None)
			.context("Failed to locate config directory")?,
	};

	let cfg: Conf = if path.exists() {
		info!("Loading config from {}", path.display());
		confy::load_path(&path)
			.with_context(|| format!("Failed to load config {}", path.display()))?
	} else {
		info!("No config at {}, using defaults", path.display());
		Conf::default()
	};
	debug!("{:?}", cfg);
	Ok(cfg)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_file_yields_defaults_without_writing() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("headcount.yml");

		let cfg = load_config(Some(&path)).unwrap();

		assert_eq!(cfg, Conf::default());
		assert!(!path.exists());
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
		assert_eq!(cfg.model_path, PathBuf::from("yolov8n.onnx"));
		assert_eq!(cfg.camera.scan_range(), 1..=4);
		assert_eq!(cfg.camera.fallback, 0);
	}

	#[test]
	fn partial_file_keeps_defaults_for_the_rest() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("headcount.yml");
		std::fs::write(&path, "time_zone: UTC\ncamera:\n  fallback: 2\n").unwrap();

		let cfg = load_config(Some(&path)).unwrap();

		assert_eq!(cfg.time_zone, "UTC");
		assert_eq!(cfg.camera.fallback, 2);
		assert_eq!(cfg.camera.scan_first, 1);
		assert_eq!(cfg.detection, DetectionConf::default());
		assert_eq!(cfg.window, WindowConf::default());
	}

	#[test]
	fn args_override_file() {
		let mut cfg = Conf::default();
		let args = Args {
			config: None,
			debug: true,
			model: Some("other.onnx".into()),
			camera: Some(3),
		};

		cfg.apply_args(&args);

		assert_eq!(cfg.log_level(), LogLevel::Debug);
		assert_eq!(cfg.model_path, PathBuf::from("other.onnx"));
		assert_eq!(cfg.camera.index, Some(3));
	}

	#[test]
	fn bare_args_change_nothing() {
		let mut cfg = Conf::default();
		cfg.apply_args(&Args::default());
		assert_eq!(cfg, Conf::default());
		assert_eq!(cfg.log_level(), LogLevel::Info);
	}

	#[test]
	fn default_zone_resolves() {
		let cfg = Conf::default();
		assert_eq!(cfg.zone().unwrap().name(), "Israel");
	}

	#[test]
	fn unknown_zone_is_rejected() {
		let cfg = Conf { time_zone: "Mars/Olympus_Mons".into(), ..Conf::default() };
		let err = cfg.zone().unwrap_err();
		assert!(err.to_string().contains("Mars/Olympus_Mons"));
	}
}
