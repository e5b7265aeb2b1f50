use clap::Parser;
use std::path::PathBuf;

/// Every flag is optional; a bare launch uses the config file alone.
#[derive(Parser, Debug, Default)]
#[command(version, about = "Counts the people in front of the webcam", long_about = None)]
pub struct Args {
	/// Read settings from this file instead of the user config directory
	#[arg(short, long)]
	pub config: Option<PathBuf>,

	/// Output debug information
	#[arg(short, long)]
	pub debug: bool,

	/// ONNX detection model
	#[arg(short, long)]
	pub model: Option<PathBuf>,

	/// Use this camera index instead of probing for one
	#[arg(long)]
	pub camera: Option<i32>,
}

pub fn parse_args() -> Args {
	Args::parse()
}
