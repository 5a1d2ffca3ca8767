mod app;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use hierarchy_force::GraphConfig;
use hierarchy_force::dataset::{load_dataset, sample_dataset};
use log::info;

const CONTROLS_WIDTH: f32 = 320.0;
const TOP_BAR_HEIGHT: f32 = 36.0;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Nested `{name, size, children}` JSON tree. Defaults to the bundled sample.
    #[arg(long)]
    data: Option<PathBuf>,
    /// JSON file overriding layout, force, zoom and scheduler defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Canvas width; the centering force targets half of it.
    #[arg(long)]
    width: Option<f32>,
    /// Canvas height; the centering force targets a quarter of it.
    #[arg(long)]
    height: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GraphConfig::load(path)?,
        None => GraphConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }

    let (datum, dataset_label) = match &args.data {
        Some(path) => (load_dataset(path)?, path.display().to_string()),
        None => (sample_dataset()?, "bundled sample".to_owned()),
    };
    let tree = datum.into_hierarchy();
    info!("loaded {} with {} nodes", dataset_label, tree.len());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([
            config.width.max(200.0) + CONTROLS_WIDTH,
            config.height.max(200.0) + TOP_BAR_HEIGHT,
        ]),
        ..Default::default()
    };

    eframe::run_native(
        "hierarchy-force",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::HierarchyForceApp::new(
                cc,
                tree,
                config,
                dataset_label,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}
