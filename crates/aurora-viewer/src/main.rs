mod assets;
mod cli;
mod fly_camera;
mod panel;
mod scene;
mod viewer;

use anyhow::Result;
use aurora_engine::device::GpuInit;
use aurora_engine::logging::{LoggingConfig, init_logging};
use aurora_engine::params::PipelineParameters;
use aurora_engine::window::{Runtime, RuntimeConfig};

use crate::assets::ViewerAssets;
use crate::cli::{USAGE, ViewerArgs};
use crate::viewer::Viewer;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = ViewerArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let mut params = PipelineParameters {
        antialias_enabled: !args.no_fxaa,
        ..PipelineParameters::default()
    };
    if let Some(n) = args.blur_passes {
        params.blur_pass_count = n;
    }

    let assets = ViewerAssets::load(args.skybox_dir.as_deref(), args.emission.as_deref());
    log::info!("hold the right mouse button to fly; Esc quits");

    let config = RuntimeConfig {
        title: "Aurora".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), Viewer::new(assets, params))
}
