use std::path::Path;
use std::process::ExitCode;

use quarry::config::{CONFIG_PATH, EngineConfig};
use quarry::{Engine, platform};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut headless_ticks = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => match args.next().and_then(|n| n.parse::<u64>().ok()) {
                Some(ticks) => headless_ticks = Some(ticks),
                None => {
                    log::error!("--headless expects a tick count");
                    return ExitCode::FAILURE;
                }
            },
            other => log::warn!("ignoring unknown argument {other}"),
        }
    }

    let config = match EngineConfig::load(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let window = config.window.clone();

    let mut builder = Engine::builder().with_config(config);
    if headless_ticks.is_some() {
        builder = builder.headless();
    }
    let mut engine = builder.build();

    if let Err(err) = engine.init() {
        log::error!("engine failed to start: {err}");
        return ExitCode::FAILURE;
    }

    let result = match headless_ticks {
        Some(ticks) => {
            engine.run_ticks(ticks);
            Ok(())
        }
        None => platform::run(&mut engine, &window),
    };
    engine.exit();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
