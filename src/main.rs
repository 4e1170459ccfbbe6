use color_eyre::{eyre::eyre, Result};
use padflow::controller::{CollectorSettings, EventCollector};
use padflow::mapping::defaults::{STICK_AXIS_LEFT, STICK_AXIS_RIGHT};
use padflow::{
    DeviceClass, DeviceEvent, EngineConfig, InputEngine, InputEvent, ListenerOptions, MemoryHost,
    Paused, RawFrame, RefreshScheduler,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::LocalSet;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let scripted = args.iter().any(|arg| arg == "--scripted");
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|index| args.get(index + 1))
        .map(PathBuf::from);

    let config = match config_path {
        Some(path) => EngineConfig::load(&path).await?,
        None => EngineConfig::load_default().await?,
    };

    // The engine and its callbacks are not Send
    LocalSet::new().run_until(run(config, scripted)).await
}

async fn run(config: EngineConfig, scripted: bool) -> Result<()> {
    let mut engine = if scripted {
        info!("Using scripted input host");
        let host = MemoryHost::new();
        tokio::task::spawn_local(drive_script(host.clone()));
        InputEngine::from_config(host, RefreshScheduler::new(), &config)
    } else {
        let settings = CollectorSettings {
            joystick_deadzone: config.joystick_deadzone,
        };
        let collector = EventCollector::create(Some(settings))?.initialize();
        InputEngine::from_config(collector, RefreshScheduler::new(), &config)
    }
    .map_err(|e| eyre!("Failed to create input engine: {}", e))?;

    register_logging(&mut engine)?;

    let engine = engine
        .resume()
        .run_until_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    engine.destroy();
    info!("Shutdown complete");
    Ok(())
}

fn register_logging(engine: &mut InputEngine<Paused>) -> Result<()> {
    let mut names: Vec<String> = Vec::new();
    for class in [DeviceClass::Gamepad, DeviceClass::Keyboard] {
        let table = engine
            .mappings()
            .buttons(class)
            .map_err(|e| eyre!("Failed to read {} mapping: {}", class, e))?;
        for (name, _) in table.iter() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    let buttons = names.join(" ");

    engine.on(
        "press release",
        &buttons,
        ListenerOptions::default(),
        |event: &InputEvent| {
            info!("{} {} on {} ({:.2})", event.kind, event.id, event.source, event.value);
            Ok(())
        },
    )?;
    engine.on(
        "hold",
        &buttons,
        ListenerOptions::default().once(),
        |event: &InputEvent| {
            info!("{} held on {}", event.id, event.source);
            Ok(())
        },
    )?;
    engine.on(
        "axis",
        &format!("{} {}", STICK_AXIS_LEFT, STICK_AXIS_RIGHT),
        ListenerOptions::default(),
        |event: &InputEvent| {
            debug!("{} on {}: {:?}", event.id, event.source, event.axes);
            Ok(())
        },
    )?;

    engine.on_device(DeviceEvent::Connect, |event: &InputEvent| {
        info!("Controller connected on {}: {}", event.source, event.id);
        Ok(())
    });
    engine.on_device(DeviceEvent::Disconnect, |event: &InputEvent| {
        info!("Controller disconnected from {}: {}", event.source, event.id);
        Ok(())
    });

    info!("Registered {} listeners", engine.listener_count());
    Ok(())
}

// Cycles a fake controller and the space key through a few inputs
async fn drive_script(host: MemoryHost) {
    host.connect(0, RawFrame::standard("Scripted Pad"));
    let mut step = tokio::time::interval(Duration::from_millis(400));
    let mut phase: u64 = 0;

    loop {
        step.tick().await;
        match phase % 6 {
            0 => host.press(0, 0),
            1 => host.release(0, 0),
            2 => host.set_axis(0, 0, 0.8),
            3 => host.set_axis(0, 0, 0.0),
            4 => host.key_down(32),
            _ => host.key_up(32),
        }
        phase += 1;
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
