use c8vm::{config::Config, emulator::Emulator};
use log::{error, info};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_args()?;
    let mut emulator = Emulator::from_config(&config)?;
    info!(
        "running {:?} at {} instructions/s",
        config.rom_path, config.tick_rate
    );

    let trace_screen = config.trace_screen;
    let summary = emulator.run(config.frames, !config.unthrottled, |vm| {
        if trace_screen {
            println!("{}", vm.framebuffer().render_text());
        }
    });

    print!("{}", emulator.vm().framebuffer().render_text());
    info!("ran {} frames", summary.frames);

    if let Some(fault) = summary.fault {
        error!("program stopped: {}", fault);
        return Err(fault.into());
    }
    Ok(())
}
