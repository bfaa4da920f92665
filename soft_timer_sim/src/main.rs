use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use soft_timer_common::{ControlSetting, FaultLog, PinId};
use soft_timer_sim::{BlinkApp, Board, SimError, Trace, COUNTS_PER_MS};

/// Runs the blink application against simulated timer hardware.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Simulated run time.
    #[arg(long, default_value_t = 1_000)]
    duration_ms: u32,

    /// LED period in ticks of the slow (10 ms) service.
    #[arg(long, default_value_t = 50)]
    blink_ticks: u16,

    /// Generic pin id driving the LED.
    #[arg(long, default_value_t = 0)]
    led_pin: u8,

    /// Stop the slow service this far into the run.
    #[arg(long)]
    stop_slow_at_ms: Option<u32>,

    /// Read this slow service slot once the run ends.
    #[arg(long)]
    probe_timer: Option<usize>,

    /// Print the trace as JSON instead of logging it.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    if args.blink_ticks == 0 {
        return Err(SimError::ZeroBlinkTicks);
    }
    let led = PinId::try_from(args.led_pin)?;

    let faults = FaultLog::new();
    let mut board = Board::new(&faults);
    board.boot();

    let mut app = BlinkApp::new(led, args.blink_ticks);
    app.setup(&mut board);

    let total = args.duration_ms.saturating_mul(COUNTS_PER_MS);
    match args.stop_slow_at_ms {
        Some(stop_ms) => {
            let before = stop_ms.saturating_mul(COUNTS_PER_MS).min(total);
            board.run_for(before, &mut app);
            board.control_slow(ControlSetting::Stop);
            board.run_for(total - before, &mut app);
        }
        None => board.run_for(total, &mut app),
    }

    if let Some(id) = args.probe_timer {
        match board.slow.read(id) {
            Some(ticks) => info!("Slow timer {} has {} ticks left", id, ticks),
            None => warn!("Slow timer {} does not exist", id),
        }
    }

    let trace = Trace::capture(&board, &app);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    } else {
        info!("Simulation finished: {:?}", trace);
    }

    Ok(())
}
