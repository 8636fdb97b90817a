use std::io::{self, BufRead, Write};
use std::process;

use log::{error, warn};
use structopt::StructOpt;

use asciibrot::config::default_workers;
use asciibrot::{Command, Config, Explorer, Frame, Precision};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "asciibrot-render",
    about = "Render the Mandelbrot set as ASCII, one frame per command read from stdin"
)]
struct Opt {
    /// Decimal digits of precision for every coordinate
    #[structopt(short, long, default_value = "500")]
    digits: usize,

    #[structopt(short, long, default_value = "80")]
    columns: usize,

    #[structopt(short, long, default_value = "40")]
    rows: usize,

    /// Iteration cap
    #[structopt(short = "i", long, default_value = "50")]
    cap: u32,

    /// Worker threads, defaults to the number of cpus minus two
    #[structopt(short, long)]
    workers: Option<usize>,

    #[structopt(long, default_value = "0.9")]
    zoom_factor: f64,

    #[structopt(long, default_value = "0.06")]
    pan_factor: f64,
}

fn show(out: &mut impl Write, frame: &Frame, explorer: &Explorer) -> io::Result<()> {
    write!(out, "{}", frame)?;
    writeln!(out, "{}", explorer.status())?;
    out.flush()
}

fn run(opt: Opt) -> asciibrot::Result<()> {
    let config = Config::default()
        .with_precision(Precision::from_digits(opt.digits)?)
        .with_iteration_cap(opt.cap)
        .with_workers(opt.workers.unwrap_or_else(default_workers))
        .with_zoom_factor(opt.zoom_factor)
        .with_pan_factor(opt.pan_factor);

    let mut explorer = Explorer::new(config, opt.columns, opt.rows)?;
    let frame = explorer.render_and_wait()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = show(&mut out, &frame, &explorer) {
        error!("could not write frame: {}", e);
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("could not read command: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let frame = match line.parse::<Command>().and_then(|c| explorer.apply(c)) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        if let Err(e) = show(&mut out, &frame, &explorer) {
            error!("could not write frame: {}", e);
            break;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Opt::from_args()) {
        error!("{}", e);
        eprintln!("asciibrot-render: {}", e);
        process::exit(1);
    }
}
