use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use trip_kinematics::session::{Command, Response, Session, Table, HELP};

#[derive(Parser, Debug)]
#[command(name = "trip_shell")]
#[command(about = "Interactive viewer for location + orientation logs", long_about = None)]
struct Args {
    /// Location table to load at startup
    #[arg(long)]
    location: Option<PathBuf>,

    /// Orientation table to load at startup
    #[arg(long)]
    orientation: Option<PathBuf>,

    /// Initial map point stride
    #[arg(long, default_value = "10", allow_hyphen_values = true)]
    step: i64,
}

fn render(response: &Response) {
    match response {
        Response::Loaded {
            table,
            path,
            count,
            summary,
        } => {
            println!("[OK] {} loaded: {} ({} rows)", table, path.display(), count);
            if let Some(summary) = summary {
                println!("[OK] merge complete");
                println!("{}", summary);
            }
        }
        Response::StepSet(step) => println!("step = {}", step),
        Response::Summary(summary) => println!("{}", summary),
        Response::Points(points) => {
            for p in points {
                println!(
                    "{:>9.2} s  {:.6}, {:.6}  {:.3} km | {:.1} km/h | Alt {} | Yaw {:.1}° Pitch {:.1}° Roll {:.1}°",
                    p.time_s,
                    p.lat,
                    p.lon,
                    p.dist_km,
                    p.speed_kmh,
                    p.alt_m.map(|a| format!("{:.1} m", a)).unwrap_or_else(|| "--".to_string()),
                    p.yaw,
                    p.pitch,
                    p.roll
                );
            }
            println!("{} points", points.len());
        }
        Response::Exported(paths) => {
            for path in paths {
                println!("[OK] {} created", path.display());
            }
        }
        Response::LocationRows(rows) => {
            println!("Time (s)  Latitude (°)  Longitude (°)  Height (m)");
            for r in rows {
                let height = r.altitude.map(|a| a.to_string()).unwrap_or_default();
                println!("{}  {}  {}  {}", r.time, r.latitude, r.longitude, height);
            }
        }
        Response::OrientationRows(rows) => {
            println!("Time (s)  Yaw (°)  Pitch (°)  Roll (°)");
            for r in rows {
                println!("{}  {}  {}  {}", r.time, r.yaw, r.pitch, r.roll);
            }
        }
        Response::Help => println!("{}", HELP),
        Response::Quit => {}
    }
}

fn dispatch(session: &mut Session, command: Command) -> bool {
    match session.handle(command) {
        Ok(response) => {
            render(&response);
            !matches!(response, Response::Quit)
        }
        Err(e) => {
            println!("[ERROR] {}", e);
            true
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut session = Session::new();
    session.set_step(args.step);
    if let Some(path) = args.location {
        dispatch(&mut session, Command::Load(Table::Location, path));
    }
    if let Some(path) = args.orientation {
        dispatch(&mut session, Command::Load(Table::Orientation, path));
    }

    println!("type 'help' for commands");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let keep_going = match line.parse::<Command>() {
            Ok(command) => dispatch(&mut session, command),
            Err(e) => {
                println!("[ERROR] {}", e);
                true
            }
        };
        if !keep_going {
            break;
        }
    }

    Ok(())
}
