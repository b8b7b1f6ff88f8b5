use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{clamp_step, PipelineConfig, DEFAULT_POINT_STEP};
use crate::error::{TripError, TripResult};
use crate::export::decimate;
use crate::pipeline::{process, TripOutput};
use crate::store::{read_locations, read_orientations, SampleStore};
use crate::summary::TripSummary;
use crate::types::{LocationSample, OrientationSample, TrackPoint};

pub const HELP: &str = "\
commands:
  location <path>              load the location table
  orientation <path>           load the orientation table
  step <n>                     map point stride (values below 1 become 1)
  summary                      show the trip summary
  points                       list decimated map points
  export <dir>                 write merged CSV and point report into <dir>
  sample location|orientation [n]  show the first n loaded rows (default 10)
  help                         show this text
  quit                         leave the shell";

/// Which tables the session currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    LocationOnly,
    OrientationOnly,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Location,
    Orientation,
}

impl FromStr for Table {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "location" | "loc" => Ok(Table::Location),
            "orientation" | "ori" => Ok(Table::Orientation),
            other => Err(TripError::InvalidCommand(format!("unknown table '{other}'"))),
        }
    }
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Location => "Location",
            Table::Orientation => "Orientation",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One shell command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(Table, PathBuf),
    Step(i64),
    Summary,
    Points,
    Export(PathBuf),
    Sample(Table, usize),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = TripError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let require_arg = |what: &str| {
            if rest.is_empty() {
                Err(TripError::InvalidCommand(format!("'{word}' needs {what}")))
            } else {
                Ok(rest)
            }
        };

        match word {
            "location" | "orientation" => {
                let path = require_arg("a file path")?;
                Ok(Command::Load(word.parse::<Table>()?, PathBuf::from(path)))
            }
            "step" => {
                let value = require_arg("a number")?;
                value
                    .parse::<i64>()
                    .map(Command::Step)
                    .map_err(|_| TripError::InvalidCommand(format!("'{value}' is not a number")))
            }
            "summary" => Ok(Command::Summary),
            "points" => Ok(Command::Points),
            "export" => Ok(Command::Export(PathBuf::from(require_arg("a directory")?))),
            "sample" => {
                let mut args = require_arg("a table name")?.split_whitespace();
                let table: Table = args.next().unwrap_or_default().parse()?;
                let count: usize = match args.next() {
                    Some(n) => n
                        .parse()
                        .map_err(|_| TripError::InvalidCommand(format!("'{n}' is not a count")))?,
                    None => 10,
                };
                Ok(Command::Sample(table, count))
            }
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err(TripError::InvalidCommand("empty command".to_string())),
            other => Err(TripError::InvalidCommand(format!("unknown command '{other}'"))),
        }
    }
}

/// What a command produced, for the shell to render
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Loaded {
        table: Table,
        path: PathBuf,
        count: usize,
        summary: Option<TripSummary>,
    },
    StepSet(NonZeroUsize),
    Summary(TripSummary),
    Points(Vec<TrackPoint>),
    Exported(Vec<PathBuf>),
    LocationRows(Vec<LocationSample>),
    OrientationRows(Vec<OrientationSample>),
    Help,
    Quit,
}

/// Interactive viewer state. Owns the loaded tables and the derived trajectory.
pub struct Session {
    location_path: Option<PathBuf>,
    orientation_path: Option<PathBuf>,
    locations: Option<Vec<LocationSample>>,
    orientations: Option<Vec<OrientationSample>>,
    trip: Option<TripOutput>,
    step: NonZeroUsize,
}

impl Session {
    pub fn new() -> Self {
        Session {
            location_path: None,
            orientation_path: None,
            locations: None,
            orientations: None,
            trip: None,
            step: clamp_step(DEFAULT_POINT_STEP as i64),
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.locations, &self.orientations) {
            (None, None) => SessionState::Empty,
            (Some(_), None) => SessionState::LocationOnly,
            (None, Some(_)) => SessionState::OrientationOnly,
            (Some(_), Some(_)) => SessionState::Ready,
        }
    }

    pub fn step(&self) -> NonZeroUsize {
        self.step
    }

    pub fn trip(&self) -> Option<&TripOutput> {
        self.trip.as_ref()
    }

    pub fn handle(&mut self, command: Command) -> TripResult<Response> {
        match command {
            Command::Load(table, path) => self.load(table, &path),
            Command::Step(step) => Ok(Response::StepSet(self.set_step(step))),
            Command::Summary => Ok(Response::Summary(self.ready_trip()?.summary.clone())),
            Command::Points => {
                let trip = self.ready_trip()?;
                Ok(Response::Points(decimate(&trip.samples, self.step)?))
            }
            Command::Export(dir) => self.export(dir).map(Response::Exported),
            Command::Sample(table, count) => self.sample(table, count),
            Command::Help => Ok(Response::Help),
            Command::Quit => Ok(Response::Quit),
        }
    }

    /// Load one table; once both are present the trip is recomputed.
    ///
    /// A table with no usable rows is rejected and the session keeps what it had.
    pub fn load(&mut self, table: Table, path: &Path) -> TripResult<Response> {
        let count = match table {
            Table::Location => {
                let samples = read_locations(path)?;
                let count = non_empty(table, samples.len())?;
                self.locations = Some(samples);
                self.location_path = Some(path.to_path_buf());
                count
            }
            Table::Orientation => {
                let samples = read_orientations(path)?;
                let count = non_empty(table, samples.len())?;
                self.orientations = Some(samples);
                self.orientation_path = Some(path.to_path_buf());
                count
            }
        };
        log::info!("{} loaded: {} ({} rows)", table, path.display(), count);

        let summary = self.refresh()?;
        Ok(Response::Loaded {
            table,
            path: path.to_path_buf(),
            count,
            summary,
        })
    }

    pub fn set_step(&mut self, step: i64) -> NonZeroUsize {
        self.step = clamp_step(step);
        if self.step.get() as i64 != step {
            log::warn!("step {} out of range, using {}", step, self.step);
        }
        self.step
    }

    fn refresh(&mut self) -> TripResult<Option<TripSummary>> {
        self.trip = None;
        let (locations, orientations) = match (&self.locations, &self.orientations) {
            (Some(l), Some(o)) => (l.clone(), o.clone()),
            _ => return Ok(None),
        };
        let store = SampleStore::new(locations, orientations)?;
        let trip = process(&store)?;
        let summary = trip.summary.clone();
        self.trip = Some(trip);
        Ok(Some(summary))
    }

    fn ready_trip(&self) -> TripResult<&TripOutput> {
        self.trip.as_ref().ok_or(TripError::NotReady)
    }

    fn export(&self, output_dir: PathBuf) -> TripResult<Vec<PathBuf>> {
        let trip = self.ready_trip()?;
        let config = PipelineConfig {
            location_path: self.location_path.clone().unwrap_or_default(),
            orientation_path: self.orientation_path.clone().unwrap_or_default(),
            output_dir,
            point_step: self.step.get(),
            ..PipelineConfig::default()
        };
        trip.write_artifacts(&config)
    }

    fn sample(&self, table: Table, count: usize) -> TripResult<Response> {
        let missing = |table: Table| TripError::EmptySeries { table: table.name() };
        match table {
            Table::Location => self
                .locations
                .as_ref()
                .filter(|rows| !rows.is_empty())
                .map(|rows| Response::LocationRows(rows.iter().take(count).copied().collect()))
                .ok_or_else(|| missing(table)),
            Table::Orientation => self
                .orientations
                .as_ref()
                .filter(|rows| !rows.is_empty())
                .map(|rows| Response::OrientationRows(rows.iter().take(count).copied().collect()))
                .ok_or_else(|| missing(table)),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(table: Table, count: usize) -> TripResult<usize> {
    if count == 0 {
        return Err(TripError::EmptySeries { table: table.name() });
    }
    Ok(count)
}
