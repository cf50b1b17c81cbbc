use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use env_logger::Env;
use log::{debug, info};
use stacktally::aggregate::Tally;
use stacktally::incident::{self, ScratchFile};
use stacktally::parse::{self, Options};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Report {
    /// `file:line` call sites
    Sites,
    /// Function names
    Calls,
    /// Incidents per endpoint
    Endpoints,
    /// Endpoints, then call sites, then function names
    All,
}

#[derive(Debug, Parser)]
#[clap(
    name = "stacktally-count",
    about,
    after_help = "\
Input is one JSON object per line with at least the fields \"id\", \"endpoint\" and
\"stacktrace\". Tables are printed as KEY : COUNT lines, most frequent first."
)]
struct Opt {
    // ************* //
    // *** FLAGS *** //
    // ************* //
    /// Print the parsed frames of every processed incident
    #[clap(long = "frames")]
    frames: bool,

    /// Silence all log output
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose logging mode (-v, -vv, -vvv)
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    // *************** //
    // *** OPTIONS *** //
    // *************** //
    /// Which frequency table(s) to print
    #[clap(long = "report", value_enum, default_value_t = Report::Sites)]
    report: Report,

    /// Only process incidents recorded for this endpoint
    #[clap(long = "endpoint", value_name = "NAME")]
    endpoint: Option<String>,

    /// Dump the split tokens of every processed incident to this file
    #[clap(long = "scratch", value_name = "PATH")]
    scratch: Option<PathBuf>,

    /// Substring to remove before splitting; may be repeated, replaces the defaults
    /// (`<br />`, newline, carriage return)
    #[clap(long = "noise", value_name = "STRING")]
    noise: Vec<String>,

    /// Regular expression matching frame and thread markers
    #[clap(
        long = "delimiters",
        value_name = "REGEX",
        default_value = parse::split::DEFAULT_DELIMITERS
    )]
    delimiters: String,

    // ************ //
    // *** ARGS *** //
    // ************ //
    /// Incident JSON lines file, or STDIN if not specified
    #[clap(value_name = "PATH")]
    infile: Option<PathBuf>,
}

impl Opt {
    fn into_parts(self) -> (Option<PathBuf>, Options, Run) {
        let mut options = Options::default();
        if !self.noise.is_empty() {
            options.noise = self.noise;
        }
        options.delimiters = self.delimiters;
        let run = Run {
            report: self.report,
            endpoint: self.endpoint,
            scratch: self.scratch,
            frames: self.frames,
        };
        (self.infile, options, run)
    }
}

struct Run {
    report: Report,
    endpoint: Option<String>,
    scratch: Option<PathBuf>,
    frames: bool,
}

fn main() -> io::Result<()> {
    let opt = Opt::parse();

    // Initialize logger
    if !opt.quiet {
        env_logger::Builder::from_env(Env::default().default_filter_or(match opt.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }))
        .format_timestamp(None)
        .init();
    }

    let (infile, options, run) = opt.into_parts();
    let parser = parse::Parser::from_options(options)?;
    let incidents = incident::from_file(infile.as_ref())?;
    let scratch = run.scratch.as_ref().map(ScratchFile::create).transpose()?;
    if let Some(ref scratch) = scratch {
        info!("Dumping split traces to {}", scratch.path().display());
    }

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());

    if matches!(run.report, Report::Endpoints | Report::All) {
        incident::endpoint_counts(&incidents).write_ranked(&mut writer)?;
        if run.report == Report::All {
            writeln!(writer)?;
        }
    }

    let mut tally = Tally::default();
    for incident in &incidents {
        if let Some(ref endpoint) = run.endpoint {
            if &incident.endpoint != endpoint {
                continue;
            }
        }

        if let Some(ref scratch) = scratch {
            scratch.append(incident, &parser.split(&incident.stacktrace))?;
        }

        let trace = parser.parse(&incident.stacktrace);
        debug!("Incident {} has {} frames", incident.id, trace.len());
        if run.frames {
            for frame in trace.frames() {
                writeln!(writer, "{}", frame)?;
            }
            writeln!(writer)?;
        }
        tally.add_trace(trace.frames());
    }
    info!(
        "Counted {} call sites and {} functions over {} traces",
        tally.sites().len(),
        tally.calls().len(),
        tally.ntraces()
    );

    match run.report {
        Report::Sites => tally.sites().write_ranked(&mut writer)?,
        Report::Calls => tally.calls().write_ranked(&mut writer)?,
        Report::Endpoints => {}
        Report::All => {
            tally.sites().write_ranked(&mut writer)?;
            writeln!(writer)?;
            tally.calls().write_ranked(&mut writer)?;
        }
    }
    writer.flush()
}
