use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use env_logger::Env;
use stacktally::parse::{self, Options};

#[derive(Debug, Parser)]
#[clap(
    name = "stacktally-parse",
    about,
    after_help = "\
Each frame is printed as FILE<TAB>LINE<TAB>FUNCTION<TAB>SOURCE. Lines of the trace that are not
frames (thread ids, the Traceback header) are printed as empty records unless --skip-unparsed
is given."
)]
struct Opt {
    // ************* //
    // *** FLAGS *** //
    // ************* //
    /// Do not print records for lines that are not frames
    #[clap(long = "skip-unparsed")]
    skip_unparsed: bool,

    /// Print a `# thread <n>` line before the frames of each thread
    #[clap(long = "threads")]
    threads: bool,

    /// Silence all log output
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose logging mode (-v, -vv, -vvv)
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    // *************** //
    // *** OPTIONS *** //
    // *************** //
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
    /// Stack trace text file, or STDIN if not specified
    #[clap(value_name = "PATH")]
    infile: Option<PathBuf>,
}

impl Opt {
    fn into_parts(self) -> (Option<PathBuf>, Options, Output) {
        let mut options = Options::default();
        if !self.noise.is_empty() {
            options.noise = self.noise;
        }
        options.delimiters = self.delimiters;
        let output = Output {
            skip_unparsed: self.skip_unparsed,
            threads: self.threads,
        };
        (self.infile, options, output)
    }
}

struct Output {
    skip_unparsed: bool,
    threads: bool,
}

fn read_input(infile: Option<&PathBuf>) -> io::Result<String> {
    let mut bytes = Vec::new();
    match infile {
        Some(path) => {
            File::open(path)?.read_to_end(&mut bytes)?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut bytes)?;
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
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

    let (infile, options, output) = opt.into_parts();
    let parser = parse::Parser::from_options(options)?;
    let raw = read_input(infile.as_ref())?;
    let trace = parser.parse(&raw);

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    for (n, thread) in trace.threads().enumerate() {
        if output.threads {
            writeln!(writer, "# thread {}", n + 1)?;
        }
        for frame in thread {
            if output.skip_unparsed && frame.is_unparsed() {
                continue;
            }
            writeln!(writer, "{}", frame)?;
        }
    }
    writer.flush()
}
