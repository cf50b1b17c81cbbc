use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::aggregate::Occurrences;

const READER_CAPACITY: usize = 128 * 1024;

/// One recorded outlier: the request endpoint it happened on and the stack trace captured for it.
///
/// Only these three fields are read; any other field of the stored record is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Incident {
    /// Identifier of the record.
    pub id: i64,

    /// Endpoint the outlier was recorded for.
    pub endpoint: String,

    /// Raw stack trace text.
    pub stacktrace: String,
}

/// Reads incidents stored as JSON lines, one object per line.
///
/// Blank lines are ignored. A line that is not a valid incident is logged and skipped.
pub fn from_reader<R>(mut reader: R) -> io::Result<Vec<Incident>>
where
    R: BufRead,
{
    let mut incidents = Vec::new();
    let mut line = Vec::new();
    let mut line_num = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_num += 1;

        let record = match std::str::from_utf8(&line) {
            Ok(record) => record.trim(),
            Err(e) => {
                warn!("Skipping invalid incident on line {}: {}", line_num, e);
                continue;
            }
        };
        if record.is_empty() {
            continue;
        }

        match serde_json::from_str::<Incident>(record) {
            Ok(incident) => incidents.push(incident),
            Err(e) => warn!("Skipping invalid incident on line {}: {}", line_num, e),
        }
    }

    info!("Read {} incidents", incidents.len());
    Ok(incidents)
}

/// Reads incidents from a file, or from STDIN if `infile` is `None`.
///
/// See [`from_reader`] for the format.
pub fn from_file<P>(infile: Option<P>) -> io::Result<Vec<Incident>>
where
    P: AsRef<Path>,
{
    match infile {
        Some(ref path) => {
            let file = File::open(path)?;
            let reader = io::BufReader::with_capacity(READER_CAPACITY, file);
            from_reader(reader)
        }
        None => {
            let stdio = io::stdin();
            let stdio_guard = stdio.lock();
            let reader = io::BufReader::with_capacity(READER_CAPACITY, stdio_guard);
            from_reader(reader)
        }
    }
}

/// Counts incidents per endpoint.
pub fn endpoint_counts<'a, I>(incidents: I) -> Occurrences
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut endpoints = Occurrences::new();
    for incident in incidents {
        endpoints.insert_or_add(&incident.endpoint, 1);
    }
    endpoints
}

/// An append-only text file the split tokens of each processed incident are dumped to, for
/// inspection by hand.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Starts a new scratch file at `path`, removing whatever was there before.
    ///
    /// The file itself is only created by the first [`ScratchFile::append`].
    pub fn create<P>(path: P) -> io::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed previous scratch file {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(Self { path })
    }

    /// Location of the scratch file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an `id, endpoint` header, one token per line, and a blank-line separator.
    ///
    /// The file is opened and closed again on every call.
    pub fn append<S>(&self, incident: &Incident, tokens: &[S]) -> io::Result<()>
    where
        S: AsRef<str>,
    {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = io::BufWriter::new(file);
        writeln!(writer, "{}, {}", incident.id, incident.endpoint)?;
        for token in tokens {
            writeln!(writer, "{}", token.as_ref())?;
        }
        writer.write_all(b"\n\n")?;
        writer.flush()
    }
}
