//! Per-node logging sink. `flux::logging::init` builds a `slog` logger from a
//! `sloggers`-parsed `LoggerConfig` because a terminal destination is all it
//! ever needs; a ring node instead needs one line-oriented file per nickname
//! stamped `HH:MM:SS`, a format `sloggers`'s bundled
//! destinations don't expose, so here the `slog::Drain` is implemented
//! directly against the file and `sloggers` is dropped (see DESIGN.md).

use slog::{Drain, Level, Record, OwnedKVList, Logger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// A `slog::Drain` that writes one timestamped line per record to a file.
struct LineDrain {
    file: Mutex<File>,
}

impl LineDrain {
    fn open(path: &str) -> io::Result<LineDrain> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(LineDrain { file: Mutex::new(file) })
    }
}

impl Drain for LineDrain {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record<'_>, _values: &OwnedKVList) -> Result<(), io::Error> {
        if record.level() > Level::Info {
            return Ok(());
        }
        let mut file = self.file.lock().unwrap();
        writeln!(file, "[{}] {}", hh_mm_ss_now(), record.msg())?;
        file.flush()
    }
}

/// Wall-clock `HH:MM:SS`.
fn hh_mm_ss_now() -> String {
    let secs_since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let secs_of_day = secs_since_epoch % 86_400;
    format!("{:02}:{:02}:{:02}", secs_of_day / 3600, (secs_of_day / 60) % 60, secs_of_day % 60)
}

/// Builds the per-node logger, writing to `<nickname>.log`.
pub fn init(nickname: &str) -> io::Result<Logger> {
    let path = format!("{}.log", nickname);
    let drain = LineDrain::open(&path)?;
    let drain = Mutex::new(drain).fuse();
    Ok(Logger::root(drain, slog::o!()))
}
