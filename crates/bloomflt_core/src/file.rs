//! Path-based save/load. Saves are published atomically: temp file in the target
//! directory, fsync, rename, fsync of the directory.

use crate::codec::{self, Encoding, SaveOptions};
use crate::errors::Result;
use crate::filter::Filter;
use crate::hash::HashSource;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let f = std::fs::OpenOptions::new().read(true).custom_flags(libc::O_DIRECTORY).open(dir)?;
    f.sync_all()
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> { Ok(()) }

pub fn save_file<H: HashSource>(filter: &Filter<H>, path: impl AsRef<Path>) -> Result<()> {
    save_file_as(filter, path, Encoding::Compressed, &SaveOptions::default())
}

pub fn save_file_as<H: HashSource>(
    filter: &Filter<H>,
    path: impl AsRef<Path>,
    encoding: Encoding,
    opts: &SaveOptions,
) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new().prefix(".bloomflt_").tempfile_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        codec::save_as(filter, &mut w, encoding, opts)?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    // on error the temp file is removed when `tmp` drops
    tmp.persist(path)?;
    if let Err(e) = fsync_dir(path) {
        warn!(path = %path.display(), error = %e, "directory fsync failed");
    }
    debug!(path = %path.display(), ?encoding, "published filter");
    Ok(())
}

pub fn load_file(path: impl AsRef<Path>, factor: usize) -> Result<Filter> {
    load_file_as(path, Encoding::Compressed, factor)
}

pub fn load_file_as(path: impl AsRef<Path>, encoding: Encoding, factor: usize) -> Result<Filter> {
    let mut r = BufReader::new(File::open(path.as_ref())?);
    codec::load_as(&mut r, encoding, factor)
}
