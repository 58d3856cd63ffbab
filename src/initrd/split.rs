//! Rootfs payload splitting.
//!
//! Container root filesystems routinely run to gigabytes; staging one as
//! a single file would hit single-file limits in the downstream archive
//! tool and concentrate copy pressure. The staged archive is therefore
//! chunked into bounded parts whose filename sort order equals their
//! byte-offset order, so the guest init script can reassemble them with
//! a plain glob and no extra metadata.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::BuildError;
use crate::initrd::BuildContext;

/// Shared prefix of all rootfs part files.
pub const PART_PREFIX: &str = "rootfs_part_";

/// Maximum size of one part.
pub const CHUNK_SIZE: u64 = 300 * 1024 * 1024;

/// Two-letter suffixes: `aa` through `zz`.
const MAX_PARTS: usize = 26 * 26;

/// Split the staged rootfs archive, drop the original, and point the
/// staged container-init helper at the build's work path.
///
/// Returns the number of parts produced.
pub fn split_staged_rootfs(ctx: &BuildContext, work_path: &str) -> Result<usize, BuildError> {
    let tag = &ctx.request.tag;
    let staged = ctx.staged_source();

    let split_error = |source: anyhow::Error| BuildError::Split {
        tag: tag.clone(),
        source,
    };

    let parts =
        split_file(&staged, &ctx.bin_dir(), PART_PREFIX, CHUNK_SIZE).map_err(split_error)?;
    info!(tag = %tag, parts = parts.len(), "split rootfs payload");

    // Only the parts ship in the image; the unsplit archive must not.
    fs::remove_file(&staged)
        .with_context(|| format!("Failed to remove {}", staged.display()))
        .map_err(split_error)?;

    patch_container_init(&ctx.staged_container_init(), work_path).map_err(split_error)?;

    Ok(parts.len())
}

/// Split `src` into parts of at most `chunk_size` bytes under `dest_dir`.
///
/// A payload no larger than one chunk still yields exactly one part, so
/// consumers can rely on at least one part existing. Part names are
/// `<prefix><suffix>` with suffixes in lexicographic order.
pub fn split_file(
    src: &Path,
    dest_dir: &Path,
    prefix: &str,
    chunk_size: u64,
) -> Result<Vec<PathBuf>> {
    let file = File::open(src).with_context(|| format!("Failed to open {}", src.display()))?;
    let total = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut parts = Vec::new();
    let mut remaining = total;
    loop {
        let index = parts.len();
        if index >= MAX_PARTS {
            bail!(
                "payload of {} bytes needs more than {} parts at {} bytes each",
                total,
                MAX_PARTS,
                chunk_size
            );
        }

        let take = chunk_size.min(remaining);
        let part_path = dest_dir.join(format!("{}{}", prefix, part_suffix(index)));
        let part = File::create(&part_path)
            .with_context(|| format!("Failed to create {}", part_path.display()))?;
        let mut writer = BufWriter::new(part);
        std::io::copy(&mut (&mut reader).take(take), &mut writer)
            .with_context(|| format!("Failed to write {}", part_path.display()))?;
        parts.push(part_path);

        remaining -= take;
        if remaining == 0 {
            break;
        }
    }

    Ok(parts)
}

/// `aa`, `ab`, ... `zz` — matches the ordering convention of split(1).
fn part_suffix(index: usize) -> String {
    let hi = (b'a' + (index / 26) as u8) as char;
    let lo = (b'a' + (index % 26) as u8) as char;
    format!("{hi}{lo}")
}

/// Insert `cd <work_path>` as the second line of the container-init
/// script, so the helper runs from the directory layout the extracted
/// container root expects before it assumes init duties.
pub fn patch_container_init(path: &Path, work_path: &str) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let cd_line = format!("cd {work_path}");
    let mut lines: Vec<&str> = content.lines().collect();
    let at = 1.min(lines.len());
    lines.insert(at, &cd_line);

    let mut patched = lines.join("\n");
    patched.push('\n');
    fs::write(path, patched).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
