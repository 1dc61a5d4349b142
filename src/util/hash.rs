//! Content hashing for descriptors and module trees.
//!
//! Directory trees are serialised as a Nix archive (NAR) and hashed with
//! SHA-256, so the resulting `sha256-<base64>` values can be fed straight
//! into fixed-output derivations.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::core::errors::{Result, VendorError};

/// Prefix of every hash written to a manifest.
pub const HASH_PREFIX: &str = "sha256-";

const NAR_MAGIC: &str = "nix-archive-1";

/// Encode a finished digest as an SRI string.
pub fn encode_sri(digest: &[u8]) -> String {
    format!("{}{}", HASH_PREFIX, STANDARD.encode(digest))
}

/// Compute the SRI SHA256 hash of a byte slice.
pub fn sha256_sri(data: &[u8]) -> String {
    encode_sri(&Sha256::digest(data))
}

/// Entries that never contribute to a module's content.
///
/// Matches OS metadata files case-insensitively.
pub fn is_ignored(name: &str) -> bool {
    name.eq_ignore_ascii_case(".ds_store")
}

/// Hash a file or directory tree.
pub fn hash_path(path: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    dump_path(&mut hasher, path).map_err(|source| VendorError::Hash {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(encode_sri(&hasher.finalize()))
}

/// Write the NAR serialisation of `path` into `w`.
pub fn dump_path(w: &mut impl Write, path: &Path) -> io::Result<()> {
    write_str(w, NAR_MAGIC)?;
    dump_node(w, path)
}

fn dump_node(w: &mut impl Write, path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    let file_type = meta.file_type();

    write_str(w, "(")?;
    write_str(w, "type")?;

    if file_type.is_symlink() {
        let target = fs::read_link(path)?;
        write_str(w, "symlink")?;
        write_str(w, "target")?;
        write_bytes(w, &os_bytes(target.as_os_str()))?;
    } else if file_type.is_dir() {
        write_str(w, "directory")?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_str().is_some_and(is_ignored) {
                continue;
            }
            entries.push((os_bytes(&name).into_owned(), entry.path()));
        }
        // NAR orders entries bytewise, independent of the listing order.
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, child) in entries {
            write_str(w, "entry")?;
            write_str(w, "(")?;
            write_str(w, "name")?;
            write_bytes(w, &name)?;
            write_str(w, "node")?;
            dump_node(w, &child)?;
            write_str(w, ")")?;
        }
    } else {
        write_str(w, "regular")?;
        if is_executable(&meta) {
            write_str(w, "executable")?;
            write_str(w, "")?;
        }
        write_str(w, "contents")?;
        let contents = fs::read(path)?;
        write_bytes(w, &contents)?;
    }

    write_str(w, ")")
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

/// Raw bytes of a file name or link target.
#[cfg(unix)]
fn os_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(s.as_bytes())
}

#[cfg(not(unix))]
fn os_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    match s.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

fn write_str(w: &mut impl Write, s: &str) -> io::Result<()> {
    write_bytes(w, s.as_bytes())
}

fn write_bytes(w: &mut impl Write, data: &[u8]) -> io::Result<()> {
    w.write_all(&(data.len() as u64).to_le_bytes())?;
    w.write_all(data)?;
    let pad = (8 - data.len() % 8) % 8;
    if pad > 0 {
        w.write_all(&[0u8; 8][..pad])?;
    }
    Ok(())
}
