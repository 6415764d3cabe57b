// Copyright (C) 2026 Jonas Keller <jonas@xypack.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Writing assembled presets to disk.
//!
//! A bundle is a tree of named byte buffers: one folder per instrument
//! holding exactly one `patch.json` and one WAV per zone. The writer is
//! the only part of the pipeline that touches the output directory, and
//! it validates every target before writing anything so a failed run
//! leaves no partial preset behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

/// One instrument's worth of output files.
#[derive(Debug)]
pub struct PresetBundle {
    /// Folder name, `<sanitized name>.preset`.
    pub folder_name: String,
    /// The serialized patch document.
    pub patch_json: Vec<u8>,
    /// Zone audio assets as `(file name, WAV bytes)`, in zone order.
    pub assets: Vec<(String, Vec<u8>)>,
}

/// Error writing bundles to disk.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("output folder {} already exists (pass --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes every bundle under `out_dir`. Existing preset folders are
/// refused unless `force` is set, and existence is checked for all
/// bundles up front so nothing is written on a refused run.
pub fn write_bundles(
    bundles: &[PresetBundle],
    out_dir: &Path,
    force: bool,
) -> Result<(), BundleError> {
    if !force {
        for bundle in bundles {
            let folder = out_dir.join(&bundle.folder_name);
            if folder.exists() {
                return Err(BundleError::AlreadyExists(folder));
            }
        }
    }

    for bundle in bundles {
        let folder = out_dir.join(&bundle.folder_name);
        fs::create_dir_all(&folder)?;
        fs::write(folder.join("patch.json"), &bundle.patch_json)?;
        for (name, bytes) in &bundle.assets {
            fs::write(folder.join(name), bytes)?;
        }
        info!(
            folder = %folder.display(),
            files = bundle.assets.len() + 1,
            "Wrote preset"
        );
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn bundle(name: &str) -> PresetBundle {
        PresetBundle {
            folder_name: format!("{name}.preset"),
            patch_json: b"{}".to_vec(),
            assets: vec![
                ("a-C4.wav".to_string(), vec![1, 2, 3]),
                ("a-C5.wav".to_string(), vec![4, 5, 6]),
            ],
        }
    }

    #[test]
    fn test_writes_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_bundles(&[bundle("piano")], dir.path(), false).expect("write");

        let folder = dir.path().join("piano.preset");
        assert!(folder.join("patch.json").is_file());
        assert_eq!(vec![1, 2, 3], fs::read(folder.join("a-C4.wav")).unwrap());
        assert_eq!(vec![4, 5, 6], fs::read(folder.join("a-C5.wav")).unwrap());
    }

    #[test]
    fn test_refuses_existing_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("piano.preset")).expect("mkdir");

        let result = write_bundles(&[bundle("piano")], dir.path(), false);
        assert!(matches!(result, Err(BundleError::AlreadyExists(_))));
    }

    #[test]
    fn test_force_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_bundles(&[bundle("piano")], dir.path(), false).expect("write");
        write_bundles(&[bundle("piano")], dir.path(), true).expect("overwrite");
    }

    #[test]
    fn test_existence_checked_before_any_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("b.preset")).expect("mkdir");

        // "a" would be writable, but "b" exists: nothing may land.
        let result = write_bundles(&[bundle("a"), bundle("b")], dir.path(), false);
        assert!(result.is_err());
        assert!(!dir.path().join("a.preset").exists());
    }
}
