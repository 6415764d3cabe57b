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

use std::io;
use std::path::{Path, PathBuf};

/// Extensions treated as audio input when expanding directories.
const AUDIO_EXTENSIONS: [&str; 8] = ["wav", "wave", "aif", "aiff", "flac", "mp3", "ogg", "m4a"];

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Expands the given paths into a flat list of audio files: files pass
/// through untouched, directories contribute their audio files in name
/// order (non-recursive).
pub fn collect_audio_files(paths: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && has_audio_extension(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

/// Formats a byte count the way humans read download sizes.
pub fn format_size(bytes: usize) -> String {
    if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_filename_display() {
        assert_eq!("a.wav", filename_display(Path::new("/tmp/x/a.wav")));
        assert_eq!("a.wav", filename_display(Path::new("a.wav")));
    }

    #[test]
    fn test_collect_expands_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("a.WAV"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = collect_audio_files(&[dir.path().to_path_buf()]).expect("collect");
        assert_eq!(2, files.len());
        assert_eq!("a.WAV", filename_display(&files[0]));
        assert_eq!("b.wav", filename_display(&files[1]));
    }

    #[test]
    fn test_format_size() {
        assert_eq!("0.5 KB", format_size(512));
        assert_eq!("100.0 KB", format_size(102400));
        assert_eq!("1.5 MB", format_size(1572864));
    }

    #[test]
    fn test_collect_passes_files_through() {
        // Explicitly named files are not second-guessed by extension.
        let files =
            collect_audio_files(&[PathBuf::from("whatever.bin")]).expect("collect");
        assert_eq!(1, files.len());
    }
}
