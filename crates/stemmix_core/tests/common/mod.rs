//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Whether both the render engine and the probe are installed.
pub async fn tools_available() -> bool {
    for tool in ["ffmpeg", "ffprobe"] {
        let ok = tokio::process::Command::new(tool)
            .arg("-version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false);
        if !ok {
            return false;
        }
    }
    true
}

/// Write a 16-bit PCM WAV file containing a quiet 440 Hz tone.
pub fn write_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    duration_ms: u32,
) -> std::io::Result<()> {
    let bits_per_sample: u16 = 16;
    let frames = (sample_rate as u64 * duration_ms as u64 / 1000) as u32;
    let block_align = channels * (bits_per_sample / 8);
    let data_size = frames * block_align as u32;

    let mut wav = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for n in 0..frames {
        let t = n as f64 / sample_rate as f64;
        let sample = ((t * 440.0 * std::f64::consts::TAU).sin() * 3000.0) as i16;
        for _ in 0..channels {
            wav.extend_from_slice(&sample.to_le_bytes());
        }
    }

    std::fs::write(path, wav)
}

/// Write an executable shell script standing in for a tool.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// File names in a directory, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
