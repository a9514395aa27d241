use std::path::{Path, PathBuf};

/// Human readable size: bytes below 1 KB, one decimal above.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    }
}

/// Percentage reduction from `original` to `compressed`, one decimal.
/// Negative when the output grew.
pub fn compression_ratio(original: u64, compressed: u64) -> String {
    if original == 0 {
        return "0.0%".to_string();
    }
    let ratio = (original as f64 - compressed as f64) / original as f64 * 100.0;
    format!("{:.1}%", ratio)
}

/// `compressed-<name>` next to `out_dir`, optionally swapping the extension.
pub fn output_path(out_dir: &Path, input: &Path, extension: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = extension
        .map(str::to_string)
        .or_else(|| input.extension().map(|e| e.to_string_lossy().into_owned()));
    let name = match ext {
        Some(ext) => format!("compressed-{}.{}", stem, ext),
        None => format!("compressed-{}", stem),
    };
    out_dir.join(name)
}
