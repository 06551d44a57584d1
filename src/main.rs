//! CLI for whence: report creation timestamps and structural metadata for
//! files/directories, or stamp a source-image checksum into one file.

#![cfg(feature = "cli")]

use clap::Parser;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;
use whence::{detect_file_type, inspect, FileType, MediaReport};

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn parse_checksum(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("bad checksum value {:?}: {}", s, e))
}

#[derive(Parser)]
#[command(name = "whence")]
#[command(about = "Report creation timestamps and structure of image/texture/video containers", long_about = None)]
struct Args {
    /// Path to a file or directory to inspect (use -d/--directory to scan a whole directory)
    path: Option<String>,

    /// Scan a whole directory (optionally with -r to recurse into subdirectories)
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    directory: Option<String>,

    /// When scanning a directory, recurse into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// File extensions to inspect (comma-separated). No-extension files are always inspected (type guessed from content). Use --all to ignore extension filter.
    #[arg(
        short,
        long,
        default_value = "jpg,jpeg,tif,tiff,png,mp4,m4v,mov,heic,heif,avi,jxr,wdp,ktx,pvr,psd"
    )]
    extensions: String,

    /// Inspect all files and guess type from content (ignore extension filter)
    #[arg(long)]
    all: bool,

    /// Output JSON per result (one line per file unless --pretty)
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON (use with --json)
    #[arg(long)]
    pretty: bool,

    /// Quiet: only print files that carry a timestamp or checksum
    #[arg(short, long)]
    quiet: bool,

    /// Stamp this source-image checksum into the file (JPEG, JPEG-XR, KTX, PVR) and write the result to --output
    #[arg(long, value_name = "U32", value_parser = parse_checksum)]
    stamp: Option<u32>,

    /// Output path for --stamp (defaults to rewriting the input in place)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let exts: std::collections::HashSet<String> = args
        .extensions
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .collect();

    let path_str = args
        .directory
        .as_ref()
        .or(args.path.as_ref())
        .ok_or("Missing path: give a file/directory as argument or use -d/--directory <DIR>")?;
    let path = Path::new(path_str.as_str());

    if !path.exists() {
        eprintln!("Not found: {}", path.display());
        std::process::exit(1);
    }

    if let Some(checksum) = args.stamp {
        if !path.is_file() {
            eprintln!("--stamp expects a file: {}", path.display());
            std::process::exit(1);
        }
        stamp_file(path, checksum, args.output.as_deref())?;
        return Ok(());
    }

    if path.is_file() {
        if args.directory.is_some() {
            eprintln!(
                "--directory expects a directory, not a file: {}",
                path.display()
            );
            std::process::exit(1);
        }
        inspect_file(path, &args, &exts)?;
        return Ok(());
    }

    if path.is_dir() {
        if !args.quiet {
            eprintln!(
                "Scanning directory: {} {}",
                path.display(),
                if args.recursive { "(recursive)" } else { "" }
            );
        }
        inspect_dir(path, &args, &exts)?;
        return Ok(());
    }

    eprintln!("Not a file or directory: {}", path.display());
    std::process::exit(1);
}

fn stamp_file(
    path: &Path,
    checksum: u32,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let out = output.map(Path::new).unwrap_or(path);
    let data = match detect_file_type(&bytes) {
        FileType::Jpeg => {
            let mut jpeg = whence::jpeg::Jpeg::load(&bytes)?;
            jpeg.set_source_checksum(checksum);
            jpeg.save()
        }
        FileType::Jxr => {
            let mut jxr = whence::jxr::Jxr::load(&bytes)?;
            jxr.set_source_checksum(checksum);
            jxr.save()
        }
        FileType::Ktx => {
            let mut ktx = whence::ktx::Ktx::load(&bytes)?;
            ktx.set_source_checksum(checksum);
            ktx.save()
        }
        FileType::Pvr => {
            let mut pvr = whence::pvr::Pvr::load(&bytes)?;
            pvr.set_source_checksum(checksum);
            pvr.save()
        }
        other => {
            eprintln!(
                "No checksum slot for {} files: {}",
                other.label(),
                path.display()
            );
            std::process::exit(1);
        }
    };
    fs::write(out, data)?;
    println!("Stamped {:#010x} into {}", checksum, out.display());
    Ok(())
}

fn inspect_file(
    path: &Path,
    args: &Args,
    exts: &std::collections::HashSet<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    // Skip only when: not --all, file has an extension, and it's not in the list. No extension => always inspect (guess from content).
    if !args.all && !ext.is_empty() && !exts.is_empty() && !exts.contains(&ext) {
        if !args.quiet {
            eprintln!("Skip (extension): {}", path.display());
        }
        return Ok(());
    }
    let bytes = fs::read(path)?;
    let report = match inspect(&bytes) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR {}: {}", path.display(), e);
            return Ok(());
        }
    };
    let no_extension = path.extension().is_none();
    print_report(path.display().to_string(), &report, args, no_extension, &bytes)?;
    Ok(())
}

fn inspect_dir(
    dir: &Path,
    args: &Args,
    exts: &std::collections::HashSet<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let walker = if args.recursive {
        WalkDir::new(dir).into_iter()
    } else {
        WalkDir::new(dir).max_depth(1).into_iter()
    };

    let mut total = 0u64;
    let mut dated = 0u64;
    let mut failed = 0u64;

    for entry in walker.filter_entry(|e| !e.path().starts_with(".")) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !args.all && !ext.is_empty() && !exts.is_empty() && !exts.contains(&ext) {
            continue;
        }
        total += 1;
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(_) => continue,
        };
        let report = match inspect(&bytes) {
            Ok(r) => r,
            Err(e) => {
                failed += 1;
                eprintln!("ERROR {}: {}", path.display(), e);
                continue;
            }
        };
        if report.image_time.is_some() {
            dated += 1;
        }
        let no_extension = path.extension().is_none();
        print_report(path.display().to_string(), &report, args, no_extension, &bytes)?;
    }

    if !args.quiet {
        eprintln!(
            "Inspected {} files, {} with timestamps, {} failed",
            total, dated, failed
        );
    }
    Ok(())
}

fn print_report(
    path: String,
    report: &MediaReport,
    args: &Args,
    no_extension: bool,
    bytes: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    if args.quiet && report.image_time.is_none() && report.source_checksum.is_none() {
        return Ok(());
    }
    if args.json {
        let sha256 = sha256_hex(bytes);
        let guessed = no_extension.then(|| detect_file_type(bytes).label());
        let mut out = IndexMap::<String, serde_json::Value>::new();
        out.insert("sha256".to_string(), serde_json::Value::String(sha256));
        out.insert("path".to_string(), serde_json::Value::String(path.clone()));
        out.insert(
            "format".to_string(),
            serde_json::Value::String(report.format.clone()),
        );
        out.insert("guessed_type".to_string(), serde_json::to_value(guessed)?);
        out.insert("width".to_string(), serde_json::to_value(report.width)?);
        out.insert("height".to_string(), serde_json::to_value(report.height)?);
        out.insert(
            "pixel_format_code".to_string(),
            serde_json::to_value(report.pixel_format_code)?,
        );
        out.insert(
            "pixel_format".to_string(),
            serde_json::to_value(&report.pixel_format)?,
        );
        out.insert(
            "image_time".to_string(),
            serde_json::to_value(report.image_time.map(|t| t.to_string()))?,
        );
        out.insert(
            "source_checksum".to_string(),
            serde_json::to_value(report.source_checksum)?,
        );
        out.insert(
            "size_bytes".to_string(),
            serde_json::to_value(report.size_bytes)?,
        );
        let json_str = if args.pretty {
            serde_json::to_string_pretty(&out)?
        } else {
            serde_json::to_string(&out)?
        };
        println!("{}", json_str);
        return Ok(());
    }
    println!("{} ({} bytes)", path, report.size_bytes);
    println!("  sha256: {}", sha256_hex(bytes));
    if no_extension {
        println!(
            "  guessed type: {} (no extension)",
            detect_file_type(bytes).label()
        );
    }
    println!("  format: {}", report.format);
    if let (Some(w), Some(h)) = (report.width, report.height) {
        println!("  dimensions: {}x{}", w, h);
    }
    if let Some(ref name) = report.pixel_format {
        println!("  pixel format: {}", name);
    } else if let Some(code) = report.pixel_format_code {
        println!("  pixel format: code {:#x}", code);
    }
    if let Some(time) = report.image_time {
        println!("  image time: {}", time);
    }
    if let Some(checksum) = report.source_checksum {
        println!("  source checksum: {:#010x}", checksum);
    }
    Ok(())
}
