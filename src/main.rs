mod cli;

use wavtrim::config::{self, Config};
use wavtrim_media::{ChunkId, FormatChunk, InfoRecord, Trimmer, WavFile};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    // Respect RUST_LOG if set, then --verbose, then the config file
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "wavtrim=trace,wavtrim_media=trace".to_string()
        } else {
            config
                .log_filter
                .clone()
                .unwrap_or_else(|| "wavtrim=info,wavtrim_media=info".to_string())
        }
    });

    // PCM may go to stdout, so logs must not
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Trim {
            input,
            output,
            start,
            end,
        } => trim_file(&input, output.as_deref(), start, end, &config),
        Commands::Info { file, json } => show_info(&file, json),
        Commands::Tag { file, tag, text } => tag_file(&file, tag, &text),
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn trim_file(
    input: &Path,
    output: Option<&Path>,
    start: Option<Duration>,
    end: Option<Duration>,
    config: &Config,
) -> Result<()> {
    let trimmer = Trimmer::new()
        .start(start)
        .end(end)
        .buffer_size(config.trim.buffer_size)
        .keep_metadata(config.trim.keep_metadata);

    if is_stdio(input) {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("Failed to read standard input")?;
        tracing::debug!("Read {} bytes from standard input", buf.len());
        write_trimmed(&trimmer, Cursor::new(buf), output)
    } else {
        let file =
            File::open(input).with_context(|| format!("Failed to open input file: {:?}", input))?;
        tracing::info!("Trimming {:?}", input);
        write_trimmed(&trimmer, BufReader::new(file), output)
    }
}

fn write_trimmed<R>(trimmer: &Trimmer, source: R, output: Option<&Path>) -> Result<()>
where
    R: Read + io::Seek,
{
    match output {
        Some(path) if !is_stdio(path) => {
            // Not truncated here: a rejected range must leave the file as it was.
            let existed = path.exists();
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            let mut writer = BufWriter::new(file);
            let total = match trimmer.run(source, &mut writer) {
                Ok(total) => total,
                Err(e) => {
                    drop(writer);
                    if !existed {
                        let _ = std::fs::remove_file(path);
                    }
                    return Err(e.into());
                }
            };
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.set_len(total)?;
            tracing::info!("Wrote {} bytes to {:?}", total, path);
        }
        _ => {
            let mut out = Cursor::new(Vec::new());
            let total = trimmer.run(source, &mut out)?;
            let bytes = out.into_inner();
            let len = usize::try_from(total)?.min(bytes.len());
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes[..len])?;
            stdout.flush()?;
            tracing::debug!("Wrote {} bytes to standard output", len);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct InfoReport<'a> {
    format: &'a FormatChunk,
    pcm_bytes: u64,
    duration_secs: f64,
    tags: Vec<TagReport>,
}

#[derive(Serialize)]
struct TagReport {
    id: ChunkId,
    label: Option<&'static str>,
    text: String,
}

fn show_info(file: &Path, json: bool) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open file: {:?}", file))?,
    );
    let wav = WavFile::decode(reader).with_context(|| format!("Failed to decode {:?}", file))?;
    let format = wav.format();

    if json {
        let report = InfoReport {
            format,
            pcm_bytes: wav.pcm_len(),
            duration_secs: wav.duration().as_secs_f64(),
            tags: wav
                .list()
                .into_iter()
                .flatten()
                .map(|record| TagReport {
                    id: record.id,
                    label: record.id.label(),
                    text: record.text_lossy().into_owned(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File: {}", file.display());
        println!("Format: {}", format.audio_format());
        println!("Channels: {}", format.channels());
        println!("Sample rate: {} Hz", format.sample_rate());
        println!("Bits per sample: {}", format.bits_per_sample());
        println!("Byte rate: {}", format.byte_rate());
        println!("Block align: {}", format.block_align());
        println!("PCM bytes: {}", wav.pcm_len());

        let secs = wav.duration().as_secs_f64();
        let whole = secs as u64;
        println!(
            "Duration: {:02}:{:02}:{:06.3}",
            whole / 3600,
            (whole / 60) % 60,
            secs - (whole - whole % 60) as f64
        );

        match wav.list() {
            Some(list) if !list.is_empty() => {
                println!("\nTags: {}", list.len());
                for record in list {
                    match record.id.label() {
                        Some(label) => {
                            println!("  {} ({}): {}", record.id, label, record.text_lossy())
                        }
                        None => println!("  {}: {}", record.id, record.text_lossy()),
                    }
                }
            }
            _ => println!("\nTags: none"),
        }
    }

    Ok(())
}

fn tag_file(file: &Path, tag: ChunkId, text: &str) -> Result<()> {
    let handle = OpenOptions::new()
        .read(true)
        .write(true)
        .open(file)
        .with_context(|| format!("Failed to open file: {:?}", file))?;

    let mut wav =
        WavFile::decode(handle).with_context(|| format!("Failed to decode {:?}", file))?;
    wav.push_info(InfoRecord::new(tag, text));
    let total = wav.encode()?;

    let handle = wav.into_inner();
    handle.set_len(total)?;

    tracing::info!("Added {} to {:?}", tag, file);
    Ok(())
}
