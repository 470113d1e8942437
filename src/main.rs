mod cli;

use mp4split::config::{self, SplitConfig};
use mp4split::output::SegmentNamer;
use mp4split_media::mp4::{BoxReader, BoxType, MovieInfo};
use mp4split_media::split::{self, SplitOptions, Termination, TrackFilter};

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use cli::{Cli, Commands, SplitArgs};
use serde::Serialize;
use std::io;
use std::path::Path;

fn main() {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mp4split=trace,mp4split_media=trace".to_string()
        } else {
            "mp4split=info,mp4split_media=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Split(args) => split_file(&args, cli.config.as_deref()),
        Commands::Inspect { input, json } => inspect_file(&input, json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mp4split {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Library failures keep their status code; everything else exits with 1.
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<mp4split_media::Error>()
        .map_or(1, mp4split_media::Error::status_code)
}

fn read_input(input: &Path) -> Result<Bytes> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }
    let data = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    Ok(Bytes::from(data))
}

fn apply_overrides(split: &mut SplitConfig, args: &SplitArgs) {
    if let Some(ref dir) = args.output_dir {
        split.output_dir = dir.clone();
    }
    if let Some(ref name) = args.init_segment {
        split.init_segment = name.clone();
    }
    if let Some(ref pattern) = args.media_segment {
        split.media_segment = pattern.clone();
    }
    if let Some(number) = args.start_number {
        split.start_number = number;
    }
    if !args.track_ids.is_empty() {
        split.track_ids = args.track_ids.clone();
    }
    split.strict |= args.strict;
}

fn split_file(args: &SplitArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    apply_overrides(&mut config.split, args);
    config::validate_config(&config)?;

    let settings = &config.split;
    let namer = SegmentNamer::from_config(settings)?;
    let data = read_input(&args.input)?;

    tracing::info!("Splitting {:?}", args.input);

    let mut filter: TrackFilter = settings.track_ids.iter().copied().collect();
    if args.audio || args.video {
        let movie = split::movie_info(data.clone())?;
        if args.video {
            let track = movie
                .first_video_track()
                .with_context(|| format!("No video track in {:?}", args.input))?;
            filter.insert(track.track_id);
        }
        if args.audio {
            let track = movie
                .first_audio_track()
                .with_context(|| format!("No audio track in {:?}", args.input))?;
            filter.insert(track.track_id);
        }
    }

    let output_dir = &settings.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    if args.init_only {
        let init = split::init_segment(data)?;
        let path = output_dir.join(namer.init_name());
        std::fs::write(&path, &init).with_context(|| format!("Failed to write {:?}", path))?;
        println!("Wrote init segment {} ({} bytes)", path.display(), init.len());
        return Ok(());
    }

    if !filter.is_empty() {
        tracing::info!("Keeping tracks {:?}", filter.ids());
    }

    let options = SplitOptions::new()
        .track_filter(filter)
        .strict(settings.strict);

    let summary = split::split(data, &options, |segment| {
        let path = output_dir.join(namer.file_name(&segment));
        tracing::debug!("Writing {} ({} bytes)", path.display(), segment.len());
        std::fs::write(&path, segment.data)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
    })?;

    if let Termination::TrailingData { offset, reason } = &summary.termination {
        eprintln!(
            "Warning: stopped at undecodable data at offset {}: {}",
            offset, reason
        );
    }

    println!(
        "Wrote {} segments ({} fragments, {} bytes) to {}",
        summary.segments,
        summary.fragments,
        summary.bytes_written,
        output_dir.display()
    );

    Ok(())
}

#[derive(Debug, Serialize)]
struct InspectReport {
    file: String,
    size: usize,
    movie: Option<MovieInfo>,
    boxes: Vec<BoxEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trailing_data: Option<TrailingEntry>,
}

#[derive(Debug, Serialize)]
struct BoxEntry {
    #[serde(rename = "type")]
    box_type: BoxType,
    offset: u64,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragment: Option<String>,
}

#[derive(Debug, Serialize)]
struct TrailingEntry {
    offset: u64,
    reason: String,
}

fn inspect_file(input: &Path, json: bool) -> Result<()> {
    let data = read_input(input)?;

    let movie = match split::movie_info(data.clone()) {
        Ok(movie) => Some(movie),
        Err(e) => {
            tracing::warn!("No usable movie metadata: {}", e);
            None
        }
    };

    let mut boxes = Vec::new();
    let mut trailing_data = None;
    let mut reader = BoxReader::new(data.clone());
    loop {
        let offset = reader.offset();
        match reader.next_box() {
            Ok(Some(mp4_box)) => {
                let fragment = (mp4_box.box_type == BoxType::MOOF).then(|| {
                    match split::classify(&mp4_box) {
                        Ok(c) => c.track.to_string(),
                        Err(e) => format!("malformed: {}", e),
                    }
                });
                boxes.push(BoxEntry {
                    box_type: mp4_box.box_type,
                    offset: mp4_box.offset,
                    size: mp4_box.size(),
                    fragment,
                });
            }
            Ok(None) => break,
            Err(e) => {
                trailing_data = Some(TrailingEntry {
                    offset,
                    reason: e.to_string(),
                });
                break;
            }
        }
    }

    let report = InspectReport {
        file: input.display().to_string(),
        size: data.len(),
        movie,
        boxes,
        trailing_data,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", report.file);
    println!("Size: {} bytes", report.size);

    if let Some(ref movie) = report.movie {
        println!(
            "Movie: {:.3}s, timescale {}, {}",
            movie.duration_secs(),
            movie.timescale,
            if movie.fragmented {
                "fragmented"
            } else {
                "not fragmented"
            }
        );
        println!("\nTracks: {}", movie.tracks.len());
        for track in &movie.tracks {
            println!(
                "  [{}] {} timescale {}",
                track.track_id, track.handler_type, track.timescale
            );
        }
    }

    println!("\nBoxes: {}", report.boxes.len());
    for entry in &report.boxes {
        print!("  {} @{} size {}", entry.box_type, entry.offset, entry.size);
        if let Some(ref fragment) = entry.fragment {
            print!(" ({})", fragment);
        }
        println!();
    }

    if let Some(ref trailing) = report.trailing_data {
        println!(
            "\nUndecodable data at offset {}: {}",
            trailing.offset, trailing.reason
        );
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_split_config(&config.split);
        }
        None => {
            println!("No config file specified, using defaults");
            print_split_config(&config::Config::default().split);
        }
    }

    Ok(())
}

fn print_split_config(split: &SplitConfig) {
    println!("  Output dir: {}", split.output_dir.display());
    println!("  Init segment: {}", split.init_segment);
    println!("  Media segment: {}", split.media_segment);
    println!("  Start number: {}", split.start_number);
    println!("  Track ids: {:?}", split.track_ids);
    println!("  Strict: {}", split.strict);
}
