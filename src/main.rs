use std::sync::Arc;

use clap::Parser;
use docsift::{
    ContentStore,
    ExtractorRegistry,
    FaceCropper,
    KeywordGate,
    OutputDir,
    Pipeline,
    Repository,
    SeetaDetector,
    Tesseract,
    error::{self, Error},
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCSIFT_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let output = OutputDir::resolve(cli.output_dir.as_deref())?;

    match cli.command {
        Command::Scan(args) => cmd_scan(&output, &args, cli.quiet)?,
        Command::Status(args) => cmd_status(&output, args.json)?,
        Command::Records(args) => cmd_records(&output, &args)?,
        Command::Completions(_) => {}
    }

    Ok(())
}

fn cmd_scan(
    output: &OutputDir,
    args: &cli::ScanArgs,
    quiet: bool,
) -> error::Result<()> {
    if !args.root.is_dir() {
        return Err(Error::Config(format!(
            "not a directory: {}",
            args.root.display()
        )));
    }

    let gate = match &args.keywords {
        Some(path) => KeywordGate::from_file(path)?,
        None => KeywordGate::default(),
    };

    let ocr =
        Tesseract::new(&args.ocr_lang).with_tessdata(args.tessdata.clone());
    let registry = ExtractorRegistry::with_defaults(Arc::new(ocr));

    let faces = if args.no_faces {
        None
    } else if let Some(model) = &args.face_model {
        let detector = SeetaDetector::new(model)
            .map_err(|e| Error::Config(e.to_string()))?;
        Some(FaceCropper::new(Arc::new(detector), args.min_face_size))
    } else {
        tracing::warn!(
            "face detection disabled: pass --face-model or set DOCSIFT_FACE_MODEL"
        );
        None
    };

    let repository = Repository::open(&output.results_db())?;
    let pipeline = Pipeline::new(registry, gate, ContentStore::new(output))
        .workers(args.workers as usize)
        .faces(faces)
        .exclude(build_excludes(&args.excludes)?)
        .progress(!quiet && !args.json);

    if !args.json {
        eprintln!("Scanning {}...", args.root.display());
    }
    let summary = pipeline.run(&args.root, &repository)?;

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("Scanned:     {}", summary.scanned);
        println!("Matched:     {}", summary.matched);
        println!("Unmatched:   {}", summary.unmatched);
        println!("Unsupported: {}", summary.unsupported);
        println!("Errored:     {}", summary.errored);
        println!("Results: {}", output.results_db().display());
    }
    Ok(())
}

fn build_excludes(patterns: &[String]) -> error::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            Error::Config(format!("invalid glob pattern: {e}"))
        })?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| Error::Config(format!("invalid glob pattern: {e}")))?;
    Ok(Some(set))
}

fn cmd_status(output: &OutputDir, json: bool) -> error::Result<()> {
    let repository = Repository::open(&output.results_db())?;
    let records = repository.count()?;

    if json {
        let status = serde_json::json!({
            "output_dir": output.root().display().to_string(),
            "records": records,
            "fulltext_dir": output.fulltext_dir().display().to_string(),
            "faces_dir": output.faces_dir().display().to_string(),
        });
        println!("{status}");
    } else {
        println!("Output directory: {}", output.root().display());
        println!("Records: {records}");
        println!("Full text: {}", output.fulltext_dir().display());
        println!("Faces: {}", output.faces_dir().display());
    }
    Ok(())
}

fn cmd_records(output: &OutputDir, args: &cli::RecordsArgs) -> error::Result<()> {
    let repository = Repository::open(&output.results_db())?;
    let records = repository.list(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string(&records)?);
    } else if records.is_empty() {
        println!("No records.");
    } else {
        for record in &records {
            let data = &record.data;
            println!(
                "{}\t{}\t[{}]\tfaces: {}",
                record.id, data.source_path, data.keywords, data.face_count
            );
        }
    }
    Ok(())
}
