//! Main entry point for the epub2image CLI application.
//!
//! Every input (a local EPUB or an HTTP URL) is converted on its own task;
//! results are reported and written in the order the inputs were given.

use anyhow::{Result, bail};
use clap::Parser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use epub2image::{
    Cli, Conversion, ExtractOptions, HttpSource, ImageArchive, Job, Status, epub_to_images,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.pipe && cli.inputs.len() > 1 {
        bail!("-p writes to stdout and accepts a single input");
    }

    let options = cli.extract_options();
    let mut tasks = JoinSet::new();
    for (index, input) in cli.inputs.iter().enumerate() {
        let job = Job::new(input.clone()).start();
        report(&job, &cli);
        tasks.spawn(async move {
            let (job, conversion) = convert(job, options).await;
            (index, job, conversion)
        });
    }

    let mut results = Vec::with_capacity(cli.inputs.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(index, _, _)| *index);

    let mut failed = 0;
    let mut claimed = HashSet::new();
    for (_, job, conversion) in results {
        let job = match conversion {
            Conversion::Success(images) => {
                match deliver(&job, &images, &cli, &mut claimed).await {
                    Ok(Delivery::Done) => job,
                    Ok(Delivery::Skipped) => job.skip(),
                    Err(e) => {
                        tracing::error!("{}: {:#}", job.input, e);
                        job.fail()
                    }
                }
            }
            Conversion::Failure => job,
        };
        if job.status == Status::Failed {
            failed += 1;
        }
        report(&job, &cli);
    }

    if failed > 0 {
        bail!("{} of {} inputs failed", failed, cli.inputs.len());
    }

    Ok(())
}

/// Load one input into memory and run the pipeline on it.
async fn convert(job: Job, options: ExtractOptions) -> (Job, Conversion) {
    let data = match load(&job).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("{}: {:#}", job.input, e);
            return (job.fail(), Conversion::Failure);
        }
    };

    let conversion = epub_to_images(data, &options).await;
    (job.finish(&conversion), conversion)
}

async fn load(job: &Job) -> Result<Vec<u8>> {
    if job.is_remote() {
        let source = HttpSource::new(job.input.clone()).await?;
        let data = source.fetch().await?;
        tracing::info!(
            url = %job.input,
            transferred = source.transferred_bytes(),
            "downloaded"
        );
        Ok(data)
    } else {
        Ok(tokio::fs::read(&job.input).await?)
    }
}

/// What `deliver` did with a finished archive.
enum Delivery {
    Done,
    /// The output file already existed and was left alone.
    Skipped,
}

/// Hand a finished archive to the user according to the CLI mode.
///
/// `claimed` holds the output paths of earlier inputs in this run; a second
/// input mapping to one of them is an error rather than an overwrite.
async fn deliver(
    job: &Job,
    images: &ImageArchive,
    cli: &Cli,
    claimed: &mut HashSet<PathBuf>,
) -> Result<Delivery> {
    if cli.list {
        for entry in &images.entries {
            println!("{}  <-  {}", entry.name, entry.source);
        }
        return Ok(Delivery::Done);
    }

    if cli.pipe {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&images.bytes).await?;
        stdout.flush().await?;
        return Ok(Delivery::Done);
    }

    let output_path = job.output_path(cli.output_dir.as_deref().map(Path::new));
    if !claimed.insert(output_path.clone()) {
        bail!(
            "{} collides with the output of an earlier input",
            output_path.display()
        );
    }

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", output_path.display());
            }
            return Ok(Delivery::Skipped);
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", output_path.display());
            }
            return Ok(Delivery::Skipped);
        }
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    if !cli.is_quiet() {
        println!(
            "  writing: {} ({} images)",
            output_path.display(),
            images.entries.len()
        );
    }
    tokio::fs::write(&output_path, &images.bytes).await?;

    Ok(Delivery::Done)
}

/// Print the job's status line. Pipe mode only reports failures, on stderr.
fn report(job: &Job, cli: &Cli) {
    if cli.is_very_quiet() {
        return;
    }
    if cli.pipe {
        if job.status == Status::Failed {
            eprintln!("{}: {}", job.file_name(), job.status);
        }
    } else if !cli.is_quiet() || job.status == Status::Failed {
        println!("{}: {}", job.file_name(), job.status);
    }
}
