use analytics_digest::config;
use analytics_digest::error::MailError;
use analytics_digest::history::PriorRun;
use analytics_digest::notify::{EmailSender, MailSettings};
use analytics_digest::pipeline;
use analytics_digest::render::{Digest, Outputs, Report, render_digest, write_artifacts};
use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;
use time::{OffsetDateTime, UtcOffset};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    config: Option<String>,
    output: PathBuf,
    json: Option<PathBuf>,
    send_email: bool,
    email_only: bool,
    fresh: bool,
}

fn main() -> Result<()> {
    // The local offset can only be read soundly while single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args()? else {
        print_help();
        return Ok(());
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(args, offset))
}

async fn run(args: Args, offset: UtcOffset) -> Result<()> {
    // Configuration problems abort before any fetch.
    let cfg = config::load(args.config.clone())?;
    let now = OffsetDateTime::now_utc().to_offset(offset);

    let seed = match &args.json {
        Some(path) if !args.fresh && !args.email_only => PriorRun::load(path),
        _ => PriorRun::default(),
    };

    let out = pipeline::run(&cfg, now, seed).await?;
    let report = Report::new(&cfg.title, now.date(), &out.ranked);

    let mut produced = 0usize;
    let mut requested = 0usize;

    if !args.email_only {
        let outputs = Outputs {
            html: Some(args.output.clone()),
            json: args.json.clone(),
        };
        for written in write_artifacts(&report, &outputs) {
            requested += 1;
            if written.result.is_ok() {
                produced += 1;
            }
        }
    }

    if args.send_email || args.email_only {
        requested += 1;
        let digest = render_digest(&report);
        match send_email(&digest).await {
            Ok(()) => produced += 1,
            Err(e) => error!(error = %e, "failed to send digest"),
        }
    }

    if produced == 0 && requested > 0 {
        bail!("no output could be produced");
    }
    if out.stats.sources_failed > 0 {
        warn!(failed = out.stats.sources_failed, "some sources failed; report is partial");
    }
    info!(produced, requested, "done");
    Ok(())
}

async fn send_email(digest: &Digest) -> Result<(), MailError> {
    let settings = MailSettings::from_env()?;
    EmailSender::new(&settings)?.send_digest(digest).await
}

/// `Ok(None)` means help was requested.
fn parse_args() -> Result<Option<Args>> {
    let mut args = env::args().skip(1);
    let mut parsed = Args {
        config: None,
        output: PathBuf::from("public/index.html"),
        json: None,
        send_email: false,
        email_only: false,
        fresh: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(value(&mut args, "--config")?),
            "--output" => parsed.output = PathBuf::from(value(&mut args, "--output")?),
            "--json" => parsed.json = Some(PathBuf::from(value(&mut args, "--json")?)),
            "--send-email" => parsed.send_email = true,
            "--email-only" => parsed.email_only = true,
            "--fresh" => parsed.fresh = true,
            "-h" | "--help" => return Ok(None),
            other => bail!("unknown argument: {other} (see --help)"),
        }
    }
    Ok(Some(parsed))
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    match args.next() {
        Some(v) => Ok(v),
        None => bail!("{flag} expects a value"),
    }
}

fn print_help() {
    println!("analytics-digest");
    println!("Usage: analytics-digest [--config <path>] [--output <html>] [--json <path>]");
    println!("                        [--send-email | --email-only] [--fresh]");
    println!("  --config <path>   config.toml, a local RSS/Atom file, or a feed URL");
    println!("  --output <path>   HTML report path (default public/index.html)");
    println!("  --json <path>     JSON feed path; an existing file seeds deduplication");
    println!("  --send-email      also email the digest (SMTP_* and EMAIL_* env vars)");
    println!("  --email-only      email the digest without writing files");
    println!("  --fresh           ignore the existing JSON file");
}
