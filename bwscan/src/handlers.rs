use anyhow::{Context, Result, anyhow};
use bwscan_core::batch::{BatchOptions, MatchCallback, run_batch};
use bwscan_core::builtwith::{extract_client_sites, fetch_technology_details, listing_url};
use bwscan_core::matcher::compile_pattern;
use bwscan_core::model::TechnologyDetails;
use bwscan_core::report::generate_batch_report;
use bwscan_scanner::config::DEFAULT_TIMEOUT_SECS;
use bwscan_scanner::{Fetch, FetchConfig, FetchOptions, PageFetcher};
use clap::ArgMatches;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use tracing::{Level, info};
use url::Url;

/// Map the number of `-v` flags to a log level
pub fn verbosity_level(count: u8) -> Level {
    match count {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Send logs to stderr so stdout only carries results
pub fn init_tracing(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(verbosity_level(verbosity))
        .with_target(false)
        .init();
}

/// Prompt for the match pattern and read one line of it
pub fn read_pattern<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<String> {
    write!(output, "regex: ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no pattern given on stdin",
        ));
    }

    let pattern = line.strip_suffix('\n').unwrap_or(&line);
    let pattern = pattern.strip_suffix('\r').unwrap_or(pattern);
    Ok(pattern.to_string())
}

pub fn write_technology_details<W: Write>(
    output: &mut W,
    details: &TechnologyDetails,
) -> io::Result<()> {
    writeln!(output, "{} {}", "Techsite:".bright_blue().bold(), details.site)?;
    writeln!(output, "{} {}", "Description:".bright_blue().bold(), details.description)?;
    writeln!(output, "{} {}", "Tags:".bright_blue().bold(), details.tags.join(", "))?;
    writeln!(
        output,
        "{} {}",
        "Image link:".bright_blue().bold(),
        details.image_link.as_deref().unwrap_or("-")
    )?;
    writeln!(
        output,
        "{} {}",
        "Is image blank:".bright_blue().bold(),
        details.is_image_blank()
    )?;
    writeln!(output)
}

pub async fn handle_scan(args: &ArgMatches) -> Result<()> {
    let technology = args
        .get_one::<String>("TECHNOLOGY")
        .context("A technology name is required")?;
    let remove_comments = !args.get_flag("no-remove-comments");
    let ignore_case = args.get_flag("ignorecase");
    let timeout = *args
        .get_one::<u64>("timeout")
        .unwrap_or(&DEFAULT_TIMEOUT_SECS);

    let listing = listing_url(technology)?;
    let fetcher = PageFetcher::new(FetchConfig::with_timeout_secs(timeout))
        .context("Failed to create HTTP client")?;

    run_scan(
        &fetcher,
        &listing,
        remove_comments,
        ignore_case,
        &mut io::stdin().lock(),
        io::stdout(),
    )
    .await
}

/// Scan the sites of one listing page, printing results to `output`.
///
/// Returns quietly when the listing cannot be fetched; prints no summary when
/// the listing has no sites.
pub async fn run_scan<F, R, W>(
    fetcher: &F,
    listing: &Url,
    remove_comments: bool,
    ignore_case: bool,
    input: &mut R,
    mut output: W,
) -> Result<()>
where
    F: Fetch,
    R: BufRead,
    W: Write + Send + 'static,
{
    writeln!(output, "{}", listing)?;

    // A redirect here means BuiltWith did not recognise the technology name
    let listing_options = FetchOptions {
        remove_comments: false,
        allow_redirects: false,
    };
    let Some(listing_page) = fetcher.fetch(listing.as_str(), listing_options).await else {
        info!("No listing page at {}", listing);
        return Ok(());
    };

    if let Some(details) = fetch_technology_details(fetcher, &listing_page.body).await {
        write_technology_details(&mut output, &details)?;
    }

    let pattern = read_pattern(input, &mut output).context("Failed to read pattern")?;
    let pattern = compile_pattern(&pattern, ignore_case)?;

    let options = BatchOptions {
        sites: extract_client_sites(&listing_page.body),
        pattern,
        remove_comments,
        show_progress: true,
    };

    let output = Arc::new(Mutex::new(output));
    let match_output = Arc::clone(&output);
    let match_callback: MatchCallback = Arc::new(move |url: String| {
        if let Ok(mut out) = match_output.lock() {
            let _ = writeln!(out, "{}", url);
        }
    });

    let Some(stats) = run_batch(fetcher, options, Some(match_callback)).await else {
        return Ok(());
    };

    let mut out = output
        .lock()
        .map_err(|_| anyhow!("Output was poisoned by a failed write"))?;
    write!(out, "{}", generate_batch_report(&stats))?;
    out.flush()?;
    Ok(())
}
