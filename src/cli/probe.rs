use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sureclick::{
    noop_hook, ActionReport, ActionSpec, Condition, Engine, EnginePolicy, EvidenceHook, Locator,
    LocatorSet, Resolution,
};
use tracing::{info, warn};
use wd_adapter::{ScreenshotHook, WebDriverSession};

use super::output::{render_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ProbeArgs {
    /// WebDriver endpoint (geckodriver, chromedriver or a grid)
    #[arg(long, default_value = "http://localhost:4444")]
    pub webdriver: String,

    /// Page to open before probing
    #[arg(long)]
    pub url: String,

    /// Locator in priority order, e.g. `css=#save` or `xpath=//button` (repeatable)
    #[arg(long = "locator", required = true, value_name = "LOCATOR")]
    pub locators: Vec<String>,

    /// Click the resolved element and verify the resulting URL
    #[arg(long, requires = "expect_url")]
    pub click: bool,

    /// URL fragment that must appear after the click
    #[arg(long, value_name = "SUBSTR")]
    pub expect_url: Option<String>,

    /// Write checkpoint screenshots into this directory
    #[arg(long, value_name = "DIR")]
    pub evidence_dir: Option<PathBuf>,

    /// Override the policy's resolve timeout
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    #[arg(long)]
    pub headless: bool,
}

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub locators: String,
    pub resolution: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionReport>,
}

pub fn parse_locators(raw: &[String]) -> Result<LocatorSet> {
    let locators = raw
        .iter()
        .map(|text| text.parse::<Locator>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LocatorSet::new(locators)?)
}

pub async fn cmd_probe(args: ProbeArgs, policy: EnginePolicy, output: OutputFormat) -> Result<()> {
    let set = parse_locators(&args.locators)?;
    let session = Arc::new(
        WebDriverSession::connect(&args.webdriver, args.headless)
            .await
            .with_context(|| format!("Failed to connect to WebDriver at {}", args.webdriver))?,
    );

    let result = probe(&args, &set, policy, Arc::clone(&session)).await;
    if let Err(err) = session.close().await {
        warn!(error = %err, "failed to close webdriver session");
    }
    let report = result?;

    match render_structured(&report, output)? {
        Some(text) => println!("{}", text),
        None => print_human(&report),
    }
    Ok(())
}

async fn probe(
    args: &ProbeArgs,
    set: &LocatorSet,
    policy: EnginePolicy,
    session: Arc<WebDriverSession>,
) -> Result<ProbeReport> {
    session
        .goto(&args.url)
        .await
        .with_context(|| format!("Failed to open {}", args.url))?;

    let hook: Arc<dyn EvidenceHook> = match &args.evidence_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "writing evidence screenshots");
            Arc::new(ScreenshotHook::new(session.clone(), dir.clone()))
        }
        None => noop_hook(),
    };
    let engine = Engine::new(policy, hook);
    let driver = session.as_ref();

    let resolution = engine
        .resolve(driver, set, args.timeout_ms.map(Duration::from_millis))
        .await?;

    let action = match (&args.click, &args.expect_url) {
        (true, Some(fragment)) => Some(
            engine
                .perform(
                    driver,
                    &ActionSpec::click(set.clone(), Condition::url_contains(fragment.as_str())),
                )
                .await?,
        ),
        _ => None,
    };

    Ok(ProbeReport {
        locators: set.to_string(),
        resolution,
        action,
    })
}

fn print_human(report: &ProbeReport) {
    let resolution = &report.resolution;
    println!("Resolved {}", report.locators);
    println!(
        "  matched:  {} (candidate {}{})",
        resolution.locator,
        resolution.candidate_index,
        if resolution.used_fallback() { ", fallback" } else { "" }
    );
    println!("  element:  {}", resolution.element);
    println!("  elapsed:  {}ms", resolution.elapsed.as_millis());
    if let Some(action) = &report.action {
        println!("Clicked via {:?}", action.method);
        println!("  stale retries:  {}", action.stale_retries);
        println!("  latency:        {}ms", action.latency_ms);
        println!("  confirmed by:   {}", action.post_condition.satisfied.join(", "));
    }
}
