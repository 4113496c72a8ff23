#![allow(clippy::multiple_crate_versions)]

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use minus::{ExitStrategy, Pager, page_all};
use siteforge_domain::{Manifest, RunOperation, RunReport, SiteDefinition, WebDefinition, WebUrl};
use siteforge_engine::{
    AuthMode, ManifestProvisioner, MemorySite, NotificationLog, Notifier, RetryPolicy,
    RetryingClient, SiteClient, SiteProvisioner, load_manifest, load_site_definition,
};
use siteforge_report::{ColorChoice, OutputFormat, RenderOptions, render_report};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod error;

pub use error::CliError;
use error::{RunError, error_chain};

const LOG_ENV: &str = "SITEFORGE_LOG";
const DEFAULT_SITE_URL: &str = "https://localhost";

#[derive(Debug, Parser)]
#[command(name = "siteforge", about = "Declarative provisioning for site collections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or update everything the manifest or site definition declares
    Provision {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        target: TargetArgs,
        /// Write manifest settings to the web property bag afterwards
        #[arg(long)]
        with_settings: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Remove what the manifest or site definition declares
    Deprovision {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Load and validate without touching a site
    Validate {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Path of a JSON manifest
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Path of a JSON site definition
    #[arg(long)]
    site_definition: Option<PathBuf>,
}

impl SourceArgs {
    fn path(&self) -> &Path {
        self.manifest
            .as_deref()
            .or(self.site_definition.as_deref())
            .unwrap_or_else(|| Path::new(""))
    }

    fn load(&self) -> Result<Source, RunError> {
        if let Some(path) = &self.manifest {
            Ok(Source::Manifest(load_manifest(path)?))
        } else {
            Ok(Source::SiteDefinition(load_site_definition(self.path())?))
        }
    }
}

#[derive(Debug, Clone, Args)]
struct TargetArgs {
    /// Site state file; read before the run and written after it
    #[arg(long, env = "SITEFORGE_STATE")]
    state: Option<PathBuf>,
    /// Site url used when the state file does not exist yet
    #[arg(long, default_value = DEFAULT_SITE_URL)]
    site_url: String,
    /// Server-relative url of the target web
    #[arg(long, default_value = "/")]
    web: String,
    /// Run with an app-only identity
    #[arg(long)]
    app_only: bool,
    /// Attempts per remote call before a transient failure is fatal
    #[arg(long, default_value_t = 3)]
    retries: u32,
}

impl TargetArgs {
    fn web_url(&self) -> Result<WebUrl, CliError> {
        WebUrl::try_from(self.web.as_str()).map_err(|source| CliError::InvalidWeb {
            web: self.web.clone(),
            source,
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retries,
            ..RetryPolicy::default()
        }
    }

    fn auth_mode(&self) -> AuthMode {
        if self.app_only {
            AuthMode::AppOnly
        } else {
            AuthMode::Interactive
        }
    }

    fn open_site(&self) -> Result<MemorySite, CliError> {
        let site = match &self.state {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading site state");
                MemorySite::load(path)?
            }
            _ => MemorySite::new(self.site_url.clone()),
        };
        Ok(site.with_auth_mode(self.auth_mode()))
    }

    fn persist(&self, site: &MemorySite) -> Result<(), CliError> {
        if let Some(path) = &self.state {
            debug!(path = %path.display(), "saving site state");
            site.save(path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Args)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    color: ColorArg,
    /// Also show unchanged and informational messages
    #[arg(long)]
    verbose: bool,
}

impl OutputArgs {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            color: self.color.into(),
            verbose: self.verbose,
            target: None,
        }
    }
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

impl From<ColorArg> for ColorChoice {
    fn from(value: ColorArg) -> Self {
        match value {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

enum Source {
    Manifest(Manifest),
    SiteDefinition(SiteDefinition),
}

/// Run the CLI using process arguments.
///
/// # Errors
///
/// Returns an error when argument parsing fails (excluding help/version), the
/// site state cannot be read or written, or the report cannot be rendered.
pub fn run() -> Result<i32, CliError> {
    run_from(std::env::args_os())
}

/// Run the CLI with explicit arguments, the first being the program name.
///
/// # Errors
///
/// See [`run`].
pub fn run_from<I, T>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(error.into()),
        },
    };
    init_logging();

    let (report, output) = match &cli.command {
        Commands::Provision {
            source,
            target,
            with_settings,
            output,
        } => (
            execute(RunOperation::Provision, source, target, *with_settings)?,
            output,
        ),
        Commands::Deprovision {
            source,
            target,
            output,
        } => (execute(RunOperation::Deprovision, source, target, false)?, output),
        Commands::Validate { source, output } => (validate(source), output),
    };

    let format: OutputFormat = output.format.into();
    let rendered = render_report(&report, format, &output.render_options())?;
    emit_output(&rendered, format);
    Ok(i32::from(report.has_failures()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn validate(source: &SourceArgs) -> RunReport {
    let mut report = RunReport::new(RunOperation::Validate, source.path().to_path_buf(), None);
    let log = NotificationLog::new();
    let notifier = log.notifier();
    match source.load() {
        Ok(Source::Manifest(manifest)) => {
            notifier.normal(format!("Manifest {} is valid", manifest.manifest_name));
        }
        Ok(Source::SiteDefinition(definition)) => {
            notifier.normal(format!(
                "Site definition with {} child web(s) is valid",
                count_webs(&definition.web_definition)
            ));
        }
        Err(error) => report.errors.push(error_chain(&error)),
    }
    report.notifications = log.snapshot();
    report
}

fn count_webs(web: &WebDefinition) -> usize {
    web.web_definitions
        .values()
        .map(|child| 1 + count_webs(child))
        .sum()
}

fn execute(
    operation: RunOperation,
    source: &SourceArgs,
    target: &TargetArgs,
    with_settings: bool,
) -> Result<RunReport, CliError> {
    let web = target.web_url()?;
    let mut report = RunReport::new(operation, source.path().to_path_buf(), Some(web.clone()));
    let loaded = match source.load() {
        Ok(loaded) => loaded,
        Err(error) => {
            report.errors.push(error_chain(&error));
            return Ok(report);
        }
    };

    info!(operation = operation.label(), web = %web, "starting run");
    let log = NotificationLog::new();
    let mut client = RetryingClient::new(target.open_site()?, target.retry_policy());
    let result = drive(
        &mut client,
        operation,
        &web,
        &loaded,
        with_settings,
        log.notifier(),
    );
    target.persist(&client.into_inner())?;

    report.notifications = log.snapshot();
    match result {
        Ok(injected) => report.injected_custom_actions = injected,
        Err(error) => report.errors.push(error_chain(&error)),
    }
    Ok(report)
}

/// Returns the titles of custom actions injected along the way.
fn drive(
    client: &mut dyn SiteClient,
    operation: RunOperation,
    web: &WebUrl,
    source: &Source,
    with_settings: bool,
    notifier: Notifier,
) -> Result<Vec<String>, RunError> {
    match (operation, source) {
        (RunOperation::Provision, Source::Manifest(manifest)) => {
            let mut provisioner = ManifestProvisioner::new(client, notifier);
            let outcome = provisioner.provision(web, manifest)?;
            if with_settings {
                provisioner.apply_settings(web, manifest)?;
            }
            Ok(outcome.injected_custom_actions.into_keys().collect())
        }
        (RunOperation::Provision, Source::SiteDefinition(definition)) => {
            let outcome = SiteProvisioner::new(client, notifier).provision(web, definition)?;
            Ok(outcome
                .manifests
                .into_iter()
                .flat_map(|(_, provisioned)| provisioned.injected_custom_actions.into_keys())
                .collect())
        }
        (RunOperation::Deprovision, Source::Manifest(manifest)) => {
            ManifestProvisioner::new(client, notifier).deprovision(web, manifest)?;
            Ok(Vec::new())
        }
        (RunOperation::Deprovision, Source::SiteDefinition(definition)) => {
            SiteProvisioner::new(client, notifier).deprovision(web, definition)?;
            Ok(Vec::new())
        }
        (RunOperation::Validate, _) => Ok(Vec::new()),
    }
}

fn emit_output(rendered: &str, format: OutputFormat) {
    if format == OutputFormat::Text && should_use_pager() && page_output(rendered).is_ok() {
        return;
    }

    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
}

fn should_use_pager() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_PAGER").is_none()
}

fn page_output(rendered: &str) -> Result<(), minus::MinusError> {
    let pager = Pager::new();
    pager.set_exit_strategy(ExitStrategy::PagerQuit)?;
    pager.set_text(rendered)?;
    page_all(pager)
}
