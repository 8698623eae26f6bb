use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::api::{ApiConfig, Credentials};
use crate::assets::{ImageSize, ImageSource, DEFAULT_SIZES};
use crate::cli::{Cli, Command, DomainArgs, ImageArgs, ResellerArgs, UiConfigArgs};
use crate::provision::{ImageJob, TenantPlan};
use crate::resources::tenant::{validate_extension, UserEntry};
use crate::resources::ui_config::{self, UiConfig};
use crate::resources::{Connection, Device, Domain, Reseller, Route};
use crate::retry::RetryConfig;

/// What the invocation should do, with every input already loaded and validated.
#[derive(Debug, Clone)]
pub enum Action {
    Provision(Box<TenantPlan>),
    Reseller(Reseller),
    Domain(Domain),
    User {
        domain: String,
        entry: UserEntry,
        device: bool,
    },
    Device(Device),
    Connections(Vec<Connection>),
    Route(Route),
    UiConfigs(Vec<UiConfig>),
    Images(ImageJob),
    Derive(ImageJob),
    Training,
}

/// Application configuration.
pub struct Config {
    /// `None` only for commands that never call the API.
    pub api: Option<ApiConfig>,
    pub no_progress_bar: bool,
    pub action: Action,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api", &self.api)
            .field("no_progress_bar", &self.no_progress_bar)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Prompt for the API token when stdin is a terminal.
fn prompt_token() -> Option<String> {
    if !std::io::stdin().is_terminal() {
        return None;
    }
    rpassword::prompt_password("API token: ").ok()
}

fn resolve_credentials(
    token: Option<String>,
    prompt: impl FnOnce() -> Option<String>,
) -> anyhow::Result<Credentials> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .or_else(prompt)
        .ok_or_else(|| {
            anyhow::anyhow!("API token is missing. Set API_TOKEN or pass --api-token")
        })?;
    Ok(Credentials::bearer(token)?)
}

struct Defaults<'a> {
    host_id: &'a str,
}

impl Defaults<'_> {
    fn reseller_name(&self) -> String {
        format!("{}_reseller", self.host_id)
    }

    fn reseller(&self, args: &ResellerArgs) -> Reseller {
        Reseller {
            name: args.name.clone().unwrap_or_else(|| self.reseller_name()),
            description: args.description.clone(),
        }
    }

    fn domain_name(&self, domain: &Option<String>) -> String {
        domain.clone().unwrap_or_else(|| self.host_id.to_string())
    }

    fn domain(&self, args: &DomainArgs) -> Domain {
        let domain = self.domain_name(&args.domain);
        Domain {
            dial_plan: args.dial_plan.clone().unwrap_or_else(|| domain.clone()),
            reseller: args.reseller.clone().unwrap_or_else(|| self.reseller_name()),
            description: args.description.clone(),
            dial_policy: args.dial_policy.clone(),
            area_code: args.area_code.clone(),
            caller_id_name: args
                .caller_id_name
                .clone()
                .unwrap_or_else(|| format!("{} CID", self.host_id)),
            caller_id_number: args.caller_id_number.clone(),
            caller_id_number_emergency: args
                .caller_id_number_emergency
                .clone()
                .unwrap_or_else(|| args.caller_id_number.clone()),
            time_zone: args.time_zone.clone(),
            domain,
        }
    }

    fn ui_configs(&self, args: &UiConfigArgs) -> anyhow::Result<Vec<UiConfig>> {
        let mut configs = match &args.file {
            Some(file) => ui_config::load(&expand_tilde(file), self.host_id)?,
            None => Vec::new(),
        };
        ui_config::apply_overrides(&mut configs, &args.overrides)?;
        Ok(configs)
    }
}

fn image_job(args: &ImageArgs, sizes: Vec<ImageSize>) -> anyhow::Result<ImageJob> {
    image_job_from(&args.source, &args.out_dir, args.max_retries, sizes)
}

fn image_job_from(
    source: &str,
    out_dir: &str,
    max_retries: u32,
    sizes: Vec<ImageSize>,
) -> anyhow::Result<ImageJob> {
    if max_retries == 0 {
        anyhow::bail!("--max-retries must be at least 1");
    }
    Ok(ImageJob {
        source: ImageSource::parse(source)?,
        out_dir: expand_tilde(out_dir),
        sizes,
        retry: RetryConfig {
            max_attempts: max_retries,
            ..RetryConfig::default()
        },
    })
}

/// Load a users file: a JSON array of user entries.
pub fn load_users(path: &Path) -> anyhow::Result<Vec<UserEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read users file {}", path.display()))?;
    let users: Vec<UserEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid users file {}", path.display()))?;
    for user in &users {
        validate_extension(&user.extension)?;
    }
    Ok(users)
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        Self::from_cli_with_prompt(cli, prompt_token)
    }

    pub(crate) fn from_cli_with_prompt(
        cli: Cli,
        prompt: impl FnOnce() -> Option<String>,
    ) -> anyhow::Result<Self> {
        if let Command::Derive(args) = &cli.command {
            let sizes = if args.sizes.is_empty() {
                DEFAULT_SIZES.to_vec()
            } else {
                args.sizes.clone()
            };
            return Ok(Self {
                api: None,
                no_progress_bar: cli.no_progress_bar,
                action: Action::Derive(image_job(&args.image, sizes)?),
            });
        }

        let host_id = cli
            .host_id
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| anyhow::anyhow!("--host-id (or NS_HOST_ID) is required"))?
            .to_string();
        let defaults = Defaults { host_id: &host_id };

        // Input faults are reported before asking for a token.
        let action = match &cli.command {
            Command::Provision(args) => {
                let domain = defaults.domain(&args.domain);
                let users = match &args.users {
                    Some(file) => load_users(&expand_tilde(file))?,
                    None => Vec::new(),
                };
                let images = args
                    .image
                    .as_deref()
                    .map(|source| {
                        image_job_from(
                            source,
                            &args.image_dir,
                            args.max_retries,
                            DEFAULT_SIZES.to_vec(),
                        )
                    })
                    .transpose()?;
                let server = format!("{}.{}", host_id, cli.base_domain.trim_matches('.'));
                Action::Provision(Box::new(TenantPlan {
                    reseller: Some(defaults.reseller(&args.reseller)),
                    images,
                    ui_configs: defaults.ui_configs(&args.ui)?,
                    connections: Connection::standard_set(&server, args.outbound),
                    route: args.outbound.then(Route::default),
                    domain: Some(domain),
                    users,
                    devices: !args.no_devices,
                    training: args.training,
                }))
            }
            Command::Reseller(args) => Action::Reseller(defaults.reseller(args)),
            Command::Domain(args) => Action::Domain(defaults.domain(args)),
            Command::User(args) => {
                validate_extension(&args.extension)?;
                Action::User {
                    domain: defaults.domain_name(&args.domain),
                    entry: UserEntry {
                        extension: args.extension.clone(),
                        first_name: args.first_name.clone(),
                        last_name: args.last_name.clone(),
                        email: args.email.clone(),
                        scope: Some(args.scope),
                    },
                    device: args.device,
                }
            }
            Command::Device(args) => {
                validate_extension(&args.extension)?;
                Action::Device(Device::new(
                    &host_id,
                    &defaults.domain_name(&args.domain),
                    &args.extension,
                ))
            }
            Command::Connections(args) => {
                let server = format!("{}.{}", host_id, cli.base_domain.trim_matches('.'));
                Action::Connections(Connection::standard_set(&server, args.outbound))
            }
            Command::Route(args) => Action::Route(Route {
                match_to: args.match_to.clone(),
                con_index: args.con_index.clone(),
                con_host: args.con_host.clone(),
            }),
            Command::UiConfigs(args) => Action::UiConfigs(defaults.ui_configs(args)?),
            Command::Images(args) => Action::Images(image_job(args, DEFAULT_SIZES.to_vec())?),
            Command::Training => Action::Training,
            Command::Derive(_) => anyhow::bail!("derive does not use the platform API"),
        };

        let credentials = resolve_credentials(cli.api_token, prompt)?;
        let api = ApiConfig::for_host(&host_id, &cli.base_domain, credentials)?;

        Ok(Self {
            api: Some(api),
            no_progress_bar: cli.no_progress_bar,
            action,
        })
    }
}
