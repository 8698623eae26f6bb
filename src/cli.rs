use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::api::DEFAULT_BASE_DOMAIN;
use crate::assets::ImageSize;
use crate::resources::ui_config::parse_override;
use crate::types::{LogLevel, UserScope};

#[derive(Parser, Debug)]
#[command(
    name = "ns-provision",
    version,
    about = "Provision a tenant on a hosted telephony platform"
)]
pub struct Cli {
    /// Tenant host id; the API is reached at https://{host-id}.{base-domain}
    #[arg(long, global = true, env = "NS_HOST_ID")]
    pub host_id: Option<String>,

    /// API bearer token (if not provided, will prompt).
    /// WARNING: passing via --api-token is visible in process listings.
    /// Prefer the API_TOKEN environment variable instead.
    #[arg(long, global = true, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Platform domain the tenant lives under
    #[arg(long, global = true, env = "NS_BASE_DOMAIN", default_value = DEFAULT_BASE_DOMAIN)]
    pub base_domain: String,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Also write plain-text logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Disable progress bar
    #[arg(long, global = true)]
    pub no_progress_bar: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Full run: reseller, images, UI configs, connections, domain, users
    Provision(ProvisionArgs),
    /// Create or update the tenant's reseller
    Reseller(ResellerArgs),
    /// Create or update a domain
    Domain(DomainArgs),
    /// Create or update one user, optionally with its device
    User(UserArgs),
    /// Create a device for an existing user
    Device(DeviceArgs),
    /// Create or update the carrier connections
    Connections(ConnectionArgs),
    /// Create an outbound route
    Route(RouteArgs),
    /// Publish portal UI configuration keys
    UiConfigs(UiConfigArgs),
    /// Fetch the branding image, derive its variants and upload every slot
    Images(ImageArgs),
    /// Fetch an image and write resized variants locally, without uploading
    Derive(DeriveArgs),
    /// Create the two training domains with their users, parks and queues
    Training,
}

#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub reseller: ResellerArgs,

    #[command(flatten)]
    pub domain: DomainArgs,

    /// Branding image URL or local path; images are skipped when absent
    #[arg(long)]
    pub image: Option<String>,

    /// Directory for the derived image variants
    #[arg(long, default_value = "image_files")]
    pub image_dir: String,

    /// Max attempts per image fetch (only rate limiting is retried)
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    #[command(flatten)]
    pub ui: UiConfigArgs,

    /// Also create the outbound LCR connection and its route
    #[arg(long)]
    pub outbound: bool,

    /// JSON file with the users to create in the domain
    #[arg(long)]
    pub users: Option<String>,

    /// Don't create a device for each user
    #[arg(long)]
    pub no_devices: bool,

    /// Also create the training domains
    #[arg(long)]
    pub training: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ResellerArgs {
    /// Reseller name (default: {host-id}_reseller)
    #[arg(long = "reseller")]
    pub name: Option<String>,

    #[arg(long = "reseller-description", id = "reseller_description", default_value = "Created via API app")]
    pub description: String,
}

#[derive(Args, Debug, Clone)]
pub struct DomainArgs {
    /// Domain name (default: the host id)
    #[arg(long)]
    pub domain: Option<String>,

    /// Owning reseller (default: {host-id}_reseller)
    #[arg(long = "domain-reseller")]
    pub reseller: Option<String>,

    #[arg(long = "domain-description", id = "domain_description", default_value = "made via api")]
    pub description: String,

    /// Dial plan (default: the domain name)
    #[arg(long)]
    pub dial_plan: Option<String>,

    #[arg(long, default_value = "US and Canada")]
    pub dial_policy: String,

    #[arg(long, default_value = "858")]
    pub area_code: String,

    /// Caller ID name (default: "{host-id} CID")
    #[arg(long)]
    pub caller_id_name: Option<String>,

    #[arg(long, default_value = "18005551234")]
    pub caller_id_number: String,

    /// Emergency caller ID number (default: the caller ID number)
    #[arg(long)]
    pub caller_id_number_emergency: Option<String>,

    #[arg(long)]
    pub time_zone: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    /// Domain the user belongs to (default: the host id)
    #[arg(long)]
    pub domain: Option<String>,

    /// Numeric extension, e.g. 1001
    #[arg(long)]
    pub extension: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, value_enum, default_value = "basic-user")]
    pub scope: UserScope,

    /// Also create a device for the user
    #[arg(long)]
    pub device: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Domain the user belongs to (default: the host id)
    #[arg(long)]
    pub domain: Option<String>,

    #[arg(long)]
    pub extension: String,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Also create the outbound LCR connection
    #[arg(long)]
    pub outbound: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    #[arg(long, default_value = "sip:1??????????@*")]
    pub match_to: String,

    #[arg(long, default_value = "1")]
    pub con_index: String,

    #[arg(long, default_value = "a.icr.commio.com")]
    pub con_host: String,
}

#[derive(Args, Debug, Clone)]
pub struct UiConfigArgs {
    /// JSON file of UI configuration keys
    #[arg(long = "ui-configs")]
    pub file: Option<String>,

    /// Override a configuration value, e.g. --set PORTAL_THEME_ACCENT=#0055AA
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone)]
pub struct ImageArgs {
    /// Image URL or local path
    #[arg(long)]
    pub source: String,

    /// Directory for the derived variants
    #[arg(long, default_value = "image_files")]
    pub out_dir: String,

    /// Max attempts per fetch (only rate limiting is retried)
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,
}

#[derive(Args, Debug, Clone)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Variant size as WxH; repeat for several (default: 192x192, 512x512, 250x150)
    #[arg(long = "size")]
    pub sizes: Vec<ImageSize>,
}
