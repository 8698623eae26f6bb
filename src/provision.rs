//! Provisioning runs: publish a tenant's resources one after another.
//!
//! A failed resource is logged and counted, then the run moves on to the
//! next one. Only a failed image fetch stops its own step early.

use std::io::IsTerminal;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{ApiClient, ApiError, PublishMode, PublishOutcome, ResourceDescriptor};
use crate::assets::{ImageFetcher, ImageSize, ImageSource};
use crate::resources::images::plan_uploads;
use crate::resources::tenant::UserEntry;
use crate::resources::ui_config::UiConfig;
use crate::resources::{
    CallPark, CallQueue, CallQueueAgent, Connection, Device, Domain, Reseller, Resource, Route,
    User,
};
use crate::retry::RetryConfig;
use crate::types::{DispatchType, UserScope};

/// A resource that did not reach its desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub resource: String,
    pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub updated: usize,
    pub already_existed: usize,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    pub fn record(&mut self, resource: &str, result: &Result<PublishOutcome, ApiError>) {
        match result {
            Ok(PublishOutcome::Created) => self.created += 1,
            Ok(PublishOutcome::Updated) | Ok(PublishOutcome::ConflictedThenUpdated) => {
                self.updated += 1
            }
            Ok(PublishOutcome::AlreadyExists) => self.already_existed += 1,
            Ok(failed @ PublishOutcome::Failed { .. }) => {
                self.record_failure(resource, failed.to_string())
            }
            Err(e) => self.record_failure(resource, e.to_string()),
        }
    }

    pub fn record_failure(&mut self, resource: &str, reason: impl Into<String>) {
        self.failures.push(Failure {
            resource: resource.to_string(),
            reason: reason.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.already_existed + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn log(&self) {
        tracing::info!("── Provisioning Summary ──");
        tracing::info!(
            "  {} resources: {} created, {} updated, {} already existed, {} failed",
            self.total(),
            self.created,
            self.updated,
            self.already_existed,
            self.failures.len()
        );
        for failure in &self.failures {
            tracing::error!("  {}: {}", failure.resource, failure.reason);
        }
    }
}

/// Where the branding image comes from and where its variants go.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub source: ImageSource,
    pub out_dir: PathBuf,
    pub sizes: Vec<ImageSize>,
    pub retry: RetryConfig,
}

/// Everything a full run publishes, in run order.
#[derive(Debug, Clone, Default)]
pub struct TenantPlan {
    pub reseller: Option<Reseller>,
    pub images: Option<ImageJob>,
    pub ui_configs: Vec<UiConfig>,
    pub connections: Vec<Connection>,
    pub route: Option<Route>,
    pub domain: Option<Domain>,
    pub users: Vec<UserEntry>,
    pub devices: bool,
    pub training: bool,
}

/// Progress bar for a run, hidden when disabled or stdout is not a TTY.
pub fn create_progress_bar(no_progress_bar: bool) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("=> "),
    );
    pb
}

pub struct Provisioner<'a> {
    client: &'a ApiClient,
    progress: ProgressBar,
    summary: RunSummary,
}

impl<'a> Provisioner<'a> {
    pub fn new(client: &'a ApiClient, progress: ProgressBar) -> Self {
        Self {
            client,
            progress,
            summary: RunSummary::default(),
        }
    }

    /// Publish one descriptor and record its outcome. Returns whether it succeeded.
    pub async fn publish(&mut self, descriptor: &ResourceDescriptor) -> bool {
        self.publish_with_mode(descriptor, PublishMode::Create).await
    }

    async fn publish_with_mode(
        &mut self,
        descriptor: &ResourceDescriptor,
        mode: PublishMode,
    ) -> bool {
        self.progress.set_message(descriptor.name().to_string());
        let result = self.client.publish_with_mode(descriptor, mode).await;
        match &result {
            Ok(failed @ PublishOutcome::Failed { .. }) => self
                .progress
                .suspend(|| tracing::error!("{}: {}", descriptor.name(), failed)),
            Err(e) => self
                .progress
                .suspend(|| tracing::error!("{}: {}", descriptor.name(), e)),
            Ok(_) => {}
        }
        let ok = matches!(&result, Ok(outcome) if outcome.is_success());
        self.summary.record(descriptor.name(), &result);
        self.progress.inc(1);
        ok
    }

    pub async fn publish_all<R: Resource>(&mut self, resources: &[R]) {
        self.progress.inc_length(resources.len() as u64);
        for resource in resources {
            self.publish(&resource.descriptor()).await;
        }
    }

    pub async fn reseller(&mut self, reseller: &Reseller) {
        self.publish_all(std::slice::from_ref(reseller)).await;
    }

    pub async fn domain(&mut self, domain: &Domain) {
        self.publish_all(std::slice::from_ref(domain)).await;
    }

    pub async fn connections(&mut self, connections: &[Connection]) {
        self.publish_all(connections).await;
    }

    pub async fn route(&mut self, route: &Route) {
        self.publish_all(std::slice::from_ref(route)).await;
    }

    /// Each config is published once per scope. Config keys override
    /// platform defaults, so a first-try success is reported as an update.
    pub async fn ui_configs(&mut self, configs: &[UiConfig]) {
        let descriptors: Vec<ResourceDescriptor> =
            configs.iter().flat_map(UiConfig::descriptors).collect();
        self.progress.inc_length(descriptors.len() as u64);
        for descriptor in &descriptors {
            self.publish_with_mode(descriptor, PublishMode::Modify).await;
        }
    }

    /// Users in `domain`, each followed by its device when `devices` is set.
    pub async fn users(&mut self, domain: &str, entries: &[UserEntry], devices: bool) {
        let host_id = self.client.config().host_id().to_string();
        let per_user = if devices { 2 } else { 1 };
        self.progress.inc_length((entries.len() * per_user) as u64);
        for entry in entries {
            self.publish(&User::from_entry(domain, entry).descriptor())
                .await;
            if devices {
                self.publish(&Device::new(&host_id, domain, &entry.extension).descriptor())
                    .await;
            }
        }
    }

    /// Fetch the source image, derive every variant, then upload each slot.
    ///
    /// Nothing is uploaded unless the fetch succeeds and every slot's
    /// variant is on disk.
    pub async fn images(&mut self, job: &ImageJob) {
        self.progress.set_message("fetching image");
        let fetcher = ImageFetcher::new(self.client.transport(), job.retry.clone());
        let assets = match fetcher
            .fetch_and_derive(&job.source, &job.sizes, &job.out_dir)
            .await
        {
            Ok(assets) => assets,
            Err(e) => {
                self.progress
                    .suspend(|| tracing::error!("Image step skipped: {}", e));
                self.summary
                    .record_failure(&format!("image {}", job.source.describe()), e.to_string());
                return;
            }
        };
        tracing::info!(
            count = assets.len(),
            dir = %job.out_dir.display(),
            "derived image variants"
        );

        let uploads = match plan_uploads(&assets) {
            Ok(uploads) => uploads,
            Err(e) => {
                self.progress
                    .suspend(|| tracing::error!("Image step skipped: {}", e));
                self.summary.record_failure("images", e.to_string());
                return;
            }
        };

        let server = self.client.config().server().to_string();
        self.progress.inc_length(uploads.len() as u64);
        for upload in &uploads {
            match upload.descriptor(&server).await {
                Ok(descriptor) => {
                    self.publish(&descriptor).await;
                }
                Err(e) => {
                    self.summary
                        .record_failure(&format!("image {}", upload.filename), e.to_string());
                    self.progress.inc(1);
                }
            }
        }
    }

    /// Two practice tenants with a fixed set of users, parks and queues.
    pub async fn training_domains(&mut self) {
        let host_id = self.client.config().host_id().to_string();
        let resellers: Vec<Reseller> = (1..=2)
            .map(|n| Reseller {
                name: format!("training_reseller{}", n),
                description: format!("Training reseller {} created via API", n),
            })
            .collect();
        self.publish_all(&resellers).await;

        for (n, reseller) in (1..=2).zip(&resellers) {
            let domain = training_domain(&host_id, &format!("trainingdomain{}", n), &reseller.name);
            let name = domain.domain.clone();
            tracing::info!(domain = %name, "creating training domain");
            self.domain(&domain).await;

            let mut users = Vec::new();
            let mut devices = Vec::new();
            for &(extension, email, scope) in TRAINING_USERS {
                users.push(training_user(&name, extension, email, scope));
                let mut device = Device::new(&host_id, &name, extension);
                device.emergency_caller_id = TRAINING_CALLER_ID.into();
                devices.push(device);
            }
            self.progress.inc_length((users.len() * 2) as u64);
            for (user, device) in users.iter().zip(&devices) {
                self.publish(&user.descriptor()).await;
                self.publish(&device.descriptor()).await;
            }

            let parks: Vec<CallPark> = TRAINING_PARKS
                .iter()
                .map(|&(callqueue, description)| CallPark {
                    domain: name.clone(),
                    callqueue: callqueue.into(),
                    description: description.into(),
                })
                .collect();
            self.publish_all(&parks).await;

            let queues: Vec<CallQueue> = TRAINING_QUEUES
                .iter()
                .map(|&(callqueue, description)| CallQueue {
                    domain: name.clone(),
                    callqueue: callqueue.into(),
                    description: description.into(),
                    dispatch: DispatchType::RingAll,
                })
                .collect();
            self.publish_all(&queues).await;

            let agents: Vec<CallQueueAgent> = queues
                .iter()
                .flat_map(|queue| {
                    TRAINING_AGENTS.iter().map(|agent| CallQueueAgent {
                        domain: name.clone(),
                        callqueue: queue.callqueue.clone(),
                        agent_extension: agent.to_string(),
                    })
                })
                .collect();
            self.publish_all(&agents).await;
        }
    }

    /// Full run: reseller, images, UI configs, connections, route, domain,
    /// users and devices, then training domains.
    pub async fn run(&mut self, plan: &TenantPlan) {
        if let Some(reseller) = &plan.reseller {
            self.reseller(reseller).await;
        }
        if let Some(job) = &plan.images {
            self.images(job).await;
        }
        self.ui_configs(&plan.ui_configs).await;
        self.connections(&plan.connections).await;
        if let Some(route) = &plan.route {
            self.route(route).await;
        }
        if let Some(domain) = &plan.domain {
            self.domain(domain).await;
            self.users(&domain.domain, &plan.users, plan.devices).await;
        }
        if plan.training {
            self.training_domains().await;
        }
    }

    pub fn finish(self) -> RunSummary {
        self.progress.finish_and_clear();
        self.summary
    }
}

const TRAINING_CALLER_ID: &str = "8585551234";
const TRAINING_AGENTS: &[&str] = &["2004", "2005"];
const TRAINING_PARKS: &[(&str, &str)] =
    &[("701", "Park One"), ("702", "Park Two"), ("703", "Park Three")];
const TRAINING_QUEUES: &[(&str, &str)] = &[("801", "Queue One"), ("802", "Queue Two")];
const TRAINING_USERS: &[(&str, &str, UserScope)] = &[
    ("2004", "cc.agent1@netsapiens.com", UserScope::CallCenterAgent),
    ("2005", "cc.agent2@netsapiens.com", UserScope::CallCenterAgent),
    ("2000", "simple.user@netsapiens.com", UserScope::SimpleUser),
    ("2001", "basic.user@netsapiens.com", UserScope::BasicUser),
    ("2002", "advanced.user@netsapiens.com", UserScope::AdvancedUser),
    ("2003", "cc.supervisor@netsapiens.com", UserScope::CallCenterSupervisor),
    ("2006", "office.manager@netsapiens.com", UserScope::OfficeManager),
    ("2007", "reseller@netsapiens.com", UserScope::Reseller),
];

fn training_domain(host_id: &str, domain: &str, reseller: &str) -> Domain {
    Domain {
        domain: domain.to_string(),
        reseller: reseller.to_string(),
        description: "Training domain created via API".into(),
        dial_plan: host_id.to_string(),
        dial_policy: "US and Canada".into(),
        area_code: "858".into(),
        caller_id_name: "Training CID".into(),
        caller_id_number: TRAINING_CALLER_ID.into(),
        caller_id_number_emergency: TRAINING_CALLER_ID.into(),
        time_zone: Some("US/Pacific".into()),
    }
}

/// Training users are named after their scope: "Office Manager" becomes
/// first name "Office", last name "Manager"; "Reseller" becomes "Reseller User".
fn training_user(domain: &str, extension: &str, email: &str, scope: UserScope) -> User {
    let (first_name, last_name) = match scope.as_str().split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (scope.as_str().to_string(), "User".to_string()),
    };
    User {
        domain: domain.to_string(),
        extension: extension.to_string(),
        first_name,
        last_name,
        email: email.to_string(),
        scope,
        department: "Training Department".into(),
        site: "Training Site".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiConfig, ApiResponse, Credentials};
    use crate::testing::{png_bytes, ScriptedTransport};
    use reqwest::Method;
    use std::sync::Arc;

    fn client(transport: Arc<ScriptedTransport>) -> ApiClient {
        let config = ApiConfig::for_host(
            "acme",
            crate::api::DEFAULT_BASE_DOMAIN,
            Credentials::bearer("tok").unwrap(),
        )
        .unwrap();
        ApiClient::new(config, Box::new(transport))
    }

    fn reseller() -> Reseller {
        Reseller {
            name: "acme_reseller".into(),
            description: "Created via API app".into(),
        }
    }

    #[test]
    fn test_summary_counts_each_outcome() {
        let mut summary = RunSummary::default();
        summary.record("a", &Ok(PublishOutcome::Created));
        summary.record("b", &Ok(PublishOutcome::ConflictedThenUpdated));
        summary.record("c", &Ok(PublishOutcome::AlreadyExists));
        summary.record(
            "d",
            &Ok(PublishOutcome::Failed {
                status: 403,
                body: "forbidden".into(),
            }),
        );
        summary.record("e", &Err(ApiError::MissingCredentials));
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.already_existed, 1);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.total(), 5);
        assert!(summary.failures[0].reason.contains("403"));
        assert_eq!(summary.failures[1].resource, "e");
    }

    #[test]
    fn test_training_user_names() {
        let u = training_user("d", "2006", "om@example.com", UserScope::OfficeManager);
        assert_eq!((u.first_name.as_str(), u.last_name.as_str()), ("Office", "Manager"));
        let u = training_user("d", "2003", "s@example.com", UserScope::CallCenterSupervisor);
        assert_eq!(u.last_name, "Center Supervisor");
        let u = training_user("d", "2007", "r@example.com", UserScope::Reseller);
        assert_eq!((u.first_name.as_str(), u.last_name.as_str()), ("Reseller", "User"));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let transport = ScriptedTransport::new([
            Ok(ApiResponse::new(500, "reseller broke")),
            Err("connection reset".into()),
            Ok(ApiResponse::new(201, "")),
        ]);
        let client = client(transport.clone());
        let plan = TenantPlan {
            reseller: Some(reseller()),
            connections: Connection::standard_set("acme.trynetsapiens.com", false),
            ..Default::default()
        };

        let mut p = Provisioner::new(&client, ProgressBar::hidden());
        p.run(&plan).await;
        let summary = p.finish();

        assert_eq!(transport.requests().len(), 3);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failures.len(), 2);
        assert!(summary.failures[1].reason.contains("connection reset"));
        assert!(summary.has_failures());
    }

    #[tokio::test]
    async fn test_run_order() {
        let transport = ScriptedTransport::always(201, 16);
        let client = client(transport.clone());
        let ui = crate::resources::ui_config::parse(
            r##"[{"config_name": "PORTAL_THEME_ACCENT", "config_value": "#000000", "scopes": ["su", "om"]}]"##,
            "acme",
        )
        .unwrap();
        let plan = TenantPlan {
            reseller: Some(reseller()),
            ui_configs: ui,
            connections: Connection::standard_set("acme.trynetsapiens.com", true),
            route: Some(Route::default()),
            domain: Some(training_domain("acme", "acme", "acme_reseller")),
            users: vec![UserEntry {
                extension: "1001".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                scope: None,
            }],
            devices: true,
            ..Default::default()
        };

        let mut p = Provisioner::new(&client, ProgressBar::hidden());
        p.run(&plan).await;
        let summary = p.finish();
        assert!(!summary.has_failures());

        let paths: Vec<String> = transport
            .requests()
            .into_iter()
            .map(|r| r.url.trim_start_matches("https://acme.trynetsapiens.com/ns-api/v2").to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/resellers",
                "/configurations",
                "/configurations",
                "/connections",
                "/connections",
                "/connections",
                "/routecon",
                "/domains",
                "/domains/acme/users",
                "/domains/acme/users/1001/devices",
            ]
        );
        assert_eq!(summary.created, 8);
        assert_eq!(summary.updated, 2);
    }

    #[tokio::test]
    async fn test_training_domains_publish_everything() {
        // 2 resellers + 2 * (domain + 8 users + 8 devices + 3 parks + 2 queues + 4 agents)
        let transport = ScriptedTransport::always(201, 54);
        let client = client(transport.clone());
        let mut p = Provisioner::new(&client, ProgressBar::hidden());
        p.training_domains().await;
        let summary = p.finish();

        let requests = transport.requests();
        assert_eq!(requests.len(), 54);
        assert_eq!(summary.created, 54);
        assert!(requests.iter().all(|r| r.method == Method::POST));

        let agent_requests: Vec<_> = requests
            .iter()
            .filter(|r| r.url.ends_with("/agents"))
            .collect();
        assert_eq!(agent_requests.len(), 8);
        assert!(agent_requests[0]
            .url
            .ends_with("/domains/trainingdomain1/callqueues/801/agents"));
    }

    #[tokio::test]
    async fn test_device_conflict_is_not_a_failure() {
        let transport = ScriptedTransport::with_statuses([201, 409]);
        let client = client(transport.clone());
        let entry = UserEntry {
            extension: "1001".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            scope: None,
        };
        let mut p = Provisioner::new(&client, ProgressBar::hidden());
        p.users("acme", &[entry], true).await;
        let summary = p.finish();
        assert_eq!(summary.already_existed, 1);
        assert!(!summary.has_failures());
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_image_fetch_skips_only_images() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("image_files");
        let transport = ScriptedTransport::new([
            Ok(ApiResponse::new(201, "")),
            Ok(ApiResponse::new(404, "")),
            Ok(ApiResponse::new(201, "")),
            Ok(ApiResponse::new(201, "")),
        ]);
        let client = client(transport.clone());
        let plan = TenantPlan {
            reseller: Some(reseller()),
            images: Some(ImageJob {
                source: ImageSource::parse("https://cdn.example.com/logo.png").unwrap(),
                out_dir: out_dir.clone(),
                sizes: crate::assets::DEFAULT_SIZES.to_vec(),
                retry: RetryConfig::default(),
            }),
            connections: Connection::standard_set("acme.trynetsapiens.com", false),
            ..Default::default()
        };

        let mut p = Provisioner::new(&client, ProgressBar::hidden());
        p.run(&plan).await;
        let summary = p.finish();

        assert_eq!(summary.created, 3);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].resource.contains("logo.png"));
        assert!(!out_dir.exists());
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_images_from_local_file_fill_every_slot() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("logo.png");
        std::fs::write(&source, png_bytes(64, 64, [0, 0, 255, 255])).unwrap();
        let transport = ScriptedTransport::always(201, 8);
        let client = client(transport.clone());
        let job = ImageJob {
            source: ImageSource::parse(source.to_str().unwrap()).unwrap(),
            out_dir: dir.path().join("out"),
            sizes: crate::assets::DEFAULT_SIZES.to_vec(),
            retry: RetryConfig::default(),
        };

        let mut p = Provisioner::new(&client, ProgressBar::hidden());
        p.images(&job).await;
        let summary = p.finish();

        assert_eq!(summary.created, 8);
        let requests = transport.requests();
        assert_eq!(requests.len(), 8);
        assert!(requests[0].url.ends_with("/images/512PWA.png"));
        assert!(requests[7].url.ends_with("/images/webphone_main_top_left.png"));
    }

    #[tokio::test]
    async fn test_incomplete_variant_set_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("logo.png");
        std::fs::write(&source, png_bytes(8, 8, [0, 0, 0, 255])).unwrap();
        let transport = ScriptedTransport::new([]);
        let client = client(transport.clone());
        let job = ImageJob {
            source: ImageSource::parse(source.to_str().unwrap()).unwrap(),
            out_dir: dir.path().join("out"),
            sizes: vec![ImageSize::new(192, 192)],
            retry: RetryConfig::default(),
        };

        let mut p = Provisioner::new(&client, ProgressBar::hidden());
        p.images(&job).await;
        let summary = p.finish();

        assert_eq!(summary.failures.len(), 1);
        assert!(transport.requests().is_empty());
    }
}
