//! Resellers, domains, users and devices.

use serde::Deserialize;
use serde_json::json;

use super::{object, path_segment, Resource};
use crate::api::{ConflictPolicy, ResourceDescriptor};
use crate::types::UserScope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reseller {
    pub name: String,
    pub description: String,
}

impl Resource for Reseller {
    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(format!("reseller {}", self.name), "/resellers")
            .with_update_path(format!("/resellers/{}", path_segment(&self.name)))
            .with_field("reseller", self.name.as_str())
            .with_field("description", self.description.as_str())
    }
}

/// A tenant domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub domain: String,
    pub reseller: String,
    pub description: String,
    pub dial_plan: String,
    pub dial_policy: String,
    pub area_code: String,
    pub caller_id_name: String,
    pub caller_id_number: String,
    pub caller_id_number_emergency: String,
    pub time_zone: Option<String>,
}

impl Resource for Domain {
    fn descriptor(&self) -> ResourceDescriptor {
        let defaults = json!({
            "synchronous": "yes",
            "recording-configuration": "yes",
            "voicemail-transcription-enabled": "deepgram",
            "language-token": "en_US",
            "domain-type": "Standard",
            "email-send-from-address": "voicemail@netsapiens.com",
            "single-sign-on-enabled": "no",
            "voicemail-enabled": "yes",
            "is-domain-locked": "no",
            "is-stir-enabled": "no",
            "is-ivr-forward-change-blocked": "no",
        });
        let mut d = ResourceDescriptor::new(format!("domain {}", self.domain), "/domains")
            .with_update_path(format!("/domains/{}", path_segment(&self.domain)))
            .with_defaults(object(defaults))
            .with_field("domain", self.domain.as_str())
            .with_field("reseller", self.reseller.as_str())
            .with_field("description", self.description.as_str())
            .with_field("dial-plan", self.dial_plan.as_str())
            .with_field("dial-policy", self.dial_policy.as_str())
            .with_field("area-code", self.area_code.as_str())
            .with_field("caller-id-name", self.caller_id_name.as_str())
            .with_field("caller-id-number", self.caller_id_number.as_str())
            .with_field(
                "caller-id-number-emergency",
                self.caller_id_number_emergency.as_str(),
            );
        if let Some(tz) = &self.time_zone {
            d = d.with_field("time-zone", tz.as_str());
        }
        d
    }
}

/// A user entry as read from a users file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserEntry {
    pub extension: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub scope: Option<UserScope>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub domain: String,
    pub extension: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub scope: UserScope,
    pub department: String,
    pub site: String,
}

impl User {
    pub fn from_entry(domain: &str, entry: &UserEntry) -> Self {
        Self {
            domain: domain.to_string(),
            extension: entry.extension.clone(),
            first_name: entry.first_name.clone(),
            last_name: entry.last_name.clone(),
            email: entry.email.clone(),
            scope: entry.scope.unwrap_or_default(),
            department: "Support Department".into(),
            site: "Site One".into(),
        }
    }
}

impl Resource for User {
    fn descriptor(&self) -> ResourceDescriptor {
        let defaults = json!({
            "synchronous": "no",
            "privacy": "no",
            "voicemail-user-control-enabled": "yes",
            "phone-numbers-to-allow-enabled": "yes",
            "phone-numbers-to-reject-enabled": "yes",
            "call-screening-enabled": "no",
            "language-token": "en_US",
            "directory-annouce-in-dial-by-name-enabled": "yes",
            "voicemail-enabled": "yes",
            "voicemail-receive-broadcast-enabled": "yes",
            "reject-anonymous-calls-enabled": "no",
            "voicemail-playback-announce-datetime-received": "no",
            "voicemail-playback-announce-caller-id": "no",
            "voicemail-playback-sort-newest-to-oldest": "yes",
            "email-send-alert-new-voicemail-behavior": "no",
            "email-send-alert-new-voicemail-enabled": "no",
            "email-send-alert-new-missed-call-enabled": "no",
            "email-send-alert-data-storage-limit-reached-enabled": "no",
            "directory-name-visible-in-list-enabled": "yes",
            "voicemail-transcription-enabled": "no",
            "call-recordings-hide-from-others-enabled": "no",
            "music-on-hold-randomized-enabled": "no",
            "recording-configuration": "no",
            "time-zone": "America/New_York",
            "voicemail-login-pin": 1818,
            "dial-policy": "US and Canada",
            "status-message": "my status message",
            "directory-name-number-dtmf-mapping": 564,
            "ring-no-answer-timeout-seconds": 30,
            "limits-max-data-storage-kilobytes": 10240,
            "limits-max-active-calls-total": 0,
            "directory-override-order-duplicate-dtmf-mapping": 0,
            "voicemail-greeting-index": 0,
        });
        let path = format!("/domains/{}/users", path_segment(&self.domain));
        let item = format!("{}/{}", path, path_segment(&self.extension));
        ResourceDescriptor::new(format!("user {}@{}", self.extension, self.domain), path)
            .with_update_path(item)
            .with_defaults(object(defaults))
            .with_field("user", self.extension.as_str())
            .with_field("login-username", self.extension.as_str())
            .with_field("name-first-name", self.first_name.as_str())
            .with_field("name-last-name", self.last_name.as_str())
            .with_field("email-address", self.email.as_str())
            .with_field("department", self.department.as_str())
            .with_field("site", self.site.as_str())
            .with_field("dial-plan", self.domain.as_str())
            .with_field(
                "caller-id-name",
                format!("{} {}", self.first_name, self.last_name),
            )
            .with_scope("user-scope", self.scope.as_str())
    }
}

/// A SIP device registered under a user. Existing devices are left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub host_id: String,
    pub domain: String,
    pub extension: String,
    pub emergency_caller_id: String,
}

impl Device {
    pub fn new(host_id: &str, domain: &str, extension: &str) -> Self {
        Self {
            host_id: host_id.to_string(),
            domain: domain.to_string(),
            extension: extension.to_string(),
            emergency_caller_id: "[*]".into(),
        }
    }
}

impl Resource for Device {
    fn descriptor(&self) -> ResourceDescriptor {
        let defaults = json!({
            "synchronous": "no",
            "device-force-notify-new-voicemails-enabled": "no",
            "device-level-call-recording-enabled": "yes",
            "device-push-enabled": "no",
            "device-sip-registration-expiry-seconds": 60,
            "device-sip-registration-ignore-for-presence-calculation": "no",
            "device-sip-registration-ignore-report-enabled": "no",
            "device-sip-no-to-tag-in-cancel": "no",
            "device-srtp-enabled": "no",
            "auto-answer-enabled": "no",
            "recording-configuration": "no",
            "device-sip-nat-traversal-enabled": "automatic",
            "device-provisioning-sip-transport-protocol": "udp",
        });
        let path = format!(
            "/domains/{}/users/{}/devices",
            path_segment(&self.domain),
            path_segment(&self.extension)
        );
        ResourceDescriptor::new(format!("device {}@{}", self.extension, self.domain), path)
            .with_defaults(object(defaults))
            .with_field("device", self.extension.as_str())
            .with_field(
                "device-provisioning-username",
                format!("{}@{}", self.extension, self.host_id),
            )
            .with_field("caller-id-number-emergency", self.emergency_caller_id.as_str())
            .on_conflict(ConflictPolicy::Skip)
    }
}

/// Extensions must be numeric, e.g. `1001`.
pub fn validate_extension(extension: &str) -> anyhow::Result<()> {
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Extension must be numeric (e.g., 1001), got '{}'", extension);
    }
    Ok(())
}
