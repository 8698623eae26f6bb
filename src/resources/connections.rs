//! SIP trunk connections and outbound routes.

use serde_json::json;

use super::{object, path_segment, Resource};
use crate::api::{ConflictPolicy, ResourceDescriptor};

/// A carrier trunk terminating on `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub address: String,
    pub description: String,
    /// The tenant server, e.g. `acme.trynetsapiens.com`.
    pub source_host: String,
}

impl Connection {
    pub fn carrier(address: &str, description: &str, source_host: &str) -> Self {
        Self {
            address: address.to_string(),
            description: description.to_string(),
            source_host: source_host.to_string(),
        }
    }

    pub fn primary_origination(source_host: &str) -> Self {
        Self::carrier("192.81.237.20", "ThinQ Primary Orig & 911", source_host)
    }

    pub fn secondary_origination(source_host: &str) -> Self {
        Self::carrier("192.81.236.20", "ThinQ Secondary Orig & 911", source_host)
    }

    pub fn lcr_outbound(source_host: &str) -> Self {
        Self::carrier("a.icr.commio.com", "ThinQ LCR Outbound", source_host)
    }

    /// The origination pair every tenant gets, plus the outbound trunk if asked.
    pub fn standard_set(source_host: &str, include_outbound: bool) -> Vec<Self> {
        let mut set = vec![
            Self::secondary_origination(source_host),
            Self::primary_origination(source_host),
        ];
        if include_outbound {
            set.push(Self::lcr_outbound(source_host));
        }
        set
    }
}

impl Resource for Connection {
    fn descriptor(&self) -> ResourceDescriptor {
        let defaults = json!({
            "connection-orig-enabled": "yes",
            "connection-term-enabled": "yes",
            "connection-translation-request-user": "[*]",
            "connection-translation-destination-user": "[*]",
            "connection-translation-source-user": "[*]",
            "connection-source-ip-checking-enabled": "yes",
            "connection-include-server-header-enabled": "no",
            "connection-relay-comfort-noise-enabled": "system-default",
            "connection-pcmu-only-enabled": "no",
            "connection-enforce-minimum-duration-enabled": "no",
            "connection-bind-to-alternate-interface-enabled": "no",
            "connection-block-video-in-sdp-enabled": "no",
            "connection-sip-get-new-dialog-destination-from": "default-ip",
            "connection-sip-get-response-destination-from": "default-ip",
            "connection-require-encrypted-audio-enabled": "no",
            "connection-sip-transport-protocol": "UDP",
            "connection-check-orig-matching-sip-header": "from",
            "connection-sip-session-timer-enabled": "system-default",
            "connection-prevent-rtp-port-change-enabled": "no",
            "connection-hide-post-dial-delay-with-ringback-enabled": "no",
            "connection-remote-ringback-handling": "allowed",
            "connection-block-media-in-sip-180-ringing": "no",
            "connection-allow-mid-call-uri-updates-enabled": "no",
            "connection-record-all-calls-enabled": "no",
            "connection-require-sip-authentication-enabled": "no",
            "minimum-call-duration-seconds": 0,
            "connection-sip-authenticate-as-client-enabled": "no",
            "connection-is-carrier-trunk": "yes",
            "domain": "*",
            "connection-audio-relay-enabled": "yes",
            "dial-plan": "Inbound DID",
            "dial-policy": "Permit All",
            "connection-linked-billing-user": "domain",
            "connection-custom-p-asserted-id-format": "passerted",
            "utc-offset": "-7",
            "time-zone": "US/Pacific",
        });
        let addr = self.address.as_str();
        let orig_match = format!("sip*@{}", addr);
        ResourceDescriptor::new(format!("connection {}", self.description), "/connections")
            .with_update_path(format!("/connections/{}", path_segment(&orig_match)))
            .with_defaults(object(defaults))
            .with_field("description", self.description.as_str())
            .with_field("connection-address", addr)
            .with_field("connection-translation-destination-host", addr)
            .with_field("connection-translation-request-host", addr)
            .with_field("connection-orig-match-pattern", orig_match.as_str())
            .with_field("connection-term-match-pattern", format!("sip:*@{}", addr))
            .with_field(
                "connection-translation-source-host",
                self.source_host.as_str(),
            )
    }
}

/// Outbound route pointing a dial pattern at a connection.
/// An existing route is reported and left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub match_to: String,
    pub con_index: String,
    pub con_host: String,
}

impl Default for Route {
    /// US domestic numbers to the outbound LCR trunk.
    fn default() -> Self {
        Self {
            match_to: "sip:1??????????@*".into(),
            con_index: "1".into(),
            con_host: "a.icr.commio.com".into(),
        }
    }
}

impl Resource for Route {
    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(format!("route {}", self.match_to), "/routecon")
            .with_field("match_to", self.match_to.as_str())
            .with_field("con_index", self.con_index.as_str())
            .with_field("con_host", self.con_host.as_str())
            .on_conflict(ConflictPolicy::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_templated_fields() {
        let d = Connection::primary_origination("acme.trynetsapiens.com").descriptor();
        assert_eq!(d.path(), "/connections");
        assert_eq!(d.update_path(), "/connections/sip*%40192.81.237.20");
        let body = d.merged_body();
        assert_eq!(body["connection-address"], "192.81.237.20");
        assert_eq!(body["connection-orig-match-pattern"], "sip*@192.81.237.20");
        assert_eq!(body["connection-term-match-pattern"], "sip:*@192.81.237.20");
        assert_eq!(
            body["connection-translation-source-host"],
            "acme.trynetsapiens.com"
        );
        assert_eq!(body["minimum-call-duration-seconds"], 0);
        assert_eq!(body["description"], "ThinQ Primary Orig & 911");
    }

    #[test]
    fn test_standard_set() {
        assert_eq!(Connection::standard_set("h", false).len(), 2);
        let with_outbound = Connection::standard_set("h", true);
        assert_eq!(with_outbound.len(), 3);
        assert_eq!(with_outbound[2].address, "a.icr.commio.com");
    }

    #[test]
    fn test_route_defaults_and_skip() {
        let d = Route::default().descriptor();
        assert_eq!(d.path(), "/routecon");
        assert_eq!(d.conflict_policy(), ConflictPolicy::Skip);
        let body = d.merged_body();
        assert_eq!(body["match_to"], "sip:1??????????@*");
        assert_eq!(body["con_host"], "a.icr.commio.com");
    }
}
