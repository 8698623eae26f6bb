//! Call queues, call parks and queue agents.

use serde_json::json;

use super::{object, path_segment, Resource};
use crate::api::ResourceDescriptor;
use crate::types::DispatchType;

fn queues_path(domain: &str) -> String {
    format!("/domains/{}/callqueues", path_segment(domain))
}

fn queue_path(domain: &str, callqueue: &str) -> String {
    format!("{}/{}", queues_path(domain), path_segment(callqueue))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallQueue {
    pub domain: String,
    pub callqueue: String,
    pub description: String,
    pub dispatch: DispatchType,
}

impl Resource for CallQueue {
    fn descriptor(&self) -> ResourceDescriptor {
        let defaults = json!({
            "synchronous": "no",
            "callqueue-calculate-statistics": "yes",
            "callqueue-agent-dispatch-timeout-seconds": 12,
            "callqueue-force-full-intro-playback": "no",
        });
        ResourceDescriptor::new(
            format!("call queue {}@{}", self.callqueue, self.domain),
            queues_path(&self.domain),
        )
        .with_update_path(queue_path(&self.domain, &self.callqueue))
        .with_defaults(object(defaults))
        .with_field("callqueue", self.callqueue.as_str())
        .with_field("description", self.description.as_str())
        .with_field("callqueue-dispatch-type", self.dispatch.as_str())
    }
}

/// A park orbit; the platform models it as a queue with "Call Park" dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPark {
    pub domain: String,
    pub callqueue: String,
    pub description: String,
}

impl Resource for CallPark {
    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(
            format!("call park {}@{}", self.callqueue, self.domain),
            queues_path(&self.domain),
        )
        .with_update_path(queue_path(&self.domain, &self.callqueue))
        .with_field("synchronous", "no")
        .with_field("callqueue", self.callqueue.as_str())
        .with_field("description", self.description.as_str())
        .with_field("callqueue-dispatch-type", DispatchType::CallPark.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallQueueAgent {
    pub domain: String,
    pub callqueue: String,
    pub agent_extension: String,
}

impl Resource for CallQueueAgent {
    fn descriptor(&self) -> ResourceDescriptor {
        let defaults = json!({
            "synchronous": "no",
            "callqueue-agent-wrap-up-allowance-seconds": 0,
            "auto-answer-enabled": "no",
            "callqueue-agent-answer-confirmation-enabled": "no",
        });
        let path = format!("{}/agents", queue_path(&self.domain, &self.callqueue));
        let item = format!("{}/{}", path, path_segment(&self.agent_extension));
        ResourceDescriptor::new(
            format!(
                "agent {} in queue {}@{}",
                self.agent_extension, self.callqueue, self.domain
            ),
            path,
        )
        .with_update_path(item)
        .with_defaults(object(defaults))
        .with_field("callqueue-agent-id", self.agent_extension.as_str())
        .with_field("callqueue", self.callqueue.as_str())
        .with_field("domain", self.domain.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_body() {
        let d = CallQueue {
            domain: "trainingdomain1".into(),
            callqueue: "801".into(),
            description: "Queue One".into(),
            dispatch: DispatchType::RingAll,
        }
        .descriptor();
        assert_eq!(d.path(), "/domains/trainingdomain1/callqueues");
        assert_eq!(d.update_path(), "/domains/trainingdomain1/callqueues/801");
        let body = d.merged_body();
        assert_eq!(body["callqueue-dispatch-type"], "Ring All");
        assert_eq!(body["callqueue-agent-dispatch-timeout-seconds"], 12);
    }

    #[test]
    fn test_park_has_no_queue_statistics() {
        let body = CallPark {
            domain: "d".into(),
            callqueue: "701".into(),
            description: "Park One".into(),
        }
        .descriptor()
        .merged_body();
        assert_eq!(body["callqueue-dispatch-type"], "Call Park");
        assert!(!body.contains_key("callqueue-calculate-statistics"));
    }

    #[test]
    fn test_agent_path_and_fields() {
        let d = CallQueueAgent {
            domain: "d".into(),
            callqueue: "801".into(),
            agent_extension: "2004".into(),
        }
        .descriptor();
        assert_eq!(d.path(), "/domains/d/callqueues/801/agents");
        assert_eq!(d.update_path(), "/domains/d/callqueues/801/agents/2004");
        let body = d.merged_body();
        assert_eq!(body["callqueue-agent-id"], "2004");
        assert_eq!(body["domain"], "d");
    }
}
