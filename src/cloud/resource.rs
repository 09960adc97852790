use serde_json::Value;

/// Identity of one remote resource: opaque id plus the service scope that
/// owns it. Immutable once issued; the polling loops look the referenced
/// resource up fresh on every iteration rather than holding a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    /// Service scope, e.g. "compute" or "orchestration"
    pub service: String,
    /// Collection path within the service, e.g. "servers" or "stacks"
    pub path: String,
    /// Backend-issued identifier
    pub id: String,
}

impl ResourceRef {
    #[must_use]
    pub fn new(service: &str, path: &str, id: &str) -> Self {
        Self {
            service: service.to_string(),
            path: path.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.service, self.path, self.id)
    }
}

/// One snapshot of a remote resource as the backend currently reports it.
///
/// The representation is kept raw because differing services disagree on
/// which attribute carries the lifecycle status ("status",
/// "provision_state", ...). Callers name the attribute in their
/// [`PollSpec`](crate::poll::PollSpec) and the accessors here pull it out.
#[derive(Debug, Clone)]
pub struct ResourceState {
    pub raw: Value,
}

impl ResourceState {
    #[must_use]
    pub const fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// String attribute lookup against the raw representation
    #[must_use]
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.raw.get(name).and_then(Value::as_str)
    }

    /// The lifecycle status under the caller-named attribute, if the
    /// backend exposes it at all
    #[must_use]
    pub fn status(&self, attribute: &str) -> Option<&str> {
        self.attr_str(attribute)
    }

    /// Backend-provided explanation for the current status, verbatim
    #[must_use]
    pub fn status_reason(&self) -> Option<&str> {
        self.attr_str("status_reason")
    }

    /// Completion percentage, where the backend reports one
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        self.raw.get("progress").and_then(Value::as_f64)
    }
}

/// Outcome of one lookup against the control plane.
///
/// `Missing` is a well-formed answer, not an error: delete waits succeed
/// on it and status waits treat it as fatal. Transport faults stay in the
/// error channel so the two are never conflated.
#[derive(Debug, Clone)]
pub enum Fetch {
    Found(ResourceState),
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_under_named_attribute() {
        let state = ResourceState::new(json!({
            "provision_state": "deploying",
            "status": "ignored",
        }));
        assert_eq!(state.status("provision_state"), Some("deploying"));
        assert_eq!(state.status("status"), Some("ignored"));
        assert_eq!(state.status("missing"), None);
    }

    #[test]
    fn test_non_string_status_is_absent() {
        let state = ResourceState::new(json!({ "status": 42 }));
        assert_eq!(state.status("status"), None);
    }

    #[test]
    fn test_progress_and_reason() {
        let state = ResourceState::new(json!({
            "status": "BUILD",
            "status_reason": "scheduling",
            "progress": 40.0,
        }));
        assert_eq!(state.status_reason(), Some("scheduling"));
        assert_eq!(state.progress(), Some(40.0));
    }

    #[test]
    fn test_resource_ref_display() {
        let r = ResourceRef::new("compute", "servers", "abc-123");
        assert_eq!(r.to_string(), "compute/servers/abc-123");
    }
}
