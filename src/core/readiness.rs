use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum ResourceState {
    Pending,
    Ready,
    /// Load failed or timed out; a substitute is in use.
    Fallback(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReadinessState {
    Pending,
    Ready,
    TimedOut { missing: Vec<String> },
}

/// Join-all over named resources with an overall deadline.
///
/// Setup proceeds once every declared resource is ready or substituted, or
/// the deadline passed.
#[derive(Clone, Debug)]
pub struct Readiness {
    resources: BTreeMap<String, ResourceState>,
    started_at: f64,
    timeout_sec: f64,
}

impl Readiness {
    pub fn new(started_at: f64, timeout_sec: f64) -> Self {
        Self {
            resources: BTreeMap::new(),
            started_at,
            timeout_sec: timeout_sec.max(0.0),
        }
    }

    pub fn declare(&mut self, id: &str) {
        self.resources
            .entry(id.to_string())
            .or_insert(ResourceState::Pending);
    }

    pub fn resolve(&mut self, id: &str) {
        self.resources.insert(id.to_string(), ResourceState::Ready);
    }

    pub fn fallback(&mut self, id: &str, reason: impl Into<String>) {
        self.resources
            .insert(id.to_string(), ResourceState::Fallback(reason.into()));
    }

    pub fn state(&self, id: &str) -> Option<&ResourceState> {
        self.resources.get(id)
    }

    /// Ready or substituted.
    pub fn is_ready(&self, id: &str) -> bool {
        matches!(
            self.resources.get(id),
            Some(ResourceState::Ready | ResourceState::Fallback(_))
        )
    }

    pub fn all_ready(&self) -> bool {
        self.resources
            .values()
            .all(|s| !matches!(s, ResourceState::Pending))
    }

    pub fn pending(&self) -> Vec<String> {
        self.resources
            .iter()
            .filter(|(_, s)| matches!(s, ResourceState::Pending))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn poll(&self, now: f64) -> ReadinessState {
        if self.all_ready() {
            ReadinessState::Ready
        } else if now - self.started_at >= self.timeout_sec {
            ReadinessState::TimedOut {
                missing: self.pending(),
            }
        } else {
            ReadinessState::Pending
        }
    }
}
