//! Process metadata used when emitting cluster events

/// Environment-derived runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnv {
    /// Pod hostname, reported as the event's reporting instance
    pub hostname: String,

    /// Namespace for events whose volume has no claim
    pub namespace: String,

    /// Running inside a cluster (service account auth instead of kubeconfig)
    pub in_cluster: bool,
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self {
            hostname: "<noname>".to_string(),
            namespace: "default".to_string(),
            in_cluster: false,
        }
    }
}

impl RuntimeEnv {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            hostname: lookup("HOSTNAME")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.hostname),
            namespace: lookup("NAMESPACE")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.namespace),
            in_cluster: lookup("KUBERNETES_SERVICE_HOST").is_some(),
        }
    }
}
