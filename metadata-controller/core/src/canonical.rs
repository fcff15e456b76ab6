use crate::Labels;

/// A workload's canonical service identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanonicalService {
    pub name: String,
    pub revision: String,
}

/// Derives a canonical service from a workload's labels.
pub trait ResolveCanonicalService {
    fn canonical_service(&self, labels: &Labels, workload_name: &str) -> CanonicalService;
}

/// Resolves canonical services from the well-known service labels, falling back to the logical
/// workload name and the `latest` revision.
#[derive(Copy, Clone, Debug, Default)]
pub struct WellKnownLabels(());

// === impl WellKnownLabels ===

impl WellKnownLabels {
    pub const NAME_LABELS: [&'static str; 3] = [
        "service.istio.io/canonical-name",
        "app.kubernetes.io/name",
        "app",
    ];

    pub const REVISION_LABELS: [&'static str; 3] = [
        "service.istio.io/canonical-revision",
        "app.kubernetes.io/version",
        "version",
    ];

    pub const DEFAULT_REVISION: &'static str = "latest";

    fn first<'l>(labels: &'l Labels, keys: &[&str]) -> Option<&'l str> {
        keys.iter().find_map(|k| labels.get(*k)).map(String::as_str)
    }
}

impl ResolveCanonicalService for WellKnownLabels {
    fn canonical_service(&self, labels: &Labels, workload_name: &str) -> CanonicalService {
        let name = Self::first(labels, &Self::NAME_LABELS).unwrap_or(workload_name);
        let revision =
            Self::first(labels, &Self::REVISION_LABELS).unwrap_or(Self::DEFAULT_REVISION);
        CanonicalService {
            name: name.to_string(),
            revision: revision.to_string(),
        }
    }
}

impl<F> ResolveCanonicalService for F
where
    F: Fn(&Labels, &str) -> CanonicalService,
{
    #[inline]
    fn canonical_service(&self, labels: &Labels, workload_name: &str) -> CanonicalService {
        (self)(labels, workload_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    fn resolve(labels: Labels) -> CanonicalService {
        WellKnownLabels::default().canonical_service(&labels, "checkout")
    }

    #[test]
    fn defaults_to_workload_name() {
        assert_eq!(
            resolve(Labels::default()),
            CanonicalService {
                name: "checkout".to_string(),
                revision: "latest".to_string(),
            }
        );
    }

    #[test]
    fn label_precedence() {
        for (labels, name, revision) in [
            (
                btreemap! {
                    "app".to_string() => "app".to_string(),
                    "version".to_string() => "v1".to_string(),
                },
                "app",
                "v1",
            ),
            (
                btreemap! {
                    "app".to_string() => "app".to_string(),
                    "app.kubernetes.io/name".to_string() => "k8s-name".to_string(),
                    "version".to_string() => "v1".to_string(),
                    "app.kubernetes.io/version".to_string() => "v2".to_string(),
                },
                "k8s-name",
                "v2",
            ),
            (
                btreemap! {
                    "app".to_string() => "app".to_string(),
                    "app.kubernetes.io/name".to_string() => "k8s-name".to_string(),
                    "service.istio.io/canonical-name".to_string() => "canonical".to_string(),
                    "app.kubernetes.io/version".to_string() => "v2".to_string(),
                    "service.istio.io/canonical-revision".to_string() => "v3".to_string(),
                },
                "canonical",
                "v3",
            ),
        ] {
            let svc = resolve(labels);
            assert_eq!(svc.name, name);
            assert_eq!(svc.revision, revision);
        }
    }

    #[test]
    fn closures_resolve() {
        let fixed = |_: &Labels, name: &str| CanonicalService {
            name: name.to_uppercase(),
            revision: "pinned".to_string(),
        };
        let svc = fixed.canonical_service(&Labels::default(), "checkout");
        assert_eq!(svc.name, "CHECKOUT");
        assert_eq!(svc.revision, "pinned");
    }
}
