use crate::{metrics, Index, SharedIndex};
use kubert::index::IndexNamespacedResource;
use maplit::{btreemap, convert_args};
use workload_metadata_controller_core::{OwnerReference, Workload};
use workload_metadata_controller_k8s_api::{self as k8s, api::core::v1::PodIP};

#[test]
fn indexes_scheduled_pods() {
    let test = TestConfig::default();

    let mut pod = mk_pod("ns-0", "web-5d4f8c7b9-x7k2p", Some("node-1"));
    pod.metadata.generate_name = Some("web-5d4f8c7b9-".to_string());
    pod.metadata.labels = Some(convert_args!(btreemap!(
        "app" => "web",
        "pod-template-hash" => "5d4f8c7b9",
    )));
    pod.metadata.owner_references = Some(vec![
        k8s::OwnerReference {
            kind: "ReplicaSet".to_string(),
            name: "web-5d4f8c7b9".to_string(),
            controller: Some(true),
            ..Default::default()
        },
        k8s::OwnerReference {
            kind: "Example".to_string(),
            name: "web".to_string(),
            ..Default::default()
        },
    ]);
    test.index.write().apply(pod);

    let workloads = test.index.read().workloads_on_node("node-1");
    assert_eq!(workloads.len(), 1);
    assert_eq!(
        *workloads[0],
        Workload {
            name: "web-5d4f8c7b9-x7k2p".to_string(),
            namespace: "ns-0".to_string(),
            generate_name: Some("web-5d4f8c7b9-".to_string()),
            ips: vec!["10.0.0.1".to_string(), "fd00::1".to_string()],
            containers: vec!["app".to_string(), "proxy".to_string()],
            labels: convert_args!(btreemap!(
                "app" => "web",
                "pod-template-hash" => "5d4f8c7b9",
            )),
            owner_references: vec![
                OwnerReference {
                    kind: "ReplicaSet".to_string(),
                    name: "web-5d4f8c7b9".to_string(),
                    controller: true,
                },
                OwnerReference {
                    kind: "Example".to_string(),
                    name: "web".to_string(),
                    controller: false,
                },
            ],
        }
    );

    assert!(test.index.read().workloads_on_node("node-2").is_empty());
}

#[test]
fn workloads_are_ordered_by_namespace_and_name() {
    let test = TestConfig::default();
    for (ns, name) in [("ns-1", "pod-a"), ("ns-0", "pod-b"), ("ns-0", "pod-a")] {
        test.index.write().apply(mk_pod(ns, name, Some("node-1")));
    }

    assert_eq!(
        names(&test.index, "node-1"),
        [("ns-0", "pod-a"), ("ns-0", "pod-b"), ("ns-1", "pod-a")]
            .map(|(ns, n)| (ns.to_string(), n.to_string()))
    );
}

#[test]
fn updates_replace_workloads() {
    let test = TestConfig::default();
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-0", Some("node-1")));

    let mut pod = mk_pod("ns-0", "pod-0", Some("node-1"));
    pod.metadata.labels = Some(convert_args!(btreemap!("version" => "v2")));
    test.index.write().apply(pod);

    let workloads = test.index.read().workloads_on_node("node-1");
    assert_eq!(workloads.len(), 1);
    assert_eq!(workloads[0].labels.get("version").map(String::as_str), Some("v2"));
    assert_eq!(test.index.read().len(), 1);
}

#[test]
fn pods_move_between_nodes() {
    let test = TestConfig::default();
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-0", Some("node-1")));
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-0", Some("node-2")));

    assert!(test.index.read().workloads_on_node("node-1").is_empty());
    assert_eq!(names(&test.index, "node-2"), [pod_ref("ns-0", "pod-0")]);
    assert_eq!(test.index.read().len(), 1);
}

#[test]
fn unscheduled_pods_are_not_indexed() {
    let test = TestConfig::default();
    test.index.write().apply(mk_pod("ns-0", "pod-0", None));
    test.index.write().apply(mk_pod("ns-0", "pod-1", Some("")));
    assert!(test.index.read().is_empty());
}

#[test]
fn terminated_pods_are_removed() {
    let test = TestConfig::default();
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-0", Some("node-1")));
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-1", Some("node-1")));

    for (name, phase) in [("pod-0", "Succeeded"), ("pod-1", "Failed")] {
        let mut pod = mk_pod("ns-0", name, Some("node-1"));
        if let Some(status) = pod.status.as_mut() {
            status.phase = Some(phase.to_string());
        }
        test.index.write().apply(pod);
    }

    assert!(test.index.read().workloads_on_node("node-1").is_empty());
    assert!(test.index.read().is_empty());
}

#[test]
fn deleted_pods_are_removed() {
    let test = TestConfig::default();
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-0", Some("node-1")));
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-1", Some("node-1")));

    <Index as IndexNamespacedResource<k8s::Pod>>::delete(
        &mut test.index.write(),
        "ns-0".to_string(),
        "pod-0".to_string(),
    );
    assert_eq!(names(&test.index, "node-1"), [pod_ref("ns-0", "pod-1")]);

    // Unknown pods are ignored.
    <Index as IndexNamespacedResource<k8s::Pod>>::delete(
        &mut test.index.write(),
        "ns-0".to_string(),
        "pod-9".to_string(),
    );
    assert_eq!(test.index.read().len(), 1);
}

#[test]
fn reset_replaces_contents() {
    let test = TestConfig::default();
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-0", Some("node-1")));
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-1", Some("node-1")));

    test.index.write().reset(
        vec![
            mk_pod("ns-0", "pod-1", Some("node-1")),
            mk_pod("ns-1", "pod-2", Some("node-2")),
        ],
        [(
            "ns-0".to_string(),
            ["pod-0".to_string()].into_iter().collect(),
        )]
        .into_iter()
        .collect(),
    );

    assert_eq!(names(&test.index, "node-1"), [pod_ref("ns-0", "pod-1")]);
    assert_eq!(names(&test.index, "node-2"), [pod_ref("ns-1", "pod-2")]);
}

#[test]
fn metrics_report_node_sizes() {
    let test = TestConfig::default();
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-0", Some("node-1")));
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-1", Some("node-1")));
    test.index
        .write()
        .apply(mk_pod("ns-0", "pod-2", Some("node-2")));

    let mut reg = prometheus_client::registry::Registry::default();
    metrics::register(
        reg.sub_registry_with_prefix("workload_index"),
        test.index.clone(),
    );

    let mut text = String::new();
    prometheus_client::encoding::text::encode(&mut text, &reg).expect("metrics must encode");
    for line in [
        "workload_index_nodes 2",
        r#"workload_index_workloads{node="node-1"} 2"#,
        r#"workload_index_workloads{node="node-2"} 1"#,
    ] {
        assert!(text.contains(line), "missing {line:?} in:\n{text}");
    }
}

struct TestConfig {
    index: SharedIndex,
    _tracing: tracing::subscriber::DefaultGuard,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            index: Index::shared(),
            _tracing: init_tracing(),
        }
    }
}

fn mk_pod(ns: &str, name: &str, node: Option<&str>) -> k8s::Pod {
    k8s::Pod {
        metadata: k8s::ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(k8s::PodSpec {
            node_name: node.map(Into::into),
            containers: ["app", "proxy"]
                .into_iter()
                .map(|name| k8s::Container {
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }),
        status: Some(k8s::PodStatus {
            phase: Some("Running".to_string()),
            pod_ips: Some(vec![
                PodIP {
                    ip: "10.0.0.1".to_string(),
                },
                PodIP {
                    ip: "fd00::1".to_string(),
                },
            ]),
            ..Default::default()
        }),
    }
}

fn names(index: &SharedIndex, node: &str) -> Vec<(String, String)> {
    index
        .read()
        .workloads_on_node(node)
        .iter()
        .map(|w| (w.namespace.clone(), w.name.clone()))
        .collect()
}

fn pod_ref(ns: &str, name: &str) -> (String, String) {
    (ns.to_string(), name.to_string())
}

fn init_tracing() -> tracing::subscriber::DefaultGuard {
    tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .finish(),
    )
}
