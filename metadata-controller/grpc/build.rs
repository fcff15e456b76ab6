const PROTOS: &[&str] = &[
    "proto/envoy/config/core/v3/base.proto",
    "proto/envoy/service/discovery/v3/discovery.proto",
    "proto/istio/telemetry/workloadmetadata/v1/workload_metadata.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The controller only serves workload metadata; it never acts as a client.
    tonic_build::configure()
        .build_client(false)
        .build_server(true)
        .compile_protos(PROTOS, &["proto"])?;

    // recompile protobufs only if any of the proto files changes.
    for file in PROTOS {
        println!("cargo:rerun-if-changed={file}");
    }
    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
