fn main() {
    // Always rerun if the build script itself changes.
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=proto");

    // Handle code generation for gRPC service definitions. `Binding` is used
    // as a map key throughout the scheduler and adapter, so it needs Eq/Hash
    // on top of prost's PartialEq.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .type_attribute("sluice.adapter.v1.Binding", "#[derive(Eq, Hash)]")
        .compile_protos(
            &[
                "proto/sluice/logs/v1/envelope.proto",
                "proto/sluice/logs/v1/egress.proto",
                "proto/sluice/adapter/v1/adapter.proto",
            ],
            &["proto"],
        )
        .expect("failed to build gRPC service definitions for sluice");
}
