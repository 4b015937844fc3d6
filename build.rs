//! Generates the `observer.Observer` service glue.
//!
//! Message types are hand-written prost structs in `src/proto.rs`, so the
//! manual builder is used and no `protoc` is needed at build time.

fn main() {
    let get_flows = tonic_build::manual::Method::builder()
        .name("get_flows")
        .route_name("GetFlows")
        .input_type("crate::proto::GetFlowsRequest")
        .output_type("crate::proto::GetFlowsResponse")
        .codec_path("tonic::codec::ProstCodec")
        .server_streaming()
        .build();

    let server_status = tonic_build::manual::Method::builder()
        .name("server_status")
        .route_name("ServerStatus")
        .input_type("crate::proto::ServerStatusRequest")
        .output_type("crate::proto::ServerStatusResponse")
        .codec_path("tonic::codec::ProstCodec")
        .build();

    let observer = tonic_build::manual::Service::builder()
        .name("Observer")
        .package("observer")
        .method(get_flows)
        .method(server_status)
        .build();

    tonic_build::manual::Builder::new().compile(&[observer]);

    println!("cargo:rerun-if-changed=build.rs");
}
