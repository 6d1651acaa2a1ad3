use std::time::Duration;

use volo_grpc_meta::{
    header::GRPC_PROTO_CONTENT_TYPE, metadata, user_agent, Code, Deadline, Error, Metadata,
    MetadataValue, Request, Status,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn client_metadata() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.append("x-request-id", "42");
    metadata.append("x-span-bin", b"\x00\x01\xfe\xff");
    metadata.append("x-request-id", "43");
    metadata
}

#[tokio::test(start_paused = true)]
async fn server_sees_what_client_sent() {
    init_tracing();

    let req = Request::builder()
        .method("POST")
        .scheme("https")
        .path("/echo.Echo/Unary")
        .authority("echo.example.com")
        .content_type(GRPC_PROTO_CONTENT_TYPE)
        .message_encoding("gzip")
        .user_agent(user_agent(Some("echo-client/0.1")))
        .metadata(client_metadata())
        .timeout(Duration::from_secs(3))
        .build()
        .unwrap();

    tokio::time::advance(Duration::from_secs(1)).await;
    let wire = req.to_headers();

    // server side
    let deadline = Deadline::from_headers(&wire).unwrap().unwrap();
    assert_eq!(deadline.time_remaining(), Duration::from_secs(2));
    assert_eq!(deadline, *req.deadline().unwrap());

    let metadata = metadata::decode(&wire).unwrap();
    assert_eq!(&metadata, req.metadata().unwrap());
    assert!(!metadata.contains_key("user-agent"));
    assert!(!metadata.contains_key("grpc-encoding"));
}

#[test]
fn incoming_binary_metadata_must_be_base64() {
    init_tracing();

    let wire = [
        (":path", "/echo.Echo/Unary"),
        ("x-ok", "fine"),
        ("x-span-bin", "%%%"),
    ];
    let err = Metadata::decode(wire).unwrap_err();
    assert!(matches!(err, Error::InvalidBinaryMetadata { .. }));
    assert_eq!(Status::from(err).code(), Code::InvalidArgument);
}

#[test]
fn incoming_timeout_must_be_well_formed() {
    init_tracing();

    let err = Deadline::from_headers([("grpc-timeout", "1.5S")]).unwrap_err();
    assert_eq!(Status::from(err).code(), Code::InvalidArgument);
}

#[test]
fn metadata_accepts_plain_pairs() {
    let headers = metadata::encode(vec![
        ("x-a", MetadataValue::from("1")),
        ("x-b-bin", MetadataValue::from(vec![0u8, 255])),
    ])
    .unwrap();
    let values: Vec<&str> = headers.iter().map(|(_, v)| v.as_str()).collect();
    assert_eq!(values, vec!["1", "AP8"]);
}

#[test]
fn status_trailers_carry_escaped_message() {
    let status = Status::deadline_exceeded("timeout after 3s: 100% of budget");
    let trailers = status.to_trailers();
    assert_eq!(
        trailers[1].1.as_str(),
        "timeout after 3s: 100%25 of budget"
    );
    assert_eq!(Status::from_headers(&trailers).unwrap(), Some(status));
}
