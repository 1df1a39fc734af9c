use {
    http::header::HeaderValue,
    pretty_assertions::assert_eq,
    qs_delegation_client::{ClientConfig, DelegationClient},
    qs_signature::{canonicalize, Operation, SignatureError, SigningTimestamp},
    qs_signing_service::{serve, Credentials, Signer, SigningService},
    std::{collections::BTreeMap, time::Duration},
    tokio::{net::TcpListener, sync::oneshot},
};

const EXPIRES: i64 = 1489571836;

fn in_process() -> DelegationClient<SigningService> {
    let service = SigningService::new(Signer::new(Credentials::new("AKID", "SECRET").unwrap()));
    DelegationClient::new(service, "http://127.0.0.1:9000", Duration::from_secs(5))
}

fn list_objects() -> Operation {
    let mut params = BTreeMap::new();
    params.insert("prefix".to_string(), "test/".to_string());
    Operation::builder()
        .uri("https://pek3a.qingstor.com:443/bucket?prefix=test/")
        .params(params)
        .expires(EXPIRES)
        .build()
        .unwrap()
}

fn put_object() -> Operation {
    let mut op = Operation::builder()
        .method("PUT")
        .uri("https://pek3a.qingstor.com:443/bucket/test-file")
        .body(&b"Hello"[..])
        .build()
        .unwrap();
    op.headers_mut().insert("content-length", HeaderValue::from_static("5"));
    op.headers_mut().insert("x-qs-date", HeaderValue::from_static("Wed, 15 Mar 2017 08:57:16 GMT"));
    op
}

#[test_log::test(tokio::test)]
async fn sign_and_apply_by_query() {
    let client = in_process();
    let mut op = list_objects();
    client.sign_and_apply_by_query(&mut op).await.unwrap();

    assert_eq!(op.params().len(), 4);
    assert_eq!(op.params()["access_key_id"], "AKID");
    assert_eq!(op.params()["signature"], "a1xLNCjtokGUIl7naluQbLsuGKTU79QBDuN8OeZ24vQ=");
    assert_eq!(op.params()["expires"], "1489571836");
    assert_eq!(op.params()["prefix"], "test/");
    assert!(op.headers().is_empty());
}

#[test_log::test(tokio::test)]
async fn sign_and_apply_by_header() {
    let client = in_process();
    let mut op = put_object();
    client.sign_and_apply_by_header(&mut op).await.unwrap();

    assert_eq!(op.headers().len(), 3);
    assert_eq!(op.headers().get("authorization").unwrap(), "QS AKID:2MPtnI/Whf226wgGdft9CPHeoGQabIdwPXeL1/Eh9hk=");
    assert_eq!(op.headers().get("content-length").unwrap(), "5");
    assert!(op.params().is_empty());

    // Signing again replaces the header instead of adding a second one.
    client.sign_and_apply_by_header(&mut op).await.unwrap();
    assert_eq!(op.headers().get_all("authorization").iter().count(), 1);
}

#[test_log::test(tokio::test)]
async fn channels_agree() {
    let client = in_process();

    let op = list_objects();
    let by_operation = client.sign_operation_by_query(&op).await.unwrap();
    let sts = canonicalize(&op, SigningTimestamp::Expires(EXPIRES)).unwrap();
    let by_string = client.sign_string_to_sign_by_query(&sts, EXPIRES).await.unwrap();
    assert_eq!(by_operation, by_string);

    let op = put_object();
    let by_operation = client.sign_operation_by_header(&op).await.unwrap();
    let by_string = client.sign_string_to_sign_by_header(&op.header_string_to_sign().unwrap()).await.unwrap();
    assert_eq!(by_operation, by_string);
}

#[test_log::test(tokio::test)]
async fn service_rejection_leaves_operation_untouched() {
    let client = in_process();
    let mut op = put_object();
    op.headers_mut().remove("x-qs-date");

    let e = client.sign_and_apply_by_header(&mut op).await.unwrap_err();
    assert!(matches!(e, SignatureError::Transport(_)));
    assert!(e.to_string().contains("400"), "{}", e);
    assert!(op.headers().get("authorization").is_none());
}

#[test_log::test(tokio::test)]
async fn over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let service = SigningService::new(Signer::new(Credentials::new("AKID", "SECRET").unwrap()));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, service, async move {
        let _ = stop_rx.await;
    }));

    let config = ClientConfig {
        signature_server_port: port,
        ..Default::default()
    };
    let client = DelegationClient::from_config(&config);

    let mut op = list_objects();
    client.sign_and_apply_by_query(&mut op).await.unwrap();
    assert_eq!(op.params()["signature"], "a1xLNCjtokGUIl7naluQbLsuGKTU79QBDuN8OeZ24vQ=");

    let mut op = put_object();
    client.sign_and_apply_by_header(&mut op).await.unwrap();
    assert_eq!(op.headers().get("authorization").unwrap(), "QS AKID:2MPtnI/Whf226wgGdft9CPHeoGQabIdwPXeL1/Eh9hk=");

    stop_tx.send(()).unwrap();
    server.await.unwrap();
}

#[test_log::test(tokio::test)]
async fn connection_refused() {
    // Bind and drop to find a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap().port();
    let config = ClientConfig {
        signature_server_port: port,
        timeout_ms: 2000,
        ..Default::default()
    };
    let client = DelegationClient::from_config(&config);

    let mut op = put_object();
    let e = client.sign_and_apply_by_header(&mut op).await.unwrap_err();
    assert!(matches!(e, SignatureError::Transport(_)), "{:?}", e);
    assert!(op.headers().get("authorization").is_none());
}
