mod support;

use std::{collections::BTreeMap, fs, time::Duration};

use si_invoke::{
    run, Interrupt, InvocationConfig, InvokeError, XmlAdapter, XmlElement, XmlFragment,
};
use support::{
    soap11_fault, soap11_response, write_wsdl, RecordingTransport, PING_WSDL, TWO_PORT_WSDL,
};

fn ping_config(dir: &std::path::Path, wsdl: &str) -> InvocationConfig {
    let wsdl = write_wsdl(dir, wsdl);
    let mut config = InvocationConfig::new(
        wsdl.to_string_lossy(),
        "urn:ping",
        "PingService",
        "Ping",
        XmlFragment::Text(r#"<p:ping xmlns:p="urn:ping"><p:id>1</p:id></p:ping>"#.to_string()),
    );
    config.output_dir = dir.join("out");
    config
}

fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn single_invocation_writes_request_and_response() {
    let dir = tempfile::tempdir().unwrap();
    let config = ping_config(dir.path(), PING_WSDL);
    let adapter = XmlAdapter::default();
    let transport = RecordingTransport::new([soap11_response("<pong>ok</pong>")]);
    let (interrupt, _handle) = Interrupt::new();
    let mut sink = BTreeMap::new();

    let outcome = run(
        &config,
        &adapter,
        Box::new(transport.clone()),
        "exec-1",
        &interrupt,
        &mut sink,
    )
    .unwrap();

    assert_eq!(outcome.invocations, 1);
    assert!(!outcome.interrupted);
    assert!(sink.is_empty());

    let execution_dir = dir.path().join("out").join("exec-1");
    assert_eq!(file_names(&execution_dir), ["request.xml", "response.xml"]);

    let request = fs::read_to_string(execution_dir.join("request.xml")).unwrap();
    assert!(request.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert_eq!(
        adapter.parse(&request).unwrap(),
        adapter.fragment(&config.request).unwrap()
    );
    let response = fs::read_to_string(execution_dir.join("response.xml")).unwrap();
    let response = adapter.parse(&response).unwrap();
    assert_eq!(response.root().name, "pong");
    assert_eq!(response.root().text(), "ok");
    assert_eq!(&response, &outcome.exchange.response);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].endpoint, "http://localhost:8080/ping");
    assert!(sent[0]
        .headers
        .contains(&("SOAPAction".to_string(), "\"urn:ping#Ping\"".to_string())));
}

#[test]
fn ambiguous_port_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let config = ping_config(dir.path(), TWO_PORT_WSDL);
    let transport = RecordingTransport::new([soap11_response("<pong/>")]);
    let (interrupt, _handle) = Interrupt::new();

    let err = run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, InvokeError::AmbiguousPort { .. }));
    assert!(transport.sent().is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn configured_port_selects_soap12_binding() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), TWO_PORT_WSDL);
    config.port = Some("PingPort12".to_string());
    let transport = RecordingTransport::new([si_invoke::WireResponse {
        status: 200,
        body: r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><pong/></env:Body></env:Envelope>"#.to_string(),
    }]);
    let (interrupt, _handle) = Interrupt::new();

    run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].endpoint, "http://localhost:8080/ping12");
    assert!(sent[0].body.contains("http://www.w3.org/2003/05/soap-envelope"));
}

#[test]
fn endpoint_override_wins_over_wsdl_address() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.endpoint = Some("http://override.test/ping".to_string());
    let transport = RecordingTransport::new([soap11_response("<pong/>")]);
    let (interrupt, _handle) = Interrupt::new();

    run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap();

    assert_eq!(transport.sent()[0].endpoint, "http://override.test/ping");
}

#[test]
fn configured_headers_are_sent_in_the_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.headers = vec![
        XmlFragment::Text(r#"<a:token xmlns:a="urn:auth">secret</a:token>"#.to_string()),
        XmlFragment::Element(XmlElement::new("trace").with_attribute("id", "7")),
    ];
    let transport = RecordingTransport::new([soap11_response("<pong/>")]);
    let (interrupt, _handle) = Interrupt::new();

    run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap();

    let body = &transport.sent()[0].body;
    let document = roxmltree::Document::parse(body).unwrap();
    let header = document
        .descendants()
        .find(|n| n.tag_name().name() == "Header")
        .unwrap();
    let names: Vec<_> = header
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    assert_eq!(names, ["token", "trace"]);

    // headers travel on the wire only
    let request =
        fs::read_to_string(dir.path().join("out/default/request.xml")).unwrap();
    assert!(!request.contains("token"));
}

#[test]
fn repeats_until_condition_then_extracts_properties() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.repeat_until = Some("/s:status/s:state = 'done'".to_string());
    config.repeat_interval = Duration::from_millis(10);
    config.properties = BTreeMap::from([
        ("job.state".to_string(), "/s:status/s:state".to_string()),
        ("job.id".to_string(), "/s:status/@id".to_string()),
    ]);
    let namespaces = BTreeMap::from([("s".to_string(), "urn:status".to_string())]);
    let adapter = XmlAdapter::new(namespaces, false);
    let status = |state: &str| {
        soap11_response(&format!(
            r#"<status xmlns="urn:status" id="9"><state>{state}</state></status>"#
        ))
    };
    let transport =
        RecordingTransport::new([status("queued"), status("running"), status("done")]);
    let (interrupt, _handle) = Interrupt::new();
    let mut sink = BTreeMap::from([("job.state".to_string(), "stale".to_string())]);

    let outcome = run(
        &config,
        &adapter,
        Box::new(transport.clone()),
        "poll",
        &interrupt,
        &mut sink,
    )
    .unwrap();

    assert_eq!(outcome.invocations, 3);
    assert_eq!(transport.sent().len(), 3);
    assert_eq!(outcome.properties["job.state"], "done");
    assert_eq!(sink["job.state"], "done");
    assert_eq!(sink["job.id"], "9");

    // the files hold the last exchange only
    let response =
        fs::read_to_string(dir.path().join("out/poll/response.xml")).unwrap();
    assert!(response.contains("done"));
}

#[test]
fn soap_fault_is_fatal_and_leaves_the_request_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = ping_config(dir.path(), PING_WSDL);
    let transport = RecordingTransport::new([soap11_fault("soap:Server", "boom")]);
    let (interrupt, _handle) = Interrupt::new();

    let err = run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, InvokeError::Fault(fault) if fault.reason == "boom"));
    let execution_dir = dir.path().join("out/default");
    assert_eq!(file_names(&execution_dir), ["request.xml"]);
}

#[test]
fn invalid_property_expression_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.properties = BTreeMap::from([("bad".to_string(), "/a/[".to_string())]);
    let transport = RecordingTransport::new([soap11_response("<pong/>")]);
    let (interrupt, _handle) = Interrupt::new();

    let err = run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, InvokeError::Property { name, .. } if name == "bad"));
    assert!(transport.sent().is_empty());
}

#[test]
fn wrong_namespace_is_service_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.namespace = "urn:other".to_string();
    let (interrupt, _handle) = Interrupt::new();

    let err = run(
        &config,
        &XmlAdapter::default(),
        Box::new(RecordingTransport::default()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, InvokeError::ServiceNotFound { .. }));
}

#[test]
fn blank_repeat_condition_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.repeat_until = Some("  ".to_string());
    let transport = RecordingTransport::new([soap11_response("<pong/>")]);
    let (interrupt, _handle) = Interrupt::new();

    let err = run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, InvokeError::Condition(_)));
    assert!(transport.sent().is_empty());
}

#[test]
fn malformed_structured_request_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.request = XmlFragment::Element(
        XmlElement::new("auth:token").with_child(XmlElement::new("1 bad")),
    );
    let transport = RecordingTransport::new([soap11_response("<pong/>")]);
    let (interrupt, _handle) = Interrupt::new();

    let err = run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, InvokeError::Fragment { what: "request", .. }));
    assert!(transport.sent().is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn malformed_structured_header_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ping_config(dir.path(), PING_WSDL);
    config.headers = vec![XmlFragment::Element(
        XmlElement::new("auth:token").with_text("secret"),
    )];
    let transport = RecordingTransport::new([soap11_response("<pong/>")]);
    let (interrupt, _handle) = Interrupt::new();

    let err = run(
        &config,
        &XmlAdapter::default(),
        Box::new(transport.clone()),
        "default",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, InvokeError::Fragment { what: "header", .. }));
    assert!(transport.sent().is_empty());
}

#[test]
fn service_declared_in_an_imported_wsdl_is_invoked() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("ping")).unwrap();
    fs::write(dir.path().join("ping").join("ping.wsdl"), PING_WSDL).unwrap();
    let config = ping_config(
        dir.path(),
        r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" targetNamespace="urn:facade">
            <import namespace="urn:ping" location="ping/ping.wsdl"/>
        </definitions>"#,
    );
    let adapter = XmlAdapter::default();
    let transport = RecordingTransport::new([soap11_response("<pong>ok</pong>")]);
    let (interrupt, _handle) = Interrupt::new();

    let outcome = run(
        &config,
        &adapter,
        Box::new(transport.clone()),
        "exec-1",
        &interrupt,
        &mut BTreeMap::new(),
    )
    .unwrap();

    assert_eq!(outcome.exchange.response.root().text(), "ok");
    let sent = transport.sent();
    assert_eq!(sent[0].endpoint, "http://localhost:8080/ping");
    assert!(sent[0]
        .headers
        .contains(&("SOAPAction".to_string(), "\"urn:ping#Ping\"".to_string())));
}
