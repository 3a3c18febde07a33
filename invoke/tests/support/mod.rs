use std::{
    cell::RefCell,
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use si_invoke::{Transport, TransportError, WireRequest, WireResponse};

pub const PING_WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
             xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
             xmlns:tns="urn:ping"
             name="Ping" targetNamespace="urn:ping">
    <binding name="PingBinding" type="tns:PingPortType">
        <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
        <operation name="Ping">
            <soap:operation soapAction="urn:ping#Ping"/>
        </operation>
    </binding>
    <service name="PingService">
        <port name="PingPort" binding="tns:PingBinding">
            <soap:address location="http://localhost:8080/ping"/>
        </port>
    </service>
</definitions>"#;

pub const TWO_PORT_WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
             xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
             xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
             xmlns:tns="urn:ping"
             targetNamespace="urn:ping">
    <binding name="PingBinding" type="tns:PingPortType">
        <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
        <operation name="Ping"><soap:operation soapAction="urn:ping#Ping"/></operation>
    </binding>
    <binding name="PingBinding12" type="tns:PingPortType">
        <soap12:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
        <operation name="Ping"><soap12:operation soapAction="urn:ping#Ping"/></operation>
    </binding>
    <service name="PingService">
        <port name="PingPort" binding="tns:PingBinding">
            <soap:address location="http://localhost:8080/ping"/>
        </port>
        <port name="PingPort12" binding="tns:PingBinding12">
            <soap12:address location="http://localhost:8080/ping12"/>
        </port>
    </service>
</definitions>"#;

pub fn write_wsdl(dir: &Path, xml: &str) -> PathBuf {
    let path = dir.join("service.wsdl");
    fs::write(&path, xml).unwrap();
    path
}

pub fn soap11_response(payload: &str) -> WireResponse {
    WireResponse {
        status: 200,
        body: format!(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{payload}</soap:Body></soap:Envelope>"#
        ),
    }
}

pub fn soap11_fault(code: &str, reason: &str) -> WireResponse {
    WireResponse {
        status: 500,
        body: format!(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>{code}</faultcode><faultstring>{reason}</faultstring></soap:Fault></soap:Body></soap:Envelope>"#
        ),
    }
}

/// Answers with queued responses, repeating the last one, and keeps everything sent.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    responses: Rc<RefCell<VecDeque<WireResponse>>>,
    sent: Rc<RefCell<Vec<WireRequest>>>,
}

impl RecordingTransport {
    pub fn new(responses: impl IntoIterator<Item = WireResponse>) -> Self {
        Self {
            responses: Rc::new(RefCell::new(responses.into_iter().collect())),
            sent: Rc::default(),
        }
    }

    pub fn sent(&self) -> Vec<WireRequest> {
        self.sent.borrow().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        self.sent.borrow_mut().push(request.clone());
        let mut responses = self.responses.borrow_mut();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        response.ok_or_else(|| TransportError::Other("no response queued".to_string()))
    }
}
