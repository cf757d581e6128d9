#[macro_use]
extern crate criterion;

use criterion::Criterion;
use std::sync::Arc;

use cimxml::{
    CimOperationRequestDecoder, DecoderSettings, HttpMessage, MessageQueue, QueueMessage,
    QueueRegistry,
};

struct NullQueue;

impl MessageQueue for NullQueue {
    fn queue_id(&self) -> u32 {
        1
    }

    fn enqueue(&self, _message: QueueMessage) {}
}

fn request(method: &str, params: &str) -> Vec<u8> {
    let body = format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="1" PROTOCOLVERSION="1.0"><SIMPLEREQ>"#,
            r#"<IMETHODCALL NAME="{}"><LOCALNAMESPACEPATH><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></LOCALNAMESPACEPATH>"#,
            "{}</IMETHODCALL></SIMPLEREQ></MESSAGE></CIM>"
        ),
        method, params
    );
    let head = format!(
        concat!(
            "POST /cimom HTTP/1.1\r\nHost: localhost\r\n",
            "Content-Type: application/xml; charset=utf-8\r\n",
            "CIMOperation: MethodCall\r\nCIMMethod: {}\r\nCIMObject: root/cimv2\r\n",
            "Content-Length: {}\r\n\r\n"
        ),
        method,
        body.len()
    );
    [head.into_bytes(), body.into_bytes()].concat()
}

fn create_instance_params(properties: usize) -> String {
    let mut instance = String::from(r#"<IPARAMVALUE NAME="NewInstance"><INSTANCE CLASSNAME="CIM_Disk">"#);
    for i in 0..properties {
        instance.push_str(&format!(
            r#"<PROPERTY NAME="Prop{i}" TYPE="uint32"><VALUE>{i}</VALUE></PROPERTY>"#
        ));
    }
    instance.push_str("</INSTANCE></IPARAMVALUE>");
    instance
}

fn criterion_benchmark(c: &mut Criterion) {
    let decoder = CimOperationRequestDecoder::new(
        Arc::new(NullQueue),
        Arc::new(QueueRegistry::new()),
        DecoderSettings::default(),
    );

    let get_class = HttpMessage::parse(
        &request(
            "GetClass",
            r#"<IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="CIM_Disk"/></IPARAMVALUE>"#,
        ),
        1,
    )
    .unwrap();
    c.bench_function("decode GetClass", |b| b.iter(|| decoder.decode(&get_class)));

    let create_instance =
        HttpMessage::parse(&request("CreateInstance", &create_instance_params(200)), 1).unwrap();
    c.bench_function("decode CreateInstance with 200 properties", |b| {
        b.iter(|| decoder.decode(&create_instance))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
