//! Hubble JSON export format.
//!
//! `hubble observe -o json` writes one `GetFlowsResponse` object per line.
//! Field names follow protojson (`IP`, `Type`, `Summary`, upper-case enum
//! names). Unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::proto::{
    layer4, Endpoint, Ethernet, Flow, FlowType, Icmp, Ip, IpVersion, Layer4, Tcp, TcpFlags,
    TrafficDirection, Udp, Verdict,
};
use crate::types::to_timestamp;

/// One line of the export.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonEvent {
    pub flow: Option<JsonFlow>,
    #[serde(default)]
    pub node_name: String,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonFlow {
    time: Option<DateTime<Utc>>,
    verdict: Option<String>,
    #[serde(default)]
    drop_reason: u32,
    ethernet: Option<JsonEthernet>,
    #[serde(rename = "IP")]
    ip: Option<JsonIp>,
    l4: Option<JsonLayer4>,
    source: Option<JsonEndpoint>,
    destination: Option<JsonEndpoint>,
    #[serde(rename = "Type")]
    flow_type: Option<String>,
    #[serde(default)]
    node_name: String,
    #[serde(default)]
    source_names: Vec<String>,
    #[serde(default)]
    destination_names: Vec<String>,
    #[serde(default)]
    is_reply: bool,
    traffic_direction: Option<String>,
    #[serde(rename = "Summary", default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct JsonEthernet {
    #[serde(default)]
    source: String,
    #[serde(default)]
    destination: String,
}

#[derive(Debug, Deserialize)]
struct JsonIp {
    #[serde(default)]
    source: String,
    #[serde(default)]
    destination: String,
    #[serde(rename = "ipVersion")]
    ip_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonLayer4 {
    #[serde(rename = "TCP")]
    tcp: Option<JsonTcp>,
    #[serde(rename = "UDP")]
    udp: Option<JsonPorts>,
    #[serde(rename = "ICMPv4")]
    icmpv4: Option<JsonIcmp>,
    #[serde(rename = "ICMPv6")]
    icmpv6: Option<JsonIcmp>,
}

#[derive(Debug, Deserialize)]
struct JsonTcp {
    #[serde(default)]
    source_port: u32,
    #[serde(default)]
    destination_port: u32,
    flags: Option<JsonTcpFlags>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct JsonTcpFlags {
    #[serde(default)]
    fin: bool,
    #[serde(default)]
    syn: bool,
    #[serde(default)]
    rst: bool,
    #[serde(default)]
    psh: bool,
    #[serde(default)]
    ack: bool,
    #[serde(default)]
    urg: bool,
    #[serde(default)]
    ece: bool,
    #[serde(default)]
    cwr: bool,
    #[serde(default)]
    ns: bool,
}

#[derive(Debug, Deserialize)]
struct JsonPorts {
    #[serde(default)]
    source_port: u32,
    #[serde(default)]
    destination_port: u32,
}

#[derive(Debug, Deserialize)]
struct JsonIcmp {
    #[serde(rename = "type", default)]
    icmp_type: u32,
    #[serde(default)]
    code: u32,
}

#[derive(Debug, Deserialize)]
struct JsonEndpoint {
    #[serde(rename = "ID", default)]
    id: u32,
    #[serde(default)]
    identity: u32,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    pod_name: String,
}

impl JsonEvent {
    /// Converts the event into a wire flow, or `None` for non-flow events.
    ///
    /// A flow without its own time inherits the envelope's.
    pub fn into_flow(self) -> Option<Flow> {
        let json = self.flow?;
        let time = json.time.or(self.time).map(to_timestamp);
        let node_name = if json.node_name.is_empty() {
            self.node_name
        } else {
            json.node_name
        };

        Some(Flow {
            time,
            verdict: enum_value(json.verdict.as_deref(), Verdict::from_name),
            drop_reason: json.drop_reason,
            ethernet: json.ethernet.map(|e| Ethernet {
                source: e.source,
                destination: e.destination,
            }),
            ip: json.ip.map(|ip| Ip {
                source: ip.source,
                destination: ip.destination,
                ip_version: enum_value(ip.ip_version.as_deref(), IpVersion::from_name),
            }),
            l4: json.l4.map(JsonLayer4::into_layer4),
            source: json.source.map(JsonEndpoint::into_endpoint),
            destination: json.destination.map(JsonEndpoint::into_endpoint),
            r#type: enum_value(json.flow_type.as_deref(), FlowType::from_name),
            node_name,
            source_names: json.source_names,
            destination_names: json.destination_names,
            reply: json.is_reply,
            traffic_direction: enum_value(
                json.traffic_direction.as_deref(),
                TrafficDirection::from_name,
            ),
            summary: json.summary,
        })
    }
}

impl JsonLayer4 {
    fn into_layer4(self) -> Layer4 {
        let protocol = if let Some(tcp) = self.tcp {
            let flags = tcp.flags.unwrap_or_default();
            Some(layer4::Protocol::Tcp(Tcp {
                source_port: tcp.source_port,
                destination_port: tcp.destination_port,
                flags: Some(TcpFlags {
                    fin: flags.fin,
                    syn: flags.syn,
                    rst: flags.rst,
                    psh: flags.psh,
                    ack: flags.ack,
                    urg: flags.urg,
                    ece: flags.ece,
                    cwr: flags.cwr,
                    ns: flags.ns,
                }),
            }))
        } else if let Some(udp) = self.udp {
            Some(layer4::Protocol::Udp(Udp {
                source_port: udp.source_port,
                destination_port: udp.destination_port,
            }))
        } else if let Some(icmp) = self.icmpv4 {
            Some(layer4::Protocol::Icmpv4(icmp.into_icmp()))
        } else {
            self.icmpv6
                .map(|icmp| layer4::Protocol::Icmpv6(icmp.into_icmp()))
        };

        Layer4 { protocol }
    }
}

impl JsonIcmp {
    fn into_icmp(self) -> Icmp {
        Icmp {
            r#type: self.icmp_type,
            code: self.code,
        }
    }
}

impl JsonEndpoint {
    fn into_endpoint(self) -> Endpoint {
        Endpoint {
            id: self.id,
            identity: self.identity,
            namespace: self.namespace,
            labels: self.labels,
            pod_name: self.pod_name,
        }
    }
}

/// Unknown or missing enum names decode as the zero value.
fn enum_value<E: Into<i32>>(name: Option<&str>, parse: fn(&str) -> Option<E>) -> i32 {
    name.and_then(parse).map(Into::into).unwrap_or(0)
}
