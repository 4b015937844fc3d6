//! Wire types for the `observer.Observer` service.
//!
//! A Hubble-compatible subset of the flow API. Field tags follow the upstream
//! `flow.proto` / `observer.proto` so that existing clients decode the
//! messages they care about; fields outside the subset are simply absent.
//! The service glue (`observer_server`, `observer_client`) is generated by
//! `build.rs`.

use prost_types::Timestamp;

include!(concat!(env!("OUT_DIR"), "/observer.Observer.rs"));

// ================================================================================================
// FLOW
// ================================================================================================

/// One captured network flow.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Flow {
    #[prost(message, optional, tag = "1")]
    pub time: Option<Timestamp>,
    #[prost(enumeration = "Verdict", tag = "2")]
    pub verdict: i32,
    #[prost(uint32, tag = "3")]
    pub drop_reason: u32,
    #[prost(message, optional, tag = "4")]
    pub ethernet: Option<Ethernet>,
    #[prost(message, optional, tag = "5")]
    pub ip: Option<Ip>,
    #[prost(message, optional, tag = "6")]
    pub l4: Option<Layer4>,
    #[prost(message, optional, tag = "8")]
    pub source: Option<Endpoint>,
    #[prost(message, optional, tag = "9")]
    pub destination: Option<Endpoint>,
    #[prost(enumeration = "FlowType", tag = "10")]
    pub r#type: i32,
    #[prost(string, tag = "11")]
    pub node_name: String,
    #[prost(string, repeated, tag = "13")]
    pub source_names: Vec<String>,
    #[prost(string, repeated, tag = "14")]
    pub destination_names: Vec<String>,
    #[prost(bool, tag = "16")]
    pub reply: bool,
    #[prost(enumeration = "TrafficDirection", tag = "22")]
    pub traffic_direction: i32,
    #[prost(string, tag = "100000")]
    pub summary: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ethernet {
    #[prost(string, tag = "1")]
    pub source: String,
    #[prost(string, tag = "2")]
    pub destination: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ip {
    #[prost(string, tag = "1")]
    pub source: String,
    #[prost(string, tag = "2")]
    pub destination: String,
    #[prost(enumeration = "IpVersion", tag = "3")]
    pub ip_version: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Layer4 {
    #[prost(oneof = "layer4::Protocol", tags = "1, 2, 3, 4")]
    pub protocol: Option<layer4::Protocol>,
}

pub mod layer4 {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Protocol {
        #[prost(message, tag = "1")]
        Tcp(super::Tcp),
        #[prost(message, tag = "2")]
        Udp(super::Udp),
        #[prost(message, tag = "3")]
        Icmpv4(super::Icmp),
        #[prost(message, tag = "4")]
        Icmpv6(super::Icmp),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tcp {
    #[prost(uint32, tag = "1")]
    pub source_port: u32,
    #[prost(uint32, tag = "2")]
    pub destination_port: u32,
    #[prost(message, optional, tag = "3")]
    pub flags: Option<TcpFlags>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TcpFlags {
    #[prost(bool, tag = "1")]
    pub fin: bool,
    #[prost(bool, tag = "2")]
    pub syn: bool,
    #[prost(bool, tag = "3")]
    pub rst: bool,
    #[prost(bool, tag = "4")]
    pub psh: bool,
    #[prost(bool, tag = "5")]
    pub ack: bool,
    #[prost(bool, tag = "6")]
    pub urg: bool,
    #[prost(bool, tag = "7")]
    pub ece: bool,
    #[prost(bool, tag = "8")]
    pub cwr: bool,
    #[prost(bool, tag = "9")]
    pub ns: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Udp {
    #[prost(uint32, tag = "1")]
    pub source_port: u32,
    #[prost(uint32, tag = "2")]
    pub destination_port: u32,
}

/// ICMPv4 and ICMPv6 share the same shape.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Icmp {
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    #[prost(uint32, tag = "2")]
    pub code: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Endpoint {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(uint32, tag = "2")]
    pub identity: u32,
    #[prost(string, tag = "3")]
    pub namespace: String,
    #[prost(string, repeated, tag = "4")]
    pub labels: Vec<String>,
    #[prost(string, tag = "5")]
    pub pod_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Verdict {
    VerdictUnknown = 0,
    Forwarded = 1,
    Dropped = 2,
    Error = 3,
    Audit = 4,
    Redirected = 5,
    Traced = 6,
    Translated = 7,
}

impl Verdict {
    /// Parses the upper-case name used in Hubble's JSON export.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "VERDICT_UNKNOWN" => Some(Self::VerdictUnknown),
            "FORWARDED" => Some(Self::Forwarded),
            "DROPPED" => Some(Self::Dropped),
            "ERROR" => Some(Self::Error),
            "AUDIT" => Some(Self::Audit),
            "REDIRECTED" => Some(Self::Redirected),
            "TRACED" => Some(Self::Traced),
            "TRANSLATED" => Some(Self::Translated),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FlowType {
    UnknownType = 0,
    L3L4 = 1,
    L7 = 2,
    Sock = 3,
}

impl FlowType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "UNKNOWN_TYPE" => Some(Self::UnknownType),
            "L3_L4" => Some(Self::L3L4),
            "L7" => Some(Self::L7),
            "SOCK" => Some(Self::Sock),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IpVersion {
    IpNotUsed = 0,
    Ipv4 = 1,
    Ipv6 = 2,
}

impl IpVersion {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "IP_NOT_USED" => Some(Self::IpNotUsed),
            "IPv4" => Some(Self::Ipv4),
            "IPv6" => Some(Self::Ipv6),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TrafficDirection {
    TrafficDirectionUnknown = 0,
    Ingress = 1,
    Egress = 2,
}

impl TrafficDirection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TRAFFIC_DIRECTION_UNKNOWN" => Some(Self::TrafficDirectionUnknown),
            "INGRESS" => Some(Self::Ingress),
            "EGRESS" => Some(Self::Egress),
            _ => None,
        }
    }
}

// ================================================================================================
// OBSERVER SERVICE MESSAGES
// ================================================================================================

/// Allow/deny filter. Accepted on requests and never evaluated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FlowFilter {
    #[prost(string, repeated, tag = "1")]
    pub source_ip: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    pub source_pod: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub destination_ip: Vec<String>,
    #[prost(string, repeated, tag = "4")]
    pub destination_pod: Vec<String>,
    #[prost(enumeration = "Verdict", repeated, tag = "5")]
    pub verdict: Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetFlowsRequest {
    /// Bounded mode cap; 0 replays the whole recording.
    #[prost(uint64, tag = "1")]
    pub number: u64,
    #[prost(bool, tag = "3")]
    pub follow: bool,
    #[prost(message, repeated, tag = "4")]
    pub whitelist: Vec<FlowFilter>,
    #[prost(message, repeated, tag = "5")]
    pub blacklist: Vec<FlowFilter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetFlowsResponse {
    #[prost(string, tag = "1000")]
    pub node_name: String,
    #[prost(message, optional, tag = "1001")]
    pub time: Option<Timestamp>,
    #[prost(oneof = "get_flows_response::ResponseTypes", tags = "1")]
    pub response_types: Option<get_flows_response::ResponseTypes>,
}

pub mod get_flows_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ResponseTypes {
        #[prost(message, tag = "1")]
        Flow(super::Flow),
    }
}

impl GetFlowsResponse {
    /// Wraps a replayed flow, copying its node name and time to the envelope.
    pub fn from_flow(flow: Flow) -> Self {
        Self {
            node_name: flow.node_name.clone(),
            time: flow.time.clone(),
            response_types: Some(get_flows_response::ResponseTypes::Flow(flow)),
        }
    }

    pub fn flow(&self) -> Option<&Flow> {
        match &self.response_types {
            Some(get_flows_response::ResponseTypes::Flow(flow)) => Some(flow),
            None => None,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerStatusRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerStatusResponse {
    #[prost(uint64, tag = "1")]
    pub num_flows: u64,
    #[prost(uint64, tag = "2")]
    pub max_flows: u64,
    #[prost(uint64, tag = "3")]
    pub seen_flows: u64,
    #[prost(uint64, tag = "4")]
    pub uptime_ns: u64,
}
