//! Topology description parser.
//!
//! Converts the XML topology document into a tree of plain description
//! records consumed by the model builder. All validation of document
//! structure (required fields, address disambiguation, type tags) lives
//! here; the builder never re-checks the document.

mod xml;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::address::{self, NetworkV4, NetworkV6};
use crate::model::{ChannelKind, DeviceKind};
use crate::runtime::TimeUnit;

use xml::Element;

const MODEL_TAG: &str = "model";
const POPULATE_TAG: &str = "populate-routing-tables";
const DURATION_TAG: &str = "duration";
const PRECISION_TAG: &str = "precision";
const NODE_TAG: &str = "node";
const DEVICE_LIST_TAG: &str = "device-list";
const DEVICE_TAG: &str = "device";
const ADDRESS_TAG: &str = "address";
const ATTRIBUTES_TAG: &str = "attributes";
const ATTRIBUTE_TAG: &str = "attribute";
const APPLICATIONS_TAG: &str = "applications";
const APPLICATION_TAG: &str = "application";
const ROUTING_TAG: &str = "routing";
const ROUTE_TAG: &str = "route";
const CONNECTIONS_TAG: &str = "connections";
const CONNECTION_TAG: &str = "connection";
const INTERFACES_TAG: &str = "interfaces";
const INTERFACE_TAG: &str = "interface";
const STATISTICS_TAG: &str = "statistics";
const REGISTRATOR_TAG: &str = "registrator";

const NAME_ATTR: &str = "name";
const TYPE_ATTR: &str = "type";
const VALUE_ATTR: &str = "value";
const PREFIX_ATTR: &str = "prefix";
const NETMASK_ATTR: &str = "netmask";
const KEY_ATTR: &str = "key";
const NETWORK_ATTR: &str = "network";
const METRIC_ATTR: &str = "metric";
const DST_ATTR: &str = "dst";
const FILE_ATTR: &str = "file";
const SOURCE_ATTR: &str = "source";
const START_ATTR: &str = "start";
const END_ATTR: &str = "end";
const VALUE_NAME_ATTR: &str = "value_name";
const SINK_ATTR: &str = "sink";

const DEFAULT_SINK: &str = "Output";
const DEFAULT_VALUE_NAME: &str = "value";
const DEFAULT_METRIC: u32 = 0;

/// String-keyed attribute values; duplicate keys overwrite.
pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelDescription {
    pub name: String,
    pub populate_routing_tables: bool,
    pub end_time: Option<String>,
    pub precision: Option<TimeUnit>,
    pub nodes: Vec<NodeDescription>,
    pub connections: Vec<ConnectionDescription>,
    pub registrators: Vec<RegistratorDescription>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDescription {
    pub name: String,
    pub devices: Vec<DeviceDescription>,
    pub applications: Vec<ApplicationDescription>,
    pub routing: RoutingDescription,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescription {
    pub name: String,
    pub kind: DeviceKind,
    pub ipv4_addresses: Vec<NetworkV4>,
    pub ipv6_addresses: Vec<NetworkV6>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationDescription {
    pub name: String,
    pub type_name: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ipv4Route {
    pub network: NetworkV4,
    pub device: String,
    pub metric: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ipv6Route {
    pub network: NetworkV6,
    pub device: String,
    pub metric: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingDescription {
    pub ipv4: Vec<Ipv4Route>,
    pub ipv6: Vec<Ipv6Route>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDescription {
    pub name: String,
    pub kind: ChannelKind,
    pub interfaces: Vec<String>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistratorDescription {
    pub source: String,
    pub probe_type: String,
    pub sink: String,
    pub value_name: String,
    pub file: String,
    pub start_time: String,
    pub end_time: Option<String>,
}

/// What went wrong while reading an attribute of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeErrorKind {
    Missing,
    WrongType,
}

impl fmt::Display for AttributeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeErrorKind::Missing => write!(f, "no such attribute"),
            AttributeErrorKind::WrongType => write!(f, "wrong value type"),
        }
    }
}

/// Error raised while reading a required or typed attribute.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} \"{attribute}\" of <{tag}> at line {line}")]
pub struct AttributeError {
    pub tag: String,
    pub attribute: String,
    pub line: u64,
    pub kind: AttributeErrorKind,
}

/// Errors raised while parsing a topology document. Fatal to the parse;
/// never recovered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed document at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("no root <model> element")]
    MissingRoot,

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("address at line {line} must carry exactly one of netmask or prefix")]
    AmbiguousAddress { line: u64 },

    #[error("bad IPv4 network \"{value}\" with netmask \"{netmask}\" at line {line}")]
    BadIpv4 {
        value: String,
        netmask: String,
        line: u64,
    },

    #[error("bad IPv6 network \"{value}\" with prefix {prefix} at line {line}")]
    BadIpv6 {
        value: String,
        prefix: u32,
        line: u64,
    },

    #[error("unknown device type \"{value}\" at line {line}")]
    UnknownDeviceType { value: String, line: u64 },

    #[error("unknown connection type \"{value}\" at line {line}")]
    UnknownChannelType { value: String, line: u64 },

    #[error("<populate-routing-tables> given more than once")]
    RepeatedPopulate,

    #[error("unknown precision value \"{value}\"")]
    UnknownPrecision { value: String },

    #[error("bad boolean \"{value}\" at line {line}")]
    BadBool { value: String, line: u64 },
}

/// Parse a topology document into a model description.
pub fn parse_model(document: &str) -> Result<ModelDescription, ParseError> {
    let root = xml::parse_document(document)?;
    if root.name != MODEL_TAG {
        return Err(ParseError::MissingRoot);
    }

    let mut description = ModelDescription {
        name: required(&root, NAME_ATTR)?.to_string(),
        ..Default::default()
    };

    parse_model_settings(&root, &mut description)?;
    description.nodes = parse_nodes(&root)?;
    description.connections = parse_connections(&root)?;
    description.registrators = parse_statistics(&root)?;

    Ok(description)
}

fn parse_model_settings(
    root: &Element,
    description: &mut ModelDescription,
) -> Result<(), ParseError> {
    let mut populate = root.children(POPULATE_TAG);
    if let Some(element) = populate.next() {
        // a repeated setting is ambiguous, not last-wins
        if populate.next().is_some() {
            return Err(ParseError::RepeatedPopulate);
        }
        description.populate_routing_tables = parse_bool(element)?;
    }

    if let Some(duration) = root.first_child(DURATION_TAG) {
        let text = duration.text();
        if !text.is_empty() {
            description.end_time = Some(text.to_string());
        }
    }

    if let Some(precision) = root.first_child(PRECISION_TAG) {
        let text = precision.text();
        description.precision =
            Some(
                TimeUnit::from_tag(text).ok_or_else(|| ParseError::UnknownPrecision {
                    value: text.to_string(),
                })?,
            );
    }

    Ok(())
}

fn parse_nodes(root: &Element) -> Result<Vec<NodeDescription>, ParseError> {
    let mut nodes = Vec::new();
    for node in root.children(NODE_TAG) {
        nodes.push(NodeDescription {
            name: required(node, NAME_ATTR)?.to_string(),
            devices: parse_devices(node)?,
            applications: parse_applications(node)?,
            routing: parse_routing(node)?,
        });
    }
    Ok(nodes)
}

fn parse_devices(node: &Element) -> Result<Vec<DeviceDescription>, ParseError> {
    let mut devices = Vec::new();

    if let Some(device_list) = node.first_child(DEVICE_LIST_TAG) {
        for device in device_list.children(DEVICE_TAG) {
            let type_tag = required(device, TYPE_ATTR)?;
            let kind =
                DeviceKind::from_tag(type_tag).ok_or_else(|| ParseError::UnknownDeviceType {
                    value: type_tag.to_string(),
                    line: device.line,
                })?;

            let (ipv4_addresses, ipv6_addresses) = parse_addresses(device)?;

            devices.push(DeviceDescription {
                name: required(device, NAME_ATTR)?.to_string(),
                kind,
                ipv4_addresses,
                ipv6_addresses,
                attributes: parse_attributes(device)?,
            });
        }
    }

    Ok(devices)
}

fn parse_addresses(device: &Element) -> Result<(Vec<NetworkV4>, Vec<NetworkV6>), ParseError> {
    let mut ipv4 = Vec::new();
    let mut ipv6 = Vec::new();

    for element in device.children(ADDRESS_TAG) {
        let value = required(element, VALUE_ATTR)?;
        match split_network(element, value)? {
            ParsedNetwork::V4(network) => ipv4.push(network),
            ParsedNetwork::V6(network) => ipv6.push(network),
        }
    }

    Ok((ipv4, ipv6))
}

enum ParsedNetwork {
    V4(NetworkV4),
    V6(NetworkV6),
}

/// Disambiguate an address-like element: a `netmask` attribute and no
/// `prefix` means IPv4, a `prefix` and no `netmask` means IPv6, anything
/// else is an error.
fn split_network(element: &Element, value: &str) -> Result<ParsedNetwork, ParseError> {
    let netmask = element.attribute(NETMASK_ATTR);
    let prefix = optional_u32(element, PREFIX_ATTR)?;

    match (netmask, prefix) {
        (Some(netmask), None) => address::from_string_v4(value, netmask)
            .map(ParsedNetwork::V4)
            .ok_or_else(|| ParseError::BadIpv4 {
                value: value.to_string(),
                netmask: netmask.to_string(),
                line: element.line,
            }),
        (None, Some(prefix)) => {
            if prefix > 128 {
                return Err(ParseError::BadIpv6 {
                    value: value.to_string(),
                    prefix,
                    line: element.line,
                });
            }
            address::from_string_v6(value, prefix as u8)
                .map(ParsedNetwork::V6)
                .ok_or_else(|| ParseError::BadIpv6 {
                    value: value.to_string(),
                    prefix,
                    line: element.line,
                })
        }
        _ => Err(ParseError::AmbiguousAddress { line: element.line }),
    }
}

fn parse_attributes(element: &Element) -> Result<Attributes, ParseError> {
    let mut attributes = Attributes::new();

    if let Some(block) = element.first_child(ATTRIBUTES_TAG) {
        for attribute in block.children(ATTRIBUTE_TAG) {
            let key = required(attribute, KEY_ATTR)?.to_string();
            let value = required(attribute, VALUE_ATTR)?.to_string();
            attributes.insert(key, value);
        }
    }

    Ok(attributes)
}

fn parse_applications(node: &Element) -> Result<Vec<ApplicationDescription>, ParseError> {
    let mut applications = Vec::new();

    if let Some(block) = node.first_child(APPLICATIONS_TAG) {
        for application in block.children(APPLICATION_TAG) {
            applications.push(ApplicationDescription {
                name: required(application, NAME_ATTR)?.to_string(),
                type_name: required(application, TYPE_ATTR)?.to_string(),
                attributes: parse_attributes(application)?,
            });
        }
    }

    Ok(applications)
}

fn parse_routing(node: &Element) -> Result<RoutingDescription, ParseError> {
    let mut routing = RoutingDescription::default();

    if let Some(block) = node.first_child(ROUTING_TAG) {
        for route in block.children(ROUTE_TAG) {
            let device = required(route, DST_ATTR)?.to_string();
            let network = required(route, NETWORK_ATTR)?;
            let metric = optional_u32(route, METRIC_ATTR)?.unwrap_or(DEFAULT_METRIC);

            match split_network(route, network)? {
                ParsedNetwork::V4(network) => routing.ipv4.push(Ipv4Route {
                    network,
                    device,
                    metric,
                }),
                ParsedNetwork::V6(network) => routing.ipv6.push(Ipv6Route {
                    network,
                    device,
                    metric,
                }),
            }
        }
    }

    Ok(routing)
}

fn parse_connections(root: &Element) -> Result<Vec<ConnectionDescription>, ParseError> {
    let mut connections = Vec::new();

    if let Some(block) = root.first_child(CONNECTIONS_TAG) {
        for connection in block.children(CONNECTION_TAG) {
            let type_tag = required(connection, TYPE_ATTR)?;
            let kind =
                ChannelKind::from_tag(type_tag).ok_or_else(|| ParseError::UnknownChannelType {
                    value: type_tag.to_string(),
                    line: connection.line,
                })?;

            connections.push(ConnectionDescription {
                name: required(connection, NAME_ATTR)?.to_string(),
                kind,
                interfaces: parse_interfaces(connection),
                attributes: parse_attributes(connection)?,
            });
        }
    }

    Ok(connections)
}

fn parse_interfaces(connection: &Element) -> Vec<String> {
    match connection.first_child(INTERFACES_TAG) {
        Some(block) => block
            .children(INTERFACE_TAG)
            .map(|interface| interface.text().to_string())
            .collect(),
        None => Vec::new(),
    }
}

fn parse_statistics(root: &Element) -> Result<Vec<RegistratorDescription>, ParseError> {
    let mut registrators = Vec::new();

    if let Some(block) = root.first_child(STATISTICS_TAG) {
        for registrator in block.children(REGISTRATOR_TAG) {
            let end_time = registrator
                .attribute(END_ATTR)
                .filter(|value| !value.is_empty())
                .map(str::to_string);

            registrators.push(RegistratorDescription {
                source: required(registrator, SOURCE_ATTR)?.to_string(),
                probe_type: required(registrator, TYPE_ATTR)?.to_string(),
                sink: optional(registrator, SINK_ATTR, DEFAULT_SINK),
                value_name: optional(registrator, VALUE_NAME_ATTR, DEFAULT_VALUE_NAME),
                file: required(registrator, FILE_ATTR)?.to_string(),
                start_time: required(registrator, START_ATTR)?.to_string(),
                end_time,
            });
        }
    }

    Ok(registrators)
}

fn required<'a>(element: &'a Element, attribute: &str) -> Result<&'a str, AttributeError> {
    element.attribute(attribute).ok_or_else(|| AttributeError {
        tag: element.name.clone(),
        attribute: attribute.to_string(),
        line: element.line,
        kind: AttributeErrorKind::Missing,
    })
}

fn optional(element: &Element, attribute: &str, default: &str) -> String {
    match element.attribute(attribute) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

fn optional_u32(element: &Element, attribute: &str) -> Result<Option<u32>, AttributeError> {
    match element.attribute(attribute) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| AttributeError {
                tag: element.name.clone(),
                attribute: attribute.to_string(),
                line: element.line,
                kind: AttributeErrorKind::WrongType,
            }),
    }
}

fn parse_bool(element: &Element) -> Result<bool, ParseError> {
    let text = element.text();
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Ok(false)
    } else {
        Err(ParseError::BadBool {
            value: text.to_string(),
            line: element.line,
        })
    }
}
