//! Dynamic type registry with per-attribute value checkers.
//!
//! Types are resolved by name at build time; each registered type lists the
//! attributes it understands together with the value domain of each one.
//! The registry ships a default catalogue of device, channel, application
//! and probe types; tests and embedders may register further types.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::time::SimTime;

/// Coarse role a registered type advertises. The typed factory variant
/// requires the requested capability from the resolved type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Node,
    Device,
    Channel,
    Application,
    Probe,
}

/// Value domain of a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Text,
    Boolean,
    Unsigned,
    Time,
    DataRate,
    MacAddress,
}

impl AttrKind {
    /// Check a textual value against this domain.
    pub fn validate(&self, value: &str) -> bool {
        match self {
            AttrKind::Text => true,
            AttrKind::Boolean => {
                value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
            }
            AttrKind::Unsigned => value.trim().parse::<u64>().is_ok(),
            AttrKind::Time => SimTime::parse(value).is_ok(),
            AttrKind::DataRate => is_data_rate(value),
            AttrKind::MacAddress => is_mac_address(value),
        }
    }
}

fn is_data_rate(value: &str) -> bool {
    let value = value.trim();
    for suffix in ["Gbps", "Mbps", "Kbps", "kbps", "bps"] {
        if let Some(number) = value.strip_suffix(suffix) {
            return number.parse::<u64>().is_ok();
        }
    }
    false
}

fn is_mac_address(value: &str) -> bool {
    let octets: Vec<&str> = value.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|octet| octet.len() == 2 && u8::from_str_radix(octet, 16).is_ok())
}

/// Declaration of one attribute of a registered type.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    kind: AttrKind,
    default: Option<String>,
}

impl AttrSpec {
    pub fn kind(&self) -> AttrKind {
        self.kind
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// A registered type: its name, capability and attribute table.
#[derive(Debug)]
pub struct TypeSpec {
    name: String,
    capability: Capability,
    attributes: BTreeMap<String, AttrSpec>,
}

impl TypeSpec {
    pub fn new(name: &str, capability: Capability) -> Self {
        Self {
            name: name.to_string(),
            capability,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, kind: AttrKind) -> Self {
        self.attributes.insert(
            name.to_string(),
            AttrSpec {
                kind,
                default: None,
            },
        );
        self
    }

    pub fn with_defaulted_attribute(mut self, name: &str, kind: AttrKind, default: &str) -> Self {
        self.attributes.insert(
            name.to_string(),
            AttrSpec {
                kind,
                default: Some(default.to_string()),
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrSpec> {
        self.attributes.get(name)
    }

    /// Initial attribute values for a freshly constructed object.
    pub(crate) fn defaults(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .filter_map(|(name, spec)| {
                spec.default
                    .as_ref()
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }
}

/// Name-to-type resolution table.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    specs: HashMap<String, Rc<TypeSpec>>,
}

impl TypeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in node, device, channel,
    /// application and probe types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register(TypeSpec::new("Node", Capability::Node));

        registry.register(
            TypeSpec::new("CsmaNetDevice", Capability::Device)
                .with_defaulted_attribute("Mtu", AttrKind::Unsigned, "1500")
                .with_attribute("Address", AttrKind::MacAddress)
                .with_defaulted_attribute("SendEnable", AttrKind::Boolean, "true")
                .with_defaulted_attribute("ReceiveEnable", AttrKind::Boolean, "true")
                .with_attribute("TxQueue", AttrKind::Text),
        );
        registry.register(
            TypeSpec::new("PointToPointNetDevice", Capability::Device)
                .with_defaulted_attribute("Mtu", AttrKind::Unsigned, "1500")
                .with_attribute("Address", AttrKind::MacAddress)
                .with_defaulted_attribute("DataRate", AttrKind::DataRate, "32768bps")
                .with_defaulted_attribute("InterframeGap", AttrKind::Time, "0s")
                .with_attribute("TxQueue", AttrKind::Text),
        );

        registry.register(
            TypeSpec::new("CsmaChannel", Capability::Channel)
                .with_defaulted_attribute("DataRate", AttrKind::DataRate, "4294967295bps")
                .with_defaulted_attribute("Delay", AttrKind::Time, "0s"),
        );
        registry.register(
            TypeSpec::new("PointToPointChannel", Capability::Channel)
                .with_defaulted_attribute("Delay", AttrKind::Time, "0s"),
        );

        registry.register(
            TypeSpec::new("UdpEchoClient", Capability::Application)
                .with_defaulted_attribute("MaxPackets", AttrKind::Unsigned, "100")
                .with_defaulted_attribute("Interval", AttrKind::Time, "1s")
                .with_attribute("RemoteAddress", AttrKind::Text)
                .with_defaulted_attribute("RemotePort", AttrKind::Unsigned, "9")
                .with_defaulted_attribute("PacketSize", AttrKind::Unsigned, "100"),
        );
        registry.register(
            TypeSpec::new("UdpEchoServer", Capability::Application)
                .with_defaulted_attribute("Port", AttrKind::Unsigned, "9"),
        );
        registry.register(
            TypeSpec::new("PacketSink", Capability::Application)
                .with_attribute("Local", AttrKind::Text)
                .with_attribute("Protocol", AttrKind::Text),
        );

        for probe in ["Uinteger32Probe", "DoubleProbe", "TimeProbe"] {
            registry.register(
                TypeSpec::new(probe, Capability::Probe)
                    .with_defaulted_attribute("Start", AttrKind::Time, "0s")
                    .with_defaulted_attribute("Stop", AttrKind::Time, "0s"),
            );
        }

        registry
    }

    /// Register a type; a later registration under the same name wins.
    pub fn register(&mut self, spec: TypeSpec) -> Rc<TypeSpec> {
        let spec = Rc::new(spec);
        self.specs.insert(spec.name().to_string(), Rc::clone(&spec));
        spec
    }

    pub fn resolve(&self, name: &str) -> Option<&Rc<TypeSpec>> {
        self.specs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_kind_validation() {
        assert!(AttrKind::Text.validate("anything at all"));
        assert!(AttrKind::Boolean.validate("true"));
        assert!(AttrKind::Boolean.validate("False"));
        assert!(!AttrKind::Boolean.validate("maybe"));
        assert!(AttrKind::Unsigned.validate("442"));
        assert!(!AttrKind::Unsigned.validate("-1"));
        assert!(AttrKind::Time.validate("10ms"));
        assert!(!AttrKind::Time.validate("soon"));
        assert!(AttrKind::DataRate.validate("100Mbps"));
        assert!(!AttrKind::DataRate.validate("fast"));
        assert!(AttrKind::MacAddress.validate("ab:cd:ef:01:02:03"));
        assert!(!AttrKind::MacAddress.validate("ab:cd:ef:01:02"));
        assert!(!AttrKind::MacAddress.validate("zz:cd:ef:01:02:03"));
    }

    #[test]
    fn test_resolve_builtin_types() {
        let registry = TypeRegistry::with_defaults();

        let device = registry.resolve("CsmaNetDevice").unwrap();
        assert_eq!(device.capability(), Capability::Device);
        assert_eq!(device.attribute("Mtu").unwrap().kind(), AttrKind::Unsigned);
        assert_eq!(device.attribute("Mtu").unwrap().default(), Some("1500"));

        assert!(registry.resolve("CsmaChannel").is_some());
        assert!(registry.resolve("UdpEchoClient").is_some());
        assert!(registry.resolve("Uinteger32Probe").is_some());
        assert!(registry.resolve("FluxCapacitor").is_none());
    }

    #[test]
    fn test_registered_type_wins_over_previous() {
        let mut registry = TypeRegistry::empty();
        registry.register(TypeSpec::new("Widget", Capability::Application));
        registry
            .register(TypeSpec::new("Widget", Capability::Probe).with_attribute("X", AttrKind::Text));

        let spec = registry.resolve("Widget").unwrap();
        assert_eq!(spec.capability(), Capability::Probe);
        assert!(spec.attribute("X").is_some());
    }
}
