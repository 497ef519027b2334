// Result types for CNI spec 1.0.0 and 1.1.0, the version every previous
// result is converted into.

use std::net::IpAddr;

use ipnet::IpNet;

use super::{Dns, Route};

/// Result is what a plugin prints on ADD and what the next plugin in the
/// chain receives as prevResult.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Result {
    #[serde(rename = "cniVersion", default)]
    pub cni_version: String,

    #[serde(rename = "interfaces", default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<Interface>>,

    #[serde(rename = "ips", default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<IpConfig>>,

    #[serde(rename = "routes", default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,

    #[serde(rename = "dns", default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,
}

/// Interface created or configured by a plugin.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(rename = "name", default)]
    pub name: String,

    #[serde(rename = "mac", default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,

    #[serde(rename = "mtu", default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,

    /// Path to the network namespace, empty for host interfaces.
    #[serde(rename = "sandbox", default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,

    #[serde(rename = "socketPath", default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<String>,

    #[serde(rename = "pciID", default, skip_serializing_if = "Option::is_none")]
    pub pci_id: Option<String>,
}

/// IpConfig contains an assigned address and its gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    /// Index into the interfaces list of the result.
    #[serde(rename = "interface", default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<usize>,

    /// The address in CIDR form, this is the host address and not the
    /// network address.
    #[serde(rename = "address")]
    pub address: IpNet,

    #[serde(rename = "gateway", default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_keeps_host_address() {
        let ip = IpConfig {
            interface: Some(0),
            address: "10.88.0.2/16".parse().unwrap(),
            gateway: Some("10.88.0.1".parse().unwrap()),
        };
        assert_eq!(
            serde_json::to_string(&ip).unwrap(),
            r#"{"interface":0,"address":"10.88.0.2/16","gateway":"10.88.0.1"}"#
        );
    }
}
