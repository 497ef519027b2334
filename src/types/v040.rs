// Result types for CNI spec 0.3.0, 0.3.1 and 0.4.0.

use std::net::IpAddr;

use ipnet::IpNet;

use super::{current, Dns, Route};

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

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(rename = "name", default)]
    pub name: String,

    #[serde(rename = "mac", default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,

    #[serde(rename = "sandbox", default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

/// IpConfig of a 0.4.0 result. The "version" field of the wire format is
/// ignored, the address already carries the family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    #[serde(rename = "interface", default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<usize>,

    #[serde(rename = "address")]
    pub address: IpNet,

    #[serde(rename = "gateway", default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
}

impl Result {
    /// Convert to the current result version.
    pub fn into_current(self, cni_version: &str) -> current::Result {
        let ips = self.ips.map(|ips| {
            ips.into_iter()
                .map(|ip| current::IpConfig {
                    interface: ip.interface,
                    address: ip.address,
                    gateway: ip.gateway,
                })
                .collect()
        });

        let interfaces = self.interfaces.map(|ifaces| {
            ifaces
                .into_iter()
                .map(|iface| current::Interface {
                    name: iface.name,
                    mac: iface.mac,
                    sandbox: iface.sandbox,
                    ..Default::default()
                })
                .collect()
        });

        current::Result {
            cni_version: cni_version.to_string(),
            interfaces,
            ips,
            routes: self.routes,
            dns: self.dns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Result {
        serde_json::from_str(data).unwrap()
    }

    #[test]
    fn test_into_current() {
        let res = parse(
            r#"{
                "cniVersion": "0.4.0",
                "interfaces": [{"name": "eth0", "mac": "aa:bb:cc:dd:ee:ff", "sandbox": "/var/run/netns/test"}],
                "ips": [
                    {"version": "4", "interface": 0, "address": "10.1.0.5/16", "gateway": "10.1.0.1"},
                    {"version": "6", "interface": 0, "address": "fd00::5/64"}
                ],
                "routes": [{"dst": "0.0.0.0/0", "gw": "10.1.0.1"}],
                "dns": {"nameservers": ["10.1.0.1"]}
            }"#,
        );

        let cur = res.into_current("1.1.0");
        assert_eq!(cur.cni_version, "1.1.0");
        let ips = cur.ips.unwrap();
        assert_eq!(ips.len(), 2);
        assert_eq!(ips[0].address.to_string(), "10.1.0.5/16");
        assert_eq!(ips[0].gateway, Some("10.1.0.1".parse().unwrap()));
        assert_eq!(ips[1].interface, Some(0));
        let ifaces = cur.interfaces.unwrap();
        assert_eq!(ifaces[0].mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(ifaces[0].mtu, None);
        assert_eq!(cur.routes.unwrap()[0].dst.to_string(), "0.0.0.0/0");
        assert_eq!(
            cur.dns.unwrap().nameservers,
            Some(vec!["10.1.0.1".to_string()])
        );
    }

    #[test]
    fn test_ip_version_is_ignored() {
        for version in ["4", "6", "5"] {
            let res = parse(&format!(
                r#"{{"ips": [{{"version": "{}", "address": "10.1.0.5/16"}}]}}"#,
                version
            ));
            let ips = res.into_current("1.1.0").ips.unwrap();
            assert_eq!(ips[0].address.to_string(), "10.1.0.5/16", "{}", version);
        }

        let res = parse(r#"{"ips": [{"address": "fd00::5/64"}]}"#);
        assert_eq!(res.into_current("1.1.0").ips.unwrap().len(), 1);
    }

    #[test]
    fn test_interface_index_carried_over() {
        let res = parse(r#"{"ips": [{"version": "4", "interface": 2, "address": "10.1.0.5/16"}]}"#);
        let cur = res.into_current("1.1.0");
        assert!(cur.interfaces.is_none());
        assert_eq!(cur.ips.unwrap()[0].interface, Some(2));
    }
}
