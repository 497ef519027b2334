// Result types for CNI spec 0.1.0 and 0.2.0.

use std::net::IpAddr;

use ipnet::IpNet;

use super::{current, Dns, Route};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Result {
    #[serde(rename = "cniVersion", default)]
    pub cni_version: String,

    #[serde(rename = "ip4", default, skip_serializing_if = "Option::is_none")]
    pub ip4: Option<IpConfig>,

    #[serde(rename = "ip6", default, skip_serializing_if = "Option::is_none")]
    pub ip6: Option<IpConfig>,

    #[serde(rename = "dns", default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    #[serde(rename = "ip")]
    pub ip: IpNet,

    #[serde(rename = "gateway", default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,

    #[serde(rename = "routes", default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,
}

impl Result {
    /// Convert to the current result version. ip4 and ip6 become entries of
    /// the ips list in that order and their routes are merged.
    pub fn into_current(self, cni_version: &str) -> current::Result {
        let mut ips = Vec::new();
        let mut routes = Vec::new();

        for config in [self.ip4, self.ip6].into_iter().flatten() {
            ips.push(current::IpConfig {
                interface: None,
                address: config.ip,
                gateway: config.gateway,
            });
            routes.extend(config.routes.unwrap_or_default());
        }

        current::Result {
            cni_version: cni_version.to_string(),
            interfaces: None,
            ips: if ips.is_empty() { None } else { Some(ips) },
            routes: if routes.is_empty() { None } else { Some(routes) },
            dns: self.dns,
        }
    }
}
