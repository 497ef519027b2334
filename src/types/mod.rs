// Crate contains the CNI types accepted on stdin and embedded as prevResult.

use std::collections::HashMap;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ChainedError;

pub mod current;
pub mod v020;
pub mod v040;

/// NetConf is the network configuration handed to the plugin on stdin.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NetConf {
    /// CNI spec version of this configuration, also selects the schema
    /// used to parse prevResult.
    #[serde(rename = "cniVersion", default)]
    pub cni_version: String,

    /// Name of the network.
    #[serde(rename = "name", default)]
    pub name: String,

    /// Plugin type, the binary name executed by the runtime.
    #[serde(rename = "type", default)]
    pub plugin_type: String,

    #[serde(
        rename = "capabilities",
        default,
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub capabilities: HashMap<String, bool>,

    #[serde(rename = "ipam", default, skip_serializing_if = "Option::is_none")]
    pub ipam: Option<Ipam>,

    #[serde(rename = "dns", default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,

    /// The result of the previous plugin in the chain, kept as raw json
    /// until it is parsed against `cni_version`.
    #[serde(rename = "prevResult", default, skip_serializing_if = "Option::is_none")]
    pub raw_prev_result: Option<Value>,

    /// prevResult converted to the current result version.
    #[serde(skip)]
    pub prev_result: Option<current::Result>,
}

impl NetConf {
    /// Decode the configuration, keeping every field that could be decoded.
    ///
    /// When the whole document does not match the expected types each known
    /// field is decoded on its own so a single bad value does not discard the
    /// rest. If the input is not a json object at all the default config is
    /// returned. In both cases the original decode error is returned as well.
    pub fn from_slice_lossy(data: &[u8]) -> (NetConf, Option<ChainedError>) {
        let err = match serde_json::from_slice::<NetConf>(data) {
            Ok(conf) => return (conf, None),
            Err(e) => e,
        };

        let mut conf = NetConf::default();
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(data) {
            if let Some(v) = decode_field(&map, "cniVersion") {
                conf.cni_version = v;
            }
            if let Some(v) = decode_field(&map, "name") {
                conf.name = v;
            }
            if let Some(v) = decode_field(&map, "type") {
                conf.plugin_type = v;
            }
            if let Some(v) = decode_field(&map, "capabilities") {
                conf.capabilities = v;
            }
            conf.ipam = decode_field(&map, "ipam");
            conf.dns = decode_field(&map, "dns");
            conf.raw_prev_result = map.get("prevResult").cloned();
        }
        (conf, Some(err.into()))
    }

    /// Returns the raw prevResult when it carries any content. A missing
    /// field, json null and an empty object all count as no result.
    pub fn raw_prev_result(&self) -> Option<&Value> {
        match &self.raw_prev_result {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) if map.is_empty() => None,
            Some(v) => Some(v),
        }
    }
}

fn decode_field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    map.get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// IPAM section of a network configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipam {
    /// Name of the IPAM plugin, e.g. host-local, dhcp...
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub ipam_type: String,
}

/// DNS settings, shared by the configuration and all result versions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    #[serde(rename = "nameservers", default, skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,

    #[serde(rename = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(rename = "search", default, skip_serializing_if = "Option::is_none")]
    pub search: Option<Vec<String>>,

    #[serde(rename = "options", default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Route entry, shared by all result versions. Only `dst` and `gw` exist
/// before 1.1.0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "dst")]
    pub dst: IpNet,

    #[serde(rename = "gw", default, skip_serializing_if = "Option::is_none")]
    pub gw: Option<IpAddr>,

    #[serde(rename = "mtu", default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,

    #[serde(rename = "advmss", default, skip_serializing_if = "Option::is_none")]
    pub advmss: Option<u32>,

    #[serde(rename = "priority", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(rename = "table", default, skip_serializing_if = "Option::is_none")]
    pub table: Option<u32>,

    #[serde(rename = "scope", default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_conf() {
        let data = std::fs::read("src/test/config/prevresult-1.0.0.json").unwrap();
        let (conf, err) = NetConf::from_slice_lossy(&data);
        assert!(err.is_none(), "unexpected decode error: {:?}", err);
        assert_eq!(conf.cni_version, "1.0.0");
        assert_eq!(conf.name, "mynet");
        assert_eq!(conf.plugin_type, "chained-cni");
        assert_eq!(conf.capabilities.get("portMappings"), Some(&true));
        assert_eq!(conf.ipam.as_ref().unwrap().ipam_type, "host-local");
        assert!(conf.raw_prev_result().is_some());
        assert!(conf.prev_result.is_none());
    }

    #[test]
    fn test_decode_partial_conf() {
        let data = br#"{"cniVersion":"1.0.0","name":"mynet","capabilities":"yes","type":"chained-cni"}"#;
        let (conf, err) = NetConf::from_slice_lossy(data);
        assert!(err.is_some());
        assert_eq!(conf.cni_version, "1.0.0");
        assert_eq!(conf.name, "mynet");
        assert_eq!(conf.plugin_type, "chained-cni");
        assert!(conf.capabilities.is_empty());
    }

    #[test]
    fn test_decode_garbage() {
        let (conf, err) = NetConf::from_slice_lossy(b"{not json");
        assert!(err.is_some());
        assert_eq!(conf.cni_version, "");
        assert!(conf.raw_prev_result.is_none());

        let (_, err) = NetConf::from_slice_lossy(b"[1, 2]");
        assert!(err.is_some());
    }

    #[test]
    fn test_empty_prev_result_is_none() {
        for data in [
            r#"{"cniVersion":"1.0.0"}"#,
            r#"{"cniVersion":"1.0.0","prevResult":null}"#,
            r#"{"cniVersion":"1.0.0","prevResult":{}}"#,
        ] {
            let (conf, err) = NetConf::from_slice_lossy(data.as_bytes());
            assert!(err.is_none());
            assert!(conf.raw_prev_result().is_none(), "{}", data);
        }
    }

    #[test]
    fn test_route_omits_unset_fields() {
        let route: Route = serde_json::from_str(r#"{"dst":"0.0.0.0/0","priority":null}"#).unwrap();
        assert_eq!(route.priority, None);
        assert_eq!(
            serde_json::to_string(&route).unwrap(),
            r#"{"dst":"0.0.0.0/0"}"#
        );
    }
}
