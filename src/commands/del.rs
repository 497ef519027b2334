//! Detaches a container, there is nothing to undo for this plugin.
use super::ChainedPlugin;
use crate::logging::to_json;
use crate::plugin::CmdArgs;

impl ChainedPlugin {
    pub fn cmd_del(&self, args: &CmdArgs) {
        self.log
            .info(format_args!("cmdDel with args {}", to_json(args)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::CaptureLog;
    use crate::plugin::Plugin;

    #[test]
    fn test_del_always_succeeds() {
        let capture = CaptureLog::default();
        let plugin = ChainedPlugin::new(capture.logger());

        for stdin in [&b"{not json"[..], b"", br#"{"cniVersion":"1.0.0","prevResult":{"ips":1}}"#] {
            let args = CmdArgs {
                container_id: "abc".to_string(),
                stdin_data: stdin.to_vec(),
                ..Default::default()
            };
            assert!(plugin.del(&args).is_ok());
        }

        assert!(capture.errors().is_empty());
        assert_eq!(capture.lines().len(), 3);
        assert!(capture.contains(r#"cmdDel with args {"containerID":"abc""#));
    }
}
