/// Renders a minimal `systemd` unit file for running `dnsward run` as a
/// service, the same shape as the original function53's installer helper.
pub fn render_unit_file(exe_path: &str) -> String {
    format!(
        "[Unit]\n\
         Description=dnsward DNS forwarder and ad-blocker\n\
         After=network.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={exe_path} run\n\
         Restart=on-failure\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_file_references_the_run_subcommand() {
        let unit = render_unit_file("/usr/local/bin/dnsward");
        assert!(unit.contains("ExecStart=/usr/local/bin/dnsward run"));
        assert!(unit.contains("Type=simple"));
        assert!(unit.contains("Restart=on-failure"));
    }
}
