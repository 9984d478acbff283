//! # Integration Tests
//!
//! Cross-crate end-to-end tests:
//! - configuration text -> registry -> dispatcher -> sink output
//! - syslog delivery to a live UDP collector
//! - domain list reload while records flow

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DnsRecord, Question, SharedRecord, SinkKind};
    use dispatcher::{
        ConsoleSink, DispatcherBuilder, DispatcherConfig, ExitSignal, SinkRegistry, SyslogSink,
    };
    use domain_filter::DomainFilter;
    use tokio::net::UdpSocket;
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn record(id: u16, names: &[&str]) -> SharedRecord {
        Arc::new(DnsRecord::query(
            Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 42).unwrap(),
            "10.0.0.2".parse().unwrap(),
            "10.0.0.53".parse().unwrap(),
            id,
            names.iter().map(|n| Question::new(*n, 1)).collect(),
        ))
    }

    /// Registry built from the loaded config, console sinks redirected to `out`
    fn registry_with_buffer(blueprint: &contracts::OutputBlueprint, out: &Buffer) -> SinkRegistry {
        let mut registry = SinkRegistry::new();
        for sink in &blueprint.sinks {
            match sink.kind {
                SinkKind::Console => {
                    registry.register(ConsoleSink::with_writer(sink.clone(), out.clone()))
                }
                SinkKind::Syslog => registry.register(SyslogSink::new(sink.clone())),
            }
        }
        registry
    }

    /// End-to-end: TOML config -> skip list file -> dispatcher -> CSV console output
    ///
    /// Verifies:
    /// 1. disabled sinks are pruned
    /// 2. the skip list matches at label boundaries
    /// 3. CSV output carries one header and one row per delivered question
    #[tokio::test]
    async fn test_e2e_config_to_console() {
        let mut skip = tempfile::NamedTempFile::new().unwrap();
        writeln!(skip, "# noisy").unwrap();
        writeln!(skip, "ads.example").unwrap();

        let config = format!(
            r#"
[general]
server_name = "edge-01"
skip_domains_file = "{}"

[[sinks]]
name = "csv"
kind = "console"
mode = "skip_list_only"
format = "csv"
worker_count = 1

[[sinks]]
name = "off"
kind = "syslog"
mode = "disabled"
"#,
            skip.path().display()
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let out = Buffer::default();
        let (tx, rx) = mpsc::channel(16);
        let filter = Arc::new(DomainFilter::new(
            blueprint.general.skip_domains_file.clone(),
            None,
        ));
        let dispatcher = DispatcherBuilder::new(registry_with_buffer(&blueprint, &out), rx)
            .config(DispatcherConfig::from_general(&blueprint.general))
            .filter(filter)
            .build();
        let handle = dispatcher.spawn();

        tx.send(record(1, &["www.example"])).await.unwrap();
        tx.send(record(2, &["tracker.ads.example", "cdn.example"]))
            .await
            .unwrap();
        tx.send(record(3, &["badads.example"])).await.unwrap();
        drop(tx);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.records_dispatched, 3);
        assert_eq!(report.sinks.len(), 1, "disabled syslog sink pruned");
        assert_eq!(report.sinks[0].stats.sent, 3);
        assert_eq!(report.sinks[0].stats.skipped, 1);

        let lines = out.lines();
        assert_eq!(lines.len(), 4, "header + 3 rows: {lines:?}");
        assert!(lines[0].starts_with("year,"));
        assert!(lines[1].contains("www.example"));
        assert!(lines[2].contains("cdn.example"));
        assert!(lines[3].contains("badads.example"));
    }

    /// End-to-end: syslog sink delivers RFC 3164 style frames over UDP
    #[tokio::test]
    async fn test_e2e_syslog_udp() {
        let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("udp://{}", collector.local_addr().unwrap());

        let config = format!(
            r#"
[general]
server_name = "edge-02"

[[sinks]]
name = "collector"
kind = "syslog"
mode = "no_filter"
endpoint = "{endpoint}"
"#
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let (tx, rx) = mpsc::channel(16);
        let dispatcher =
            DispatcherBuilder::new(SinkRegistry::from_configs(&blueprint.sinks), rx)
                .config(DispatcherConfig::from_general(&blueprint.general))
                .build();
        let handle = dispatcher.spawn();

        tx.send(record(42, &["mail.example"])).await.unwrap();

        let mut buf = vec![0u8; 4096];
        let n = tokio::time::timeout(Duration::from_secs(5), collector.recv(&mut buf))
            .await
            .expect("collector received nothing")
            .unwrap();
        let frame = String::from_utf8_lossy(&buf[..n]).to_string();

        assert!(frame.starts_with("<25>"), "frame: {frame}");
        assert!(frame.contains(" edge-02["), "tag is the server name: {frame}");
        let body = frame.split_once("]: ").unwrap().1;
        let decoded: DnsRecord = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.message.id, 42);

        drop(tx);
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.sinks[0].stats.sent, 1);
        assert!(report.drained);
    }

    /// Allow list reloaded from disk while the dispatcher runs
    #[tokio::test]
    async fn test_e2e_allow_list_reload() {
        let allow = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(allow.path(), "first.example\n").unwrap();

        let blueprint = ConfigLoader::load_from_str(
            &format!(
                r#"
[general]
allow_domains_file = "{}"

[[sinks]]
name = "json"
kind = "console"
mode = "allow_list_only"
worker_count = 1
"#,
                allow.path().display()
            ),
            ConfigFormat::Toml,
        )
        .unwrap();

        let out = Buffer::default();
        let filter = Arc::new(DomainFilter::new(
            None,
            blueprint.general.allow_domains_file.clone(),
        ));
        let (tx, rx) = mpsc::channel(16);
        let exit = ExitSignal::new();
        let dispatcher = DispatcherBuilder::new(registry_with_buffer(&blueprint, &out), rx)
            .config(DispatcherConfig {
                allow_reload: Some(Duration::from_millis(50)),
                ..DispatcherConfig::from_general(&blueprint.general)
            })
            .filter(Arc::clone(&filter))
            .exit_signal(exit.clone())
            .build();
        let handle = dispatcher.spawn();

        tx.send(record(1, &["first.example"])).await.unwrap();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while out.lines().is_empty() {
            assert!(tokio::time::Instant::now() < deadline, "first record never written");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        std::fs::write(allow.path(), "second.example\n").unwrap();
        while !filter
            .snapshot(domain_filter::ListKind::Allow)
            .matches("second.example")
        {
            assert!(tokio::time::Instant::now() < deadline, "allow list never reloaded");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        tx.send(record(3, &["first.example"])).await.unwrap();
        tx.send(record(4, &["second.example"])).await.unwrap();
        drop(tx);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.sinks[0].stats.sent, 2);
        assert_eq!(report.sinks[0].stats.skipped, 1);

        let ids: Vec<u64> = out
            .lines()
            .iter()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["message"]["id"]
                .as_u64()
                .unwrap())
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    /// Firing the exit signal mid-stream drains and stops everything
    #[tokio::test]
    async fn test_e2e_exit_signal() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[[sinks]]
name = "json"
kind = "console"
mode = "no_filter"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let out = Buffer::default();
        let (tx, rx) = mpsc::channel(16);
        let exit = ExitSignal::new();
        let dispatcher = DispatcherBuilder::new(registry_with_buffer(&blueprint, &out), rx)
            .exit_signal(exit.clone())
            .build();
        let state = dispatcher.state_handle();
        let handle = dispatcher.spawn();

        tx.send(record(1, &["a.example"])).await.unwrap();
        exit.fire();

        let report = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatcher did not stop")
            .unwrap()
            .unwrap();
        assert!(report.records_dispatched <= 1);
        assert_eq!(state.current(), dispatcher::DispatcherState::Stopped);
    }
}
