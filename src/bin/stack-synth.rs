// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Synthesis Entry Point
//!
//! Builds the full stack graph (network -> data -> compute) and writes
//! the synthesized template. Takes no runtime arguments; external
//! inputs come from the environment:
//!
//! - `SSH_KEY_PAIR`   - optional instance-login key pair name
//! - `APP_IMAGE`      - container image, `name:tag` (default sonarqube)
//! - `TEMPLATE_OUT`   - output file path (default: stdout)
//!
//! Exit code is non-zero on any configuration validation failure and
//! zero on successful synthesis. Deployment is a separate step, out of
//! scope here.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use cim_stacks::domain::{
    CidrBlock, Cron, DatabaseEngine, DatabaseName, EnvValue, HealthCheck, ImageRef, InstanceType,
    KeyPairRef, Port, PortMapping, ScalingPolicy, ScalingRange, StartupScript, SubnetTier,
    TierKind,
};
use cim_stacks::stacks::{
    AutoscalingSpec, ClusterCapacitySpec, ClusterSpec, ComputeSpec, DatabaseSpec, InstanceSpec,
    ListenerSpec, LoadBalancerSpec, NetworkSpec, ServiceSpec, TargetRef, TaskSpec,
};
use cim_stacks::Composition;

/// External configuration inputs
///
/// Credentials and key identifiers are never literals in the
/// composition; they arrive from the environment or stay managed by
/// the secret store.
#[derive(Debug, Clone)]
struct SynthConfig {
    /// Instance-login key pair, if operators use one
    key_pair: Option<KeyPairRef>,
    /// Application container image
    app_image: ImageRef,
    /// Where to write the template; stdout when unset
    out_path: Option<PathBuf>,
}

impl SynthConfig {
    fn from_env() -> Result<Self> {
        let key_pair = match std::env::var("SSH_KEY_PAIR") {
            Ok(name) => Some(KeyPairRef::new(name).context("SSH_KEY_PAIR is set but empty")?),
            Err(_) => None,
        };

        let image_raw =
            std::env::var("APP_IMAGE").unwrap_or_else(|_| "sonarqube:8.9.8-community".to_string());
        let (name, tag) = image_raw
            .split_once(':')
            .unwrap_or((image_raw.as_str(), "latest"));
        let app_image = ImageRef::new(name, tag).context("APP_IMAGE is not a valid name:tag")?;

        let out_path = std::env::var("TEMPLATE_OUT").ok().map(PathBuf::from);

        Ok(Self {
            key_pair,
            app_image,
            out_path,
        })
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Synthesizing stack graph");

    let config = SynthConfig::from_env()?;
    info!("📋 Configuration loaded:");
    info!("  - App image: {}", config.app_image);
    info!(
        "  - Key pair: {}",
        config
            .key_pair
            .as_ref()
            .map_or("<none>", KeyPairRef::as_str)
    );

    let mut app = Composition::new("mpb");

    // Network: three tiers across three availability zones
    let (network, groups) = app.network(
        "network",
        NetworkSpec {
            address_block: CidrBlock::new("10.10.0.0/16")?,
            az_count: 3,
            subnet_tiers: vec![
                SubnetTier::new("Public", TierKind::Public, 24)?,
                SubnetTier::new("Private", TierKind::PrivateNat, 24)?,
                SubnetTier::new("DB", TierKind::Isolated, 24)?,
            ],
            security_groups: vec!["app".to_string(), "alb".to_string()],
        },
    )?;
    let app_group = groups
        .iter()
        .find(|g| g.name() == "app")
        .context("app security group missing from network stack")?;

    // Data: Aurora Postgres in the isolated tier, reachable from the
    // app group only
    let db = app.data(
        "data",
        DatabaseSpec {
            engine: DatabaseEngine::aurora_postgres("13.4")?,
            default_database_name: DatabaseName::new("mpb")?,
            instance_count: 2,
        },
        &network,
        &[app_group.clone()],
    )?;

    // Compute: two fixed web servers plus an autoscaled container
    // service, all behind one public load balancer
    let mut web_startup = StartupScript::new();
    web_startup
        .add_command("dnf install -y httpd")
        .add_command("echo healthy > /var/www/html/health")
        .add_command("systemctl enable --now httpd");

    let instances = (1..=2)
        .map(|n| -> Result<InstanceSpec> {
            Ok(InstanceSpec {
                name: format!("web-{n}"),
                instance_type: InstanceType::new("t3.nano")?,
                subnet_tier: "Private".to_string(),
                security_group: "app".to_string(),
                key_pair: config.key_pair.clone(),
                startup: web_startup.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let service = ServiceSpec {
        name: "app".to_string(),
        task: TaskSpec {
            container_name: "app".to_string(),
            image: config.app_image.clone(),
            cpu: 2048,
            memory_mib: 2048,
            command: vec![],
            env: BTreeMap::from([(
                "SONAR_SEARCH_OPTS".to_string(),
                EnvValue::literal("-Dnode.store.allow_mmap=false"),
            )]),
            port_mappings: vec![PortMapping::tcp(Port::new(9000)?, Port::new(9000)?)],
            log_stream_prefix: Some("myapp".to_string()),
        },
        desired_count: 1,
        subnet_tier: "Private".to_string(),
        security_group: "app".to_string(),
        autoscaling: Some(AutoscalingSpec {
            range: ScalingRange::new(1, 3)?,
            policies: vec![
                // overnight floor drop, evening rush floor raise
                ScalingPolicy::scheduled(Cron::daily(8, 0)?, 1),
                ScalingPolicy::scheduled(Cron::daily(20, 0)?, 2),
                ScalingPolicy::target_utilization(
                    60,
                    Duration::from_secs(120),
                    Duration::from_secs(60),
                )?,
            ],
        }),
    };

    let sample = ServiceSpec {
        name: "sample".to_string(),
        task: TaskSpec {
            container_name: "web".to_string(),
            image: ImageRef::new("amazon/amazon-ecs-sample", "latest")?,
            cpu: 1024,
            memory_mib: 256,
            command: vec![],
            env: BTreeMap::new(),
            port_mappings: vec![PortMapping::tcp(Port::new(80)?, Port::new(8080)?)],
            log_stream_prefix: Some("myapp".to_string()),
        },
        desired_count: 1,
        subnet_tier: "Private".to_string(),
        security_group: "app".to_string(),
        autoscaling: None,
    };

    let health = HealthCheck::new(Duration::from_secs(60), Duration::from_secs(5), "/health")?;

    let output = app.compute(
        "compute",
        ComputeSpec {
            instances,
            cluster: Some(ClusterSpec {
                name: "main".to_string(),
                capacity: Some(ClusterCapacitySpec {
                    instance_type: InstanceType::new("t2.micro")?,
                    range: ScalingRange::new(1, 4)?,
                }),
                services: vec![service, sample],
            }),
            load_balancer: LoadBalancerSpec {
                name: "alb".to_string(),
                security_group: Some("alb".to_string()),
                listeners: vec![
                    ListenerSpec {
                        port: Port::new(8080)?,
                        target: TargetRef::Service {
                            name: "sample".to_string(),
                            container_port: Port::new(80)?,
                        },
                        health_check: health.clone(),
                    },
                    ListenerSpec {
                        port: Port::new(8081)?,
                        target: TargetRef::Service {
                            name: "app".to_string(),
                            container_port: Port::new(9000)?,
                        },
                        health_check: health,
                    },
                ],
            },
        },
        &network,
        &groups,
        Some(&db),
    )?;

    info!(
        "🌐 Entry point output: {} -> {}.{}",
        output.output_name(),
        output.load_balancer_dns().resource(),
        output.load_balancer_dns().attribute()
    );

    let template = app.synth();
    let rendered = template.to_json_pretty()?;

    match &config.out_path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write template to {}", path.display()))?;
            info!("✅ Template written to {}", path.display());
        }
        None => {
            println!("{rendered}");
            info!("✅ Template written to stdout");
        }
    }

    Ok(())
}
