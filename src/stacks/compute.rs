// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Stack
//!
//! Declares compute capacity (fixed instances and/or an elastic
//! container cluster), container task definitions, and a public load
//! balancer with one or more listeners. Capacity models combine freely
//! in one build call. Every listener forwards to exactly one target
//! group; a listener naming a target that this build call did not
//! declare is a dangling reference and fails before synthesis.
//!
//! When a database handle is supplied, task environments receive
//! connection parameters as deferred secret resolutions, never as
//! literals.

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

use crate::domain::{
    AttrRef, ComputeOutput, DatabaseClusterHandle, EnvValue, HealthCheck, ImageRef, IngressPeer,
    IngressRule, InstanceType, KeyPairRef, NetworkHandle, Port, PortMapping, Provenance,
    ScalingPolicy, ScalingRange, SecretField, SecurityGroupRef, StartupScript,
};
use crate::errors::{CompositionError, CompositionResult};
use crate::synth::{CompositionContext, OutputValue, Resource, ResourceKind};

/// A fixed virtual machine with an idempotent startup script
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub name: String,
    pub instance_type: InstanceType,
    pub subnet_tier: String,
    /// Name resolved against the security groups passed to `build`
    pub security_group: String,
    pub key_pair: Option<KeyPairRef>,
    pub startup: StartupScript,
}

/// Container task definition parameters
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub container_name: String,
    pub image: ImageRef,
    pub cpu: u32,
    pub memory_mib: u32,
    pub command: Vec<String>,
    pub env: BTreeMap<String, EnvValue>,
    pub port_mappings: Vec<PortMapping>,
    pub log_stream_prefix: Option<String>,
}

/// Autoscaling attachment for one service
#[derive(Debug, Clone)]
pub struct AutoscalingSpec {
    pub range: ScalingRange,
    pub policies: Vec<ScalingPolicy>,
}

/// A long-running container service keeping a target task count
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub name: String,
    pub task: TaskSpec,
    pub desired_count: u32,
    pub subnet_tier: String,
    pub security_group: String,
    pub autoscaling: Option<AutoscalingSpec>,
}

/// Elastic container cluster with optional instance-backed capacity
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    pub name: String,
    pub capacity: Option<ClusterCapacitySpec>,
    pub services: Vec<ServiceSpec>,
}

/// Instance-backed capacity provider for a cluster
#[derive(Debug, Clone)]
pub struct ClusterCapacitySpec {
    pub instance_type: InstanceType,
    pub range: ScalingRange,
}

/// What a listener forwards to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    /// A fixed instance declared in the same build call
    Instance { name: String },
    /// A service declared in the same build call, addressed by
    /// container name + container port
    Service { name: String, container_port: Port },
}

impl TargetRef {
    fn describe(&self) -> String {
        match self {
            TargetRef::Instance { name } => format!("instance {name}"),
            TargetRef::Service {
                name,
                container_port,
            } => format!("service {name}:{container_port}"),
        }
    }
}

/// One public listener bound to a distinct port
#[derive(Debug, Clone)]
pub struct ListenerSpec {
    pub port: Port,
    pub target: TargetRef,
    pub health_check: HealthCheck,
}

/// Public-facing load balancer with its listeners
#[derive(Debug, Clone)]
pub struct LoadBalancerSpec {
    pub name: String,
    pub security_group: Option<String>,
    pub listeners: Vec<ListenerSpec>,
}

/// Inputs of a compute stack build
#[derive(Debug, Clone)]
pub struct ComputeSpec {
    pub instances: Vec<InstanceSpec>,
    pub cluster: Option<ClusterSpec>,
    pub load_balancer: LoadBalancerSpec,
}

/// Builder for the compute stack
pub struct ComputeStack;

impl ComputeStack {
    /// `build(network, securityGroups, dbClusterHandle?) -> ComputeOutput`
    pub fn build(
        ctx: &mut CompositionContext,
        scope: Provenance,
        spec: ComputeSpec,
        network: &NetworkHandle,
        security_groups: &[SecurityGroupRef],
        database: Option<&DatabaseClusterHandle>,
    ) -> CompositionResult<ComputeOutput> {
        let stack = ctx.stack_name(scope).to_string();

        ctx.consume(scope, network.produced_by(), network.logical_id())?;
        for group in security_groups {
            ctx.consume(scope, group.produced_by(), group.name())?;
            if group.network_id() != network.id() {
                return Err(CompositionError::ForeignSecurityGroup {
                    stack: stack.clone(),
                    group: group.name().to_string(),
                });
            }
        }
        if let Some(db) = database {
            ctx.consume(scope, db.produced_by(), db.logical_id())?;
        }

        validate(&stack, &spec, network, security_groups)?;

        let groups_by_name: HashMap<&str, &SecurityGroupRef> = security_groups
            .iter()
            .map(|g| (g.name(), g))
            .collect();

        // Fixed instances
        let mut instance_ids = HashMap::new();
        for instance in &spec.instances {
            let group = groups_by_name[instance.security_group.as_str()];
            let logical_id = ctx.add_resource(
                scope,
                &format!("instance/{}", instance.name),
                Resource::new(
                    ResourceKind::Instance,
                    json!({
                        "network": network.logical_id(),
                        "instance-type": instance.instance_type.as_str(),
                        "subnet-tier": instance.subnet_tier,
                        "security-group": group.logical_id(),
                        "key-pair": instance.key_pair.as_ref().map(KeyPairRef::as_str),
                        "user-data": instance.startup.render(),
                    }),
                ),
            )?;
            instance_ids.insert(instance.name.clone(), logical_id);
        }

        // Elastic container capacity
        let mut service_ids = HashMap::new();
        if let Some(cluster) = &spec.cluster {
            let cluster_id = ctx.add_resource(
                scope,
                &format!("cluster/{}", cluster.name),
                Resource::new(
                    ResourceKind::ContainerCluster,
                    json!({ "network": network.logical_id() }),
                ),
            )?;

            if let Some(capacity) = &cluster.capacity {
                ctx.add_resource(
                    scope,
                    &format!("cluster/{}/capacity", cluster.name),
                    Resource::new(
                        ResourceKind::CapacityProvider,
                        json!({
                            "cluster": cluster_id,
                            "instance-type": capacity.instance_type.as_str(),
                            "min-capacity": capacity.range.min(),
                            "max-capacity": capacity.range.max(),
                        }),
                    ),
                )?;
            }

            for service in &cluster.services {
                let env = task_environment(&service.task, database);
                let group = groups_by_name[service.security_group.as_str()];

                let task_id = ctx.add_resource(
                    scope,
                    &format!("task/{}", service.name),
                    Resource::new(
                        ResourceKind::TaskDefinition,
                        json!({
                            "container": service.task.container_name,
                            "image": service.task.image.to_string(),
                            "cpu": service.task.cpu,
                            "memory-mib": service.task.memory_mib,
                            "command": service.task.command,
                            "environment": env,
                            "port-mappings": port_mappings_json(&service.task.port_mappings),
                            "log-stream-prefix": service.task.log_stream_prefix,
                        }),
                    ),
                )?;

                let service_id = ctx.add_resource(
                    scope,
                    &format!("service/{}", service.name),
                    Resource::new(
                        ResourceKind::Service,
                        json!({
                            "cluster": cluster_id,
                            "task-definition": task_id,
                            "desired-count": service.desired_count,
                            "subnet-tier": service.subnet_tier,
                            "security-group": group.logical_id(),
                        }),
                    ),
                )?;

                if let Some(autoscaling) = &service.autoscaling {
                    ctx.add_resource(
                        scope,
                        &format!("service/{}/scaling", service.name),
                        Resource::new(
                            ResourceKind::ScalableTarget,
                            json!({
                                "service": service_id,
                                "min-capacity": autoscaling.range.min(),
                                "max-capacity": autoscaling.range.max(),
                                "policies": autoscaling
                                    .policies
                                    .iter()
                                    .map(policy_json)
                                    .collect::<Vec<_>>(),
                            }),
                        ),
                    )?;
                }

                service_ids.insert(service.name.clone(), service_id);
            }
        }

        // Public load balancer and its listeners
        let lb = &spec.load_balancer;
        let lb_id = ctx.add_resource(
            scope,
            &format!("lb/{}", lb.name),
            Resource::new(
                ResourceKind::LoadBalancer,
                json!({
                    "network": network.logical_id(),
                    "internet-facing": true,
                    "security-group": lb
                        .security_group
                        .as_deref()
                        .map(|name| groups_by_name[name].logical_id()),
                }),
            ),
        )?;

        let lb_group = lb
            .security_group
            .as_deref()
            .map(|name| groups_by_name[name]);

        for listener in &lb.listeners {
            // Open public listener: anyone may reach the balancer port
            if let Some(group) = lb_group {
                ctx.grant_ingress(
                    group.logical_id(),
                    IngressRule::tcp(
                        IngressPeer::AnyIpv4,
                        listener.port,
                        format!("open listener on {}", listener.port),
                    ),
                );
            }

            // Forwarded traffic needs explicit ingress on the target's
            // group, from the balancer's group
            if let Some(lb_group) = lb_group {
                let (target_group, traffic_port) = match &listener.target {
                    TargetRef::Instance { name } => {
                        let instance = spec
                            .instances
                            .iter()
                            .find(|i| i.name == *name)
                            .map(|i| i.security_group.as_str());
                        (instance, listener.port)
                    }
                    TargetRef::Service {
                        name,
                        container_port,
                    } => {
                        let service = spec.cluster.as_ref().and_then(|c| {
                            c.services
                                .iter()
                                .find(|s| s.name == *name)
                                .map(|s| s.security_group.as_str())
                        });
                        (service, *container_port)
                    }
                };
                if let Some(target_group) = target_group {
                    ctx.grant_ingress(
                        groups_by_name[target_group].logical_id(),
                        IngressRule::tcp(
                            IngressPeer::Group(lb_group.clone()),
                            traffic_port,
                            "allow load balancer in",
                        ),
                    );
                }
            }

            let target = match &listener.target {
                TargetRef::Instance { name } => json!({ "instance": instance_ids[name] }),
                TargetRef::Service {
                    name,
                    container_port,
                } => json!({
                    "service": service_ids[name],
                    "container-port": container_port.get(),
                }),
            };

            let tg_id = ctx.add_resource(
                scope,
                &format!("lb/{}/tg-{}", lb.name, listener.port),
                Resource::new(
                    ResourceKind::TargetGroup,
                    json!({
                        "target": target,
                        "health-check": {
                            "interval-secs": listener.health_check.interval().as_secs(),
                            "timeout-secs": listener.health_check.timeout().as_secs(),
                            "path": listener.health_check.path(),
                        },
                    }),
                ),
            )?;

            ctx.add_resource(
                scope,
                &format!("lb/{}/listener-{}", lb.name, listener.port),
                Resource::new(
                    ResourceKind::Listener,
                    json!({
                        "load-balancer": lb_id,
                        "port": listener.port.get(),
                        "protocol": "http",
                        "target-group": tg_id,
                    }),
                ),
            )?;
        }

        let dns = AttrRef::new(lb_id, "DnsName");
        let output_name = format!("{}-dns", lb.name);
        ctx.add_output(scope, &output_name, OutputValue::from(dns.clone()))?;

        info!(
            stack = %ctx.stack_name(scope),
            instances = spec.instances.len(),
            services = spec.cluster.as_ref().map_or(0, |c| c.services.len()),
            listeners = lb.listeners.len(),
            "compute stack built"
        );

        Ok(ComputeOutput::new(output_name, dns, scope))
    }
}

/// All structural checks, before any resource is declared
fn validate(
    stack: &str,
    spec: &ComputeSpec,
    network: &NetworkHandle,
    security_groups: &[SecurityGroupRef],
) -> CompositionResult<()> {
    let group_names: HashSet<&str> = security_groups.iter().map(|g| g.name()).collect();

    let require_tier = |tier: &str| -> CompositionResult<()> {
        if network.tier(tier).is_none() {
            return Err(CompositionError::MissingSubnetTier {
                stack: stack.to_string(),
                tier: tier.to_string(),
            });
        }
        Ok(())
    };
    let require_group = |name: &str| -> CompositionResult<()> {
        if !group_names.contains(name) {
            return Err(CompositionError::UnknownSecurityGroup {
                stack: stack.to_string(),
                group: name.to_string(),
            });
        }
        Ok(())
    };

    let mut instance_names = HashSet::new();
    for instance in &spec.instances {
        if !instance_names.insert(instance.name.as_str()) {
            return Err(CompositionError::DuplicateName {
                stack: stack.to_string(),
                what: "instance",
                name: instance.name.clone(),
            });
        }
        require_tier(&instance.subnet_tier)?;
        require_group(&instance.security_group)?;
    }

    let mut service_ports: HashMap<&str, HashSet<u16>> = HashMap::new();
    if let Some(cluster) = &spec.cluster {
        let mut service_names = HashSet::new();
        for service in &cluster.services {
            if !service_names.insert(service.name.as_str()) {
                return Err(CompositionError::DuplicateName {
                    stack: stack.to_string(),
                    what: "service",
                    name: service.name.clone(),
                });
            }
            require_tier(&service.subnet_tier)?;
            require_group(&service.security_group)?;

            if let Some(autoscaling) = &service.autoscaling {
                for policy in &autoscaling.policies {
                    if let Some(floor) = policy.capacity_floor() {
                        if floor > autoscaling.range.max() {
                            return Err(CompositionError::ScheduledFloorAboveMax {
                                stack: stack.to_string(),
                                field: format!("services.{}.autoscaling", service.name),
                                floor,
                                max: autoscaling.range.max(),
                            });
                        }
                    }
                }
            }

            service_ports.insert(
                service.name.as_str(),
                service
                    .task
                    .port_mappings
                    .iter()
                    .map(|m| m.container_port.get())
                    .collect(),
            );
        }
    }

    if let Some(name) = spec.load_balancer.security_group.as_deref() {
        require_group(name)?;
    }

    let mut listener_ports = HashSet::new();
    for listener in &spec.load_balancer.listeners {
        if !listener_ports.insert(listener.port.get()) {
            return Err(CompositionError::DuplicateListenerPort {
                stack: stack.to_string(),
                port: listener.port.get(),
            });
        }

        let resolved = match &listener.target {
            TargetRef::Instance { name } => instance_names.contains(name.as_str()),
            TargetRef::Service {
                name,
                container_port,
            } => service_ports
                .get(name.as_str())
                .is_some_and(|ports| ports.contains(&container_port.get())),
        };
        if !resolved {
            return Err(CompositionError::DanglingTarget {
                stack: stack.to_string(),
                port: listener.port.get(),
                target: listener.target.describe(),
            });
        }
    }

    Ok(())
}

/// Task environment, with connection parameters injected when a
/// database handle is supplied
///
/// Injected values are deferred secret resolutions; explicit entries in
/// the task spec win over injected ones.
fn task_environment(task: &TaskSpec, database: Option<&DatabaseClusterHandle>) -> Value {
    let mut env = task.env.clone();

    if let Some(db) = database {
        let secret = db.secret();
        env.entry("DB_USERNAME".to_string())
            .or_insert_with(|| secret.field(SecretField::Username).into());
        env.entry("DB_PASSWORD".to_string())
            .or_insert_with(|| secret.field(SecretField::Password).into());
        env.entry("DB_HOST".to_string())
            .or_insert_with(|| secret.field(SecretField::Host).into());
        env.entry("DB_PORT".to_string())
            .or_insert_with(|| secret.field(SecretField::Port).into());
        env.entry("DB_NAME".to_string())
            .or_insert_with(|| EnvValue::literal(db.default_database_name().as_str()));
    }

    serde_json::to_value(&env).unwrap_or_default()
}

fn port_mappings_json(mappings: &[PortMapping]) -> Value {
    Value::Array(
        mappings
            .iter()
            .map(|m| {
                json!({
                    "container-port": m.container_port.get(),
                    "host-port": m.host_port.get(),
                    "protocol": m.protocol.to_string(),
                })
            })
            .collect(),
    )
}

fn policy_json(policy: &ScalingPolicy) -> Value {
    match policy {
        ScalingPolicy::Scheduled {
            schedule,
            min_capacity,
        } => json!({
            "scheduled": {
                "hour": schedule.hour(),
                "minute": schedule.minute(),
                "min-capacity": min_capacity,
            }
        }),
        ScalingPolicy::TargetUtilization {
            target_percent,
            scale_in_cooldown,
            scale_out_cooldown,
        } => json!({
            "target-utilization": {
                "target-percent": target_percent,
                "scale-in-cooldown-secs": scale_in_cooldown.as_secs(),
                "scale-out-cooldown-secs": scale_out_cooldown.as_secs(),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CidrBlock, SubnetTier, TierKind};
    use crate::stacks::network::{NetworkSpec, NetworkStack};
    use std::time::Duration;

    fn health_check() -> HealthCheck {
        HealthCheck::new(Duration::from_secs(60), Duration::from_secs(5), "/health").unwrap()
    }

    fn built_network(ctx: &mut CompositionContext) -> (NetworkHandle, Vec<SecurityGroupRef>) {
        let scope = ctx.begin_stack("network").unwrap();
        let built = NetworkStack::build(
            ctx,
            scope,
            NetworkSpec {
                address_block: CidrBlock::new("10.10.0.0/16").unwrap(),
                az_count: 2,
                subnet_tiers: vec![
                    SubnetTier::new("Public", TierKind::Public, 24).unwrap(),
                    SubnetTier::new("Private", TierKind::PrivateNat, 24).unwrap(),
                ],
                security_groups: vec!["app".to_string(), "alb".to_string()],
            },
        )
        .unwrap();
        ctx.seal_stack(scope);
        built
    }

    fn service(name: &str, container_port: u16) -> ServiceSpec {
        ServiceSpec {
            name: name.to_string(),
            task: TaskSpec {
                container_name: name.to_string(),
                image: ImageRef::new("amazon/amazon-ecs-sample", "latest").unwrap(),
                cpu: 1024,
                memory_mib: 2048,
                command: vec![],
                env: BTreeMap::new(),
                port_mappings: vec![PortMapping::tcp(
                    Port::new(container_port).unwrap(),
                    Port::new(container_port).unwrap(),
                )],
                log_stream_prefix: Some("myapp".to_string()),
            },
            desired_count: 1,
            subnet_tier: "Private".to_string(),
            security_group: "app".to_string(),
            autoscaling: None,
        }
    }

    fn spec_with_service() -> ComputeSpec {
        ComputeSpec {
            instances: vec![],
            cluster: Some(ClusterSpec {
                name: "main".to_string(),
                capacity: None,
                services: vec![service("web", 80)],
            }),
            load_balancer: LoadBalancerSpec {
                name: "alb".to_string(),
                security_group: Some("alb".to_string()),
                listeners: vec![ListenerSpec {
                    port: Port::new(8081).unwrap(),
                    target: TargetRef::Service {
                        name: "web".to_string(),
                        container_port: Port::new(80).unwrap(),
                    },
                    health_check: health_check(),
                }],
            },
        }
    }

    #[test]
    fn dangling_service_target_fails_before_synthesis() {
        let mut ctx = CompositionContext::new("test");
        let (net, groups) = built_network(&mut ctx);
        let mut spec = spec_with_service();
        spec.load_balancer.listeners[0].target = TargetRef::Service {
            name: "missing".to_string(),
            container_port: Port::new(80).unwrap(),
        };

        let scope = ctx.begin_stack("compute").unwrap();
        let declared_before = ctx.resource_count();
        let result = ComputeStack::build(&mut ctx, scope, spec, &net, &groups, None);
        assert!(matches!(
            result,
            Err(CompositionError::DanglingTarget { port: 8081, .. })
        ));
        // nothing was declared for the failed stack
        assert_eq!(ctx.resource_count(), declared_before);
    }

    #[test]
    fn target_port_must_be_mapped_by_the_service() {
        let mut ctx = CompositionContext::new("test");
        let (net, groups) = built_network(&mut ctx);
        let mut spec = spec_with_service();
        spec.load_balancer.listeners[0].target = TargetRef::Service {
            name: "web".to_string(),
            container_port: Port::new(9999).unwrap(),
        };

        let scope = ctx.begin_stack("compute").unwrap();
        let result = ComputeStack::build(&mut ctx, scope, spec, &net, &groups, None);
        assert!(matches!(
            result,
            Err(CompositionError::DanglingTarget { .. })
        ));
    }

    #[test]
    fn duplicate_listener_ports_rejected() {
        let mut ctx = CompositionContext::new("test");
        let (net, groups) = built_network(&mut ctx);
        let mut spec = spec_with_service();
        let duplicate = spec.load_balancer.listeners[0].clone();
        spec.load_balancer.listeners.push(duplicate);

        let scope = ctx.begin_stack("compute").unwrap();
        let result = ComputeStack::build(&mut ctx, scope, spec, &net, &groups, None);
        assert_eq!(
            result,
            Err(CompositionError::DuplicateListenerPort {
                stack: "compute".to_string(),
                port: 8081,
            })
        );
    }

    #[test]
    fn scheduled_floor_above_max_rejected() {
        let mut ctx = CompositionContext::new("test");
        let (net, groups) = built_network(&mut ctx);
        let mut spec = spec_with_service();
        if let Some(cluster) = spec.cluster.as_mut() {
            cluster.services[0].autoscaling = Some(AutoscalingSpec {
                range: ScalingRange::new(1, 3).unwrap(),
                policies: vec![ScalingPolicy::scheduled(
                    crate::domain::Cron::daily(20, 0).unwrap(),
                    5,
                )],
            });
        }

        let scope = ctx.begin_stack("compute").unwrap();
        let result = ComputeStack::build(&mut ctx, scope, spec, &net, &groups, None);
        assert!(matches!(
            result,
            Err(CompositionError::ScheduledFloorAboveMax { floor: 5, max: 3, .. })
        ));
    }

    #[test]
    fn unknown_security_group_rejected() {
        let mut ctx = CompositionContext::new("test");
        let (net, groups) = built_network(&mut ctx);
        let mut spec = spec_with_service();
        if let Some(cluster) = spec.cluster.as_mut() {
            cluster.services[0].security_group = "nope".to_string();
        }

        let scope = ctx.begin_stack("compute").unwrap();
        let result = ComputeStack::build(&mut ctx, scope, spec, &net, &groups, None);
        assert_eq!(
            result,
            Err(CompositionError::UnknownSecurityGroup {
                stack: "compute".to_string(),
                group: "nope".to_string(),
            })
        );
    }

    #[test]
    fn database_env_is_injected_as_deferred_values() {
        let task = TaskSpec {
            container_name: "app".to_string(),
            image: ImageRef::new("sonarqube", "8.9.8-community").unwrap(),
            cpu: 2048,
            memory_mib: 2048,
            command: vec![],
            env: BTreeMap::from([(
                "DB_NAME".to_string(),
                EnvValue::literal("explicit_wins"),
            )]),
            port_mappings: vec![],
            log_stream_prefix: None,
        };
        let db = DatabaseClusterHandle::new(
            "data/db/cluster",
            crate::domain::DatabaseEngine::aurora_postgres("13.4").unwrap(),
            crate::domain::DatabaseName::new("mpb").unwrap(),
            AttrRef::new("data/db/cluster", "Endpoint"),
            crate::domain::SecretRef::new("data/db/secret"),
            Provenance(1),
        );

        let env = task_environment(&task, Some(&db));
        assert_eq!(
            env["DB_PASSWORD"],
            json!({ "resolve": { "secret": "data/db/secret", "field": "password" } })
        );
        assert_eq!(
            env["DB_HOST"],
            json!({ "resolve": { "secret": "data/db/secret", "field": "host" } })
        );
        // explicit entries win over injection
        assert_eq!(env["DB_NAME"], json!("explicit_wins"));
    }

    #[test]
    fn no_database_means_no_injected_env() {
        let task = TaskSpec {
            container_name: "app".to_string(),
            image: ImageRef::new("app", "latest").unwrap(),
            cpu: 256,
            memory_mib: 512,
            command: vec![],
            env: BTreeMap::new(),
            port_mappings: vec![],
            log_stream_prefix: None,
        };
        let env = task_environment(&task, None);
        assert_eq!(env, json!({}));
    }
}
