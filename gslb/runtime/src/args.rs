use crate::{
    core::{QueueConfig, WorkQueues},
    index::{Context, IndexMetrics, PolicyIndex},
    k8s::GlobalDeploymentPolicy,
    members::{self, MemberCluster, Watches},
    workers::{self, WorkerMetrics},
    LogDownstream,
};
use anyhow::{bail, Context as _, Result};
use clap::{ArgAction, Parser};
use kube::{config::Kubeconfig, runtime::watcher};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "gslb-federator",
    about = "Federates member-cluster endpoints into global services"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "gslb_federator=info,warn",
        env = "GSLB_FEDERATOR_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    /// Configures the client for the cluster that holds the `GlobalDeploymentPolicy`.
    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Member clusters as `name=context` pairs of a cluster name, as referred to by policies, and
    /// a kubeconfig context. A bare context is also used as the cluster name.
    #[clap(long, value_delimiter = ',', required = true)]
    member_clusters: Vec<MemberCluster>,

    /// The namespace watched for the `GlobalDeploymentPolicy`.
    #[clap(long, default_value = "gslb-system")]
    policy_namespace: String,

    /// The tenant that owns the produced global services.
    #[clap(long, default_value = "admin")]
    tenant: String,

    #[clap(long, default_value = "8")]
    ingestion_workers: usize,

    #[clap(long, default_value = "8")]
    graph_workers: usize,

    #[clap(long, default_value = "4")]
    retry_workers: usize,

    #[clap(long, default_value = "true", action = ArgAction::Set)]
    watch_ingresses: bool,

    #[clap(long, default_value = "true", action = ArgAction::Set)]
    watch_routes: bool,

    #[clap(long, default_value = "true", action = ArgAction::Set)]
    watch_services: bool,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            member_clusters,
            policy_namespace,
            tenant,
            ingestion_workers,
            graph_workers,
            retry_workers,
            watch_ingresses,
            watch_routes,
            watch_services,
        } = self;

        let mut prom = <Registry>::default();
        let gslb = prom.sub_registry_with_prefix("gslb_federator");
        let index_metrics = IndexMetrics::register(gslb);
        let worker_metrics = WorkerMetrics::register(gslb);
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let queues = WorkQueues::new(QueueConfig {
            ingestion_workers,
            graph_workers,
            retry_workers,
        });
        let ctx = Context::new(tenant, queues, index_metrics);

        // Start draining the queues before any watch can publish.
        let downstream = Arc::new(LogDownstream::new(ctx.clone()));
        workers::spawn(
            ctx.clone(),
            downstream,
            worker_metrics,
            runtime.shutdown_handle(),
        )?;

        let policies = runtime.watch_namespaced::<GlobalDeploymentPolicy>(
            policy_namespace.clone(),
            watcher::Config::default(),
        );
        tokio::spawn(
            kubert::index::namespaced(PolicyIndex::shared(&policy_namespace, ctx.clone()), policies)
                .instrument(info_span!("globaldeploymentpolicies")),
        );

        let watches = Watches {
            ingresses: watch_ingresses,
            routes: watch_routes,
            services: watch_services,
        };
        let kubeconfig = Kubeconfig::read().context("failed to read kubeconfig")?;
        for MemberCluster { name, context } in member_clusters {
            let client = members::connect(kubeconfig.clone(), &context)
                .await
                .with_context(|| format!("failed to connect to member cluster {name}"))?;
            info!(cluster = %name, %context, "Watching member cluster");
            members::spawn_watches(name, client, ctx.clone(), watches).await;
        }

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
