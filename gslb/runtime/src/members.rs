//! Connects to member clusters and indexes their resources.

use crate::{
    index::{namespace, MemberIndex, SharedContext},
    k8s::{self, Api, Client, Resource},
};
use anyhow::{bail, Result};
use futures::prelude::*;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    runtime::{watcher, WatchStreamExt},
};
use serde::de::DeserializeOwned;
use std::{fmt, str::FromStr};
use tracing::{info_span, Instrument};

/// A member cluster: the name policies refer to it by, and the kubeconfig context used to reach it.
///
/// Parsed from `name=context`, or from a bare `context` that doubles as the name. Names end up as
/// a segment of every federation key, so they may not contain `/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MemberCluster {
    pub name: String,
    pub context: String,
}

/// The member-cluster resources to federate.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Watches {
    pub ingresses: bool,
    pub routes: bool,
    pub services: bool,
}

// === impl MemberCluster ===

impl FromStr for MemberCluster {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, context) = s.split_once('=').unwrap_or((s, s));
        if name.is_empty() || context.is_empty() {
            bail!("invalid member cluster {s:?}: expected `name=context` or `context`");
        }
        if name.contains('/') {
            bail!(
                "member cluster name {name:?} contains '/'; name the cluster explicitly with `name={context}`"
            );
        }
        Ok(Self {
            name: name.to_string(),
            context: context.to_string(),
        })
    }
}

/// Builds a client for the member cluster named by a kubeconfig context.
pub(crate) async fn connect(kubeconfig: Kubeconfig, context: &str) -> Result<Client> {
    let options = KubeConfigOptions {
        context: Some(context.to_string()),
        ..Default::default()
    };
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?;
    Ok(Client::try_from(config)?)
}

/// Spawns the watches for a member cluster. The cluster's namespaces are always watched so that the
/// namespace selector can be evaluated.
pub(crate) async fn spawn_watches(
    cluster: String,
    client: Client,
    ctx: SharedContext,
    watches: Watches,
) {
    let index = MemberIndex::shared(cluster.clone(), ctx.clone());

    tokio::spawn(
        namespace::index_namespaces(
            cluster.clone(),
            ctx,
            watch_all::<k8s::Namespace>(&client),
        )
        .instrument(info_span!("namespaces", %cluster)),
    );

    if watches.ingresses {
        tokio::spawn(
            kubert::index::namespaced(index.clone(), watch_all::<k8s::Ingress>(&client))
                .instrument(info_span!("ingresses", %cluster)),
        );
    }

    if watches.routes {
        if api_resource_exists::<k8s::Route>(&client).await {
            tokio::spawn(
                kubert::index::namespaced(index.clone(), watch_all::<k8s::Route>(&client))
                    .instrument(info_span!("routes.route.openshift.io", %cluster)),
            );
        } else {
            tracing::warn!(%cluster, "routes.route.openshift.io resource kind not found, skipping watches");
        }
    }

    if watches.services {
        tokio::spawn(
            kubert::index::namespaced(index, watch_all::<k8s::Service>(&client))
                .instrument(info_span!("services", %cluster)),
        );
    }
}

/// Watches every instance of a resource, restarting the watch with backoff on errors.
fn watch_all<T>(client: &Client) -> impl Stream<Item = watcher::Event<T>> + Send + 'static
where
    T: Resource + Clone + DeserializeOwned + fmt::Debug + Send + 'static,
    T::DynamicType: Default,
{
    watcher(Api::<T>::all(client.clone()), watcher::Config::default())
        .default_backoff()
        .filter_map(|res| {
            future::ready(match res {
                Ok(event) => Some(event),
                Err(error) => {
                    tracing::info!(%error, "Watch failed");
                    None
                }
            })
        })
}

async fn api_resource_exists<T>(client: &Client) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    client
        .list_api_group_resources(&T::api_version(&dt))
        .await
        .ok()
        .iter()
        .flat_map(|r| r.resources.iter())
        .any(|r| r.kind == T::kind(&dt))
}
