#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod policy;
pub mod route;

pub use self::{
    labels::Labels,
    policy::{GlobalDeploymentPolicy, GlobalDeploymentPolicySpec},
    route::Route,
};
pub use k8s_openapi::api::{
    self,
    core::v1::{Namespace, Service, ServiceSpec, ServiceStatus},
    networking::v1::{Ingress, IngressSpec, IngressStatus},
};
pub use kube::{
    api::{Api, ObjectMeta, ResourceExt},
    runtime::watcher,
    Client, Error, Resource,
};
