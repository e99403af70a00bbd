#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use gslb_federator_core as core;
pub use gslb_federator_k8s_api as k8s;
pub use gslb_federator_k8s_index as index;

mod args;
mod downstream;
mod members;
mod workers;

pub use self::{
    args::Args,
    downstream::{Downstream, LogDownstream},
};
