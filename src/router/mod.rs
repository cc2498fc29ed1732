//! This mod decides where each request goes. Writes chase the leader; reads go everywhere.
mod fan_out;
mod leader_guess;
mod router;
mod router_api;
mod write_state;

pub(crate) use fan_out::NodeLogResult;
pub(crate) use router::Router;
pub(crate) use router_api::RouterConfig;
pub(crate) use router_api::SubmitEntryError;
pub(crate) use router_api::SubmitEntryOutput;
