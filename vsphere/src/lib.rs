/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Client for the vSphere vim25 SOAP api: property retrieval through the
//! property collector, and task monitoring through filter updates.

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod inventory;
pub mod property_collector;
pub mod requests;
mod response;
pub mod session;
pub mod soap;
pub mod spec;
pub mod task;
pub mod types;

pub use config::{Config, Credentials, HostAlias, TaskOptions};
pub use error::{Error, Result, TaskFailure};
pub use inventory::Inventory;
pub use property_collector::{PropertyCollector, PropertyMap, Traversal};
pub use session::VimClient;
pub use soap::{CertType, SoapClient, SoapError, SoapFault, Transport};
pub use task::TaskMonitor;
pub use types::{ManagedObjectReference, TaskInfo, TaskInfoState, Value};
