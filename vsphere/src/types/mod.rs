/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod mor;
mod retrieve;
mod service;
mod task_info;
mod update;
pub(crate) mod value;

pub use mor::ManagedObjectReference;
pub use retrieve::{
    DynamicProperty, MissingProperty, ObjectContent, RetrieveResult,
};
pub use service::{AboutInfo, ApiType, ServiceContent, UserSession};
pub use task_info::{LocalizedMethodFault, TaskInfo, TaskInfoState};
pub use update::{
    ObjectUpdate, ObjectUpdateKind, PropertyChange, PropertyChangeOp,
    PropertyFilterUpdate, UpdateSet,
};
pub use value::{GenericArray, GenericObject, GenericValue, Value};
