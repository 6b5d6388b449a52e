/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

/* Managed object types. */

pub const DATACENTER: &str = "Datacenter";
pub const CLUSTER_COMPUTE_RESOURCE: &str = "ClusterComputeResource";
pub const HOST_SYSTEM: &str = "HostSystem";
pub const VIRTUAL_MACHINE: &str = "VirtualMachine";
pub const DISTRIBUTED_VIRTUAL_SWITCH: &str = "VmwareDistributedVirtualSwitch";
pub const DISTRIBUTED_VIRTUAL_PORTGROUP: &str = "DistributedVirtualPortgroup";

/* Property paths. */

pub const NAME_PROPERTY: &str = "name";
pub const RECENT_TASK_PROPERTY: &str = "recentTask";
pub const TASK_INFO_PROPERTY: &str = "info";

/* Api types reported in `about.apiType`. */

pub const VCENTER_API_TYPE: &str = "VirtualCenter";
pub const HOST_API_TYPE: &str = "HostAgent";
