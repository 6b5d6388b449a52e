/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod args;
mod error;

use clap::Parser;
use colored::Colorize;
use futures::{stream, StreamExt};
use log::{info, warn};
use serde_json::json;

use vsphere::{ManagedObjectReference, VimClient};

use args::{Args, Command, Kind};
use error::{Error, Result, TaskResult};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.init_logger();

    let config = args.get_config().await?;
    let client = VimClient::connect(&config).await?;

    let result = run(&client, &args.command).await;
    if let Err(e) = client.disconnect().await {
        warn!("Failed to log out: {}", e);
    }
    result
}

async fn run(client: &VimClient, command: &Command) -> Result<()> {
    match command {
        Command::About => {
            print_json(&client.service_content().about)?;
        }
        Command::List { r#type, props } => {
            let props = props.iter().map(String::as_str).collect::<Vec<_>>();
            let objects = client
                .property_collector()
                .in_container_by_type(client.root_folder(), r#type, &props)
                .await?;
            info!("found {} objects of type {}", objects.len(), r#type);
            let mut objects = objects.into_iter().collect::<Vec<_>>();
            objects.sort_by(|(a, _), (b, _)| a.value.cmp(&b.value));
            print_json(
                &objects
                    .into_iter()
                    .map(|(obj, props)| json!({"obj": obj, "props": props}))
                    .collect::<Vec<_>>(),
            )?;
        }
        Command::Props { object, props } => {
            let props = props.iter().map(String::as_str).collect::<Vec<_>>();
            let values = client
                .property_collector()
                .entity_props(&object.0, &props)
                .await?;
            print_json(&values)?;
        }
        Command::Find {
            kind,
            name,
            datacenter,
        } => {
            let dc = datacenter.as_deref();
            match find(client, *kind, name, dc).await? {
                Some(mor) => print_json(&mor)?,
                None => return Err(Error::NotFound(name.clone())),
            }
        }
        Command::Hosts {
            cluster,
            datacenter,
        } => {
            let inventory = client.inventory();
            let mor = inventory
                .cluster_in(datacenter, cluster)
                .await?
                .ok_or_else(|| Error::NotFound(cluster.clone()))?;
            print_json(&inventory.hosts_in_cluster(&mor).await?)?;
        }
        Command::Tasks { entity } => {
            let tasks = client
                .property_collector()
                .recent_active_tasks(&entity.0)
                .await?;
            print_json(&tasks)?;
        }
        Command::WaitTask { tasks, parallel } => {
            wait_tasks(client, tasks.iter().map(|t| t.0.clone()), *parallel)
                .await?;
        }
        Command::Destroy { entity } => {
            let info = client.task_monitor().destroy(&entity.0).await?;
            print_json(&info)?;
        }
    }
    Ok(())
}

async fn find(
    client: &VimClient,
    kind: Kind,
    name: &str,
    datacenter: Option<&str>,
) -> Result<Option<ManagedObjectReference>> {
    let inventory = client.inventory();
    let dc = || {
        datacenter.ok_or_else(|| Error::RequiredArg(String::from("datacenter")))
    };
    Ok(match kind {
        Kind::Datacenter => inventory.datacenter(name).await?,
        Kind::Cluster => inventory.cluster_in(dc()?, name).await?,
        Kind::Host => inventory.host(name).await?,
        Kind::Switch => inventory.distributed_switch(name).await?,
        Kind::Portgroup => inventory.portgroup_in(dc()?, name).await?,
        Kind::Vm => inventory.virtual_machine(name).await?,
    })
}

async fn wait_tasks<I>(
    client: &VimClient,
    tasks: I,
    parallel: usize,
) -> Result<()>
where
    I: Iterator<Item = ManagedObjectReference>,
{
    let results = stream::iter(tasks.map(|task| async move {
        let result = client.task_monitor().wait_for_task(&task).await;
        TaskResult::new(task, result)
    }))
    .buffer_unordered(parallel.max(1))
    .collect::<Vec<TaskResult>>()
    .await;
    info!("All tasks have finished");

    for result in &results {
        result.log_outcome();
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(
        "Summary: {}, {}",
        format!("{} tasks succeeded", results.len() - failed).green(),
        format!("{} tasks failed", failed).red(),
    );
    match failed {
        0 => Ok(()),
        n => Err(Error::TasksFailed(n, results.len())),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
