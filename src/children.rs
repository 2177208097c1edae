//! # Recursive enumeration of nested stacks.
//!
//! Walks a stack's resource listing depth-first, following every
//! nested-stack resource into its children. The orchestrator guarantees
//! the nesting forms a tree, so no cycle guard is needed.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::client::{OrchestratorClient, ResourcePages};
use crate::error::ClientResult;
use crate::event::NESTED_STACK_TYPE;
use crate::stack::StackIdentity;

/// Returns every nested descendant of `root` (the root itself excluded)
/// as a flat list.
///
/// Child identities are taken from the resources' physical ids directly;
/// no name resolution is involved.
pub async fn descendants(
    client: &dyn OrchestratorClient,
    root: &StackIdentity,
    cancel: &CancellationToken,
) -> ClientResult<Vec<StackIdentity>> {
    let mut found = Vec::new();
    collect(client, root, cancel, &mut found).await?;
    Ok(found)
}

fn collect<'a>(
    client: &'a dyn OrchestratorClient,
    stack: &'a StackIdentity,
    cancel: &'a CancellationToken,
    out: &'a mut Vec<StackIdentity>,
) -> Pin<Box<dyn Future<Output = ClientResult<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut children = Vec::new();
        let mut pages = ResourcePages::new(client, stack);
        while let Some(page) = pages.next_page(cancel).await? {
            for resource in page {
                if resource.resource_type != NESTED_STACK_TYPE {
                    continue;
                }
                if let Some(physical) = resource.physical_resource_id.filter(|p| !p.is_empty()) {
                    children.push(StackIdentity::new(physical));
                }
            }
        }

        for child in children {
            out.push(child.clone());
            collect(client, &child, cancel, out).await?;
        }
        Ok(())
    })
}
