//! Render graph with automatic dependency resolution
//!
//! Passes declare the resources they read and write; [`RenderGraph::build`]
//! orders them with Kahn's algorithm. Resources owned by the host camera are
//! *imported*: every pass reading an imported resource runs before the pass
//! writing it, so the copy of the color target happens before the composite
//! overwrites it. All other resources are produced inside the graph and are
//! written before they are read.

mod pass;
mod resource;

pub use pass::{PassContext, RenderPass};
pub use resource::{PassId, ResourceHandle};

use crate::resources::FogTargets;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet, VecDeque};

/// Render graph for automatic pass ordering
pub struct RenderGraph {
    passes: Vec<PassNode>,
    imported: HashSet<ResourceHandle>,
    execution_order: Vec<usize>,
}

struct PassNode {
    pass: Box<dyn RenderPass>,
    reads: Vec<ResourceHandle>,
    writes: Vec<ResourceHandle>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            imported: HashSet::new(),
            execution_order: Vec::new(),
        }
    }

    /// Mark a resource as owned outside the graph
    pub fn import(&mut self, resource: ResourceHandle) -> &mut Self {
        self.imported.insert(resource);
        self
    }

    /// Add a pass to the graph
    pub fn add_pass(&mut self, pass: impl RenderPass + 'static) -> PassId {
        let id = PassId(self.passes.len());

        let mut builder = PassResourceBuilder::new();
        pass.declare_resources(&mut builder);

        self.passes.push(PassNode {
            pass: Box::new(pass),
            reads: builder.reads,
            writes: builder.writes,
        });
        id
    }

    /// Build the graph - resolve dependencies and determine execution order
    pub fn build(&mut self) -> Result<()> {
        let count = self.passes.len();

        let mut writers: HashMap<ResourceHandle, Vec<usize>> = HashMap::new();
        for (i, pass) in self.passes.iter().enumerate() {
            for &resource in &pass.writes {
                writers.entry(resource).or_default().push(i);
            }
        }

        let mut in_degree = vec![0usize; count];
        let mut adj_list: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (reader, pass) in self.passes.iter().enumerate() {
            for resource in &pass.reads {
                let Some(resource_writers) = writers.get(resource) else {
                    continue;
                };
                let imported = self.imported.contains(resource);
                for &writer in resource_writers {
                    if writer == reader {
                        continue;
                    }
                    let (from, to) = if imported { (reader, writer) } else { (writer, reader) };
                    if !adj_list[from].contains(&to) {
                        adj_list[from].push(to);
                        in_degree[to] += 1;
                    }
                }
            }
        }

        // Kahn's algorithm, FIFO to preserve insertion order
        let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &neighbor in &adj_list[node] {
                in_degree[neighbor] -= 1;
                if in_degree[neighbor] == 0 {
                    queue.push_back(neighbor);
                }
            }
        }

        if order.len() != count {
            return Err(Error::Graph("Cyclic dependency detected in fog graph".to_string()));
        }

        self.execution_order = order;

        for (i, &pass_idx) in self.execution_order.iter().enumerate() {
            log::debug!("  Fog pass {}: {}", i, self.passes[pass_idx].pass.name());
        }

        Ok(())
    }

    /// Pass names in execution order (empty until [`build`](Self::build) succeeds)
    pub fn execution_order(&self) -> Vec<&str> {
        self.execution_order
            .iter()
            .map(|&i| self.passes[i].pass.name())
            .collect()
    }

    /// Execute the render graph
    pub fn execute(&mut self, ctx: &mut GraphContext) -> Result<()> {
        log::trace!("Executing fog graph (frame {})", ctx.frame);

        for &pass_idx in &self.execution_order {
            let node = &mut self.passes[pass_idx];
            log::trace!("  Executing pass: {}", node.pass.name());

            let mut pass_ctx = PassContext {
                encoder: ctx.encoder,
                device: ctx.device,
                queue: ctx.queue,
                target: ctx.target,
                depth_view: ctx.depth_view,
                targets: ctx.targets,
                frame: ctx.frame,
            };

            node.pass.execute(&mut pass_ctx)?;
        }

        Ok(())
    }
}

/// Context for graph execution
pub struct GraphContext<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target: &'a wgpu::TextureView,
    pub depth_view: &'a wgpu::TextureView,
    pub targets: &'a FogTargets,
    pub frame: u64,
}

/// Builder for declaring pass resource dependencies
pub struct PassResourceBuilder {
    reads: Vec<ResourceHandle>,
    writes: Vec<ResourceHandle>,
}

impl PassResourceBuilder {
    fn new() -> Self {
        Self {
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Declare that this pass reads a resource
    pub fn read(&mut self, resource: ResourceHandle) -> &mut Self {
        self.reads.push(resource);
        self
    }

    /// Declare that this pass writes to a resource
    pub fn write(&mut self, resource: ResourceHandle) -> &mut Self {
        self.writes.push(resource);
        self
    }
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        name: &'static str,
        reads: Vec<ResourceHandle>,
        writes: Vec<ResourceHandle>,
    }

    impl Dummy {
        fn new(name: &'static str, reads: &[ResourceHandle], writes: &[ResourceHandle]) -> Self {
            Self { name, reads: reads.to_vec(), writes: writes.to_vec() }
        }
    }

    impl RenderPass for Dummy {
        fn name(&self) -> &str {
            self.name
        }

        fn declare_resources(&self, builder: &mut PassResourceBuilder) {
            for &r in &self.reads {
                builder.read(r);
            }
            for &r in &self.writes {
                builder.write(r);
            }
        }

        fn execute(&mut self, _ctx: &mut PassContext) -> Result<()> {
            Ok(())
        }
    }

    fn fog_graph(order: &[&str]) -> RenderGraph {
        let mut graph = RenderGraph::new();
        graph
            .import(ResourceHandle::camera_color())
            .import(ResourceHandle::camera_depth());
        for &name in order {
            let pass = match name {
                "copy" => Dummy::new(
                    "copy",
                    &[ResourceHandle::camera_color()],
                    &[ResourceHandle::fog_copied_color()],
                ),
                "mask" => Dummy::new("mask", &[], &[ResourceHandle::fog_exclusion_mask()]),
                _ => Dummy::new(
                    "composite",
                    &[
                        ResourceHandle::fog_copied_color(),
                        ResourceHandle::camera_depth(),
                        ResourceHandle::fog_exclusion_mask(),
                    ],
                    &[ResourceHandle::camera_color()],
                ),
            };
            graph.add_pass(pass);
        }
        graph
    }

    #[test]
    fn composite_runs_last_whatever_the_insertion_order() {
        let orders = [
            ["copy", "mask", "composite"],
            ["composite", "mask", "copy"],
            ["mask", "composite", "copy"],
        ];
        for order in orders {
            let mut graph = fog_graph(&order);
            graph.build().expect("acyclic");
            let executed = graph.execution_order();
            assert_eq!(executed.len(), 3);
            assert_eq!(executed[2], "composite");
        }
    }

    #[test]
    fn insertion_order_kept_for_independent_passes() {
        let mut graph = fog_graph(&["copy", "mask", "composite"]);
        graph.build().expect("acyclic");
        assert_eq!(graph.execution_order(), vec!["copy", "mask", "composite"]);
    }

    #[test]
    fn mask_is_optional() {
        let mut graph = fog_graph(&["composite", "copy"]);
        graph.build().expect("acyclic");
        assert_eq!(graph.execution_order(), vec!["copy", "composite"]);
    }

    #[test]
    fn cycles_are_reported() {
        let a = ResourceHandle::named("a");
        let b = ResourceHandle::named("b");
        let mut graph = RenderGraph::new();
        graph.add_pass(Dummy::new("first", &[a], &[b]));
        graph.add_pass(Dummy::new("second", &[b], &[a]));
        assert!(matches!(graph.build(), Err(Error::Graph(_))));
        assert!(graph.execution_order().is_empty());
    }
}
