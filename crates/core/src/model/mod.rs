pub mod builder;
pub mod call_tree;
pub mod frame;
pub mod profile;
mod transform;
pub mod unit;

pub use builder::ProfileBuilder;
pub use call_tree::{CallNode, CallTreeNode, NodeId, Sample};
pub use frame::{Frame, FrameId, FrameInfo, FrameKey};
pub use profile::Profile;
pub use unit::ValueUnit;

/// Build a profile from `;`-separated stacks. An empty stack is idle time.
#[cfg(test)]
pub(crate) fn folded(stacks: &[(&str, f64)]) -> Profile {
    let mut builder = ProfileBuilder::new(ValueUnit::Samples);
    for (line, weight) in stacks {
        let stack: Vec<FrameInfo> = line
            .split(';')
            .filter(|name| !name.is_empty())
            .map(FrameInfo::new)
            .collect();
        builder
            .append_sample(&stack, *weight)
            .expect("test weights are valid");
    }
    builder.build()
}
