/// Result alias shared by every crate in the workspace.
pub type Result<T> = anyhow::Result<T>;
