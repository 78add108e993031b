mod permissions;

pub use permissions::{PermissionGuardFactory, PermissionGuardService};
