//! Permission-gated routing: guards, the console's route table, and the
//! sidebar menu derived from the same permission checks.

mod guard;
mod menu;
mod table;

pub use guard::{Guard, GuardDecision, GuardState, PermissionRequirement, Redirect};
pub use menu::{visible_items, MenuItem, MENU};
pub use table::{Resolution, RouteMatch, RouteTable, Settled, View, MAX_REDIRECTS};
