pub mod map_info;
pub mod physical_resource_block;
pub mod scheduled_compound;

mod scheduling_map;

pub use scheduling_map::SchedulingMap;
